//! Append-only conversations and the reply currently being streamed into them.

use thiserror::Error;
use tracing::debug;

use crate::api::{ChatMessage, Usage};
use crate::core::message::{Message, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("message id '{0}' already exists in this conversation")]
    DuplicateId(String),
}

/// Finish metadata reported with the terminal stream signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

/// Streamed text that has not been finalized into a [`Message`] yet.
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub stream_id: u64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
    pending: Option<PendingReply>,
    error: Option<String>,
    last_summary: Option<StreamSummary>,
    next_seq: u64,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            pending: None,
            error: None,
            last_summary: None,
            next_seq: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.pending.is_none()
    }

    pub fn pending(&self) -> Option<&PendingReply> {
        self.pending.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.pending.is_some()
    }

    pub fn owns_stream(&self, stream_id: u64) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.stream_id == stream_id)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_summary(&self) -> Option<&StreamSummary> {
        self.last_summary.as_ref()
    }

    pub fn has_assistant_reply(&self) -> bool {
        self.messages.iter().any(Message::is_assistant)
    }

    /// Append a finalized message. Ids must be unique within the conversation.
    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        if self.messages.iter().any(|existing| existing.id == message.id) {
            return Err(ConversationError::DuplicateId(message.id));
        }
        self.messages.push(message);
        Ok(())
    }

    fn next_message_id(&mut self) -> String {
        loop {
            let id = format!("{}-{}", self.id, self.next_seq);
            self.next_seq += 1;
            if !self.messages.iter().any(|message| message.id == id) {
                return id;
            }
        }
    }

    fn push_new(&mut self, role: Role, text: String) -> Option<&Message> {
        let id = self.next_message_id();
        let message = match role {
            Role::User => Message::user_text(id, text),
            Role::Assistant => Message::assistant_text(id, text),
        };
        self.push(message).ok()?;
        self.messages.last()
    }

    /// Record a user turn. Blank input is rejected without touching any state.
    pub fn submit_user_text(&mut self, text: &str) -> Option<&Message> {
        if text.trim().is_empty() {
            return None;
        }
        self.error = None;
        self.push_new(Role::User, text.to_string())
    }

    /// Start collecting a reply for `stream_id`, replacing any reply in flight.
    pub fn begin_reply(&mut self, stream_id: u64) {
        if let Some(previous) = &self.pending {
            debug!(
                conversation = %self.id,
                previous = previous.stream_id,
                stream_id,
                "replacing in-flight reply"
            );
        }
        self.pending = Some(PendingReply {
            stream_id,
            text: String::new(),
        });
        self.error = None;
    }

    /// Append streamed text. Deltas for streams this conversation no longer
    /// owns are ignored.
    pub fn push_delta(&mut self, stream_id: u64, delta: &str) -> bool {
        match self.pending.as_mut() {
            Some(pending) if pending.stream_id == stream_id => {
                pending.text.push_str(delta);
                true
            }
            _ => false,
        }
    }

    /// Turn the pending reply into an assistant message.
    pub fn complete_reply(&mut self, stream_id: u64, summary: StreamSummary) -> Option<&Message> {
        if !self.owns_stream(stream_id) {
            return None;
        }
        let pending = self.pending.take()?;
        let reason = summary.finish_reason.clone();
        self.last_summary = Some(summary);

        if pending.text.trim().is_empty() {
            self.error = Some(match reason {
                Some(reason) => format!("The model returned an empty response ({reason})."),
                None => "The model returned an empty response.".to_string(),
            });
            return None;
        }

        self.push_new(Role::Assistant, pending.text)
    }

    /// Drop the partial reply and surface `error`. The message list is left
    /// exactly as it was before the request.
    pub fn fail_reply(&mut self, stream_id: u64, error: impl Into<String>) -> bool {
        if !self.owns_stream(stream_id) {
            return false;
        }
        self.pending = None;
        self.error = Some(error.into());
        true
    }

    /// Forget the reply in flight without recording an error.
    pub fn abandon_reply(&mut self) -> Option<u64> {
        self.pending.take().map(|pending| pending.stream_id)
    }

    pub fn api_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_api_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_submissions_are_rejected() {
        let mut conversation = Conversation::new("main-chat");
        assert!(conversation.submit_user_text("").is_none());
        assert!(conversation.submit_user_text("  \n\t ").is_none());
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn ids_are_sequential_and_unique() {
        let mut conversation = Conversation::new("main-chat");
        conversation.submit_user_text("one");
        conversation.submit_user_text("two");
        let ids: Vec<_> = conversation.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["main-chat-1", "main-chat-2"]);

        let duplicate = Message::user_text("main-chat-1", "again");
        assert_eq!(
            conversation.push(duplicate),
            Err(ConversationError::DuplicateId("main-chat-1".into()))
        );
        assert_eq!(conversation.messages().len(), 2);
    }

    #[test]
    fn generated_ids_skip_manually_pushed_ones() {
        let mut conversation = Conversation::new("c");
        conversation.push(Message::user_text("c-1", "manual")).unwrap();
        let message = conversation.submit_user_text("generated").unwrap();
        assert_eq!(message.id, "c-2");
    }

    #[test]
    fn completed_reply_becomes_assistant_message() {
        let mut conversation = Conversation::new("main-chat");
        conversation.submit_user_text("hi");
        conversation.begin_reply(3);
        assert!(conversation.push_delta(3, "Hel"));
        assert!(conversation.push_delta(3, "lo"));
        assert!(!conversation.push_delta(4, "stale"));

        let summary = StreamSummary {
            finish_reason: Some("stop".into()),
            usage: None,
        };
        let message = conversation.complete_reply(3, summary.clone()).unwrap();
        assert_eq!(message.text(), "Hello");
        assert!(message.is_assistant());
        assert!(!conversation.is_streaming());
        assert_eq!(conversation.last_summary(), Some(&summary));
    }

    #[test]
    fn failed_reply_leaves_messages_untouched() {
        let mut conversation = Conversation::new("main-chat");
        conversation.submit_user_text("hi");
        conversation.begin_reply(1);
        conversation.push_delta(1, "partial");

        assert!(conversation.fail_reply(1, "API Error: boom"));
        assert_eq!(conversation.messages().len(), 1);
        assert!(conversation.pending().is_none());
        assert_eq!(conversation.error(), Some("API Error: boom"));

        conversation.submit_user_text("retry");
        assert!(conversation.error().is_none());
    }

    #[test]
    fn signals_for_other_streams_are_ignored() {
        let mut conversation = Conversation::new("main-chat");
        conversation.begin_reply(7);
        assert!(!conversation.fail_reply(8, "nope"));
        assert!(conversation
            .complete_reply(8, StreamSummary::default())
            .is_none());
        assert!(conversation.owns_stream(7));
    }

    #[test]
    fn empty_completion_reports_error() {
        let mut conversation = Conversation::new("main-chat");
        conversation.begin_reply(1);
        let summary = StreamSummary {
            finish_reason: Some("content_filter".into()),
            usage: None,
        };
        assert!(conversation.complete_reply(1, summary).is_none());
        assert!(conversation.messages().is_empty());
        assert_eq!(
            conversation.error(),
            Some("The model returned an empty response (content_filter).")
        );
    }

    #[test]
    fn api_messages_follow_insertion_order() {
        let mut conversation = Conversation::new("main-chat");
        conversation.submit_user_text("q");
        conversation.begin_reply(1);
        conversation.push_delta(1, "a");
        conversation.complete_reply(1, StreamSummary::default());
        let roles: Vec<_> = conversation
            .api_messages()
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();
        assert_eq!(
            roles,
            [
                ("user".to_string(), "q".to_string()),
                ("assistant".to_string(), "a".to_string())
            ]
        );
    }
}

//! A conversation together with the presentation state that belongs to it:
//! the reveal animation of its newest assistant text and the cancellation
//! handle of its stream in flight.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::core::conversation::Conversation;
use crate::core::message::Role;
use crate::core::reveal::TextReveal;

/// One block of rendered transcript text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptBlock {
    pub role: Role,
    pub text: String,
    /// The block currently driven by the reveal animation.
    pub live: bool,
}

pub struct ChatView {
    pub conversation: Conversation,
    reveal: TextReveal,
    stream_cancel: Option<CancellationToken>,
}

impl ChatView {
    pub fn new(id: impl Into<String>, reveal_speed_ms: i64) -> Self {
        Self {
            conversation: Conversation::new(id),
            reveal: TextReveal::new(reveal_speed_ms),
            stream_cancel: None,
        }
    }

    /// The newest assistant text: the reply in flight, or the last message
    /// when it came from the assistant.
    pub fn live_text(&self) -> Option<&str> {
        live_text_of(&self.conversation)
    }

    pub fn reveal(&self) -> &TextReveal {
        &self.reveal
    }

    /// Feed the latest assistant text to the animation and fire due ticks.
    /// Returns whether anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.reveal.revealed_len();
        let source_before = self.reveal.source().len();
        self.reveal
            .set_source(live_text_of(&self.conversation).unwrap_or_default(), now);
        let advanced = self.reveal.advance(now);
        advanced
            || before != self.reveal.revealed_len()
            || source_before != self.reveal.source().len()
    }

    pub fn is_animating(&self) -> bool {
        self.reveal.is_animating()
    }

    /// Transcript blocks as they should be displayed right now.
    pub fn blocks(&self) -> Vec<TranscriptBlock> {
        let live_index = self.live_index();
        let mut blocks: Vec<TranscriptBlock> = self
            .conversation
            .messages()
            .iter()
            .enumerate()
            .map(|(index, message)| {
                let live = Some(index) == live_index;
                TranscriptBlock {
                    role: message.role,
                    text: if live {
                        self.visible_live_text()
                    } else {
                        message.text()
                    },
                    live,
                }
            })
            .collect();

        if self.conversation.pending().is_some() {
            blocks.push(TranscriptBlock {
                role: Role::Assistant,
                text: self.visible_live_text(),
                live: true,
            });
        }
        blocks
    }

    fn live_index(&self) -> Option<usize> {
        if self.conversation.pending().is_some() {
            return None;
        }
        let messages = self.conversation.messages();
        match messages.last() {
            Some(last) if last.is_assistant() => Some(messages.len() - 1),
            _ => None,
        }
    }

    /// What the animation shows. Until the next tick picks up a replaced
    /// source, nothing is shown rather than a prefix of the old text.
    fn visible_live_text(&self) -> String {
        let live = self.live_text().unwrap_or_default();
        let shown = self.reveal.displayed();
        if live.starts_with(shown) {
            shown.to_string()
        } else {
            String::new()
        }
    }

    /// Register a new stream, cancelling the previous one.
    pub fn start_stream(&mut self, stream_id: u64) -> CancellationToken {
        self.cancel_stream();
        let token = CancellationToken::new();
        self.stream_cancel = Some(token.clone());
        self.conversation.begin_reply(stream_id);
        token
    }

    /// Cancel the stream in flight and forget its reply.
    pub fn cancel_stream(&mut self) -> Option<u64> {
        if let Some(token) = self.stream_cancel.take() {
            token.cancel();
        }
        self.conversation.abandon_reply()
    }

    /// Release the cancellation handle once the stream has ended on its own.
    pub fn stream_finished(&mut self) {
        self.stream_cancel = None;
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        if let Some(token) = self.stream_cancel.take() {
            token.cancel();
        }
    }
}

fn live_text_of(conversation: &Conversation) -> Option<&str> {
    if let Some(pending) = conversation.pending() {
        return Some(pending.text.as_str());
    }
    conversation
        .messages()
        .last()
        .filter(|message| message.is_assistant())
        .and_then(|message| message.parts.iter().find_map(|part| part.as_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::StreamSummary;
    use std::time::Duration;

    #[test]
    fn streamed_text_is_revealed_progressively() {
        let start = Instant::now();
        let mut view = ChatView::new("main-chat", 10);
        view.conversation.submit_user_text("hi");
        view.start_stream(1);
        view.conversation.push_delta(1, "abc");

        view.tick(start);
        let blocks = view.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text, "");
        assert!(blocks[1].live);

        view.tick(start + Duration::from_millis(20));
        assert_eq!(view.blocks()[1].text, "ab");

        view.conversation.complete_reply(1, StreamSummary::default());
        view.stream_finished();
        view.tick(start + Duration::from_millis(30));
        let blocks = view.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text, "abc");
        assert!(blocks[1].live);
        assert!(!view.is_animating());
    }

    #[test]
    fn older_replies_render_in_full() {
        let start = Instant::now();
        let mut view = ChatView::new("main-chat", 10);
        view.conversation.submit_user_text("q1");
        view.start_stream(1);
        view.conversation.push_delta(1, "first answer");
        view.conversation.complete_reply(1, StreamSummary::default());
        view.conversation.submit_user_text("q2");
        view.start_stream(2);

        view.tick(start);
        let blocks = view.blocks();
        assert_eq!(blocks[1].text, "first answer");
        assert!(!blocks[1].live);
        assert_eq!(blocks[3].text, "");
        assert!(blocks[3].live);
    }

    #[test]
    fn cancelling_drops_the_pending_reply_and_token() {
        let mut view = ChatView::new("c", 10);
        let token = view.start_stream(4);
        assert_eq!(view.cancel_stream(), Some(4));
        assert!(token.is_cancelled());
        assert!(!view.conversation.is_streaming());
    }

    #[test]
    fn starting_a_stream_cancels_the_previous_one() {
        let mut view = ChatView::new("c", 10);
        let first = view.start_stream(1);
        let second = view.start_stream(2);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(view.conversation.owns_stream(2));
    }

    #[test]
    fn dropping_the_view_cancels_its_stream() {
        let mut view = ChatView::new("c", 10);
        let token = view.start_stream(1);
        drop(view);
        assert!(token.is_cancelled());
    }
}

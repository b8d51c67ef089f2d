use tracing::debug;

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::session::SessionContext;
use crate::core::chat_view::ChatView;
use crate::core::conversation::StreamSummary;

pub(super) fn handle_streaming_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content, stream_id } => {
            match view_for_stream(app, stream_id) {
                Some(view) => {
                    view.conversation.push_delta(stream_id, &content);
                }
                None => debug!(stream_id, "dropping chunk for stale stream"),
            }
            None
        }
        AppAction::StreamErrored { message, stream_id } => {
            if let Some(view) = view_for_stream(app, stream_id) {
                debug!(stream_id, conversation = view.conversation.id(), error = %message, "stream failed");
                view.conversation.fail_reply(stream_id, message);
                view.stream_finished();
            }
            None
        }
        AppAction::StreamCompleted {
            finish_reason,
            usage,
            stream_id,
        } => {
            if let Some(view) = view_for_stream(app, stream_id) {
                view.conversation.complete_reply(
                    stream_id,
                    StreamSummary {
                        finish_reason,
                        usage,
                    },
                );
                view.stream_finished();
            }
            None
        }
        AppAction::CancelStreaming => {
            if let Some(stream_id) = app.main.cancel_stream() {
                debug!(stream_id, "main stream interrupted");
            }
            None
        }
        AppAction::SubmitFocusedInput => {
            if app.side_has_focus() {
                submit_side_input(app)
            } else {
                submit_main_input(app)
            }
        }
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}

/// The view whose reply `stream_id` is feeding, if any still is.
fn view_for_stream(app: &mut App, stream_id: u64) -> Option<&mut ChatView> {
    if app.main.conversation.owns_stream(stream_id) {
        return Some(&mut app.main);
    }
    app.side
        .get_mut()
        .filter(|side| side.view.conversation.owns_stream(stream_id))
        .map(|side| &mut side.view)
}

/// Begin streaming a reply to the conversation's latest user turn.
pub(super) fn start_turn(session: &mut SessionContext, view: &mut ChatView) -> AppCommand {
    let stream_id = session.allocate_stream_id();
    let cancel_token = view.start_stream(stream_id);
    let params = session.stream_params(
        view.conversation.id(),
        view.conversation.api_messages(),
        cancel_token,
        stream_id,
    );
    AppCommand::SpawnStream(params)
}

fn submit_main_input(app: &mut App) -> Option<AppCommand> {
    if app.main.conversation.is_streaming() {
        return None;
    }
    let text = app.ui.input_text();
    app.main.conversation.submit_user_text(&text)?;
    app.ui.clear_input();
    app.ui.auto_scroll = true;
    Some(start_turn(&mut app.session, &mut app.main))
}

fn submit_side_input(app: &mut App) -> Option<AppCommand> {
    let side = app.side.get_mut()?;
    if side.view.conversation.is_streaming() {
        return None;
    }
    let text = side.input.lines().join("\n");
    side.view.conversation.submit_user_text(&text)?;
    side.input.select_all();
    side.input.cut();
    Some(start_turn(&mut app.session, &mut side.view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::actions::apply_action;
    use crate::core::app::UiFocus;
    use crate::core::side_chat::SelectionCapture;
    use crate::utils::test_utils::create_test_app;
    use std::time::Instant;

    fn ctx() -> AppActionContext {
        AppActionContext {
            term_width: 80,
            term_height: 24,
        }
    }

    fn submit(app: &mut App, text: &str) -> Option<AppCommand> {
        app.focused_input_mut().insert_str(text);
        apply_action(app, AppAction::SubmitFocusedInput, ctx())
    }

    fn chunk(app: &mut App, stream_id: u64, content: &str) {
        apply_action(
            app,
            AppAction::AppendResponseChunk {
                content: content.into(),
                stream_id,
            },
            ctx(),
        );
    }

    fn complete(app: &mut App, stream_id: u64) {
        apply_action(
            app,
            AppAction::StreamCompleted {
                finish_reason: Some("stop".into()),
                usage: None,
                stream_id,
            },
            ctx(),
        );
    }

    fn spawned(command: Option<AppCommand>) -> crate::core::chat_stream::StreamParams {
        match command {
            Some(AppCommand::SpawnStream(params)) => params,
            None => panic!("expected a stream to be spawned"),
        }
    }

    #[test]
    fn submitting_spawns_a_stream_with_history() {
        let mut app = create_test_app();
        let params = spawned(submit(&mut app, "What is a borrow?"));
        assert_eq!(params.conversation_id, "main-chat");
        assert_eq!(params.api_messages.len(), 1);
        assert_eq!(params.api_messages[0].content, "What is a borrow?");
        assert_eq!(params.temperature, Some(0.7));
        assert!(app.ui.input_text().is_empty());
        assert!(app.main.conversation.owns_stream(params.stream_id));
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut app = create_test_app();
        assert!(submit(&mut app, "   ").is_none());
        assert!(app.main.conversation.is_empty());
        assert!(app.main.conversation.error().is_none());
    }

    #[test]
    fn submit_is_ignored_while_a_reply_streams() {
        let mut app = create_test_app();
        spawned(submit(&mut app, "first"));
        assert!(submit(&mut app, "second").is_none());
        assert_eq!(app.ui.input_text(), "second");
        assert_eq!(app.main.conversation.messages().len(), 1);
    }

    #[test]
    fn chunks_complete_into_an_assistant_message() {
        let mut app = create_test_app();
        let id = spawned(submit(&mut app, "hi")).stream_id;
        chunk(&mut app, id, "Hel");
        chunk(&mut app, id + 100, "stale");
        chunk(&mut app, id, "lo");
        complete(&mut app, id);

        let messages = app.main.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text(), "Hello");
        assert!(!app.is_streaming());
    }

    #[test]
    fn errors_leave_the_conversation_consistent() {
        let mut app = create_test_app();
        let id = spawned(submit(&mut app, "hi")).stream_id;
        chunk(&mut app, id, "partial");
        apply_action(
            &mut app,
            AppAction::StreamErrored {
                message: "API Error: quota exceeded".into(),
                stream_id: id,
            },
            ctx(),
        );
        assert_eq!(app.main.conversation.messages().len(), 1);
        assert_eq!(
            app.main.conversation.error(),
            Some("API Error: quota exceeded")
        );

        // A late completion for the failed stream changes nothing.
        complete(&mut app, id);
        assert_eq!(app.main.conversation.messages().len(), 1);
    }

    #[test]
    fn interrupting_discards_the_partial_reply() {
        let mut app = create_test_app();
        let params = spawned(submit(&mut app, "hi"));
        chunk(&mut app, params.stream_id, "part");
        apply_action(&mut app, AppAction::CancelStreaming, ctx());

        assert!(params.cancel_token.is_cancelled());
        assert!(!app.main.conversation.is_streaming());
        assert_eq!(app.main.conversation.messages().len(), 1);
        assert!(app.main.conversation.error().is_none());
    }

    #[test]
    fn side_and_main_streams_stay_isolated() {
        let mut app = create_test_app();
        let main_id = spawned(submit(&mut app, "main question")).stream_id;

        app.side.toggle(
            || SelectionCapture::new(Some("term"), None),
            Instant::now(),
            10,
        );
        app.ui.focus = UiFocus::SideInput;
        let side_params = spawned(submit(&mut app, "side question"));
        assert!(side_params.conversation_id.starts_with("subchat-"));
        assert_eq!(side_params.api_messages.len(), 1);

        chunk(&mut app, side_params.stream_id, "side answer");
        chunk(&mut app, main_id, "main answer");
        complete(&mut app, side_params.stream_id);
        complete(&mut app, main_id);

        let side = app.side.get().unwrap();
        assert_eq!(side.view.conversation.messages()[1].text(), "side answer");
        assert_eq!(app.main.conversation.messages()[1].text(), "main answer");
    }

    #[test]
    fn chunks_after_side_chat_closes_are_dropped() {
        let mut app = create_test_app();
        app.side.toggle(
            || SelectionCapture::new(Some("term"), None),
            Instant::now(),
            10,
        );
        app.ui.focus = UiFocus::SideInput;
        let params = spawned(submit(&mut app, "explain"));
        app.side.close();

        assert!(params.cancel_token.is_cancelled());
        chunk(&mut app, params.stream_id, "late");
        complete(&mut app, params.stream_id);
        assert!(app.main.conversation.is_empty());
        assert!(!app.side.is_open());
    }
}

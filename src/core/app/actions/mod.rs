mod input;
mod pointer;
mod side_chat;
mod streaming;

use std::time::Instant;

use tokio::sync::mpsc;

use super::App;
use crate::api::Usage;
use crate::core::chat_stream::StreamParams;

pub enum AppAction {
    AppendResponseChunk {
        content: String,
        stream_id: u64,
    },
    StreamErrored {
        message: String,
        stream_id: u64,
    },
    StreamCompleted {
        finish_reason: Option<String>,
        usage: Option<Usage>,
        stream_id: u64,
    },
    CancelStreaming,
    /// Submit whichever input has focus.
    SubmitFocusedInput,
    InsertIntoInput {
        text: String,
    },
    ClearSelection,
    ScrollTranscript {
        lines: i32,
    },
    ScrollTranscriptPage {
        down: bool,
    },
    ToggleFocus,
    ToggleTheme,
    ToggleSideChat,
    CloseSideChat,
    PointerDown {
        column: u16,
        row: u16,
    },
    PointerDrag {
        column: u16,
        row: u16,
    },
    PointerUp {
        column: u16,
        row: u16,
    },
    /// The button was released somewhere we could not see (outside the
    /// terminal, or focus was lost).
    PointerLost,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

pub enum AppCommand {
    SpawnStream(StreamParams),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::CancelStreaming
        | AppAction::SubmitFocusedInput => streaming::handle_streaming_action(app, action, ctx),

        AppAction::InsertIntoInput { .. }
        | AppAction::ClearSelection
        | AppAction::ScrollTranscript { .. }
        | AppAction::ScrollTranscriptPage { .. }
        | AppAction::ToggleFocus
        | AppAction::ToggleTheme => input::handle_input_action(app, action, ctx),

        AppAction::ToggleSideChat | AppAction::CloseSideChat => {
            side_chat::handle_side_chat_action(app, action, ctx)
        }

        AppAction::PointerDown { .. }
        | AppAction::PointerDrag { .. }
        | AppAction::PointerUp { .. }
        | AppAction::PointerLost => pointer::handle_pointer_action(app, action, ctx),
    }
}

/// Fire everything that is due at `now`: reveal ticks and a pending side
/// chat intro. Returns the commands to run and whether anything visible
/// changed.
pub fn poll_deadlines(app: &mut App, now: Instant) -> (Vec<AppCommand>, bool) {
    let mut commands = Vec::new();
    let mut changed = false;

    if let Some(command) = side_chat::send_due_intro(app, now) {
        commands.push(command);
        changed = true;
    }

    changed |= app.main.tick(now);
    if let Some(side) = app.side.get_mut() {
        changed |= side.view.tick(now);
    }

    (commands, changed)
}

use std::time::Instant;

use tui_textarea::TextArea;

use crate::core::chat_view::ChatView;
use crate::core::constants::MAIN_CONVERSATION_ID;
use crate::core::side_chat::SideChatSlot;
use crate::ui::theme::Theme;

pub mod actions;
pub mod session;
pub mod ui_state;

pub use actions::{
    apply_action, apply_actions, poll_deadlines, AppAction, AppActionContext,
    AppActionDispatcher, AppActionEnvelope, AppCommand,
};
pub use session::{SessionContext, SessionOverrides};
pub use ui_state::{UiFocus, UiState};

pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
    pub main: ChatView,
    pub side: SideChatSlot,
}

impl App {
    pub fn new(session: SessionContext, theme: Theme) -> Self {
        let main = ChatView::new(MAIN_CONVERSATION_ID, session.reveal_speed_ms);
        Self {
            session,
            ui: UiState::new(theme),
            main,
            side: SideChatSlot::default(),
        }
    }

    /// The input that currently receives keystrokes.
    pub fn focused_input_mut(&mut self) -> &mut TextArea<'static> {
        match (self.ui.focus, self.side.get_mut()) {
            (UiFocus::SideInput, Some(side)) => &mut side.input,
            _ => &mut self.ui.input,
        }
    }

    pub fn side_has_focus(&self) -> bool {
        self.ui.focus == UiFocus::SideInput && self.side.is_open()
    }

    pub fn request_exit(&mut self) {
        self.ui.exit_requested = true;
    }

    /// Whether any reply is still streaming in.
    pub fn is_streaming(&self) -> bool {
        self.main.conversation.is_streaming()
            || self
                .side
                .get()
                .is_some_and(|side| side.view.conversation.is_streaming())
    }

    /// The earliest moment at which time-driven state changes: a reveal tick
    /// or a pending side-chat intro.
    pub fn next_deadline(&self) -> Option<Instant> {
        let side = self.side.get();
        [
            self.main.reveal().next_deadline(),
            side.and_then(|side| side.view.reveal().next_deadline()),
            side.and_then(|side| side.intro_deadline()),
        ]
        .into_iter()
        .flatten()
        .min()
    }
}

//! Keybinding handler implementations

use ratatui::crossterm::event::KeyEvent;

use crate::core::app::{AppAction, AppActionContext, AppActionDispatcher};
use crate::ui::chat_loop::keybindings::registry::{KeyHandler, KeyResult};
use crate::ui::chat_loop::AppHandle;

/// Handlers that only translate a key into a fixed action.
#[derive(Clone, Copy)]
pub enum SimpleAction {
    Submit,
    ToggleFocus,
    ToggleTheme,
    PageUp,
    PageDown,
    LineUp,
    LineDown,
}

impl SimpleAction {
    fn action(self) -> AppAction {
        match self {
            SimpleAction::Submit => AppAction::SubmitFocusedInput,
            SimpleAction::ToggleFocus => AppAction::ToggleFocus,
            SimpleAction::ToggleTheme => AppAction::ToggleTheme,
            SimpleAction::PageUp => AppAction::ScrollTranscriptPage { down: false },
            SimpleAction::PageDown => AppAction::ScrollTranscriptPage { down: true },
            SimpleAction::LineUp => AppAction::ScrollTranscript { lines: -1 },
            SimpleAction::LineDown => AppAction::ScrollTranscript { lines: 1 },
        }
    }
}

#[async_trait::async_trait]
impl KeyHandler for SimpleAction {
    async fn handle(
        &self,
        _app: &AppHandle,
        dispatcher: &AppActionDispatcher,
        _key: &KeyEvent,
        ctx: AppActionContext,
    ) -> KeyResult {
        dispatcher.dispatch_many([self.action()], ctx);
        KeyResult::Handled
    }
}

/// Handler for Ctrl+C (quit)
#[derive(Clone, Copy)]
pub struct CtrlCHandler;

#[async_trait::async_trait]
impl KeyHandler for CtrlCHandler {
    async fn handle(
        &self,
        app: &AppHandle,
        _dispatcher: &AppActionDispatcher,
        _key: &KeyEvent,
        _ctx: AppActionContext,
    ) -> KeyResult {
        app.update(|app| app.request_exit()).await;
        KeyResult::Exit
    }
}

/// Handler for Alt+Enter and Shift+Enter
#[derive(Clone, Copy)]
pub struct NewlineHandler;

#[async_trait::async_trait]
impl KeyHandler for NewlineHandler {
    async fn handle(
        &self,
        app: &AppHandle,
        _dispatcher: &AppActionDispatcher,
        _key: &KeyEvent,
        _ctx: AppActionContext,
    ) -> KeyResult {
        app.update(|app| app.focused_input_mut().insert_newline())
            .await;
        KeyResult::Handled
    }
}

/// Esc in the main input: interrupt the reply in flight, otherwise drop the
/// transcript selection.
#[derive(Clone, Copy)]
pub struct MainEscapeHandler;

#[async_trait::async_trait]
impl KeyHandler for MainEscapeHandler {
    async fn handle(
        &self,
        app: &AppHandle,
        dispatcher: &AppActionDispatcher,
        _key: &KeyEvent,
        ctx: AppActionContext,
    ) -> KeyResult {
        let streaming = app
            .read(|app| app.main.conversation.is_streaming())
            .await;
        let action = if streaming {
            AppAction::CancelStreaming
        } else {
            AppAction::ClearSelection
        };
        dispatcher.dispatch_many([action], ctx);
        KeyResult::Handled
    }
}

/// Esc in the side input closes the side chat.
#[derive(Clone, Copy)]
pub struct SideEscapeHandler;

#[async_trait::async_trait]
impl KeyHandler for SideEscapeHandler {
    async fn handle(
        &self,
        _app: &AppHandle,
        dispatcher: &AppActionDispatcher,
        _key: &KeyEvent,
        ctx: AppActionContext,
    ) -> KeyResult {
        dispatcher.dispatch_many([AppAction::CloseSideChat], ctx);
        KeyResult::Handled
    }
}

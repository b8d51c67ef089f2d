use std::time::Instant;

use tracing::debug;

use super::streaming::start_turn;
use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::UiFocus;
use crate::core::side_chat::{SelectionCapture, ToggleOutcome};

pub(super) fn handle_side_chat_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::ToggleSideChat => {
            toggle_side_chat(app, Instant::now());
            None
        }
        AppAction::CloseSideChat => {
            close_side_chat(app);
            None
        }
        _ => unreachable!("non-side-chat action routed to side chat handler"),
    }
}

/// Capture the current transcript selection, if it holds any text.
fn capture_selection(app: &App) -> Option<SelectionCapture> {
    let selection = app.ui.selection.filter(|selection| !selection.is_empty())?;
    let blocks: Vec<String> = app
        .main
        .blocks()
        .into_iter()
        .map(|block| block.text)
        .collect();
    SelectionCapture::new(
        Some(&selection.text(&blocks)),
        Some(&selection.context(&blocks)),
    )
}

pub(super) fn toggle_side_chat(app: &mut App, now: Instant) -> ToggleOutcome {
    let capture = if app.side.is_open() {
        None
    } else {
        capture_selection(app)
    };
    let outcome = app
        .side
        .toggle(move || capture, now, app.session.reveal_speed_ms);
    match outcome {
        ToggleOutcome::Opened => app.ui.focus = UiFocus::SideInput,
        ToggleOutcome::Closed => {
            app.ui.focus = UiFocus::MainInput;
            app.ui.side_panel = None;
        }
        ToggleOutcome::Ignored => debug!("explain chord pressed without a selection"),
    }
    outcome
}

fn close_side_chat(app: &mut App) {
    if app.side.close() {
        app.ui.focus = UiFocus::MainInput;
        app.ui.side_panel = None;
    }
}

/// Send the side chat's intro once it is due. Nothing is sent for a side
/// chat that was closed before then, and nothing is ever sent twice. If the
/// user already asked something in the side chat, the intro is dropped.
pub(super) fn send_due_intro(app: &mut App, now: Instant) -> Option<AppCommand> {
    let prompt = app.side.poll_intro(now)?;
    let side = app.side.get_mut()?;
    if !side.view.conversation.is_empty() {
        debug!(side_chat = side.id(), "intro skipped, side chat already in use");
        return None;
    }
    side.view.conversation.submit_user_text(&prompt)?;
    Some(start_turn(&mut app.session, &mut side.view))
}

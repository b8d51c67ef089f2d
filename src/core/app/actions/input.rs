use tracing::debug;

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::UiFocus;
use crate::ui::theme::Theme;

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::InsertIntoInput { text } => {
            app.focused_input_mut().insert_str(text);
            None
        }
        AppAction::ClearSelection => {
            app.ui.selection = None;
            app.ui.selecting = false;
            None
        }
        AppAction::ScrollTranscript { lines } => {
            app.ui.scroll_by(lines);
            None
        }
        AppAction::ScrollTranscriptPage { down } => {
            let page = page_size(ctx);
            app.ui.scroll_by(if down { page } else { -page });
            None
        }
        AppAction::ToggleFocus => {
            app.ui.focus = match app.ui.focus {
                UiFocus::MainInput if app.side.is_open() => UiFocus::SideInput,
                _ => UiFocus::MainInput,
            };
            None
        }
        AppAction::ToggleTheme => {
            let kind = app.ui.theme.kind.toggled();
            debug!(theme = kind.as_str(), "theme toggled");
            app.ui.theme = Theme::for_kind(kind);
            None
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

/// Half the terminal height, the distance PageDown travels.
fn page_size(ctx: AppActionContext) -> i32 {
    i32::from((ctx.term_height / 2).max(1))
}

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::core::app::AppAction;

const WHEEL_LINES: i32 = 3;

/// Translate a mouse event. `pointer_held` says whether a selection or
/// panel drag is in progress: plain movement then means the button came up
/// where we could not see it, and the gesture must end.
pub fn mouse_action(event: MouseEvent, pointer_held: bool) -> Option<AppAction> {
    let (column, row) = (event.column, event.row);
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(AppAction::PointerDown { column, row }),
        MouseEventKind::Drag(MouseButton::Left) => Some(AppAction::PointerDrag { column, row }),
        MouseEventKind::Up(MouseButton::Left) => Some(AppAction::PointerUp { column, row }),
        MouseEventKind::Moved if pointer_held => Some(AppAction::PointerLost),
        MouseEventKind::ScrollUp => Some(AppAction::ScrollTranscript {
            lines: -WHEEL_LINES,
        }),
        MouseEventKind::ScrollDown => Some(AppAction::ScrollTranscript { lines: WHEEL_LINES }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn event(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn left_button_gestures_map_to_pointer_actions() {
        assert!(matches!(
            mouse_action(event(MouseEventKind::Down(MouseButton::Left)), false),
            Some(AppAction::PointerDown { column: 4, row: 7 })
        ));
        assert!(matches!(
            mouse_action(event(MouseEventKind::Up(MouseButton::Left)), true),
            Some(AppAction::PointerUp { column: 4, row: 7 })
        ));
        assert!(mouse_action(event(MouseEventKind::Down(MouseButton::Right)), false).is_none());
    }

    #[test]
    fn movement_only_matters_mid_gesture() {
        assert!(mouse_action(event(MouseEventKind::Moved), false).is_none());
        assert!(matches!(
            mouse_action(event(MouseEventKind::Moved), true),
            Some(AppAction::PointerLost)
        ));
    }

    #[test]
    fn wheel_scrolls_the_transcript() {
        assert!(matches!(
            mouse_action(event(MouseEventKind::ScrollUp), false),
            Some(AppAction::ScrollTranscript { lines: -3 })
        ));
    }
}

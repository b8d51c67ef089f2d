use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::ui_state::PanelHit;
use crate::core::app::UiFocus;
use crate::core::selection::TextSelection;

pub(super) fn handle_pointer_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::PointerDown { column, row } => pointer_down(app, column, row),
        AppAction::PointerDrag { column, row } => pointer_drag(app, column, row),
        AppAction::PointerUp { column, row } => {
            if let Some(side) = app.side.get_mut() {
                side.end_drag(Some(pointer(column, row)));
            }
            if app.ui.selecting {
                extend_selection(app, column, row);
                app.ui.finish_selection();
            }
        }
        AppAction::PointerLost => {
            if let Some(side) = app.side.get_mut() {
                side.end_drag(None);
            }
            app.ui.finish_selection();
        }
        _ => unreachable!("non-pointer action routed to pointer handler"),
    }
    None
}

fn pointer(column: u16, row: u16) -> (i32, i32) {
    (i32::from(column), i32::from(row))
}

fn pointer_down(app: &mut App, column: u16, row: u16) {
    let panel = app.ui.side_panel.filter(|_| app.side.is_open());
    let panel_hit = panel.and_then(|panel| panel.hit(column, row));

    match panel_hit {
        Some(PanelHit::Close) => {
            app.side.close();
            app.ui.side_panel = None;
            app.ui.focus = UiFocus::MainInput;
        }
        Some(PanelHit::TitleBar) => {
            if let (Some(side), Some(panel)) = (app.side.get_mut(), panel) {
                side.begin_drag(pointer(column, row), panel.drawn_offset);
            }
        }
        Some(PanelHit::Body) => app.ui.focus = UiFocus::SideInput,
        None => match app.ui.transcript.point_at(column, row) {
            Some(point) => {
                app.ui.selection = Some(TextSelection::collapsed(point));
                app.ui.selecting = true;
                app.ui.focus = UiFocus::MainInput;
            }
            None => {
                app.ui.selection = None;
                app.ui.selecting = false;
            }
        },
    }
}

fn pointer_drag(app: &mut App, column: u16, row: u16) {
    if let Some(side) = app.side.get_mut().filter(|side| side.is_dragging()) {
        side.drag_to(pointer(column, row));
    } else if app.ui.selecting {
        extend_selection(app, column, row);
    }
}

fn extend_selection(app: &mut App, column: u16, row: u16) {
    let Some(point) = app.ui.transcript.point_near(column, row) else {
        return;
    };
    if let Some(selection) = app.ui.selection.as_mut() {
        selection.focus = point;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::actions::apply_action;
    use crate::core::app::ui_state::{PanelLayout, TranscriptLayout};
    use crate::core::chat_view::TranscriptBlock;
    use crate::core::message::Role;
    use crate::core::selection::SelectionPoint;
    use crate::core::side_chat::{PanelOffset, SelectionCapture};
    use crate::core::text_wrapping::layout_transcript;
    use crate::utils::test_utils::create_test_app;
    use ratatui::layout::Rect;
    use std::time::Instant;

    fn send(app: &mut App, action: AppAction) {
        apply_action(app, action, AppActionContext::default());
    }

    fn app_with_transcript() -> App {
        let mut app = create_test_app();
        let blocks = vec![TranscriptBlock {
            role: Role::Assistant,
            text: "borrowing rules".into(),
            live: false,
        }];
        // Row 0 is the label, row 1 the text.
        app.ui.transcript = TranscriptLayout {
            area: Rect::new(0, 0, 40, 10),
            rows: layout_transcript(&blocks, 40),
            scroll: 0,
        };
        app
    }

    fn open_panel(app: &mut App) {
        app.side.toggle(
            || SelectionCapture::new(Some("rules"), None),
            Instant::now(),
            10,
        );
        app.ui.side_panel = Some(PanelLayout {
            area: Rect::new(50, 10, 30, 10),
            close_button: Rect::new(76, 10, 3, 1),
            drawn_offset: PanelOffset::default(),
        });
    }

    #[test]
    fn press_drag_release_selects_text() {
        let mut app = app_with_transcript();
        send(&mut app, AppAction::PointerDown { column: 0, row: 1 });
        assert!(app.ui.selecting);
        send(&mut app, AppAction::PointerDrag { column: 5, row: 1 });
        send(&mut app, AppAction::PointerUp { column: 9, row: 1 });

        assert!(!app.ui.selecting);
        let selection = app.ui.selection.unwrap();
        assert_eq!(selection.anchor, SelectionPoint::new(0, 0));
        assert_eq!(selection.focus, SelectionPoint::new(0, 9));
    }

    #[test]
    fn click_without_drag_leaves_no_selection() {
        let mut app = app_with_transcript();
        send(&mut app, AppAction::PointerDown { column: 3, row: 1 });
        send(&mut app, AppAction::PointerUp { column: 3, row: 1 });
        assert!(app.ui.selection.is_none());
    }

    #[test]
    fn clicking_empty_space_clears_the_selection() {
        let mut app = app_with_transcript();
        app.ui.selection = Some(TextSelection {
            anchor: SelectionPoint::new(0, 0),
            focus: SelectionPoint::new(0, 4),
        });
        send(&mut app, AppAction::PointerDown { column: 3, row: 8 });
        assert!(app.ui.selection.is_none());
    }

    #[test]
    fn title_bar_drag_moves_the_panel_until_release() {
        let mut app = app_with_transcript();
        open_panel(&mut app);

        send(&mut app, AppAction::PointerDown { column: 55, row: 10 });
        send(&mut app, AppAction::PointerDrag { column: 50, row: 7 });
        send(&mut app, AppAction::PointerUp { column: 52, row: 6 });

        let side = app.side.get().unwrap();
        assert_eq!(side.offset(), PanelOffset { x: -3, y: -4 });
        assert!(!side.is_dragging());

        // Movement after release does not drag the panel.
        send(&mut app, AppAction::PointerDrag { column: 0, row: 0 });
        assert_eq!(app.side.get().unwrap().offset(), PanelOffset { x: -3, y: -4 });
    }

    #[test]
    fn lost_pointer_ends_the_drag_in_place() {
        let mut app = app_with_transcript();
        open_panel(&mut app);

        send(&mut app, AppAction::PointerDown { column: 60, row: 10 });
        send(&mut app, AppAction::PointerDrag { column: 62, row: 11 });
        send(&mut app, AppAction::PointerLost);
        send(&mut app, AppAction::PointerDrag { column: 70, row: 20 });

        let side = app.side.get().unwrap();
        assert!(!side.is_dragging());
        assert_eq!(side.offset(), PanelOffset { x: 2, y: 1 });
    }

    #[test]
    fn close_button_and_body_clicks() {
        let mut app = app_with_transcript();
        open_panel(&mut app);

        send(&mut app, AppAction::PointerDown { column: 60, row: 15 });
        assert_eq!(app.ui.focus, UiFocus::SideInput);
        assert!(app.ui.selection.is_none());

        send(&mut app, AppAction::PointerDown { column: 77, row: 10 });
        assert!(!app.side.is_open());
        assert!(app.ui.side_panel.is_none());
        assert_eq!(app.ui.focus, UiFocus::MainInput);
    }
}

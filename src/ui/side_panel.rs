//! The floating side-chat panel.
//!
//! The panel rests in the bottom-right corner and is displaced by the
//! side chat's drag offset. The offset itself is never clamped; only the
//! drawn position is kept inside the frame.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::core::app::ui_state::PanelLayout;
use crate::core::app::{App, UiFocus};
use crate::core::side_chat::{PanelOffset, SideChat};
use crate::core::text_wrapping::layout_transcript;
use crate::ui::theme::Theme;
use crate::ui::transcript::{pulse_symbol, render_rows};
use crate::utils::text::collapse_whitespace;

const PANEL_WIDTH: u16 = 48;
const PANEL_HEIGHT: u16 = 22;
const EDGE_MARGIN: u16 = 2;
const CLOSE_LABEL: &str = "[x]";

fn panel_size(frame: Rect) -> (u16, u16) {
    (
        PANEL_WIDTH.min(scaled(frame.width, 90)).max(1),
        PANEL_HEIGHT.min(scaled(frame.height, 85)).max(1),
    )
}

/// Top-left corner of the undisplaced panel.
fn resting_position(frame: Rect) -> (i32, i32) {
    let (width, height) = panel_size(frame);
    (
        i32::from(frame.right()) - i32::from(width) - i32::from(EDGE_MARGIN),
        i32::from(frame.bottom()) - i32::from(height) - i32::from(EDGE_MARGIN),
    )
}

/// Where the panel is drawn inside `frame` for a given drag offset.
pub fn panel_area(frame: Rect, offset: PanelOffset) -> Rect {
    let (width, height) = panel_size(frame);
    let (rest_x, rest_y) = resting_position(frame);
    let max_x = (i32::from(frame.right()) - i32::from(width)).max(i32::from(frame.x));
    let max_y = (i32::from(frame.bottom()) - i32::from(height)).max(i32::from(frame.y));

    let x = (rest_x + offset.x).clamp(i32::from(frame.x), max_x);
    let y = (rest_y + offset.y).clamp(i32::from(frame.y), max_y);
    // Both values were clamped into the u16 frame above.
    Rect::new(x as u16, y as u16, width, height).intersection(frame)
}

/// The offset that draws the panel exactly at `area`, i.e. the stored
/// offset without whatever the frame edges cut off.
pub fn drawn_offset(frame: Rect, area: Rect) -> PanelOffset {
    let (rest_x, rest_y) = resting_position(frame);
    PanelOffset {
        x: i32::from(area.x) - rest_x,
        y: i32::from(area.y) - rest_y,
    }
}

fn scaled(value: u16, percent: u32) -> u16 {
    (u32::from(value) * percent / 100) as u16
}

pub fn render(f: &mut Frame, app: &mut App, frame_area: Rect) {
    let Some(side) = app.side.get_mut() else {
        app.ui.side_panel = None;
        return;
    };
    let theme = &app.ui.theme;
    let focused = app.ui.focus == UiFocus::SideInput;
    let area = panel_area(frame_area, side.offset());
    if area.width < 8 || area.height < 6 {
        app.ui.side_panel = None;
        return;
    }

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border_style)
        .style(Style::default().bg(theme.background_color))
        .title(Span::styled(format!(" {} ", side.title()), theme.panel_title_style));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let close_button = Rect::new(area.right().saturating_sub(4), area.y, 3, 1);
    f.render_widget(
        Paragraph::new(Span::styled(CLOSE_LABEL, theme.panel_title_style)),
        close_button,
    );

    let context_height = if side.capture.surrounding_context.is_empty() {
        0
    } else {
        2
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(context_height),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(inner);

    if context_height > 0 {
        let excerpt = collapse_whitespace(&side.capture.surrounding_context);
        f.render_widget(
            Paragraph::new(Span::styled(excerpt, theme.panel_context_style))
                .wrap(Wrap { trim: true }),
            chunks[0],
        );
    }

    render_conversation(f, side, theme, chunks[1], app.ui.pulse_start.elapsed());
    render_input(f, side, theme, focused, chunks[2]);

    app.ui.side_panel = Some(PanelLayout {
        area,
        close_button,
        drawn_offset: drawn_offset(frame_area, area),
    });
}

fn render_conversation(
    f: &mut Frame,
    side: &SideChat,
    theme: &Theme,
    area: Rect,
    pulse_elapsed: std::time::Duration,
) {
    let conversation = &side.view.conversation;
    if conversation.is_empty() && !conversation.is_streaming() {
        let loading = Rect::new(area.x, area.y + area.height / 2, area.width, 1).intersection(area);
        f.render_widget(
            Paragraph::new(Span::styled("Loading...", theme.system_text_style))
                .alignment(Alignment::Center),
            loading,
        );
        return;
    }

    let blocks = side.view.blocks();
    let rows = layout_transcript(&blocks, area.width as usize);
    let mut lines = render_rows(&rows, &blocks, theme, None);
    // Drop the spacer after the last block; the indicator or error goes there.
    if !lines.is_empty() {
        lines.pop();
    }
    if conversation.is_streaming() && side.view.live_text().is_none_or(str::is_empty) {
        lines.push(Line::from(Span::styled(
            format!("{0} {0} {0}", pulse_symbol(pulse_elapsed)),
            theme.streaming_indicator_style,
        )));
    }
    if let Some(error) = conversation.error() {
        lines.push(Line::from(Span::styled(
            collapse_whitespace(error),
            theme.error_text_style,
        )));
    }

    // Follow the newest output.
    let scroll = lines.len().saturating_sub(area.height as usize);
    let visible: Vec<Line> = lines.into_iter().skip(scroll).collect();
    f.render_widget(Paragraph::new(visible), area);
}

fn render_input(f: &mut Frame, side: &mut SideChat, theme: &Theme, focused: bool, area: Rect) {
    let border_style = if focused {
        theme.panel_border_style
    } else {
        theme.input_border_style
    };
    side.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    side.input.set_style(theme.input_text_style);
    side.input.set_cursor_line_style(Style::default());
    side.input.set_placeholder_style(theme.input_placeholder_style);
    side.input.set_cursor_style(if focused {
        theme.input_cursor_style
    } else {
        Style::default()
    });
    f.render_widget(&side.input, area);
}

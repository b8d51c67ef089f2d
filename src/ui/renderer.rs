use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::app::ui_state::TranscriptLayout;
use crate::core::app::{App, UiFocus};
use crate::core::text_wrapping::layout_transcript;
use crate::ui::side_panel;
use crate::ui::transcript::{pulse_symbol, render_rows};
use crate::utils::text::collapse_whitespace;

const MAX_INPUT_LINES: u16 = 5;

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(app.ui.theme.background_color)),
        area,
    );

    let error = app.main.conversation.error().map(collapse_whitespace);
    let show_tip = app.main.conversation.has_assistant_reply();
    let input_lines = (app.ui.input.lines().len() as u16).clamp(1, MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(u16::from(error.is_some())),
            Constraint::Length(u16::from(show_tip)),
            Constraint::Length(input_lines + 2), // +2 for borders
            Constraint::Length(1),
        ])
        .split(area);

    render_title(f, app, chunks[0]);
    render_transcript(f, app, chunks[1]);

    if let Some(error) = error {
        f.render_widget(
            Paragraph::new(Span::styled(error, app.ui.theme.error_text_style)),
            chunks[2],
        );
    }
    if show_tip {
        let tip = format!(
            "Tip: Highlight any text and press {} to learn more",
            app.session.explain_chord
        );
        f.render_widget(
            Paragraph::new(Span::styled(tip, app.ui.theme.system_text_style)),
            chunks[3],
        );
    }

    render_input(f, app, chunks[4]);

    let footer = format!("{} can make mistakes, so double-check it", app.session.model);
    f.render_widget(
        Paragraph::new(Span::styled(footer, app.ui.theme.system_text_style))
            .alignment(Alignment::Center),
        chunks[5],
    );

    side_panel::render(f, app, area);
}

fn render_title(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "Sidenote v{} - {}",
        env!("CARGO_PKG_VERSION"),
        app.session.model
    );
    f.render_widget(
        Paragraph::new(Span::styled(title, app.ui.theme.title_style)),
        area,
    );
}

fn render_transcript(f: &mut Frame, app: &mut App, area: Rect) {
    if app.main.conversation.is_empty() {
        app.ui.transcript = TranscriptLayout {
            area,
            rows: Vec::new(),
            scroll: 0,
        };
        let greeting = format!("Hello, {}", app.session.user_name);
        let middle = Rect::new(area.x, area.y + area.height / 2, area.width, 1).intersection(area);
        f.render_widget(
            Paragraph::new(Span::styled(greeting, app.ui.theme.greeting_style))
                .alignment(Alignment::Center),
            middle,
        );
        return;
    }

    let blocks = app.main.blocks();
    let rows = layout_transcript(&blocks, area.width as usize);
    let mut layout = TranscriptLayout {
        area,
        rows,
        scroll: 0,
    };
    let max_scroll = layout.max_scroll();
    layout.scroll = if app.ui.auto_scroll {
        max_scroll
    } else {
        app.ui.transcript.scroll.min(max_scroll)
    };

    let end = (layout.scroll + area.height as usize).min(layout.rows.len());
    let lines = render_rows(
        &layout.rows[layout.scroll..end],
        &blocks,
        &app.ui.theme,
        app.ui.selection.as_ref(),
    );
    f.render_widget(Paragraph::new(lines), area);
    app.ui.transcript = layout;
}

fn render_input(f: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.ui.theme;
    let focused = app.ui.focus == UiFocus::MainInput;
    let hint = if app.main.conversation.is_streaming() {
        "Esc to interrupt, Ctrl+C to quit".to_string()
    } else {
        format!(
            "Enter to send, Alt+Enter for new line, {} to explain, Ctrl+C to quit",
            app.session.explain_chord
        )
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(hint, theme.input_title_style));
    if app.main.conversation.is_streaming() {
        let symbol = pulse_symbol(app.ui.pulse_start.elapsed());
        block = block.title_top(
            Line::from(Span::styled(format!(" {symbol} "), theme.streaming_indicator_style))
                .right_aligned(),
        );
    }

    let input = &mut app.ui.input;
    input.set_block(block);
    input.set_style(theme.input_text_style);
    input.set_cursor_line_style(Style::default());
    input.set_placeholder_style(theme.input_placeholder_style);
    input.set_cursor_style(if focused {
        theme.input_cursor_style
    } else {
        Style::default()
    });
    f.render_widget(&*input, area);
}

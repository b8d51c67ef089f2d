//! Turning laid-out transcript rows into styled lines.

use std::time::Duration;

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::core::chat_view::TranscriptBlock;
use crate::core::message::Role;
use crate::core::selection::TextSelection;
use crate::core::text_wrapping::{RowKind, TranscriptRow};
use crate::ui::theme::Theme;

pub const USER_LABEL: &str = "You";
pub const ASSISTANT_LABEL: &str = "Gemini";

/// Style the given rows. `blocks` is the list the rows were laid out from;
/// selected characters are drawn with the theme's selection style.
pub fn render_rows(
    rows: &[TranscriptRow],
    blocks: &[TranscriptBlock],
    theme: &Theme,
    selection: Option<&TextSelection>,
) -> Vec<Line<'static>> {
    rows.iter()
        .map(|row| match row.kind {
            RowKind::Label(role) => label_line(role, theme),
            RowKind::Text { block, start } => {
                let base = blocks
                    .get(block)
                    .map(|block| text_style(block.role, theme))
                    .unwrap_or(theme.assistant_text_style);
                Line::from(highlighted_spans(
                    &row.text,
                    block,
                    start,
                    base,
                    selection,
                    theme.selection_style,
                ))
            }
            RowKind::Spacer => Line::default(),
        })
        .collect()
}

fn label_line(role: Role, theme: &Theme) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled(USER_LABEL, theme.user_prefix_style)),
        Role::Assistant => Line::from(Span::styled(
            ASSISTANT_LABEL,
            theme.assistant_text_style.patch(theme.title_style),
        )),
    }
}

fn text_style(role: Role, theme: &Theme) -> Style {
    match role {
        Role::User => theme.user_text_style,
        Role::Assistant => theme.assistant_text_style,
    }
}

/// Split `text` into runs of selected and unselected characters.
fn highlighted_spans(
    text: &str,
    block: usize,
    start: usize,
    base: Style,
    selection: Option<&TextSelection>,
    selected_style: Style,
) -> Vec<Span<'static>> {
    let Some(selection) = selection.filter(|selection| !selection.is_empty()) else {
        return vec![Span::styled(text.to_string(), base)];
    };

    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_selected = false;
    for (idx, ch) in text.chars().enumerate() {
        let selected = selection.covers(block, start + idx);
        if selected != run_selected && !run.is_empty() {
            let style = if run_selected { selected_style } else { base };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_selected = selected;
        run.push(ch);
    }
    if !run.is_empty() {
        let style = if run_selected { selected_style } else { base };
        spans.push(Span::styled(run, style));
    }
    spans
}

/// Indicator glyph for a stream in flight, pulsing twice per second.
pub fn pulse_symbol(elapsed: Duration) -> &'static str {
    let phase = (elapsed.as_millis() % 1000) as f32 / 500.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };
    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

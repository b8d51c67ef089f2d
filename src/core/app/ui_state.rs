use std::time::Instant;

use ratatui::layout::{Position, Rect};
use ratatui::prelude::Size;
use tui_textarea::TextArea;

use crate::core::selection::{SelectionPoint, TextSelection};
use crate::core::side_chat::PanelOffset;
use crate::core::text_wrapping::TranscriptRow;
use crate::ui::theme::Theme;

/// Which input receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiFocus {
    MainInput,
    SideInput,
}

/// Where the transcript was last drawn, for mapping mouse positions back to
/// text.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLayout {
    pub area: Rect,
    pub rows: Vec<TranscriptRow>,
    /// Index of the first visible row.
    pub scroll: usize,
}

impl TranscriptLayout {
    pub fn max_scroll(&self) -> usize {
        self.rows.len().saturating_sub(self.area.height as usize)
    }

    /// Text position under the cell, if the cell shows transcript text.
    pub fn point_at(&self, column: u16, row: u16) -> Option<SelectionPoint> {
        if !self.area.contains(Position::new(column, row)) {
            return None;
        }
        self.point_in_row(column, row)
    }

    /// Like [`point_at`](Self::point_at), but positions outside the transcript
    /// are pulled onto its nearest edge, so a drag can leave the area and
    /// still extend the selection. Rows without text resolve to the nearest
    /// text row above them, or below when there is none.
    pub fn point_near(&self, column: u16, row: u16) -> Option<SelectionPoint> {
        if self.area.is_empty() || self.rows.is_empty() {
            return None;
        }
        let top = self.area.y;
        let bottom = self.area.y + self.area.height - 1;
        if row < top {
            return self.first_text_point();
        }
        if row > bottom {
            return self.last_text_point();
        }
        let column = column.clamp(self.area.x, self.area.x + self.area.width - 1);
        self.point_in_row(column, row).or_else(|| {
            let index = self.scroll + (row - top) as usize;
            self.nearest_text_point(index)
        })
    }

    fn point_in_row(&self, column: u16, row: u16) -> Option<SelectionPoint> {
        let index = self.scroll + (row - self.area.y) as usize;
        let rendered = self.rows.get(index)?;
        rendered.point_at_column((column - self.area.x) as usize)
    }

    fn first_text_point(&self) -> Option<SelectionPoint> {
        self.rows
            .iter()
            .skip(self.scroll)
            .find_map(|row| row.point_at_column(0))
    }

    fn last_text_point(&self) -> Option<SelectionPoint> {
        let visible_end = (self.scroll + self.area.height as usize).min(self.rows.len());
        self.rows[..visible_end]
            .iter()
            .rev()
            .find_map(|row| row.point_at_column(usize::MAX))
    }

    fn nearest_text_point(&self, index: usize) -> Option<SelectionPoint> {
        let index = index.min(self.rows.len() - 1);
        self.rows[..=index]
            .iter()
            .rev()
            .find_map(|row| row.point_at_column(usize::MAX))
            .or_else(|| {
                self.rows[index..]
                    .iter()
                    .find_map(|row| row.point_at_column(0))
            })
    }
}

/// Where the side panel was last drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub area: Rect,
    pub close_button: Rect,
    /// The drag offset matching `area`, edge clamping included.
    pub drawn_offset: PanelOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelHit {
    Close,
    TitleBar,
    Body,
}

impl PanelLayout {
    pub fn hit(&self, column: u16, row: u16) -> Option<PanelHit> {
        let position = Position::new(column, row);
        if self.close_button.contains(position) {
            Some(PanelHit::Close)
        } else if !self.area.contains(position) {
            None
        } else if row == self.area.y {
            Some(PanelHit::TitleBar)
        } else {
            Some(PanelHit::Body)
        }
    }
}

pub struct UiState {
    pub theme: Theme,
    pub focus: UiFocus,
    pub input: TextArea<'static>,
    pub selection: Option<TextSelection>,
    /// A mouse selection is being dragged out.
    pub selecting: bool,
    pub auto_scroll: bool,
    pub transcript: TranscriptLayout,
    pub side_panel: Option<PanelLayout>,
    pub last_term_size: Size,
    /// Phase origin of the streaming indicator.
    pub pulse_start: Instant,
    pub exit_requested: bool,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        let mut input = TextArea::default();
        input.set_placeholder_text("Ask Gemini");
        Self {
            theme,
            focus: UiFocus::MainInput,
            input,
            selection: None,
            selecting: false,
            auto_scroll: true,
            transcript: TranscriptLayout::default(),
            side_panel: None,
            last_term_size: Size::default(),
            pulse_start: Instant::now(),
            exit_requested: false,
        }
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn clear_input(&mut self) {
        self.input.select_all();
        self.input.cut();
    }

    /// Scroll the transcript by `lines` (negative is up). Scrolling to the
    /// bottom re-enables following new output.
    pub fn scroll_by(&mut self, lines: i32) {
        let max = self.transcript.max_scroll();
        let current = if self.auto_scroll {
            max
        } else {
            self.transcript.scroll.min(max)
        };
        let target = if lines < 0 {
            current.saturating_sub(lines.unsigned_abs() as usize)
        } else {
            current.saturating_add(lines as usize).min(max)
        };
        self.transcript.scroll = target;
        self.auto_scroll = target >= max;
    }

    /// Drop a collapsed selection; clicking without dragging selects nothing.
    pub fn finish_selection(&mut self) {
        self.selecting = false;
        if self.selection.is_some_and(|selection| selection.is_empty()) {
            self.selection = None;
        }
    }
}

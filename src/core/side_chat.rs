//! The selection-triggered side chat.
//!
//! At most one side chat exists at a time. It lives in a [`SideChatSlot`],
//! which the explain chord toggles: an occupied slot is cleared, an empty
//! slot is filled from the current selection (if there is one). A fresh side
//! chat schedules its introductory request for shortly after it opens, so the
//! panel is on screen before the reply starts streaming in.

use std::time::Instant;

use tracing::info;
use tui_textarea::TextArea;

use crate::core::chat_view::ChatView;
use crate::core::constants::{CONTEXT_CHAR_LIMIT, EXPLAIN_TEXT_LIMIT, INTRO_DELAY, PANEL_TITLE_LIMIT};
use crate::utils::text::{take_chars, truncate_with_ellipsis};

/// Text captured when the side chat is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCapture {
    pub selected_text: String,
    pub surrounding_context: String,
}

impl SelectionCapture {
    /// Returns `None` for a missing or whitespace-only selection. A missing
    /// context becomes the empty string.
    pub fn new(selected: Option<&str>, context: Option<&str>) -> Option<Self> {
        let selected_text = selected.map(str::trim).filter(|text| !text.is_empty())?;
        Some(Self {
            selected_text: selected_text.to_string(),
            surrounding_context: take_chars(context.unwrap_or_default(), CONTEXT_CHAR_LIMIT),
        })
    }
}

/// The first request a side chat makes on behalf of the user.
pub fn explain_prompt(selected_text: &str) -> String {
    format!(
        "Explain \"{}\" in 2-3 sentences. Keep it concise and simple.",
        truncate_with_ellipsis(selected_text, EXPLAIN_TEXT_LIMIT)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroState {
    Scheduled { due: Instant },
    Sent,
}

/// Displacement of the panel from its resting place, in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelOffset {
    pub x: i32,
    pub y: i32,
}

/// An active panel drag. `origin` is the pointer position minus the panel
/// offset at the moment the drag started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    origin: (i32, i32),
}

impl DragState {
    fn offset_for(&self, pointer: (i32, i32)) -> PanelOffset {
        PanelOffset {
            x: pointer.0 - self.origin.0,
            y: pointer.1 - self.origin.1,
        }
    }
}

pub struct SideChat {
    pub capture: SelectionCapture,
    pub view: ChatView,
    pub input: TextArea<'static>,
    intro: IntroState,
    offset: PanelOffset,
    drag: Option<DragState>,
}

impl SideChat {
    pub fn open(capture: SelectionCapture, now: Instant, reveal_speed_ms: i64) -> Self {
        let id = format!("subchat-{}", chrono::Utc::now().timestamp_millis());
        let mut input = TextArea::default();
        input.set_placeholder_text("Ask more...");
        Self {
            capture,
            view: ChatView::new(id, reveal_speed_ms),
            input,
            intro: IntroState::Scheduled {
                due: now + INTRO_DELAY,
            },
            offset: PanelOffset::default(),
            drag: None,
        }
    }

    pub fn id(&self) -> &str {
        self.view.conversation.id()
    }

    /// The highlighted text as shown in the panel title.
    pub fn title(&self) -> String {
        truncate_with_ellipsis(&self.capture.selected_text, PANEL_TITLE_LIMIT)
    }

    pub fn intro_state(&self) -> IntroState {
        self.intro
    }

    pub fn intro_deadline(&self) -> Option<Instant> {
        match self.intro {
            IntroState::Scheduled { due } => Some(due),
            IntroState::Sent => None,
        }
    }

    /// Hand out the intro prompt once its deadline has passed. Every later
    /// call returns `None`.
    pub fn poll_intro(&mut self, now: Instant) -> Option<String> {
        match self.intro {
            IntroState::Scheduled { due } if due <= now => {
                self.intro = IntroState::Sent;
                Some(explain_prompt(&self.capture.selected_text))
            }
            _ => None,
        }
    }

    pub fn offset(&self) -> PanelOffset {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Grab the panel at `pointer`. `drawn` is the offset the panel is
    /// actually shown at; any overshoot past a frame edge is dropped so the
    /// panel follows the pointer from where it is seen.
    pub fn begin_drag(&mut self, pointer: (i32, i32), drawn: PanelOffset) {
        self.offset = drawn;
        self.drag = Some(DragState {
            origin: (pointer.0 - self.offset.x, pointer.1 - self.offset.y),
        });
    }

    /// Follow the pointer. Ignored unless a drag is in progress.
    pub fn drag_to(&mut self, pointer: (i32, i32)) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let offset = drag.offset_for(pointer);
        let moved = offset != self.offset;
        self.offset = offset;
        moved
    }

    /// Finish the drag at `pointer`, or simply forget it when the release
    /// position is unknown.
    pub fn end_drag(&mut self, pointer: Option<(i32, i32)>) {
        if let Some(pointer) = pointer {
            self.drag_to(pointer);
        }
        self.drag = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Opened,
    Closed,
    Ignored,
}

#[derive(Default)]
pub struct SideChatSlot {
    active: Option<SideChat>,
}

impl SideChatSlot {
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn get(&self) -> Option<&SideChat> {
        self.active.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut SideChat> {
        self.active.as_mut()
    }

    /// Close an open side chat, or open one from the selection. The
    /// selection is only read when the slot is empty.
    pub fn toggle<F>(&mut self, capture: F, now: Instant, reveal_speed_ms: i64) -> ToggleOutcome
    where
        F: FnOnce() -> Option<SelectionCapture>,
    {
        if self.close() {
            return ToggleOutcome::Closed;
        }
        let Some(capture) = capture() else {
            return ToggleOutcome::Ignored;
        };
        let side = SideChat::open(capture, now, reveal_speed_ms);
        info!(
            side_chat = side.id(),
            chars = side.capture.selected_text.chars().count(),
            "side chat opened"
        );
        self.active = Some(side);
        ToggleOutcome::Opened
    }

    /// Drop the side chat and everything it owns. Its stream, if any, is
    /// cancelled along with it.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(side) => {
                info!(side_chat = side.id(), "side chat closed");
                true
            }
            None => false,
        }
    }

    pub fn poll_intro(&mut self, now: Instant) -> Option<String> {
        self.active.as_mut()?.poll_intro(now)
    }

    pub fn owns_stream(&self, stream_id: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|side| side.view.conversation.owns_stream(stream_id))
    }
}

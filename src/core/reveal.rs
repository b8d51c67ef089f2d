//! Typewriter-style reveal of text that may already be fully available.
//!
//! [`TextReveal`] holds the source text, how many grapheme clusters of it are
//! currently shown, and the deadline of its next tick. The event loop feeds it
//! the latest source with [`TextReveal::set_source`] and drives it with
//! [`TextReveal::advance`]; there is no background timer, so dropping the
//! owner is all it takes to stop an animation.

use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

use crate::core::constants::DEFAULT_REVEAL_SPEED_MS;

#[derive(Debug, Clone)]
pub struct TextReveal {
    source: String,
    /// Grapheme clusters of `source` currently displayed.
    revealed: usize,
    /// Byte length of the displayed prefix, kept in step with `revealed`.
    displayed_bytes: usize,
    /// `None` means every tick is instantaneous.
    speed: Option<Duration>,
    next_tick: Option<Instant>,
}

impl Default for TextReveal {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_SPEED_MS)
    }
}

impl TextReveal {
    /// `speed_ms` is the delay per character; zero or negative reveals
    /// everything at once.
    pub fn new(speed_ms: i64) -> Self {
        let speed = u64::try_from(speed_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        Self {
            source: String::new(),
            revealed: 0,
            displayed_bytes: 0,
            speed,
            next_tick: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The currently visible prefix of the source.
    pub fn displayed(&self) -> &str {
        &self.source[..self.displayed_bytes]
    }

    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    pub fn is_animating(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.displayed_bytes == self.source.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn cancel(&mut self) {
        self.next_tick = None;
    }

    /// Treat a missing source as the empty string.
    pub fn set_source_opt(&mut self, text: Option<&str>, now: Instant) {
        self.set_source(text.unwrap_or_default(), now);
    }

    /// Point the animation at `text`.
    ///
    /// Growing text continues from the current position. Text shorter than
    /// what is already shown restarts from nothing. A replacement of the same
    /// or greater length is indistinguishable from a continuation and is
    /// treated as one.
    pub fn set_source(&mut self, text: &str, now: Instant) {
        if text == self.source {
            return;
        }

        let new_len = text.graphemes(true).count();
        if self.revealed == 0 || new_len < self.revealed {
            self.revealed = 0;
        }
        self.source.clear();
        self.source.push_str(text);

        if self.source.is_empty() {
            self.revealed = 0;
            self.displayed_bytes = 0;
            self.next_tick = None;
            return;
        }

        let Some(speed) = self.speed else {
            self.snap_to_end(new_len);
            return;
        };

        if self.revealed >= new_len {
            self.snap_to_end(new_len);
            return;
        }

        self.displayed_bytes = byte_offset_of(&self.source, self.revealed);
        // Restarting the cycle replaces whatever tick was scheduled before.
        self.next_tick = Some(now + speed);
    }

    /// Fire every tick that is due at `now`. Returns whether the displayed
    /// text changed.
    pub fn advance(&mut self, now: Instant) -> bool {
        let (Some(mut deadline), Some(speed)) = (self.next_tick, self.speed) else {
            return false;
        };

        let total = self.source.graphemes(true).count();
        let before = self.revealed;
        while deadline <= now && self.revealed < total {
            self.revealed += 1;
            deadline += speed;
        }

        if self.revealed >= total {
            self.revealed = total;
            self.next_tick = None;
        } else {
            self.next_tick = Some(deadline);
        }

        if self.revealed != before {
            self.displayed_bytes = byte_offset_of(&self.source, self.revealed);
            true
        } else {
            false
        }
    }

    fn snap_to_end(&mut self, len: usize) {
        self.revealed = len;
        self.displayed_bytes = self.source.len();
        self.next_tick = None;
    }
}

/// Byte offset just past the first `graphemes` clusters of `text`.
fn byte_offset_of(text: &str, graphemes: usize) -> usize {
    if graphemes == 0 {
        return 0;
    }
    text.grapheme_indices(true)
        .nth(graphemes)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests;

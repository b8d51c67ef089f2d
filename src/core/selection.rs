//! Text selection over the rendered transcript.
//!
//! A selection is a pair of points, each addressing a character offset inside
//! one transcript block (a message, or the reply being streamed). The anchor
//! is where the drag started and the focus is where it currently ends, so
//! the two may be in either order.

use std::cmp::Ordering;

use crate::core::constants::CONTEXT_CHAR_LIMIT;
use crate::utils::text::take_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionPoint {
    pub block: usize,
    /// Offset in characters within the block's text.
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

impl PartialOrd for SelectionPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SelectionPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block
            .cmp(&other.block)
            .then(self.offset.cmp(&other.offset))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSelection {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl TextSelection {
    pub fn collapsed(at: SelectionPoint) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    /// `(start, end)` in document order.
    pub fn normalized(&self) -> (SelectionPoint, SelectionPoint) {
        if self.anchor <= self.focus {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn contains(&self, point: SelectionPoint) -> bool {
        let (start, end) = self.normalized();
        start <= point && point < end
    }

    /// Whether the character at `offset` of `block` is inside the selection.
    pub fn covers(&self, block: usize, offset: usize) -> bool {
        self.contains(SelectionPoint::new(block, offset))
    }

    /// The selected text. Blocks are joined with newlines.
    pub fn text<S: AsRef<str>>(&self, blocks: &[S]) -> String {
        let (start, end) = self.normalized();
        let mut out = String::new();
        for idx in start.block..=end.block {
            let Some(block) = blocks.get(idx) else {
                break;
            };
            let block = block.as_ref();
            let from = if idx == start.block { start.offset } else { 0 };
            let to = if idx == end.block {
                end.offset
            } else {
                usize::MAX
            };
            out.extend(
                block
                    .chars()
                    .skip(from)
                    .take(to.saturating_sub(from)),
            );
            if idx != end.block && idx + 1 < blocks.len() {
                out.push('\n');
            }
        }
        out
    }

    /// Text of the smallest block that contains the whole selection, cut to
    /// [`CONTEXT_CHAR_LIMIT`] characters. A selection spanning blocks is
    /// contained only by the transcript as a whole.
    pub fn context<S: AsRef<str>>(&self, blocks: &[S]) -> String {
        let (start, end) = self.normalized();
        if start.block == end.block {
            return blocks
                .get(start.block)
                .map(|block| take_chars(block.as_ref(), CONTEXT_CHAR_LIMIT))
                .unwrap_or_default();
        }
        let joined = blocks
            .iter()
            .map(|block| block.as_ref())
            .collect::<Vec<&str>>()
            .join("\n");
        take_chars(&joined, CONTEXT_CHAR_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(a: (usize, usize), f: (usize, usize)) -> TextSelection {
        TextSelection {
            anchor: SelectionPoint::new(a.0, a.1),
            focus: SelectionPoint::new(f.0, f.1),
        }
    }

    #[test]
    fn backwards_selection_normalizes() {
        let selection = sel((1, 4), (0, 2));
        let (start, end) = selection.normalized();
        assert_eq!(start, SelectionPoint::new(0, 2));
        assert_eq!(end, SelectionPoint::new(1, 4));
        assert!(!selection.is_empty());
        assert!(TextSelection::collapsed(start).is_empty());
    }

    #[test]
    fn text_within_one_block_uses_character_offsets() {
        let blocks = ["neural networks learn", "other"];
        assert_eq!(sel((0, 0), (0, 6)).text(&blocks), "neural");
        assert_eq!(sel((0, 15), (0, 7)).text(&blocks), "networks");

        let accented = ["café crème"];
        assert_eq!(sel((0, 5), (0, 10)).text(&accented), "crème");
    }

    #[test]
    fn text_across_blocks_joins_with_newlines() {
        let blocks = ["first block", "middle", "last block"];
        assert_eq!(sel((0, 6), (2, 4)).text(&blocks), "block\nmiddle\nlast");
    }

    #[test]
    fn out_of_range_points_are_clamped() {
        let blocks = ["abc"];
        assert_eq!(sel((0, 1), (0, 99)).text(&blocks), "bc");
        assert_eq!(sel((0, 1), (5, 0)).text(&blocks), "bc");
    }

    #[test]
    fn context_is_containing_block_capped_at_limit() {
        let long = "x".repeat(300);
        let blocks = [long.as_str(), "short"];
        assert_eq!(sel((0, 3), (0, 9)).context(&blocks).chars().count(), 200);
        assert_eq!(sel((1, 0), (1, 2)).context(&blocks), "short");
    }

    #[test]
    fn context_for_multi_block_selection_is_whole_transcript() {
        let blocks = ["one", "two"];
        assert_eq!(sel((0, 1), (1, 1)).context(&blocks), "one\ntwo");
    }

    #[test]
    fn context_falls_back_to_empty_string() {
        let blocks: [&str; 0] = [];
        assert_eq!(sel((0, 0), (0, 1)).context(&blocks), "");
    }

    #[test]
    fn covers_is_half_open() {
        let selection = sel((0, 2), (0, 5));
        assert!(!selection.covers(0, 1));
        assert!(selection.covers(0, 2));
        assert!(selection.covers(0, 4));
        assert!(!selection.covers(0, 5));
    }
}

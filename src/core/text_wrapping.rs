//! Transcript wrapping that remembers where every row came from.
//!
//! Ratatui's `Paragraph` wrapping cannot tell us which character sits under a
//! given cell, and mouse selection needs exactly that. We wrap ourselves,
//! recording for every row the block it belongs to and the character offset
//! of its first character, then render the rows without further wrapping.

use unicode_width::UnicodeWidthChar;

use crate::core::chat_view::TranscriptBlock;
use crate::core::message::Role;
use crate::core::selection::SelectionPoint;

/// A visual row of one block's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedRow {
    /// Character offset of the row's first character within the block.
    pub start: usize,
    pub text: String,
}

impl WrappedRow {
    /// Character offset under display column `column`. Columns past the end
    /// of the row map to the row's end.
    pub fn offset_at_column(&self, column: usize) -> usize {
        let mut used = 0;
        for (idx, ch) in self.text.chars().enumerate() {
            used += ch.width().unwrap_or(0);
            if used > column {
                return self.start + idx;
            }
        }
        self.start + self.text.chars().count()
    }
}

/// Word-wrap `text` to `width` columns. Newlines always break; a word longer
/// than the width is split. Every character of `text` except the newlines
/// lands in exactly one row.
pub fn wrap_block(text: &str, width: usize) -> Vec<WrappedRow> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut line_offset = 0;

    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(WrappedRow {
                start: line_offset,
                text: String::new(),
            });
        }

        let mut start = 0;
        while start < chars.len() {
            let mut used = 0;
            let mut end = start;
            let mut last_break = None;
            while end < chars.len() {
                let ch_width = chars[end].width().unwrap_or(0);
                if used + ch_width > width && end > start {
                    break;
                }
                used += ch_width;
                if chars[end] == ' ' {
                    last_break = Some(end + 1);
                }
                end += 1;
            }

            if end < chars.len() {
                if chars[end] == ' ' {
                    // The space that caused the break stays on this row.
                    end += 1;
                } else if let Some(at) = last_break.filter(|at| *at > start) {
                    end = at;
                }
            }

            rows.push(WrappedRow {
                start: line_offset + start,
                text: chars[start..end].iter().collect(),
            });
            start = end;
        }

        line_offset += chars.len() + 1;
    }

    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// The speaker label above a block.
    Label(Role),
    Text { block: usize, start: usize },
    Spacer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRow {
    pub kind: RowKind,
    pub text: String,
}

impl TranscriptRow {
    /// Selection point under display column `column` of this row.
    pub fn point_at_column(&self, column: usize) -> Option<SelectionPoint> {
        match self.kind {
            RowKind::Text { block, start } => {
                let row = WrappedRow {
                    start,
                    text: self.text.clone(),
                };
                Some(SelectionPoint::new(block, row.offset_at_column(column)))
            }
            _ => None,
        }
    }
}

/// Lay out all blocks: a label row, the wrapped text, then a blank spacer.
pub fn layout_transcript(blocks: &[TranscriptBlock], width: usize) -> Vec<TranscriptRow> {
    let mut rows = Vec::new();
    for (block_index, block) in blocks.iter().enumerate() {
        rows.push(TranscriptRow {
            kind: RowKind::Label(block.role),
            text: String::new(),
        });
        rows.extend(wrap_block(&block.text, width).into_iter().map(|row| TranscriptRow {
            kind: RowKind::Text {
                block: block_index,
                start: row.start,
            },
            text: row.text,
        }));
        rows.push(TranscriptRow {
            kind: RowKind::Spacer,
            text: String::new(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(rows: &[WrappedRow]) -> Vec<&str> {
        rows.iter().map(|row| row.text.as_str()).collect()
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let rows = wrap_block("the quick brown fox", 10);
        assert_eq!(texts(&rows), ["the quick ", "brown fox"]);
        assert_eq!(rows[1].start, 10);
    }

    #[test]
    fn long_words_are_split() {
        let rows = wrap_block("abcdefghij", 4);
        assert_eq!(texts(&rows), ["abcd", "efgh", "ij"]);
        assert_eq!(rows[2].start, 8);
    }

    #[test]
    fn newlines_break_and_offsets_skip_them() {
        let rows = wrap_block("ab\n\ncd", 10);
        assert_eq!(texts(&rows), ["ab", "", "cd"]);
        assert_eq!(rows.iter().map(|r| r.start).collect::<Vec<_>>(), [0, 3, 4]);
    }

    #[test]
    fn every_character_is_kept() {
        let text = "Rust's ownership   model keeps memory safe without a GC.";
        let rows = wrap_block(text, 7);
        let joined: String = rows.iter().map(|row| row.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn wide_characters_count_two_columns() {
        let rows = wrap_block("日本語テキスト", 6);
        assert_eq!(texts(&rows), ["日本語", "テキス", "ト"]);
        assert_eq!(rows[0].offset_at_column(0), 0);
        assert_eq!(rows[0].offset_at_column(1), 0);
        assert_eq!(rows[0].offset_at_column(2), 1);
        assert_eq!(rows[1].offset_at_column(40), 6);
    }

    #[test]
    fn transcript_rows_map_back_to_blocks() {
        let blocks = vec![
            TranscriptBlock {
                role: Role::User,
                text: "hi".into(),
                live: false,
            },
            TranscriptBlock {
                role: Role::Assistant,
                text: "hello there".into(),
                live: true,
            },
        ];
        let rows = layout_transcript(&blocks, 6);
        assert_eq!(rows[0].kind, RowKind::Label(Role::User));
        assert_eq!(rows[1].point_at_column(1), Some(SelectionPoint::new(0, 1)));
        assert_eq!(rows[2].kind, RowKind::Spacer);
        assert_eq!(rows[4].text, "hello ");
        assert_eq!(rows[5].point_at_column(2), Some(SelectionPoint::new(1, 8)));
        assert_eq!(rows[3].point_at_column(0), None);
    }
}

//! Edit operations and results

use crate::document::ParagraphId;
use crate::editing::mapping::Mapping;
use crate::editing::position_map::{Bias, PositionMap};
use crate::editing::DocPosition;
use smallvec::SmallVec;

/// Absolute byte offset in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AbsoluteOffset(pub usize);

impl AbsoluteOffset {
    /// Create a new absolute offset
    pub fn new(offset: usize) -> Self {
        Self(offset)
    }
}

/// An atomic edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Insert text at a position
    Insert {
        position: AbsoluteOffset,
        text: String,
    },
    /// Delete text in a range
    Delete {
        start: AbsoluteOffset,
        end: AbsoluteOffset,
    },
    /// A composite transaction of multiple operations
    Transaction {
        ops: Vec<EditOp>,
    },
}

impl EditOp {
    /// Create an insert operation
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self::Insert {
            position: AbsoluteOffset(position),
            text: text.into(),
        }
    }

    /// Create a delete operation
    pub fn delete(start: usize, end: usize) -> Self {
        Self::Delete {
            start: AbsoluteOffset(start),
            end: AbsoluteOffset(end),
        }
    }

    /// Create a transaction
    pub fn transaction(ops: Vec<EditOp>) -> Self {
        Self::Transaction { ops }
    }

    /// Get the affected range of this operation
    pub fn affected_range(&self) -> (usize, usize) {
        match self {
            EditOp::Insert { position, text } => (position.0, position.0 + text.len()),
            EditOp::Delete { start, end } => (start.0, end.0),
            EditOp::Transaction { ops } => {
                let mut min_start = usize::MAX;
                let mut max_end = 0;
                for op in ops {
                    let (s, e) = op.affected_range();
                    min_start = min_start.min(s);
                    max_end = max_end.max(e);
                }
                (min_start, max_end)
            }
        }
    }

    /// Try to fuse two adjacent edits into one, as done when a new edit
    /// arrives soon enough after the previous one to belong in the same
    /// undo step. Returns `None` when the two ops don't touch.
    pub fn merge(&self, other: &EditOp) -> Option<EditOp> {
        match (self, other) {
            (
                EditOp::Insert { position: p1, text: t1 },
                EditOp::Insert { position: p2, .. },
            ) if p1.0 + t1.len() == p2.0 => {
                let EditOp::Insert { text: t2, .. } = other else { unreachable!() };
                let mut text = t1.clone();
                text.push_str(t2);
                Some(EditOp::Insert { position: *p1, text })
            }
            (
                EditOp::Delete { start: s1, end: e1 },
                EditOp::Delete { start: s2, end: e2 },
            ) if s1 == s2 => {
                // Forward-delete chaining: cursor stays put, each press
                // removes more text starting at the same offset.
                Some(EditOp::Delete {
                    start: *s1,
                    end: AbsoluteOffset(e1.0 + (e2.0 - s2.0)),
                })
            }
            (
                EditOp::Delete { start: s1, end: e1 },
                EditOp::Delete { start: s2, end: e2 },
            ) if e2.0 == s1.0 => {
                // Backspace chaining: cursor moves left with every press.
                let _ = e1;
                Some(EditOp::Delete { start: *s2, end: *e1 })
            }
            (
                EditOp::Delete { start: s1, end: e1 },
                EditOp::Delete { start: s2, end: e2 },
            ) if e1.0 == s2.0 => {
                // Two deletes covering adjacent ascending ranges (e.g. the
                // undo side of two consecutive single-character inserts)
                // concatenate into one wider delete.
                Some(EditOp::Delete { start: *s1, end: *e2 })
            }
            _ => None,
        }
    }

    /// The position map this single edit induces. For a composite
    /// transaction, union each sub-op's own ranges into one map, the same
    /// way `affected_range` unions their affected spans.
    pub fn get_map(&self) -> PositionMap {
        match self {
            EditOp::Insert { position, text } => {
                PositionMap::single(position.0, position.0, text.len())
            }
            EditOp::Delete { start, end } => PositionMap::single(start.0, end.0, 0),
            EditOp::Transaction { ops } => {
                let ranges = ops.iter().flat_map(|op| op.get_map().ranges().to_vec()).collect();
                PositionMap::from_ranges(ranges)
            }
        }
    }

    /// Remap this op's positions through `mapping`, producing the
    /// equivalent op against the document `mapping` maps into. Returns
    /// `None` if the op was fully absorbed by intervening edits (a
    /// deletion whose range collapsed to nothing).
    pub fn map(&self, mapping: &Mapping) -> Option<EditOp> {
        match self {
            EditOp::Insert { position, text } => Some(EditOp::Insert {
                position: AbsoluteOffset(mapping.map_pos(position.0, Bias::After)),
                text: text.clone(),
            }),
            EditOp::Delete { start, end } => {
                let new_start = mapping.map_pos(start.0, Bias::After);
                let new_end = mapping.map_pos(end.0, Bias::Before);
                if new_start >= new_end {
                    None
                } else {
                    Some(EditOp::Delete {
                        start: AbsoluteOffset(new_start),
                        end: AbsoluteOffset(new_end),
                    })
                }
            }
            EditOp::Transaction { ops } => {
                let mapped: Vec<_> = ops.iter().filter_map(|op| op.map(mapping)).collect();
                if mapped.is_empty() {
                    None
                } else {
                    Some(EditOp::Transaction { ops: mapped })
                }
            }
        }
    }
}

/// Result of applying an edit operation
#[derive(Debug, Clone, Default)]
pub struct EditResult {
    /// New document version after this edit
    pub version: u64,
    /// Paragraphs that were modified
    pub affected_paragraphs: SmallVec<[ParagraphId; 4]>,
    /// Paragraphs that were created
    pub created_paragraphs: SmallVec<[ParagraphId; 2]>,
    /// Paragraphs that were deleted
    pub deleted_paragraphs: SmallVec<[ParagraphId; 2]>,
    /// New cursor position after the edit
    pub new_cursor: DocPosition,
}

impl EditResult {
    /// Check if any paragraphs were affected
    pub fn has_changes(&self) -> bool {
        !self.affected_paragraphs.is_empty()
            || !self.created_paragraphs.is_empty()
            || !self.deleted_paragraphs.is_empty()
    }

    /// Get all paragraphs that need relayout
    pub fn paragraphs_to_relayout(&self) -> impl Iterator<Item = &ParagraphId> {
        self.affected_paragraphs
            .iter()
            .chain(self.created_paragraphs.iter())
    }
}

//! A single undoable unit within a branch.

use crate::editing::{EditOp, PositionMap, SelectionBookmark};

/// One entry in a history branch.
///
/// `step` holds the *inverse* of the edit that produced this item — applying
/// it undoes the edit. `map` holds the edit's own *forward* map, used to
/// carry later selections and items across it. `selection` is set only on
/// the item that closes out an event (the most recent one before the user's
/// selection changed), and `mirror_offset` links a step item to the
/// map-only copy of itself pushed to the other side of the branch when an
/// event is popped, so a later pop_event can find its forward counterpart.
#[derive(Debug, Clone)]
pub struct Item {
    pub map: PositionMap,
    pub step: Option<EditOp>,
    pub selection: Option<SelectionBookmark>,
    pub mirror_offset: Option<isize>,
}

impl Item {
    pub fn new(
        map: PositionMap,
        step: Option<EditOp>,
        selection: Option<SelectionBookmark>,
        mirror_offset: Option<isize>,
    ) -> Self {
        Self {
            map,
            step,
            selection,
            mirror_offset,
        }
    }

    /// A map-only item: carries no edit, only repositions later items and
    /// selections across some change it didn't itself cause.
    pub fn map_only(map: PositionMap) -> Self {
        Self {
            map,
            step: None,
            selection: None,
            mirror_offset: None,
        }
    }

    pub fn has_step(&self) -> bool {
        self.step.is_some()
    }

    /// Try to fuse `other` onto the end of `self` (`self` is the earlier
    /// item). Only two consecutive step items with no intervening
    /// selection boundary can merge.
    pub fn merge(&self, other: &Item) -> Option<Item> {
        if other.selection.is_some() {
            return None;
        }
        let self_step = self.step.as_ref()?;
        let other_step = other.step.as_ref()?;
        let fused = self_step.merge(other_step)?;
        let map = fused.get_map().invert();
        Some(Item {
            map,
            step: Some(fused),
            selection: self.selection.clone(),
            mirror_offset: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::EditOp;

    fn step_item(op: EditOp) -> Item {
        let map = op.get_map().invert();
        Item::new(map, Some(op), None, None)
    }

    #[test]
    fn merges_two_adjacent_typed_chars() {
        // typing "H" at 0 then "e" at 1: undo items are deletes of those spans
        let a = step_item(EditOp::delete(0, 1));
        let b = step_item(EditOp::delete(1, 2));
        let merged = a.merge(&b).expect("adjacent typing should merge");
        assert_eq!(merged.step, Some(EditOp::delete(0, 2)));
    }

    #[test]
    fn refuses_to_merge_across_a_selection_boundary() {
        use crate::editing::{AbsoluteOffset, SelectionBookmark};

        let a = step_item(EditOp::delete(0, 1));
        let mut b = step_item(EditOp::delete(1, 2));
        b.selection = Some(SelectionBookmark::new(AbsoluteOffset(2), AbsoluteOffset(2)));
        assert!(a.merge(&b).is_none());
    }
}

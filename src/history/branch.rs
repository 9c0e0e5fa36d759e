//! An ordered sequence of [`Item`]s forming one side (undo or redo) of a
//! history. Structural sharing comes from [`im::Vector`], so cloning a
//! branch after a push or a pop is cheap.

use im::Vector;

use crate::document::Document;
use crate::editing::{Mapping, PositionMap, RebasedTransform, SelectionBookmark, Transform};
use crate::history::item::Item;

/// Slack above `depth` events tolerated before the oldest events are
/// dropped, so trimming happens in occasional bulk rather than on every
/// single push past the limit.
pub const DEPTH_OVERFLOW: usize = 20;

/// Map-only item count above which a branch is proactively compressed.
pub const MAX_EMPTY_ITEMS: usize = 500;

/// The outcome of popping the most recent event off a branch: the transform
/// that undoes it (already applied against the document handed in), the
/// selection to restore, and the branch with that event removed.
#[derive(Debug)]
pub struct PoppedEvent {
    pub transform: Transform,
    pub selection: Option<SelectionBookmark>,
    pub remaining: Branch,
}

#[derive(Debug, Clone, Default)]
pub struct Branch {
    items: Vector<Item>,
    event_count: usize,
}

impl Branch {
    pub fn new() -> Self {
        Self {
            items: Vector::new(),
            event_count: 0,
        }
    }

    pub fn items(&self) -> &Vector<Item> {
        &self.items
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn empty_item_count(&self) -> usize {
        self.items.iter().filter(|item| !item.has_step()).count()
    }

    /// Record the inverse of each step in `transform`. `selection`, when
    /// present, opens a new event on the first new item; pass `None` to
    /// continue the current event (the common case for grouped typing).
    pub fn add_transform(
        &self,
        transform: &Transform,
        selection: Option<SelectionBookmark>,
        depth: usize,
        preserve_items: bool,
    ) -> Branch {
        let mut items = self.items.clone();
        let mut event_count = self.event_count;
        let mut pending_selection = selection;

        for i in 0..transform.steps().len() {
            let map = transform.mapping().maps()[i].clone();
            let inverted = transform.inverted_steps()[i].clone();
            let mut new_item = Item::new(map, Some(inverted), None, None);
            if i == 0 {
                if let Some(sel) = pending_selection.take() {
                    new_item.selection = Some(sel);
                }
            }

            let merged = if !preserve_items {
                items.back().and_then(|tail| tail.merge(&new_item))
            } else {
                None
            };

            if let Some(merged_item) = merged {
                let last = items.len() - 1;
                items.set(last, merged_item);
            } else {
                if new_item.selection.is_some() {
                    event_count += 1;
                }
                items.push_back(new_item);
            }
        }

        if event_count > depth + DEPTH_OVERFLOW {
            let drop = DEPTH_OVERFLOW;
            let mut seen = 0;
            let mut cut = items.len();
            for (idx, item) in items.iter().enumerate() {
                if item.selection.is_some() {
                    seen += 1;
                    if seen == drop {
                        cut = idx + 1;
                        break;
                    }
                }
            }
            items = items.split_off(cut);
            event_count -= drop;
        }

        Branch { items, event_count }
    }

    /// Append each map as a map-only item, tracking position changes caused
    /// by a transaction this branch doesn't otherwise record. No-op on an
    /// empty branch: there is nothing later to keep aligned.
    pub fn add_maps(&self, maps: &[PositionMap]) -> Branch {
        if self.event_count == 0 {
            return self.clone();
        }
        let mut items = self.items.clone();
        for map in maps {
            items.push_back(Item::map_only(map.clone()));
        }
        Branch {
            items,
            event_count: self.event_count,
        }
    }

    /// Pop the most recent event, returning the transform that undoes it
    /// (built by applying remapped inverse steps to `doc`), the selection to
    /// restore, and the branch with that event removed.
    pub fn pop_event(&self, doc: &Document, preserve_items: bool) -> Option<PoppedEvent> {
        if self.event_count == 0 {
            return None;
        }
        let n = self.items.len();
        let mut end = n;
        for i in (0..n).rev() {
            if self.items[i].selection.is_some() {
                end = i;
                break;
            }
        }
        debug_assert!(end < n, "eventCount > 0 implies a selection exists");

        let mut transform = Transform::new(doc.clone());
        // Items above `end` not belonging to this event (remote map-only
        // items interleaved after it) must survive into `remaining`.
        let mut add_before: Vec<Item> = Vec::new();
        // Forward-map mirrors of the steps we're undoing, for later rebase.
        let mut add_after: Vec<Item> = Vec::new();
        // (index into add_after, index into add_before) pairs, in push order.
        let mut mirror_links: Vec<(usize, usize)> = Vec::new();
        let mut selection = None;

        let mut idx = n;
        while idx > end {
            idx -= 1;
            let item = self.items[idx].clone();

            if item.step.is_none() {
                add_before.push(item);
                continue;
            }

            let remap = self.remapping(idx + 1, n);
            let op = item.step.as_ref().unwrap();
            let remapped = if remap.is_empty() {
                Some(op.clone())
            } else {
                op.map(&remap)
            };

            if idx == end {
                if let Some(remapped_op) = remapped {
                    transform.maybe_step(remapped_op);
                }
                let bookmark = item.selection.clone().expect("event start carries a selection");
                selection = Some(if remap.is_empty() {
                    bookmark
                } else {
                    bookmark.map(&remap)
                });
                break;
            }

            let needs_bookkeeping = preserve_items || !remap.is_empty();
            if needs_bookkeeping {
                add_before.push(Item::map_only(item.map.clone()));
                let before_idx = add_before.len() - 1;
                if let Some(remapped_op) = remapped {
                    if transform.maybe_step(remapped_op) {
                        if let Some(new_map) = transform.last_map() {
                            mirror_links.push((add_after.len(), before_idx));
                            add_after.push(Item::map_only(new_map.clone()));
                        }
                    }
                }
            } else if let Some(remapped_op) = remapped {
                transform.maybe_step(remapped_op);
            }
        }

        add_before.reverse();
        add_after.reverse();
        let ab_len = add_before.len();
        let aa_len = add_after.len();
        for (q, p) in mirror_links {
            let pb = ab_len - 1 - p;
            let pa = aa_len - 1 - q;
            let final_before = end + pb;
            let final_after = end + ab_len + pa;
            add_after[pa].mirror_offset = Some(final_after as isize - final_before as isize);
        }

        let mut items: Vector<Item> = self.items.iter().take(end).cloned().collect();
        for item in add_before {
            items.push_back(item);
        }
        for item in add_after {
            items.push_back(item);
        }

        Some(PoppedEvent {
            transform,
            selection,
            remaining: Branch {
                items,
                event_count: self.event_count - 1,
            },
        })
    }

    /// Fold remote changes into the last `rebased_count` items, replacing
    /// each with its new forward map (dropping items whose edit was fully
    /// absorbed by a conflicting remote change).
    pub fn rebased(&self, rebased: &RebasedTransform) -> Branch {
        if self.event_count == 0 {
            return self.clone();
        }
        let rebased_count = rebased.rebased_count;
        let n = self.items.len();
        let start = n.saturating_sub(rebased_count);
        let removed_events = self
            .items
            .iter()
            .skip(start)
            .filter(|item| item.selection.is_some())
            .count();

        let mut new_until = rebased.mapping.len();
        let mut rebased_items: Vec<Item> = Vec::new();

        for k in 0..(n - start) {
            let item = &self.items[start + k];
            let Some(mirror_idx) = rebased.mapping.get_mirror(k) else {
                continue;
            };
            new_until = new_until.min(mirror_idx);
            let new_map = rebased.mapping.maps()[mirror_idx].clone();
            let new_step = if item.step.is_some() {
                rebased.inverted_steps.get(mirror_idx).cloned().flatten()
            } else {
                None
            };
            let mapped_selection = item.selection.as_ref().map(|bookmark| {
                let lo = k.min(mirror_idx);
                let hi = k.max(mirror_idx) + 1;
                let portion = rebased.mapping.slice(lo, Some(hi));
                bookmark.map(&portion)
            });

            if new_step.is_some() {
                rebased_items.push(Item::new(new_map, new_step, mapped_selection, None));
            } else {
                // The local step was fully absorbed by a conflicting remote
                // edit. Only a step-bearing Item may carry a selection, so
                // if this was an event boundary, hand it to the previous
                // surviving step instead of leaving it on a map-only item.
                if let Some(bookmark) = mapped_selection {
                    if let Some(tail) = rebased_items.last_mut() {
                        if tail.step.is_some() && tail.selection.is_none() {
                            tail.selection = Some(bookmark);
                        }
                    }
                }
                rebased_items.push(Item::new(new_map, new_step, None, None));
            }
        }
        let rebased_items_len = rebased_items.len();

        let mut remote_items: Vec<Item> = Vec::new();
        let remote_upper = new_until.min(rebased.mapping.len());
        for idx in rebased_count..remote_upper {
            remote_items.push(Item::map_only(rebased.mapping.maps()[idx].clone()));
        }

        let mut items: Vector<Item> = self.items.iter().take(start).cloned().collect();
        for item in remote_items {
            items.push_back(item);
        }
        for item in rebased_items {
            items.push_back(item);
        }

        let kept_events = items
            .iter()
            .skip(start)
            .filter(|item| item.selection.is_some())
            .count();
        let event_count = self.event_count - removed_events + kept_events;

        let branch = Branch { items, event_count };
        if branch.empty_item_count() > MAX_EMPTY_ITEMS {
            let upto = branch.items.len() - rebased_items_len;
            branch.compress(upto)
        } else {
            branch
        }
    }

    /// Fold map-only items below `upto` into the maps of neighboring step
    /// items, leaving items at or above `upto` untouched (their indices must
    /// stay stable for later rebase lookups).
    pub fn compress(&self, upto: usize) -> Branch {
        let upto = upto.min(self.items.len());
        let mut emitted: Vec<Item> = Vec::new();

        for i in 0..upto {
            let item = &self.items[i];
            let Some(op) = item.step.as_ref() else {
                continue;
            };
            let suffix = self.remapping(i + 1, upto);
            let remapped = if suffix.is_empty() {
                Some(op.clone())
            } else {
                op.map(&suffix)
            };

            let new_item = match remapped {
                Some(step) => {
                    let map = step.get_map().invert();
                    Some(Item::new(map, Some(step), item.selection.clone(), None))
                }
                // The step vanished entirely once remapped through what
                // follows it. Only a step-bearing Item may carry a
                // selection, so an event boundary here has to move to the
                // item already emitted rather than sit on a map-only item.
                None if item.selection.is_some() => {
                    if let Some(tail) = emitted.last_mut() {
                        if tail.selection.is_none() {
                            tail.selection = item.selection.clone();
                            None
                        } else {
                            Some(item.clone())
                        }
                    } else {
                        Some(item.clone())
                    }
                }
                None => None,
            };

            let Some(new_item) = new_item else { continue };

            let merged = emitted.last().and_then(|tail: &Item| tail.merge(&new_item));
            if let Some(merged_item) = merged {
                *emitted.last_mut().unwrap() = merged_item;
            } else {
                emitted.push(new_item);
            }
        }

        let mut items: Vector<Item> = emitted.into_iter().collect();
        for item in self.items.iter().skip(upto) {
            items.push_back(item.clone());
        }

        Branch {
            items,
            event_count: self.event_count,
        }
    }

    /// Build a [`Mapping`] from the forward maps of `items[from:to]`, wiring
    /// mirror relationships for items whose mirror partner also falls
    /// within the range.
    pub fn remapping(&self, from: usize, to: usize) -> Mapping {
        let mut mapping = Mapping::new();
        let to = to.min(self.items.len());
        for i in from..to {
            let item = &self.items[i];
            let mirror = item.mirror_offset.and_then(|offset| {
                let local = mapping.len() as isize - offset;
                if local >= 0 {
                    Some(local as usize)
                } else {
                    None
                }
            });
            mapping.append_map(item.map.clone(), mirror);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{AbsoluteOffset, EditOp};

    fn doc(text: &str) -> Document {
        Document::from_text(text)
    }

    #[test]
    fn add_transform_opens_an_event_and_records_the_inverse() {
        let base = doc("");
        let mut transform = Transform::new(base.clone());
        transform.maybe_step(EditOp::insert(0, "a"));
        let branch = Branch::new().add_transform(
            &transform,
            Some(SelectionBookmark::new(AbsoluteOffset(0), AbsoluteOffset(0))),
            100,
            false,
        );
        assert_eq!(branch.event_count(), 1);
        assert_eq!(branch.items().len(), 1);
        assert_eq!(branch.items()[0].step, Some(EditOp::delete(0, 1)));
    }

    #[test]
    fn add_transform_merges_into_the_same_event_when_no_selection_given() {
        let mut t1 = Transform::new(doc(""));
        t1.maybe_step(EditOp::insert(0, "a"));
        let branch = Branch::new().add_transform(
            &t1,
            Some(SelectionBookmark::new(AbsoluteOffset(0), AbsoluteOffset(0))),
            100,
            false,
        );

        let mut t2 = Transform::new(doc("a"));
        t2.maybe_step(EditOp::insert(1, "b"));
        let branch = branch.add_transform(&t2, None, 100, false);

        assert_eq!(branch.event_count(), 1);
        assert_eq!(branch.items().len(), 1);
        assert_eq!(branch.items()[0].step, Some(EditOp::delete(0, 2)));
    }

    #[test]
    fn overflow_trims_oldest_events_leaving_a_fixed_remainder() {
        let mut branch = Branch::new();
        let mut text = String::new();
        for i in 0..24 {
            let mut t = Transform::new(doc(&text));
            t.maybe_step(EditOp::insert(i, "x"));
            text.push('x');
            branch = branch.add_transform(
                &t,
                Some(SelectionBookmark::new(AbsoluteOffset(i), AbsoluteOffset(i))),
                3,
                false,
            );
        }
        assert_eq!(branch.event_count(), 4);
    }

    #[test]
    fn pop_event_undoes_the_last_event_and_shrinks_event_count() {
        let mut t1 = Transform::new(doc(""));
        t1.maybe_step(EditOp::insert(0, "a"));
        let branch = Branch::new().add_transform(
            &t1,
            Some(SelectionBookmark::new(AbsoluteOffset(0), AbsoluteOffset(0))),
            100,
            false,
        );

        let popped = branch.pop_event(&doc("a"), false).expect("one event present");
        assert_eq!(popped.transform.doc().text(), "");
        assert_eq!(popped.remaining.event_count(), 0);
    }

    #[test]
    fn pop_event_remaps_through_an_interleaved_remote_map() {
        // local: insert "X" at 5 in "helloworld" -> "helloXworld"
        let base = doc("helloworld");
        let mut t1 = Transform::new(base.clone());
        t1.maybe_step(EditOp::insert(5, "X"));
        let branch = Branch::new().add_transform(
            &t1,
            Some(SelectionBookmark::new(AbsoluteOffset(5), AbsoluteOffset(5))),
            100,
            false,
        );

        // remote: insert "Y" at 0 (non-recorded, tracked only as a map)
        let remote_map = PositionMap::single(0, 0, 1);
        let branch = branch.add_maps(&[remote_map]);

        let current_doc = doc("YhelloXworld");
        let popped = branch.pop_event(&current_doc, false).expect("one event present");
        // undoing X should remove exactly one char at the (shifted) position 6,
        // leaving Y and the original text intact.
        assert_eq!(popped.transform.doc().text(), "Yhelloworld");
        assert_eq!(popped.remaining.event_count(), 0);
    }

    #[test]
    fn rebased_replaces_items_with_mirrored_forward_maps() {
        let mut t1 = Transform::new(doc(""));
        t1.maybe_step(EditOp::insert(0, "ab"));
        let branch = Branch::new().add_transform(
            &t1,
            Some(SelectionBookmark::new(AbsoluteOffset(0), AbsoluteOffset(0))),
            100,
            true,
        );
        assert_eq!(branch.items().len(), 1);

        // Fabricate a rebase where the single local item (index 0) survives
        // under a new forward map at mapping index 1 (index 0 is a remote map).
        let mut mapping = Mapping::new();
        mapping.append_map(PositionMap::single(0, 2, 2), None); // old forward map (placeholder, unused by get_mirror)
        mapping.append_map(PositionMap::single(0, 2, 2), Some(0)); // new forward map, mirrors old at 0
        let inverted_steps = vec![None, Some(EditOp::delete(0, 2))];
        let rebased_transform = RebasedTransform::new(1, mapping, inverted_steps);

        let rebased = branch.rebased(&rebased_transform);
        assert_eq!(rebased.event_count(), 1);
        assert_eq!(rebased.items().len(), 1);
        assert_eq!(rebased.items()[0].step, Some(EditOp::delete(0, 2)));
    }

    #[test]
    fn compress_folds_map_only_items_away_without_changing_event_count() {
        let base = doc("");
        let mut t1 = Transform::new(base.clone());
        t1.maybe_step(EditOp::insert(0, "a"));
        let mut branch = Branch::new().add_transform(
            &t1,
            Some(SelectionBookmark::new(AbsoluteOffset(0), AbsoluteOffset(0))),
            100,
            false,
        );

        let maps: Vec<PositionMap> = (0..501).map(|_| PositionMap::identity()).collect();
        branch = branch.add_maps(&maps);
        assert!(branch.empty_item_count() > MAX_EMPTY_ITEMS);

        let compressed = branch.compress(branch.items().len());
        assert_eq!(compressed.empty_item_count(), 0);
        assert_eq!(compressed.event_count(), 1);
    }
}

//! Position mapping across a single edit step

/// Which side of a replaced range a position should be associated with
/// when it falls inside the range being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Stick to the content before the replaced range.
    Before,
    /// Stick to the content after the replaced range.
    After,
}

/// One replaced span: `[old_start, old_end)` in the pre-edit document became
/// `new_len` bytes of content in the post-edit document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
    pub old_start: usize,
    pub old_end: usize,
    pub new_len: usize,
}

/// Maps positions from one document version to the next (or back), across
/// a single edit step. Ranges are stored sorted by `old_start` and are
/// non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    ranges: Vec<MapRange>,
}

impl PositionMap {
    /// A map with no replaced ranges: every position maps to itself.
    pub fn identity() -> Self {
        Self { ranges: Vec::new() }
    }

    /// A map representing a single replaced span.
    pub fn single(old_start: usize, old_end: usize, new_len: usize) -> Self {
        Self {
            ranges: vec![MapRange {
                old_start,
                old_end,
                new_len,
            }],
        }
    }

    /// A map from several already-disjoint ranges (e.g. one per sub-op of a
    /// composite transaction), sorted into the order `map_pos` expects.
    pub(crate) fn from_ranges(mut ranges: Vec<MapRange>) -> Self {
        ranges.sort_by_key(|r| r.old_start);
        Self { ranges }
    }

    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    /// Map a position in the old document to the corresponding position in
    /// the new document. Positions inside a replaced range collapse to one
    /// of its endpoints, chosen by `bias`.
    pub fn map_pos(&self, pos: usize, bias: Bias) -> usize {
        let mut delta: isize = 0;
        for range in &self.ranges {
            if pos < range.old_start {
                break;
            }
            if pos <= range.old_end {
                if pos < range.old_end {
                    return match bias {
                        Bias::Before => (range.old_start as isize + delta) as usize,
                        Bias::After => {
                            (range.old_start as isize + delta) as usize + range.new_len
                        }
                    };
                }
                // pos == range.old_end: falls exactly on the boundary, so
                // straightforwardly maps to the end of the replacement.
                delta += range.new_len as isize - (range.old_end - range.old_start) as isize;
                continue;
            }
            delta += range.new_len as isize - (range.old_end - range.old_start) as isize;
        }
        (pos as isize + delta) as usize
    }

    /// Build the map that undoes this one: new-document ranges become
    /// old-document ranges and vice versa.
    pub fn invert(&self) -> Self {
        let mut ranges = Vec::with_capacity(self.ranges.len());
        let mut delta: isize = 0;
        for range in &self.ranges {
            let new_start = (range.old_start as isize + delta) as usize;
            let new_end = new_start + range.new_len;
            ranges.push(MapRange {
                old_start: new_start,
                old_end: new_end,
                new_len: range.old_end - range.old_start,
            });
            delta += range.new_len as isize - (range.old_end - range.old_start) as isize;
        }
        Self { ranges }
    }

    /// Visit every replaced range as `(old_start, old_end, new_start, new_end)`.
    pub fn for_each_range(&self, mut f: impl FnMut(usize, usize, usize, usize)) {
        let mut delta: isize = 0;
        for range in &self.ranges {
            let new_start = (range.old_start as isize + delta) as usize;
            let new_end = new_start + range.new_len;
            f(range.old_start, range.old_end, new_start, new_end);
            delta += range.new_len as isize - (range.old_end - range.old_start) as isize;
        }
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_map_is_noop() {
        let map = PositionMap::identity();
        assert_eq!(map.map_pos(42, Bias::Before), 42);
        assert_eq!(map.map_pos(42, Bias::After), 42);
    }

    #[test]
    fn insert_shifts_positions_after() {
        // inserted 5 bytes at offset 10
        let map = PositionMap::single(10, 10, 5);
        assert_eq!(map.map_pos(0, Bias::After), 0);
        assert_eq!(map.map_pos(10, Bias::Before), 10);
        assert_eq!(map.map_pos(10, Bias::After), 15);
        assert_eq!(map.map_pos(20, Bias::After), 25);
    }

    #[test]
    fn delete_collapses_positions_inside_range() {
        // deleted bytes [10, 20)
        let map = PositionMap::single(10, 20, 0);
        assert_eq!(map.map_pos(15, Bias::Before), 10);
        assert_eq!(map.map_pos(15, Bias::After), 10);
        assert_eq!(map.map_pos(25, Bias::After), 15);
    }

    #[test]
    fn invert_round_trips_insert() {
        let map = PositionMap::single(10, 10, 5);
        let inverted = map.invert();
        assert_eq!(inverted.map_pos(15, Bias::Before), 10);
        assert_eq!(inverted.map_pos(25, Bias::After), 20);
    }
}

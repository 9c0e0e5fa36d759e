//! Composition of several position maps, with mirroring between maps that
//! undo one another (used when the history engine remaps a deletion's
//! inverse back through the deletion itself).

use crate::editing::position_map::{Bias, PositionMap};

/// An ordered sequence of [`PositionMap`]s, applied one after another, plus
/// bookkeeping for which pairs of maps are inverses of each other.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    maps: Vec<PositionMap>,
    /// Each entry `(a, b)` records that `maps[a]` and `maps[b]` mirror one
    /// another. Stored as an unordered flat list; both directions are
    /// searched by [`Mapping::get_mirror`].
    mirror: Vec<(usize, usize)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn maps(&self) -> &[PositionMap] {
        &self.maps
    }

    /// Append a map, optionally recording that it mirrors an earlier map at
    /// `mirror` (its index within this `Mapping`).
    pub fn append_map(&mut self, map: PositionMap, mirror: Option<usize>) {
        let index = self.maps.len();
        self.maps.push(map);
        if let Some(other) = mirror {
            self.mirror.push((other, index));
        }
    }

    /// The index of the map that mirrors the one at `index`, if any.
    pub fn get_mirror(&self, index: usize) -> Option<usize> {
        for &(a, b) in &self.mirror {
            if a == index {
                return Some(b);
            }
            if b == index {
                return Some(a);
            }
        }
        None
    }

    /// A new `Mapping` covering only `maps[from..to]` (or `maps[from..]` if
    /// `to` is `None`), with mirror pairs re-indexed relative to the slice.
    /// Mirror pairs whose partner falls outside the slice are dropped.
    pub fn slice(&self, from: usize, to: Option<usize>) -> Mapping {
        let to = to.unwrap_or(self.maps.len());
        let maps = self.maps[from..to].to_vec();
        let mirror = self
            .mirror
            .iter()
            .filter(|&&(a, b)| a >= from && a < to && b >= from && b < to)
            .map(|&(a, b)| (a - from, b - from))
            .collect();
        Mapping { maps, mirror }
    }

    /// Fold `pos` through every map in this `Mapping`, in order.
    pub fn map_pos(&self, pos: usize, bias: Bias) -> usize {
        let mut pos = pos;
        for map in &self.maps {
            pos = map.map_pos(pos, bias);
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_multiple_maps() {
        let mut mapping = Mapping::new();
        mapping.append_map(PositionMap::single(10, 10, 5), None);
        mapping.append_map(PositionMap::single(0, 0, 2), None);
        // insert 2 bytes at 0 shifts everything by 2, then the 10->15 insert applies
        assert_eq!(mapping.map_pos(20, Bias::After), 27);
    }

    #[test]
    fn mirror_pairs_survive_slicing() {
        let mut mapping = Mapping::new();
        mapping.append_map(PositionMap::single(0, 5, 0), None);
        mapping.append_map(PositionMap::identity(), None);
        mapping.append_map(PositionMap::single(0, 0, 5), Some(0));

        assert_eq!(mapping.get_mirror(0), Some(2));
        assert_eq!(mapping.get_mirror(2), Some(0));

        let sliced = mapping.slice(1, None);
        assert_eq!(sliced.get_mirror(0), None);

        let sliced_both = mapping.slice(0, Some(3));
        assert_eq!(sliced_both.get_mirror(0), Some(2));
    }
}

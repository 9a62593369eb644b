//! Point selection state.
//!
//! Selecting a point paints it with the highlight color and remembers the
//! color it had, so deselecting restores it exactly. Structural edits remap
//! the remembered indices so a selection follows its points.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::buffer::GrowableBuffer;

/// How a multi-select combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectMode {
    /// Selects the candidates and keeps the existing selection.
    Add,
    /// Clears the selection, then selects the candidates.
    Replace,
    /// Deselects the candidates.
    Remove,
}

impl SelectMode {
    /// Maps a signed mode flag: positive adds, zero replaces, negative removes.
    #[must_use]
    pub fn from_sign(mode: i32) -> Self {
        match mode.signum() {
            1 => Self::Add,
            0 => Self::Replace,
            _ => Self::Remove,
        }
    }
}

/// Selected indices and their pre-selection colors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    saved: BTreeMap<usize, [u8; 3]>,
    highlight: [u8; 3],
}

impl Selection {
    /// Creates an empty selection painting with `highlight`.
    #[must_use]
    pub fn new(highlight: [u8; 3]) -> Self {
        Self {
            saved: BTreeMap::new(),
            highlight,
        }
    }

    /// Number of selected points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    /// Whether `index` is selected.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.saved.contains_key(&index)
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.saved.keys().copied()
    }

    /// Color the point had before it was selected.
    #[must_use]
    pub fn saved_color(&self, index: usize) -> Option<[u8; 3]> {
        self.saved.get(&index).copied()
    }

    /// Highlight color.
    #[must_use]
    pub fn highlight(&self) -> [u8; 3] {
        self.highlight
    }

    /// Replaces the remembered color of a selected point.
    /// Returns false if the point is not selected.
    pub fn update_saved(&mut self, index: usize, color: [u8; 3]) -> bool {
        match self.saved.get_mut(&index) {
            Some(saved) => {
                *saved = color;
                true
            }
            None => false,
        }
    }

    /// Selects a point. Returns false if it was already selected.
    pub fn select(&mut self, index: usize, colors: &mut GrowableBuffer<u8>) -> bool {
        if self.saved.contains_key(&index) {
            return false;
        }
        let Some(color) = colors.item(index).map(|c| [c[0], c[1], c[2]]) else {
            return false;
        };
        self.saved.insert(index, color);
        colors.write(index, &self.highlight);
        true
    }

    /// Deselects a point. Returns false if it was not selected.
    pub fn deselect(&mut self, index: usize, colors: &mut GrowableBuffer<u8>) -> bool {
        let Some(color) = self.saved.remove(&index) else {
            return false;
        };
        if index < colors.len() {
            colors.write(index, &color);
        }
        true
    }

    /// Deselects everything, returning how many points were deselected.
    pub fn clear(&mut self, colors: &mut GrowableBuffer<u8>) -> usize {
        let saved = std::mem::take(&mut self.saved);
        for (&index, color) in &saved {
            if index < colors.len() {
                colors.write(index, color);
            }
        }
        saved.len()
    }

    /// Forgets the selection without touching colors.
    pub fn forget(&mut self) {
        self.saved.clear();
    }

    /// Follows an insertion of `count` points at `at`.
    pub fn on_insert(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.saved = std::mem::take(&mut self.saved)
            .into_iter()
            .map(|(i, c)| (if i >= at { i + count } else { i }, c))
            .collect();
    }

    /// Follows an insertion at sorted final positions.
    pub fn on_insert_ranges(&mut self, ranges: &[Range<usize>]) {
        let mut inserted = 0;
        let mut boundaries = Vec::with_capacity(ranges.len());
        for range in ranges {
            boundaries.push((range.start - inserted, range.len()));
            inserted += range.len();
        }
        self.saved = std::mem::take(&mut self.saved)
            .into_iter()
            .map(|(i, c)| {
                let shift: usize = boundaries
                    .iter()
                    .filter(|(at, _)| *at <= i)
                    .map(|(_, n)| n)
                    .sum();
                (i + shift, c)
            })
            .collect();
    }

    /// Follows a removal of sorted, non-overlapping ranges of old indices.
    /// Selected points inside the ranges are dropped.
    pub fn on_remove_ranges(&mut self, ranges: &[Range<usize>]) {
        self.saved = std::mem::take(&mut self.saved)
            .into_iter()
            .filter(|(i, _)| !ranges.iter().any(|r| r.contains(i)))
            .map(|(i, c)| {
                let removed: usize = ranges
                    .iter()
                    .take_while(|r| r.end <= i)
                    .map(|r| r.len())
                    .sum();
                (i - removed, c)
            })
            .collect();
    }

    /// Follows a reversal of `len` points.
    pub fn on_reverse(&mut self, len: usize) {
        self.saved = std::mem::take(&mut self.saved)
            .into_iter()
            .map(|(i, c)| (len - 1 - i, c))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use geoscene_core::GrowthPolicy;

    use super::*;

    fn colors(n: u8) -> GrowableBuffer<u8> {
        let mut buf = GrowableBuffer::new(3, GrowthPolicy::default());
        for i in 0..n {
            buf.push(&[i, i, i]);
        }
        buf
    }

    #[test]
    fn test_select_restores_color() {
        let mut buf = colors(3);
        let mut sel = Selection::new([255, 255, 0]);
        assert!(sel.select(1, &mut buf));
        assert!(!sel.select(1, &mut buf));
        assert_eq!(buf.item(1), Some(&[255, 255, 0][..]));
        assert_eq!(sel.saved_color(1), Some([1, 1, 1]));
        assert!(sel.deselect(1, &mut buf));
        assert_eq!(buf.item(1), Some(&[1, 1, 1][..]));
        assert!(!sel.deselect(1, &mut buf));
        assert!(!sel.select(7, &mut buf));
    }

    #[test]
    fn test_clear() {
        let mut buf = colors(4);
        let mut sel = Selection::new([9, 9, 9]);
        sel.select(0, &mut buf);
        sel.select(3, &mut buf);
        assert_eq!(sel.clear(&mut buf), 2);
        assert!(sel.is_empty());
        assert_eq!(buf.item(3), Some(&[3, 3, 3][..]));
    }

    #[test]
    fn test_mode_from_sign() {
        assert_eq!(SelectMode::from_sign(5), SelectMode::Add);
        assert_eq!(SelectMode::from_sign(0), SelectMode::Replace);
        assert_eq!(SelectMode::from_sign(-1), SelectMode::Remove);
    }

    #[test]
    fn test_remap_on_edits() {
        let mut buf = colors(10);
        let mut sel = Selection::new([0, 0, 0]);
        for i in [1, 4, 8] {
            sel.select(i, &mut buf);
        }
        sel.on_insert(4, 2);
        assert_eq!(sel.indices().collect::<Vec<_>>(), [1, 6, 10]);

        sel.on_remove_ranges(&[0..1, 5..7]);
        assert_eq!(sel.indices().collect::<Vec<_>>(), [0, 7]);
        assert_eq!(sel.saved_color(0), Some([1, 1, 1]));

        // old indices 0 and 7 become 1 and 8
        sel.on_insert_ranges(&[0..1, 8..9]);
        assert_eq!(sel.indices().collect::<Vec<_>>(), [1, 8]);

        sel.on_reverse(12);
        assert_eq!(sel.indices().collect::<Vec<_>>(), [3, 10]);
    }
}

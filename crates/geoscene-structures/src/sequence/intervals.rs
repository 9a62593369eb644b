//! Interleaved start/end instance buffers for interval pair sequences.
//!
//! A trace of `n` points is drawn as `n - 1` independent segments. Each
//! segment instance stores its start and end point back to back, so every
//! interior point is written twice: as the end of segment `i - 1` and as the
//! start of segment `i`. Edits shift the instance buffer alongside the point
//! buffer and rewrite only the segments whose endpoints changed.

use std::ops::Range;

use glam::DVec3;
use geoscene_core::GrowthPolicy;

use crate::buffer::GrowableBuffer;

/// Per-segment start/end positions and colors.
#[derive(Debug, Clone)]
pub struct IntervalInstances {
    segments: GrowableBuffer<f32>,
    colors: GrowableBuffer<u8>,
}

impl IntervalInstances {
    /// Creates empty instance buffers.
    #[must_use]
    pub fn new(growth: GrowthPolicy) -> Self {
        Self {
            segments: GrowableBuffer::new(6, growth),
            colors: GrowableBuffer::new(6, growth),
        }
    }

    /// Creates instance buffers with room for `capacity` segments.
    #[must_use]
    pub fn with_capacity(capacity: usize, growth: GrowthPolicy) -> Self {
        Self {
            segments: GrowableBuffer::with_capacity(6, capacity, growth),
            colors: GrowableBuffer::with_capacity(6, capacity, growth),
        }
    }

    /// Number of segment instances.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Start and end of one segment, in local coordinates.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<(DVec3, DVec3)> {
        let s = self.segments.item(index)?;
        Some((
            DVec3::new(f64::from(s[0]), f64::from(s[1]), f64::from(s[2])),
            DVec3::new(f64::from(s[3]), f64::from(s[4]), f64::from(s[5])),
        ))
    }

    /// Start and end colors of one segment.
    #[must_use]
    pub fn segment_colors(&self, index: usize) -> Option<([u8; 3], [u8; 3])> {
        let c = self.colors.item(index)?;
        Some(([c[0], c[1], c[2]], [c[3], c[4], c[5]]))
    }

    /// Interleaved start/end position buffer.
    #[must_use]
    pub fn segments_buffer(&self) -> &GrowableBuffer<f32> {
        &self.segments
    }

    /// Interleaved start/end color buffer.
    #[must_use]
    pub fn colors_buffer(&self) -> &GrowableBuffer<u8> {
        &self.colors
    }

    /// Acknowledges an upload of both buffers.
    pub fn clear_dirty(&mut self) {
        self.segments.clear_dirty();
        self.colors.clear_dirty();
    }

    fn write_window(
        &mut self,
        window: Range<usize>,
        points: &GrowableBuffer<f32>,
        colors: &GrowableBuffer<u8>,
    ) {
        for j in window {
            let (Some(p0), Some(p1)) = (points.item(j), points.item(j + 1)) else {
                continue;
            };
            let (Some(c0), Some(c1)) = (colors.item(j), colors.item(j + 1)) else {
                continue;
            };
            self.segments
                .write(j, &[p0[0], p0[1], p0[2], p1[0], p1[1], p1[2]]);
            self.colors.write(j, &[c0[0], c0[1], c0[2], c1[0], c1[1], c1[2]]);
        }
    }

    /// Follows an insertion of `count` points at `at` into a sequence that
    /// held `old_len` points; `points`/`colors` are already updated.
    pub fn on_insert(
        &mut self,
        at: usize,
        count: usize,
        old_len: usize,
        points: &GrowableBuffer<f32>,
        colors: &GrowableBuffer<u8>,
    ) {
        let old_segments = old_len.saturating_sub(1);
        let new_segments = (old_len + count).saturating_sub(1);
        let added = new_segments - old_segments;
        let from = at.min(old_segments);
        self.segments.shift_right(from, added);
        self.colors.shift_right(from, added);
        self.write_window(at.saturating_sub(1)..(at + count).min(new_segments), points, colors);
    }

    /// Follows a deletion of `count` points starting at `start` from a
    /// sequence that held `old_len` points.
    pub fn on_delete(
        &mut self,
        start: usize,
        count: usize,
        old_len: usize,
        points: &GrowableBuffer<f32>,
        colors: &GrowableBuffer<u8>,
    ) {
        let old_segments = old_len.saturating_sub(1);
        let new_segments = (old_len - count).saturating_sub(1);
        let removed = old_segments - new_segments;
        let from = start.min(old_segments - removed);
        self.segments.remove(from, removed);
        self.colors.remove(from, removed);
        self.write_window(start.saturating_sub(1)..start.min(new_segments), points, colors);
    }

    /// Follows an in-place overwrite of `count` points at `index`.
    pub fn on_set(
        &mut self,
        index: usize,
        count: usize,
        points: &GrowableBuffer<f32>,
        colors: &GrowableBuffer<u8>,
    ) {
        let segments = self.segment_count();
        self.write_window(index.saturating_sub(1)..(index + count).min(segments), points, colors);
    }

    /// Regenerates every instance from the point buffer.
    pub fn rebuild(&mut self, points: &GrowableBuffer<f32>, colors: &GrowableBuffer<u8>) {
        let segments = points.len().saturating_sub(1);
        self.segments.clear();
        self.colors.clear();
        self.segments.shift_right(0, segments);
        self.colors.shift_right(0, segments);
        self.write_window(0..segments, points, colors);
    }

    /// Frees both buffers.
    pub fn release(&mut self) {
        self.segments.release();
        self.colors.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(xs: &[f32]) -> (GrowableBuffer<f32>, GrowableBuffer<u8>) {
        let mut p = GrowableBuffer::new(3, GrowthPolicy::default());
        let mut c = GrowableBuffer::new(3, GrowthPolicy::default());
        for &x in xs {
            p.push(&[x, 0.0, 0.0]);
            c.push(&[x as u8, 0, 0]);
        }
        (p, c)
    }

    fn starts_ends(inst: &IntervalInstances) -> Vec<(f64, f64)> {
        (0..inst.segment_count())
            .map(|i| {
                let (a, b) = inst.segment(i).unwrap();
                (a.x, b.x)
            })
            .collect()
    }

    fn consistent(inst: &IntervalInstances, p: &GrowableBuffer<f32>, c: &GrowableBuffer<u8>) {
        let mut fresh = IntervalInstances::new(GrowthPolicy::default());
        fresh.rebuild(p, c);
        assert_eq!(inst.segments_buffer().as_slice(), fresh.segments_buffer().as_slice());
        assert_eq!(inst.colors_buffer().as_slice(), fresh.colors_buffer().as_slice());
    }

    #[test]
    fn test_interior_points_are_replicated() {
        let (p, c) = points(&[0.0, 1.0, 2.0, 3.0]);
        let mut inst = IntervalInstances::new(GrowthPolicy::default());
        inst.rebuild(&p, &c);
        assert_eq!(starts_ends(&inst), [(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        assert_eq!(inst.segment_colors(1), Some(([1, 0, 0], [2, 0, 0])));
    }

    #[test]
    fn test_incremental_insert_matches_rebuild() {
        for at in 0..=3 {
            let (mut p, mut c) = points(&[0.0, 1.0, 2.0]);
            let mut inst = IntervalInstances::new(GrowthPolicy::default());
            inst.rebuild(&p, &c);
            p.insert(at, &[10.0, 0.0, 0.0, 11.0, 0.0, 0.0]);
            c.insert(at, &[10, 0, 0, 11, 0, 0]);
            inst.on_insert(at, 2, 3, &p, &c);
            consistent(&inst, &p, &c);
        }
    }

    #[test]
    fn test_insert_into_empty_and_single() {
        let (mut p, mut c) = points(&[]);
        let mut inst = IntervalInstances::new(GrowthPolicy::default());
        p.push(&[0.0, 0.0, 0.0]);
        c.push(&[0, 0, 0]);
        inst.on_insert(0, 1, 0, &p, &c);
        assert_eq!(inst.segment_count(), 0);
        p.push(&[5.0, 0.0, 0.0]);
        c.push(&[5, 0, 0]);
        inst.on_insert(1, 1, 1, &p, &c);
        assert_eq!(starts_ends(&inst), [(0.0, 5.0)]);
    }

    #[test]
    fn test_incremental_delete_matches_rebuild() {
        for start in 0..5 {
            for count in 1..=(5 - start) {
                let (mut p, mut c) = points(&[0.0, 1.0, 2.0, 3.0, 4.0]);
                let mut inst = IntervalInstances::new(GrowthPolicy::default());
                inst.rebuild(&p, &c);
                p.remove(start, count);
                c.remove(start, count);
                inst.on_delete(start, count, 5, &p, &c);
                consistent(&inst, &p, &c);
            }
        }
    }

    #[test]
    fn test_set_rewrites_adjacent_segments() {
        let (mut p, c) = points(&[0.0, 1.0, 2.0, 3.0]);
        let mut inst = IntervalInstances::new(GrowthPolicy::default());
        inst.rebuild(&p, &c);
        p.write(2, &[20.0, 0.0, 0.0]);
        inst.on_set(2, 1, &p, &c);
        assert_eq!(starts_ends(&inst), [(0.0, 1.0), (1.0, 20.0), (20.0, 3.0)]);
    }
}

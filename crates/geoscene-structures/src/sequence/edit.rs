//! Structural edits: add, insert, set, delete, batched ranges, reversal,
//! lookups and polyline closing.
//!
//! Every edit validates its whole input before the first buffer write, then
//! applies the same index operation to points, colors, visibility, attributes,
//! interval instances and selection so they stay aligned.

use std::ops::Range;

use geoscene_core::{DVec3, GeoSceneError, Result};

use super::{invalid_index, ColorInput, IndexRange, PointSequence};
use crate::input::PointInput;
use crate::labels::{LabelAction, LabelUpdate};

fn validate_ranges(ranges: &[IndexRange]) -> Result<()> {
    for r in ranges {
        if r.start > r.end {
            log::error!("range start {} is after range end {}", r.start, r.end);
            return Err(GeoSceneError::RangeOrder {
                start: r.start,
                end: r.end,
            });
        }
    }
    if ranges.windows(2).any(|w| w[0].end >= w[1].start) {
        log::error!("ranges must be sorted and non-overlapping: {ranges:?}");
        return Err(GeoSceneError::UnsortedRanges);
    }
    Ok(())
}

impl PointSequence {
    /// Appends points, before the closing duplicate of a closed polyline.
    ///
    /// Returns the indices the new points occupy.
    pub fn add_points(
        &mut self,
        input: impl Into<PointInput>,
        colors: Option<ColorInput>,
    ) -> Result<Range<usize>> {
        let flat = input.into().to_flat()?;
        let count = flat.len() / 3;
        let colors = self.resolve_colors(colors, count)?;
        let at = self.user_point_count();
        if count == 0 {
            return Ok(at..at);
        }
        self.insert_raw(at, &flat, &colors);
        self.notify(LabelUpdate::new(at, count, LabelAction::Add));
        Ok(at..at + count)
    }

    /// Inserts points so the first one lands at `index`.
    ///
    /// `index` may equal the point count; on a closed polyline that inserts
    /// before the closing duplicate.
    pub fn insert_points(
        &mut self,
        index: usize,
        input: impl Into<PointInput>,
        colors: Option<ColorInput>,
    ) -> Result<Range<usize>> {
        let len = self.len();
        if index > len {
            return Err(invalid_index(index, len));
        }
        let flat = input.into().to_flat()?;
        let count = flat.len() / 3;
        let colors = self.resolve_colors(colors, count)?;
        let at = index.min(self.user_point_count());
        if count == 0 {
            return Ok(at..at);
        }
        self.insert_raw(at, &flat, &colors);
        self.notify(LabelUpdate::new(at, count, LabelAction::Insert));
        if at == 0 {
            self.resync_closure(0..1);
        }
        Ok(at..at + count)
    }

    /// Overwrites consecutive points starting at `index`; the count is unchanged.
    pub fn set_points(&mut self, index: usize, input: impl Into<PointInput>) -> Result<()> {
        let flat = input.into().to_flat()?;
        let count = flat.len() / 3;
        if count == 0 {
            return Ok(());
        }
        let len = self.len();
        if index + count > len {
            return Err(invalid_index(index + count - 1, len));
        }
        let local = self.to_local(&flat);
        self.points.write(index, &local);
        if let Some(instances) = &mut self.instances {
            instances.on_set(index, count, &self.points, &self.colors);
        }
        self.notify(LabelUpdate::new(index, count, LabelAction::Set));
        self.resync_closure(index..index + count);
        self.refresh_bounds();
        Ok(())
    }

    /// Deletes the inclusive range `[start, end]`.
    ///
    /// On a closed polyline the last index is the closing duplicate; deleting
    /// it deletes point 0 instead.
    pub fn delete_points(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        let ranges = self.deletion_ranges(&[start..end + 1]);
        self.remove_and_notify(&ranges);
        Ok(())
    }

    /// Deletes several sorted, non-overlapping inclusive ranges in one pass.
    ///
    /// Equivalent to deleting each range on its own, last range first.
    pub fn delete_points_ranges(&mut self, ranges: &[IndexRange]) -> Result<()> {
        validate_ranges(ranges)?;
        let Some(last) = ranges.last() else {
            return Ok(());
        };
        if last.end >= self.len() {
            return Err(invalid_index(last.end, self.len()));
        }
        let half_open: Vec<Range<usize>> = ranges.iter().map(|r| r.to_range()).collect();
        let ranges = self.deletion_ranges(&half_open);
        self.remove_and_notify(&ranges);
        Ok(())
    }

    /// Inserts points at sorted, non-overlapping final positions in one pass.
    ///
    /// `input` holds the points of every range back to back. Equivalent to
    /// inserting each range on its own, first range first.
    pub fn insert_points_ranges(
        &mut self,
        ranges: &[IndexRange],
        input: impl Into<PointInput>,
        colors: Option<ColorInput>,
    ) -> Result<()> {
        validate_ranges(ranges)?;
        let flat = input.into().to_flat()?;
        let count = flat.len() / 3;
        let total: usize = ranges.iter().map(IndexRange::len).sum();
        if count != total {
            let message = format!("{count} points for ranges covering {total}");
            log::error!("invalid coordinate input: {message}");
            return Err(GeoSceneError::InvalidCoordinateShape(message));
        }
        let colors = self.resolve_colors(colors, count)?;
        let limit = self.user_point_count();
        let mut inserted = 0;
        for r in ranges {
            if r.start - inserted > limit {
                return Err(invalid_index(r.start, self.len()));
            }
            inserted += r.len();
        }
        if total == 0 {
            return Ok(());
        }

        if self.is_empty() {
            self.rehome(DVec3::new(flat[0], flat[1], flat[2]));
        }
        let local = self.to_local(&flat);
        let half_open: Vec<Range<usize>> = ranges.iter().map(|r| r.to_range()).collect();
        self.points.insert_ranges(&half_open, &local);
        self.colors.insert_ranges(&half_open, &colors);
        if let Some(visibility) = &mut self.visibility {
            visibility.insert_ranges(&half_open, &vec![1; total]);
        }
        self.attributes.insert_ranges(&half_open);
        if let Some(instances) = &mut self.instances {
            instances.rebuild(&self.points, &self.colors);
        }
        self.selection.on_insert_ranges(&half_open);
        self.refresh_bounds();

        let mut update = LabelUpdate::new(half_open[0].start, total, LabelAction::InsertRanges);
        update.ranges = half_open.iter().map(|r| (r.start, r.end)).collect();
        self.notify(update);
        if half_open[0].start == 0 {
            self.resync_closure(0..1);
        }
        Ok(())
    }

    /// Reverses the point order in place.
    pub fn reverse_order(&mut self) {
        let len = self.len();
        if len < 2 {
            return;
        }
        self.points.reverse_items();
        self.colors.reverse_items();
        if let Some(visibility) = &mut self.visibility {
            visibility.reverse_items();
        }
        self.attributes.reverse(len);
        if let Some(instances) = &mut self.instances {
            instances.rebuild(&self.points, &self.colors);
        }
        self.selection.on_reverse(len);
        self.notify(LabelUpdate::new(0, len, LabelAction::Set));
    }

    // --- Lookups ---

    /// World position of one point.
    #[must_use]
    pub fn get_point_at(&self, index: usize) -> Option<DVec3> {
        let world = self.world_matrix();
        self.local_point(index).map(|p| world.transform_point3(p))
    }

    /// World positions of the inclusive range `[start, end]`.
    pub fn get_points(&self, start: usize, end: usize) -> Result<Vec<DVec3>> {
        self.check_range(start, end)?;
        Ok((start..=end).filter_map(|i| self.get_point_at(i)).collect())
    }

    /// World positions of `[start, end]` as a flat coordinate array.
    pub fn get_points_flat(&self, start: usize, end: usize) -> Result<Vec<f64>> {
        Ok(self
            .get_points(start, end)?
            .into_iter()
            .flat_map(|p| p.to_array())
            .collect())
    }

    /// World positions of every stored point.
    #[must_use]
    pub fn points(&self) -> Vec<DVec3> {
        let world = self.world_matrix();
        self.local_points().map(|p| world.transform_point3(p)).collect()
    }

    /// Indices of every point within `epsilon` of `point` on each axis.
    #[must_use]
    pub fn find_point(&self, point: DVec3, epsilon: Option<f64>) -> Vec<usize> {
        let epsilon = DVec3::splat(epsilon.unwrap_or(self.options.find_epsilon));
        let world = self.world_matrix();
        self.local_points()
            .enumerate()
            .filter(|(_, p)| (world.transform_point3(*p) - point).abs().cmple(epsilon).all())
            .map(|(i, _)| i)
            .collect()
    }

    /// [`Self::find_point`] for several query points.
    #[must_use]
    pub fn find_points(&self, points: &[DVec3], epsilon: Option<f64>) -> Vec<Vec<usize>> {
        points.iter().map(|&p| self.find_point(p, epsilon)).collect()
    }

    // --- Closing ---

    /// Closes a polyline by appending a maintained duplicate of point 0.
    ///
    /// Returns false if the sequence is not a polyline or has fewer than two
    /// points.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return true;
        }
        if !self.shape.can_close() {
            log::warn!("'{}' is a {} and cannot be closed", self.name, self.shape.type_name());
            return false;
        }
        let last = self.len();
        if last < 2 {
            log::warn!("'{}' needs at least two points to close", self.name);
            return false;
        }
        self.points.push(&[0.0; 3]);
        self.colors.push(&[0; 3]);
        self.attributes.insert_slots(last, 1);
        self.closed = true;
        self.copy_point(0, last);
        self.notify(LabelUpdate::new(last, 1, LabelAction::Add));
        true
    }

    /// Opens a closed polyline by dropping the closing duplicate.
    pub fn open(&mut self) -> bool {
        if !self.closed {
            return false;
        }
        let last = self.drop_closing_duplicate();
        self.notify(LabelUpdate::new(last, 1, LabelAction::Delete));
        true
    }

    // --- Shared plumbing ---

    /// Inserts world-space points at `at` into every parallel buffer.
    fn insert_raw(&mut self, at: usize, flat: &[f64], colors: &[u8]) {
        if self.is_empty() {
            self.rehome(DVec3::new(flat[0], flat[1], flat[2]));
        }
        let local = self.to_local(flat);
        let count = local.len() / 3;
        let old_len = self.len();
        self.points.insert(at, &local);
        self.colors.insert(at, colors);
        if let Some(visibility) = &mut self.visibility {
            visibility.insert(at, &vec![1; count]);
        }
        self.attributes.insert_slots(at, count);
        if let Some(instances) = &mut self.instances {
            instances.on_insert(at, count, old_len, &self.points, &self.colors);
        }
        self.selection.on_insert(at, count);
        self.refresh_bounds();
    }

    /// Maps user deletion ranges onto stored indices. On a closed polyline
    /// the closing duplicate is never removed; covering it removes point 0.
    fn deletion_ranges(&self, ranges: &[Range<usize>]) -> Vec<Range<usize>> {
        if !self.closed {
            return ranges.to_vec();
        }
        let last = self.len() - 1;
        let mut covers_last = false;
        let mut mapped: Vec<Range<usize>> = Vec::with_capacity(ranges.len() + 1);
        for r in ranges {
            let mut r = r.clone();
            if r.end > last {
                r.end = last;
                covers_last = true;
            }
            if !r.is_empty() {
                mapped.push(r);
            }
        }
        if covers_last && mapped.first().map_or(true, |r| r.start != 0) {
            mapped.insert(0, 0..1);
        }
        mapped
    }

    /// Removes stored index ranges from every buffer and reports them.
    ///
    /// A single range is announced as `Delete`; anything else, including a
    /// closed-polyline delete split around the closing duplicate, as
    /// `DeleteRanges` with every range listed.
    fn remove_and_notify(&mut self, ranges: &[Range<usize>]) {
        let Some(first) = ranges.first() else {
            return;
        };
        let total: usize = ranges.iter().map(|r| r.len()).sum();
        let old_len = self.len();

        self.points.remove_ranges(ranges);
        self.colors.remove_ranges(ranges);
        if let Some(visibility) = &mut self.visibility {
            visibility.remove_ranges(ranges);
        }
        self.attributes.remove_ranges(ranges);
        if let Some(instances) = &mut self.instances {
            if let [single] = ranges {
                instances.on_delete(single.start, single.len(), old_len, &self.points, &self.colors);
            } else {
                instances.rebuild(&self.points, &self.colors);
            }
        }
        self.selection.on_remove_ranges(ranges);

        let update = if let [single] = ranges {
            LabelUpdate::new(single.start, total, LabelAction::Delete)
        } else {
            let mut update = LabelUpdate::new(first.start, total, LabelAction::DeleteRanges);
            update.ranges = ranges.iter().map(|r| (r.start, r.end)).collect();
            update
        };
        self.notify(update);

        if self.closed {
            if self.len() < 3 {
                let last = self.drop_closing_duplicate();
                log::debug!("'{}' reopened: fewer than two points left", self.name);
                self.notify(LabelUpdate::new(last, 1, LabelAction::Delete));
            } else if first.start == 0 {
                self.resync_closure(0..1);
            }
        }
        if self.is_empty() {
            self.origin = DVec3::ZERO;
        }
        self.refresh_bounds();
    }

    /// Removes the closing duplicate and returns the index it occupied.
    fn drop_closing_duplicate(&mut self) -> usize {
        let last = self.len() - 1;
        self.points.truncate(last);
        self.colors.truncate(last);
        self.attributes.remove_slots(last..last + 1);
        self.selection.on_remove_ranges(&[last..last + 1]);
        self.closed = false;
        last
    }
}

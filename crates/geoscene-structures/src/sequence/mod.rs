//! Point sequence primitive.
//!
//! A [`PointSequence`] owns the coordinate, color, visibility and attribute
//! storage of one survey object and keeps them index aligned through every
//! edit. The [`Shape`] tag selects how the points are interpreted:
//!
//! - [`Shape::Polyline`]: `n` points joined by `n - 1` segments, optionally
//!   closed by a maintained duplicate of point 0 in the last slot.
//! - [`Shape::IntervalPair`]: `n` points drawn as `n - 1` discrete segment
//!   instances (drillhole traces, thick lines).
//! - [`Shape::PointCloud`]: unordered points with per-point show/hide.
//!
//! Coordinates cross the API in world space and double precision. Internally
//! they are stored in `f32` relative to a local origin that is re-homed onto
//! the first point added to an empty sequence, so projected survey
//! coordinates keep full precision on the GPU side.

mod edit;
pub mod intervals;
mod measure;
mod raycast;
pub mod selection;

use std::any::Any;
use std::ops::Range;

use geoscene_core::{
    average_scale, Aabb, BoundingSphere, DMat4, DVec3, Frustum, GeoSceneError, MarkerHandle,
    MarkerRegistry, OrientedBox, Options, Primitive, Result,
};

use crate::attributes::{AttributeKind, AttributeTable, AttributeValue};
use crate::buffer::GrowableBuffer;
use crate::labels::{LabelAction, LabelChannel, LabelSink, LabelUpdate};

pub use intervals::IntervalInstances;
pub use selection::{SelectMode, Selection};

/// How a sequence interprets its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Open or closed polyline.
    Polyline,
    /// Points drawn as discrete start/end segment pairs.
    IntervalPair,
    /// Unordered points.
    PointCloud,
}

impl Shape {
    /// Number of segments implied by `point_count` points.
    #[must_use]
    pub fn segment_count(self, point_count: usize) -> usize {
        match self {
            Self::Polyline | Self::IntervalPair => point_count.saturating_sub(1),
            Self::PointCloud => 0,
        }
    }

    /// Whether the shape can carry a closing duplicate.
    #[must_use]
    pub fn can_close(self) -> bool {
        self == Self::Polyline
    }

    /// Whether the shape keeps a per-point visibility mask.
    #[must_use]
    pub fn supports_visibility(self) -> bool {
        self == Self::PointCloud
    }

    /// Primitive type name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Polyline => "Polyline",
            Self::IntervalPair => "Trace",
            Self::PointCloud => "PointCloud",
        }
    }
}

/// Colors supplied alongside new points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorInput {
    /// One color for every new point.
    Uniform([u8; 3]),
    /// One color per new point.
    PerPoint(Vec<[u8; 3]>),
}

impl From<[u8; 3]> for ColorInput {
    fn from(color: [u8; 3]) -> Self {
        Self::Uniform(color)
    }
}

impl From<Vec<[u8; 3]>> for ColorInput {
    fn from(colors: Vec<[u8; 3]>) -> Self {
        Self::PerPoint(colors)
    }
}

/// An inclusive index range `{start, end}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    /// Creates an inclusive range.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of indices covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Always false; an inclusive range covers at least one index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Half-open equivalent.
    #[must_use]
    pub fn to_range(self) -> Range<usize> {
        self.start..self.end + 1
    }
}

pub(crate) fn invalid_index(index: usize, count: usize) -> GeoSceneError {
    log::error!("invalid index {index} (point count {count})");
    GeoSceneError::InvalidIndex { index, count }
}

fn dvec(p: &[f32]) -> DVec3 {
    DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]))
}

/// A mutable sequence of survey points.
#[derive(Debug)]
pub struct PointSequence {
    name: String,
    shape: Shape,
    options: Options,
    points: GrowableBuffer<f32>,
    colors: GrowableBuffer<u8>,
    visibility: Option<GrowableBuffer<u8>>,
    instances: Option<IntervalInstances>,
    attributes: AttributeTable,
    selection: Selection,
    closed: bool,
    transform: DMat4,
    origin: DVec3,
    enabled: bool,
    local_bounds: Option<Aabb>,
    local_sphere: Option<BoundingSphere>,
    labels: Option<LabelChannel>,
    marker: Option<MarkerHandle>,
    parent: Option<String>,
}

impl PointSequence {
    /// Creates an empty sequence.
    pub fn new(name: impl Into<String>, shape: Shape, options: Options) -> Self {
        Self::with_capacity(name, shape, options, 0)
    }

    /// Creates an empty sequence with room for `capacity` points.
    pub fn with_capacity(
        name: impl Into<String>,
        shape: Shape,
        options: Options,
        capacity: usize,
    ) -> Self {
        let growth = options.growth;
        Self {
            name: name.into(),
            shape,
            points: GrowableBuffer::with_capacity(3, capacity, growth),
            colors: GrowableBuffer::with_capacity(3, capacity, growth),
            visibility: shape
                .supports_visibility()
                .then(|| GrowableBuffer::with_capacity(1, capacity, growth)),
            instances: (shape == Shape::IntervalPair).then(|| {
                IntervalInstances::with_capacity(capacity.saturating_sub(1), growth)
            }),
            attributes: AttributeTable::new(),
            selection: Selection::new(options.highlight_color),
            closed: false,
            transform: DMat4::IDENTITY,
            origin: DVec3::ZERO,
            enabled: true,
            local_bounds: None,
            local_sphere: None,
            labels: None,
            marker: None,
            parent: None,
            options,
        }
    }

    /// Creates an empty polyline.
    pub fn polyline(name: impl Into<String>, options: Options) -> Self {
        Self::new(name, Shape::Polyline, options)
    }

    /// Creates an empty interval pair trace.
    pub fn trace(name: impl Into<String>, options: Options) -> Self {
        Self::new(name, Shape::IntervalPair, options)
    }

    /// Creates an empty point cloud.
    pub fn point_cloud(name: impl Into<String>, options: Options) -> Self {
        Self::new(name, Shape::PointCloud, options)
    }

    /// Creates an empty point cloud drawn with a shared marker symbol.
    pub fn point_cloud_with_marker(
        name: impl Into<String>,
        options: Options,
        markers: &mut MarkerRegistry,
        symbol: &str,
    ) -> Result<Self> {
        let marker = markers.acquire(symbol)?;
        let mut cloud = Self::point_cloud(name, options);
        cloud.marker = Some(marker);
        Ok(cloud)
    }

    // --- Shape and counts ---

    /// Shape tag.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of stored points, including a closing duplicate.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Alias of [`Self::point_count`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points excluding a closing duplicate.
    #[must_use]
    pub fn user_point_count(&self) -> usize {
        self.len() - usize::from(self.closed)
    }

    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.shape.segment_count(self.len())
    }

    /// Whether the polyline is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Point capacity before the next reallocation.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    /// Number of times the point storage was reallocated.
    #[must_use]
    pub fn reallocations(&self) -> usize {
        self.points.reallocations()
    }

    /// Options the sequence was created with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    // --- Renderer-facing buffers ---

    /// Local `f32` coordinates, three per point.
    #[must_use]
    pub fn points_buffer(&self) -> &GrowableBuffer<f32> {
        &self.points
    }

    /// RGB colors, three per point.
    #[must_use]
    pub fn colors_buffer(&self) -> &GrowableBuffer<u8> {
        &self.colors
    }

    /// Visibility mask, one byte per point, for point clouds.
    #[must_use]
    pub fn visibility_buffer(&self) -> Option<&GrowableBuffer<u8>> {
        self.visibility.as_ref()
    }

    /// Segment instances, for interval pair sequences.
    #[must_use]
    pub fn instances(&self) -> Option<&IntervalInstances> {
        self.instances.as_ref()
    }

    /// Whether any buffer changed since the last upload.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.points.needs_update()
            || self.colors.needs_update()
            || self.visibility.as_ref().is_some_and(GrowableBuffer::needs_update)
            || self.instances.as_ref().is_some_and(|i| {
                i.segments_buffer().needs_update() || i.colors_buffer().needs_update()
            })
    }

    /// Acknowledges an upload of every buffer.
    pub fn clear_dirty(&mut self) {
        self.points.clear_dirty();
        self.colors.clear_dirty();
        if let Some(visibility) = &mut self.visibility {
            visibility.clear_dirty();
        }
        if let Some(instances) = &mut self.instances {
            instances.clear_dirty();
        }
    }

    // --- Frames ---

    /// Local origin, expressed in the parent frame.
    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Matrix taking stored local coordinates to world space.
    #[must_use]
    pub fn world_matrix(&self) -> DMat4 {
        self.transform * DMat4::from_translation(self.origin)
    }

    /// Name of the primitive this one is attached to.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Attaches this primitive to a parent for hit ordering.
    pub fn set_parent(&mut self, parent: Option<String>) -> &mut Self {
        self.parent = parent;
        self
    }

    /// Marker handle of a point cloud.
    #[must_use]
    pub fn marker(&self) -> Option<&MarkerHandle> {
        self.marker.as_ref()
    }

    pub(crate) fn local_point(&self, index: usize) -> Option<DVec3> {
        self.points.item(index).map(dvec)
    }

    pub(crate) fn local_points(&self) -> impl Iterator<Item = DVec3> + Clone + '_ {
        self.points.items().map(dvec)
    }

    /// Converts world coordinates to stored local `f32` coordinates.
    fn to_local(&self, flat: &[f64]) -> Vec<f32> {
        let inverse = self.world_matrix().inverse();
        flat.chunks_exact(3)
            .flat_map(|c| {
                let p = inverse.transform_point3(DVec3::new(c[0], c[1], c[2]));
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect()
    }

    /// Moves the local origin onto `first`, which is in world space.
    fn rehome(&mut self, first: DVec3) {
        self.origin = self.transform.inverse().transform_point3(first);
        log::debug!("'{}' local origin re-homed to {}", self.name, self.origin);
    }

    fn refresh_bounds(&mut self) {
        self.local_bounds = Aabb::from_points(self.local_points());
        self.local_sphere = BoundingSphere::from_points(self.local_points());
    }

    /// World-space bounding sphere.
    #[must_use]
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let world = self.world_matrix();
        self.local_sphere.map(|s| BoundingSphere {
            center: world.transform_point3(s.center),
            radius: s.radius * average_scale(&world),
        })
    }

    pub(crate) fn local_sphere(&self) -> Option<BoundingSphere> {
        self.local_sphere
    }

    // --- Colors ---

    fn resolve_colors(&self, colors: Option<ColorInput>, count: usize) -> Result<Vec<u8>> {
        match colors {
            None => Ok(self.options.default_color.repeat(count)),
            Some(ColorInput::Uniform(c)) => Ok(c.repeat(count)),
            Some(ColorInput::PerPoint(list)) => {
                if list.len() != count {
                    log::error!(
                        "'{}' got {} colors for {count} points",
                        self.name,
                        list.len()
                    );
                    return Err(GeoSceneError::ColorCountMismatch {
                        expected: count,
                        actual: list.len(),
                    });
                }
                Ok(list.into_iter().flatten().collect())
            }
        }
    }

    /// Color used for points added without explicit colors.
    #[must_use]
    pub fn default_color(&self) -> [u8; 3] {
        self.options.default_color
    }

    /// Changes the color used for points added from now on.
    pub fn set_default_color(&mut self, color: [u8; 3]) -> &mut Self {
        self.options.default_color = color;
        self
    }

    /// Overwrites the colors of consecutive points starting at `index`.
    ///
    /// Selected points keep their highlight; the new color shows once they
    /// are deselected.
    pub fn set_colors(&mut self, index: usize, colors: &[[u8; 3]]) -> Result<()> {
        let count = self.len();
        if colors.is_empty() {
            return Ok(());
        }
        if index + colors.len() > count {
            return Err(invalid_index(index + colors.len() - 1, count));
        }
        let mut wrote_first = false;
        for (k, color) in colors.iter().enumerate() {
            let i = self.canonical_index(index + k);
            if i == 0 && k > 0 && index == 0 {
                // point 0 was already written by this call
                continue;
            }
            wrote_first |= i == 0;
            if !self.selection.update_saved(i, *color) {
                self.colors.write(i, color);
            }
        }
        let end = (index + colors.len()).min(self.user_point_count());
        self.colors_changed(index..end);
        if wrote_first && index > 0 {
            self.colors_changed(0..1);
        }
        Ok(())
    }

    /// Color of one point as currently rendered.
    #[must_use]
    pub fn get_color_at(&self, index: usize) -> Option<[u8; 3]> {
        self.colors.item(index).map(|c| [c[0], c[1], c[2]])
    }

    /// Colors of the inclusive range `[start, end]`.
    pub fn get_colors(&self, start: usize, end: usize) -> Result<Vec<[u8; 3]>> {
        self.check_range(start, end)?;
        Ok((start..=end)
            .filter_map(|i| self.get_color_at(i))
            .collect())
    }

    /// Propagates a color change to derived buffers.
    fn colors_changed(&mut self, range: Range<usize>) {
        if let Some(instances) = &mut self.instances {
            instances.on_set(range.start, range.len(), &self.points, &self.colors);
        }
        self.restore_closure(range);
    }

    pub(crate) fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end {
            log::error!("range start {start} is after range end {end}");
            return Err(GeoSceneError::RangeOrder { start, end });
        }
        if end >= self.len() {
            return Err(invalid_index(end, self.len()));
        }
        Ok(())
    }

    // --- Closing duplicate ---

    /// Copies point `from` over point `to`, including its color and
    /// attribute slots.
    fn copy_point(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let (Some(p), Some(c)) = (self.points.item(from), self.colors.item(from)) else {
            return;
        };
        let (p, c) = ([p[0], p[1], p[2]], [c[0], c[1], c[2]]);
        self.points.write(to, &p);
        self.colors.write(to, &c);
        self.attributes.copy_slot(from, to);
    }

    /// Keeps the closing duplicate equal to point 0 after `touched` changed.
    ///
    /// Returns the slot that was rewritten outside `touched`, if any.
    fn restore_closure(&mut self, touched: Range<usize>) -> Option<usize> {
        if !self.closed || touched.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        if touched.start == 0 {
            self.copy_point(0, last);
            (touched.end <= last).then_some(last)
        } else if touched.end > last {
            self.copy_point(last, 0);
            Some(0)
        } else {
            None
        }
    }

    /// [`Self::restore_closure`], telling the label presenter about the
    /// rewritten slot.
    fn resync_closure(&mut self, touched: Range<usize>) {
        if let Some(slot) = self.restore_closure(touched) {
            self.notify(LabelUpdate::new(slot, 1, LabelAction::Set));
        }
    }

    /// Index a user-facing operation acts on: the closing duplicate of a
    /// closed polyline stands for point 0.
    fn canonical_index(&self, index: usize) -> usize {
        if self.closed && index + 1 == self.len() {
            0
        } else {
            index
        }
    }

    // --- Attributes ---

    /// Attribute table, index aligned with the points.
    #[must_use]
    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Adds an empty attribute column.
    pub fn add_attribute(&mut self, key: &str, kind: AttributeKind) -> Result<()> {
        self.attributes.add_column(key, kind)
    }

    /// Removes an attribute column.
    pub fn remove_attribute(&mut self, key: &str) -> Result<()> {
        if self.attributes.remove_column(key).is_some() {
            Ok(())
        } else {
            log::error!("attribute '{key}' not found");
            Err(GeoSceneError::AttributeNotFound(key.to_string()))
        }
    }

    /// Writes one attribute value.
    pub fn set_attribute(
        &mut self,
        key: &str,
        index: usize,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let index = self.canonical_index(index);
        self.attributes.set(key, index, Some(value.into()))?;
        self.resync_closure(index..index + 1);
        Ok(())
    }

    /// Clears one attribute value.
    pub fn clear_attribute(&mut self, key: &str, index: usize) -> Result<()> {
        let index = self.canonical_index(index);
        self.attributes.set(key, index, None)?;
        self.resync_closure(index..index + 1);
        Ok(())
    }

    /// Reads one attribute value.
    #[must_use]
    pub fn get_attribute(&self, key: &str, index: usize) -> Option<AttributeValue> {
        self.attributes.get(key, index)
    }

    // --- Visibility ---

    /// Whether a point is drawn and pickable.
    #[must_use]
    pub fn is_point_visible(&self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.visibility
            .as_ref()
            .and_then(|v| v.item(index))
            .map_or(true, |v| v[0] != 0)
    }

    /// Number of visible points.
    #[must_use]
    pub fn visible_point_count(&self) -> usize {
        match &self.visibility {
            Some(v) => v.as_slice().iter().filter(|&&b| b != 0).count(),
            None => self.len(),
        }
    }

    /// Shows the given points.
    pub fn show_points(&mut self, indices: &[usize]) -> Result<()> {
        self.set_visibility(indices, true)
    }

    /// Hides the given points; hidden points are skipped by picking and
    /// selection.
    pub fn hide_points(&mut self, indices: &[usize]) -> Result<()> {
        self.set_visibility(indices, false)
    }

    fn set_visibility(&mut self, indices: &[usize], visible: bool) -> Result<()> {
        let count = self.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= count) {
            return Err(invalid_index(bad, count));
        }
        let Some(mask) = &mut self.visibility else {
            log::warn!(
                "'{}' is a {} and has no per-point visibility",
                self.name,
                self.shape.type_name()
            );
            return Ok(());
        };
        for &i in indices {
            mask.write(i, &[u8::from(visible)]);
        }
        Ok(())
    }

    // --- Labels ---

    /// Connects a label presenter; existing points are announced as added.
    pub fn attach_labels(&mut self, sink: Box<dyn LabelSink>) {
        let mut channel = LabelChannel::new(sink);
        if !self.is_empty() {
            channel.notify(&LabelUpdate::new(0, self.len(), LabelAction::Add));
        }
        self.labels = Some(channel);
    }

    /// Disconnects the label presenter.
    pub fn detach_labels(&mut self) -> Option<Box<dyn LabelSink>> {
        self.labels.take().map(LabelChannel::into_sink)
    }

    /// Label channel, if a presenter is attached.
    #[must_use]
    pub fn labels(&self) -> Option<&LabelChannel> {
        self.labels.as_ref()
    }

    /// Runs the pending label rebuild. Returns true if one completed.
    pub fn flush_labels(&mut self) -> bool {
        self.labels.as_mut().is_some_and(LabelChannel::flush)
    }

    fn notify(&mut self, update: LabelUpdate) {
        if let Some(labels) = &mut self.labels {
            labels.notify(&update);
        }
    }

    // --- Selection ---

    /// Selection state.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether a point is selected.
    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(index)
    }

    /// Selected indices, ascending.
    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selection.indices().collect()
    }

    /// Selects one point. Returns false if it was already selected.
    ///
    /// Selecting the closing duplicate of a closed polyline selects point 0.
    pub fn select(&mut self, index: usize) -> Result<bool> {
        if index >= self.len() {
            return Err(invalid_index(index, self.len()));
        }
        let index = self.canonical_index(index);
        let changed = self.selection.select(index, &mut self.colors);
        if changed {
            self.colors_changed(index..index + 1);
        }
        Ok(changed)
    }

    /// Deselects one point. Returns false if it was not selected.
    pub fn deselect(&mut self, index: usize) -> Result<bool> {
        if index >= self.len() {
            return Err(invalid_index(index, self.len()));
        }
        let index = self.canonical_index(index);
        let changed = self.selection.deselect(index, &mut self.colors);
        if changed {
            self.colors_changed(index..index + 1);
        }
        Ok(changed)
    }

    /// Deselects every point, returning how many were selected.
    pub fn deselect_all(&mut self) -> usize {
        let count = self.selection.clear(&mut self.colors);
        if count > 0 {
            self.colors_changed_all();
        }
        count
    }

    fn colors_changed_all(&mut self) {
        if let Some(instances) = &mut self.instances {
            instances.rebuild(&self.points, &self.colors);
        }
        self.restore_closure(0..1);
    }

    /// Selects, adds to or removes from the selection every visible point
    /// inside `frustum` and the optional clip volume.
    ///
    /// Returns the number of points whose selection state changed.
    pub fn frustum_select(
        &mut self,
        frustum: &Frustum,
        clip: Option<&OrientedBox>,
        mode: SelectMode,
    ) -> usize {
        if !self.enabled {
            return 0;
        }
        let world = self.world_matrix();
        let inside: Vec<usize> = (0..self.user_point_count())
            .filter(|&i| self.is_point_visible(i))
            .filter(|&i| {
                let Some(local) = self.local_point(i) else {
                    return false;
                };
                let p = world.transform_point3(local);
                frustum.contains_point(p) && clip.map_or(true, |c| c.contains_point(p))
            })
            .collect();

        let mut changed = 0;
        if mode == SelectMode::Replace {
            let stale: Vec<usize> = self
                .selection
                .indices()
                .filter(|i| inside.binary_search(i).is_err())
                .collect();
            for i in stale {
                changed += usize::from(self.selection.deselect(i, &mut self.colors));
            }
        }
        for &i in &inside {
            changed += usize::from(match mode {
                SelectMode::Add | SelectMode::Replace => self.selection.select(i, &mut self.colors),
                SelectMode::Remove => self.selection.deselect(i, &mut self.colors),
            });
        }
        if changed > 0 {
            self.colors_changed_all();
        }
        log::debug!("'{}' frustum select {mode:?}: {changed} changed", self.name);
        changed
    }
}

impl Primitive for PointSequence {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }

    fn bounding_box(&self) -> Option<Aabb> {
        let world = self.world_matrix();
        self.local_bounds.map(|b| b.transformed(&world))
    }

    fn transform(&self) -> DMat4 {
        self.transform
    }

    fn set_transform(&mut self, transform: DMat4) {
        self.transform = transform;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn dispose(&mut self, markers: &mut MarkerRegistry) {
        self.points.release();
        self.colors.release();
        if let Some(visibility) = &mut self.visibility {
            visibility.release();
        }
        if let Some(instances) = &mut self.instances {
            instances.release();
        }
        self.attributes.clear();
        self.selection.forget();
        self.labels = None;
        if let Some(marker) = self.marker.take() {
            markers.release(marker);
        }
        self.closed = false;
        self.origin = DVec3::ZERO;
        self.local_bounds = None;
        self.local_sphere = None;
        log::debug!("'{}' disposed", self.name);
    }
}

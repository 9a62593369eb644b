//! Primitive trait.
//!
//! A [`Primitive`] is a geological survey object placed in the scene, such as a
//! polyline, a drillhole trace, a point cloud or a section plane.

use std::any::Any;

use glam::DMat4;

use crate::geometry::Aabb;
use crate::markers::MarkerRegistry;
use crate::pick::Raycast;

/// A survey object managed by the scene.
///
/// Each primitive has:
/// - A unique name
/// - A world transform
/// - An enabled (visible) state
/// - Ray picking through [`Raycast`]
pub trait Primitive: Raycast + Any + Send + Sync {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the unique name of this primitive.
    fn name(&self) -> &str;

    /// Returns the type name of this primitive (e.g., "`Polyline`", "`PointCloud`").
    fn type_name(&self) -> &'static str;

    /// Returns the axis-aligned bounding box in world coordinates.
    ///
    /// Returns `None` if the primitive has no spatial extent.
    fn bounding_box(&self) -> Option<Aabb>;

    /// Returns the parent world transform.
    fn transform(&self) -> DMat4;

    /// Sets the parent world transform.
    fn set_transform(&mut self, transform: DMat4);

    /// Returns whether this primitive is currently visible.
    fn is_enabled(&self) -> bool;

    /// Sets the visibility of this primitive.
    fn set_enabled(&mut self, enabled: bool);

    /// Whether this primitive is a filled surface for hit ordering purposes.
    fn is_solid(&self) -> bool {
        false
    }

    /// Releases all buffers and shared resources held by this primitive.
    fn dispose(&mut self, markers: &mut MarkerRegistry);
}

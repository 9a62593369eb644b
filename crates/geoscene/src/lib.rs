//! geoscene-rs: a dynamic vector geometry store with ray picking for
//! geological survey primitives.
//!
//! Polylines, interval-pair traces and point clouds keep their coordinates in
//! growable GPU-ready buffers that are edited in place as points are inserted,
//! deleted or recolored. A [`Scene`] owns the registered primitives and casts
//! rays against all of them at once.
//!
//! # Quick Start
//!
//! ```
//! use geoscene::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!     let mut scene = Scene::default();
//!
//!     let hole = scene.register_polyline("outline")?;
//!     hole.add_points(vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 10.0, 0.0], None)?;
//!     hole.close();
//!
//!     let ray = Ray::new(DVec3::new(5.0, 0.0, 10.0), DVec3::NEG_Z);
//!     let hits = scene.raycast(&ray, &scene.default_params());
//!     assert_eq!(hits[0].object, "outline");
//!     Ok(())
//! }
//! ```

mod scene;

pub use geoscene_core::{
    average_scale, sort_hits, Aabb, BoundingSphere, DMat3, DMat4, DQuat, DVec3, Frustum,
    GeoSceneError, GrowthPolicy, Hit, HitKind, MarkerHandle, MarkerRegistry, MarkerSymbol,
    MarkerTexture, Options, OrientedBox, Plane, Primitive, Ray, Raycast, RaycastParams, Registry,
    Result, SnapMode,
};
pub use geoscene_structures::{
    AttributeKind, AttributeTable, AttributeValue, ColorInput, GrowableBuffer, IndexRange,
    IntervalInstances, LabelAction, LabelChannel, LabelSink, LabelUpdate, PointInput,
    PointSequence, SectionPlane, SectionPlaneUniforms, SelectMode, Selection, Shape,
};
pub use scene::Scene;

/// Initializes the `env_logger` backend for the `log` facade.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::info!("geoscene-rs logging initialized");
    }
}

//! Core abstractions for geoscene-rs.
//!
//! This crate provides the fundamental traits and types used throughout geoscene-rs:
//! - [`Primitive`] trait for survey objects (polylines, traces, point clouds, planes)
//! - Double precision math primitives for picking and clipping
//! - Hit records, snap modes and hit ordering
//! - The primitive registry, shared marker textures and configuration options

// Marker rasterization casts pixel indices to floats
#![allow(clippy::cast_precision_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod geometry;
pub mod markers;
pub mod options;
pub mod pick;
pub mod registry;
pub mod structure;

pub use error::{GeoSceneError, Result};
pub use geometry::{average_scale, Aabb, BoundingSphere, Frustum, OrientedBox, Plane, Ray};
pub use markers::{MarkerHandle, MarkerRegistry, MarkerSymbol, MarkerTexture};
pub use options::{GrowthPolicy, Options};
pub use pick::{sort_hits, Hit, HitKind, Raycast, RaycastParams, SnapMode};
pub use registry::Registry;
pub use structure::Primitive;

// Re-export glam types for convenience
pub use glam::{DMat3, DMat4, DQuat, DVec3};

//! Primitive implementations for geoscene-rs.
//!
//! This crate provides the editable survey primitives:
//! - Polylines (optionally closed outlines)
//! - Traces (disjoint interval pairs such as drill-hole runs)
//! - Point clouds with per-point visibility and shared markers
//! - Section planes
//!
//! All point primitives share [`PointSequence`], which stores positions as
//! `f32` offsets from a re-homed origin in growable GPU-ready buffers.

// Buffers store f32 offsets and u8 colors derived from f64 world values
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod attributes;
pub mod buffer;
pub mod input;
pub mod labels;
pub mod section_plane;
pub mod sequence;

pub use attributes::{AttributeKind, AttributeTable, AttributeValue};
pub use buffer::GrowableBuffer;
pub use input::PointInput;
pub use labels::{LabelAction, LabelChannel, LabelSink, LabelUpdate};
pub use section_plane::{SectionPlane, SectionPlaneUniforms};
pub use sequence::intervals::IntervalInstances;
pub use sequence::selection::{SelectMode, Selection};
pub use sequence::{ColorInput, IndexRange, PointSequence, Shape};

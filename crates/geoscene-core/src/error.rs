//! Error types for geoscene-rs.

use thiserror::Error;

/// The main error type for geoscene-rs operations.
///
/// Geometry edits validate their arguments before touching any buffer, so an
/// `Err` always means the call left the primitive unchanged.
#[derive(Error, Debug)]
pub enum GeoSceneError {
    /// An index was out of range for the current point count.
    #[error("invalid index {index} (point count {count})")]
    InvalidIndex { index: usize, count: usize },

    /// A coordinate input was missing a component or had a bad length.
    #[error("invalid coordinate shape: {0}")]
    InvalidCoordinateShape(String),

    /// A range had its start after its end.
    #[error("range start {start} is after range end {end}")]
    RangeOrder { start: usize, end: usize },

    /// A batched range list was not sorted or had overlapping entries.
    #[error("ranges must be sorted and non-overlapping")]
    UnsortedRanges,

    /// The number of colors did not match the number of points.
    #[error("color count mismatch: expected {expected}, got {actual}")]
    ColorCountMismatch { expected: usize, actual: usize },

    /// An attribute column with the given key already exists.
    #[error("attribute '{0}' already exists")]
    AttributeExists(String),

    /// An attribute column with the given key was not found.
    #[error("attribute '{0}' not found")]
    AttributeNotFound(String),

    /// A value of the wrong kind was written to an attribute column.
    #[error("attribute '{key}' holds {expected} values")]
    AttributeKindMismatch { key: String, expected: &'static str },

    /// A primitive with the given name already exists.
    #[error("primitive '{0}' already exists")]
    PrimitiveExists(String),

    /// A primitive with the given name was not found.
    #[error("primitive '{0}' not found")]
    PrimitiveNotFound(String),

    /// A marker symbol name is not known to the marker registry.
    #[error("unknown marker symbol '{0}'")]
    UnknownMarker(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for geoscene-rs operations.
pub type Result<T> = std::result::Result<T, GeoSceneError>;

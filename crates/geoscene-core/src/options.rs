//! Configuration options for geoscene.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pick::DEFAULT_TIE_EPSILON;

/// How a growable buffer picks its new capacity when it runs out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Double the capacity, but always leave at least `min_slack` spare items.
    Geometric { min_slack: usize },
    /// Grow to exactly what is needed plus `slack` spare items.
    Constant { slack: usize },
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::Geometric { min_slack: 16 }
    }
}

impl GrowthPolicy {
    /// Returns the item capacity to allocate when `required` items must fit
    /// into a buffer that currently holds `capacity` items.
    #[must_use]
    pub fn next_capacity(self, capacity: usize, required: usize) -> usize {
        match self {
            Self::Geometric { min_slack } => (capacity * 2).max(required + min_slack),
            Self::Constant { slack } => required + slack,
        }
    }
}

/// Global configuration options for geoscene primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Buffer growth policy for point, color and attribute storage.
    pub growth: GrowthPolicy,

    /// Color given to points added without an explicit color.
    pub default_color: [u8; 3],

    /// Color used to render selected points.
    pub highlight_color: [u8; 3],

    /// Per-axis tolerance used by point lookup, in world units. Stored
    /// coordinates are `f32` offsets from the local origin.
    pub find_epsilon: f64,

    /// Distance under which a line hit is considered to sit on a shared joint.
    pub joint_epsilon: f64,

    /// Distance under which two hits are considered coincident when ordering.
    pub tie_epsilon: f64,

    /// Default world-space line pick threshold.
    pub line_threshold: f64,

    /// Default world-space point pick threshold.
    pub point_threshold: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            growth: GrowthPolicy::default(),
            default_color: [255, 255, 255],
            highlight_color: [255, 255, 0],
            find_epsilon: 1e-4,
            joint_epsilon: 1e-6,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            line_threshold: 0.1,
            point_threshold: 0.1,
        }
    }
}

impl Options {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric_growth() {
        let policy = GrowthPolicy::Geometric { min_slack: 4 };
        assert_eq!(policy.next_capacity(0, 3), 7);
        assert_eq!(policy.next_capacity(100, 101), 200);
        assert_eq!(policy.next_capacity(10, 40), 44);
    }

    #[test]
    fn test_constant_growth() {
        let policy = GrowthPolicy::Constant { slack: 10 };
        assert_eq!(policy.next_capacity(100, 101), 111);
    }

    #[test]
    fn test_options_json_defaults() {
        let options = Options::from_json(r#"{ "default_color": [10, 20, 30] }"#).unwrap();
        assert_eq!(options.default_color, [10, 20, 30]);
        assert_eq!(options.growth, GrowthPolicy::default());
        assert_eq!(options.tie_epsilon, DEFAULT_TIE_EPSILON);
    }

    #[test]
    fn test_options_json_growth() {
        let options =
            Options::from_json(r#"{ "growth": { "kind": "constant", "slack": 100 } }"#).unwrap();
        assert_eq!(options.growth, GrowthPolicy::Constant { slack: 100 });

        let round = Options::from_json(&options.to_json().unwrap()).unwrap();
        assert_eq!(round, options);
    }

    #[test]
    fn test_options_json_error() {
        assert!(Options::from_json("{ not json").is_err());
    }
}

//! Ray picking: snap policies, hit records and hit ordering.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{OrientedBox, Ray};

/// Default distance under which two hits are considered coincident.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-3;

/// Picking policy restricting which hit types a ray query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SnapMode {
    /// No snapping; vertices win over lines.
    #[default]
    None,
    /// Only vertices are reported.
    Points,
    /// Only lines are reported, with joint duplicates suppressed.
    Lines,
    /// Vertices and lines.
    All,
    /// Lines, with the foot of the perpendicular from a reference point as child.
    Perpendicular,
    /// Lines, with the segment midpoint as child.
    Bisector,
}

impl SnapMode {
    /// Whether this mode runs the vertex proximity test.
    #[must_use]
    pub fn tests_points(self) -> bool {
        matches!(self, Self::None | Self::Points | Self::All)
    }

    /// Whether this mode runs the segment proximity test.
    #[must_use]
    pub fn tests_lines(self) -> bool {
        !matches!(self, Self::Points)
    }
}

/// What a hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitKind {
    /// A vertex of a point sequence; `index` is the point index.
    Point,
    /// A segment of a point sequence; `index` is the segment start.
    Segment,
    /// The surface of a solid primitive.
    Surface,
}

/// A single ray hit, in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Distance from the ray origin to the closest point on the ray.
    pub distance: f64,
    /// Hit position on the primitive.
    pub point: DVec3,
    /// Element index (point or segment start).
    pub index: usize,
    /// Element kind.
    pub kind: HitKind,
    /// Name of the primitive that was hit.
    pub object: String,
    /// Snap-mode specific secondary point (perpendicular foot, midpoint).
    pub child: Option<DVec3>,
    /// Whether the hit primitive is a solid/filled surface.
    pub solid: bool,
    /// Name of the parent primitive, if any.
    pub parent: Option<String>,
}

/// Parameters for a single raycast query.
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastParams {
    /// World-space distance from a line under which a segment counts as hit.
    pub line_threshold: f64,
    /// World-space distance from a vertex under which the vertex counts as hit.
    pub point_threshold: f64,
    /// Snap policy.
    pub snap_mode: SnapMode,
    /// Optional clipping volume; elements outside it are never hit.
    pub clip: Option<OrientedBox>,
    /// Reference points for [`SnapMode::Perpendicular`]; at most two are used.
    pub reference_points: Vec<DVec3>,
}

impl Default for RaycastParams {
    fn default() -> Self {
        Self {
            line_threshold: 0.1,
            point_threshold: 0.1,
            snap_mode: SnapMode::None,
            clip: None,
            reference_points: Vec::new(),
        }
    }
}

impl RaycastParams {
    /// Creates parameters with the given thresholds and no snapping.
    #[must_use]
    pub fn new(line_threshold: f64, point_threshold: f64) -> Self {
        Self {
            line_threshold,
            point_threshold,
            ..Self::default()
        }
    }

    /// Sets the snap mode.
    #[must_use]
    pub fn with_snap_mode(mut self, snap_mode: SnapMode) -> Self {
        self.snap_mode = snap_mode;
        self
    }

    /// Sets the clipping volume.
    #[must_use]
    pub fn with_clip(mut self, clip: OrientedBox) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Sets the reference points used by perpendicular snapping.
    #[must_use]
    pub fn with_reference_points(mut self, points: Vec<DVec3>) -> Self {
        self.reference_points = points;
        self
    }
}

/// Something a ray can be cast against.
pub trait Raycast {
    /// Appends every hit along `ray` to `hits`, unordered.
    fn raycast(&self, ray: &Ray, params: &RaycastParams, hits: &mut Vec<Hit>);
}

/// Sorts hits ascending by distance and applies the thin-over-solid tie-break.
///
/// When the two nearest hits are within `tie_epsilon` of each other and the
/// nearer one belongs to a solid primitive while the second does not (or the
/// second is the solid's own parent), the two are swapped so that lines and
/// points drawn flush against a face stay pickable.
pub fn sort_hits(hits: &mut [Hit], tie_epsilon: f64) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    if hits.len() < 2 {
        return;
    }
    let (first, second) = (&hits[0], &hits[1]);
    if (second.distance - first.distance).abs() >= tie_epsilon || !first.solid {
        return;
    }
    let second_is_parent = first.parent.as_deref() == Some(second.object.as_str());
    if !second.solid || second_is_parent {
        hits.swap(0, 1);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn hit(object: &str, distance: f64, solid: bool) -> Hit {
        Hit {
            distance,
            point: DVec3::ZERO,
            index: 0,
            kind: if solid { HitKind::Surface } else { HitKind::Segment },
            object: object.to_string(),
            child: None,
            solid,
            parent: None,
        }
    }

    #[test]
    fn test_snap_mode_tests() {
        assert!(SnapMode::None.tests_points());
        assert!(SnapMode::All.tests_points());
        assert!(!SnapMode::Lines.tests_points());
        assert!(!SnapMode::Points.tests_lines());
        assert!(SnapMode::Bisector.tests_lines());
    }

    #[test]
    fn test_sort_hits_by_distance() {
        let mut hits = vec![hit("c", 3.0, false), hit("a", 1.0, false), hit("b", 2.0, false)];
        sort_hits(&mut hits, DEFAULT_TIE_EPSILON);
        let names: Vec<_> = hits.iter().map(|h| h.object.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_thin_primitive_wins_tie_against_solid() {
        let mut hits = vec![hit("line", 5.0005, false), hit("face", 5.0, true)];
        sort_hits(&mut hits, DEFAULT_TIE_EPSILON);
        assert_eq!(hits[0].object, "line");
    }

    #[test]
    fn test_no_swap_outside_epsilon() {
        let mut hits = vec![hit("line", 5.01, false), hit("face", 5.0, true)];
        sort_hits(&mut hits, DEFAULT_TIE_EPSILON);
        assert_eq!(hits[0].object, "face");
    }

    #[test]
    fn test_solid_parent_swap() {
        let mut child = hit("face", 5.0, true);
        child.parent = Some("block".to_string());
        let mut hits = vec![child, hit("block", 5.0002, true)];
        sort_hits(&mut hits, DEFAULT_TIE_EPSILON);
        assert_eq!(hits[0].object, "block");

        let mut hits = vec![hit("a", 5.0, true), hit("b", 5.0002, true)];
        sort_hits(&mut hits, DEFAULT_TIE_EPSILON);
        assert_eq!(hits[0].object, "a");
    }

    proptest! {
        #[test]
        fn test_sorted_after_the_nearest_pair(
            hits in prop::collection::vec((0.0f64..100.0, any::<bool>()), 0..20)
        ) {
            let mut hits: Vec<Hit> = hits
                .iter()
                .enumerate()
                .map(|(i, (d, solid))| hit(&i.to_string(), *d, *solid))
                .collect();
            let count = hits.len();
            sort_hits(&mut hits, DEFAULT_TIE_EPSILON);
            prop_assert_eq!(hits.len(), count);
            for pair in hits.windows(2).skip(1) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
            if count >= 2 {
                prop_assert!((hits[0].distance - hits[1].distance).abs() < DEFAULT_TIE_EPSILON
                    || hits[0].distance <= hits[1].distance);
            }
        }
    }
}

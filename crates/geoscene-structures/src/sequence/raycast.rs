//! Ray picking against a point sequence.
//!
//! The world ray is taken into the sequence's local frame once and both pick
//! thresholds are divided by the frame's average scale, so the per-segment
//! loop runs on the stored coordinates directly. Hits are reported back in
//! world space.

use geoscene_core::{
    average_scale, DMat4, DVec3, Hit, HitKind, Ray, Raycast, RaycastParams, SnapMode,
};

use super::{PointSequence, Shape};

/// Per-query values shared by the segment and point loops.
struct Query<'a> {
    world: DMat4,
    inverse: DMat4,
    ray: &'a Ray,
    local_ray: Ray,
    params: &'a RaycastParams,
    precision_sq: f64,
    threshold_sq: f64,
    joint_sq: f64,
}

impl Query<'_> {
    fn to_world(&self, local: DVec3) -> DVec3 {
        self.world.transform_point3(local)
    }

    fn inside_clip(&self, local: DVec3) -> bool {
        self.params
            .clip
            .as_ref()
            .map_or(true, |clip| clip.contains_point(self.to_world(local)))
    }
}

impl PointSequence {
    fn hit(&self, query: &Query<'_>, on_ray: DVec3, point: DVec3, index: usize, kind: HitKind) -> Hit {
        Hit {
            distance: query.ray.origin.distance(query.to_world(on_ray)),
            point: query.to_world(point),
            index,
            kind,
            object: self.name.clone(),
            child: None,
            solid: false,
            parent: self.parent.clone(),
        }
    }

    fn raycast_segments(&self, query: &Query<'_>, hits: &mut Vec<Hit>) {
        let snap = query.params.snap_mode;
        let count = self.len();
        // a closed polyline's last vertex is point 0 again
        let closing = self.closed.then(|| count - 2);
        let mut first_reported = false;
        let mut i = 0;
        while i + 1 < count {
            let (Some(v0), Some(v1)) = (self.local_point(i), self.local_point(i + 1)) else {
                break;
            };
            if !query.inside_clip(v0) && !query.inside_clip(v1) {
                i += 1;
                continue;
            }
            let approach = query.local_ray.approach_segment(v0, v1);

            if snap.tests_points() {
                let end_is_closer = approach.on_segment.distance_squared(v1)
                    < approach.on_segment.distance_squared(v0);
                let (index, vertex) = if end_is_closer { (i + 1, v1) } else { (i, v0) };
                if approach.on_segment.distance_squared(vertex) < query.threshold_sq
                    && query.local_ray.distance_sq_to_point(vertex) < query.threshold_sq
                    && query.inside_clip(vertex)
                {
                    let index = if closing == Some(i) && index == i + 1 { 0 } else { index };
                    if index != 0 || !first_reported {
                        first_reported |= index == 0;
                        let on_ray = query.local_ray.closest_point_to_point(vertex);
                        hits.push(self.hit(query, on_ray, vertex, index, HitKind::Point));
                    }
                    // the end vertex is the next segment's start
                    i += if end_is_closer { 2 } else { 1 };
                    continue;
                }
            }

            if snap.tests_lines() && approach.distance_sq < query.precision_sq {
                let child = match snap {
                    SnapMode::Lines
                        if (i > 0
                            && approach.on_segment.distance_squared(v0) < query.joint_sq)
                            || (closing == Some(i)
                                && approach.on_segment.distance_squared(v1) < query.joint_sq) =>
                    {
                        i += 1;
                        continue;
                    }
                    SnapMode::Perpendicular => {
                        let Some(foot) = self.perpendicular_foot(query, v0, v1) else {
                            i += 1;
                            continue;
                        };
                        Some(query.to_world(foot))
                    }
                    SnapMode::Bisector => Some(query.to_world((v0 + v1) * 0.5)),
                    _ => None,
                };
                let mut hit = self.hit(query, approach.on_ray, approach.on_segment, i, HitKind::Segment);
                hit.child = child;
                hits.push(hit);
            }
            i += 1;
        }
    }

    /// First reference point whose projection falls strictly inside the segment.
    fn perpendicular_foot(&self, query: &Query<'_>, v0: DVec3, v1: DVec3) -> Option<DVec3> {
        let axis = v1 - v0;
        let length = axis.length();
        if length <= f64::EPSILON {
            return None;
        }
        let dir = axis / length;
        query
            .params
            .reference_points
            .iter()
            .take(2)
            .map(|&r| (query.inverse.transform_point3(r) - v0).dot(dir))
            .find(|&t| t > 0.0 && t < length)
            .map(|t| v0 + dir * t)
    }

    fn raycast_points(&self, query: &Query<'_>, hits: &mut Vec<Hit>) {
        if !query.params.snap_mode.tests_points() {
            return;
        }
        for (i, p) in self.local_points().enumerate() {
            if !self.is_point_visible(i) || !query.inside_clip(p) {
                continue;
            }
            if query.local_ray.distance_sq_to_point(p) < query.threshold_sq {
                let on_ray = query.local_ray.closest_point_to_point(p);
                hits.push(self.hit(query, on_ray, p, i, HitKind::Point));
            }
        }
    }

    /// Casts a ray and returns the hits sorted by distance.
    #[must_use]
    pub fn intersect(&self, ray: &Ray, params: &RaycastParams) -> Vec<Hit> {
        let mut hits = Vec::new();
        self.raycast(ray, params, &mut hits);
        geoscene_core::sort_hits(&mut hits, self.options.tie_epsilon);
        hits
    }
}

impl Raycast for PointSequence {
    fn raycast(&self, ray: &Ray, params: &RaycastParams, hits: &mut Vec<Hit>) {
        if !self.enabled || self.is_empty() {
            return;
        }
        let world = self.world_matrix();
        let scale = average_scale(&world);
        if scale <= f64::EPSILON {
            return;
        }
        let inverse = world.inverse();
        let local_ray = ray.transformed(&inverse);
        let precision = params.line_threshold / scale;
        let threshold = params.point_threshold / scale;

        let Some(sphere) = self.local_sphere() else {
            return;
        };
        if !local_ray.intersects_sphere(&sphere.expanded(precision.max(threshold))) {
            return;
        }
        if params.clip.as_ref().is_some_and(|clip| !clip.intersects_ray(ray)) {
            return;
        }

        let joint = self.options.joint_epsilon / scale;
        let query = Query {
            world,
            inverse,
            ray,
            local_ray,
            params,
            precision_sq: precision * precision,
            threshold_sq: threshold * threshold,
            joint_sq: joint * joint,
        };
        match self.shape {
            Shape::Polyline | Shape::IntervalPair => self.raycast_segments(&query, hits),
            Shape::PointCloud => self.raycast_points(&query, hits),
        }
    }
}

#[cfg(test)]
mod tests {
    use geoscene_core::{DMat3, DQuat, OrientedBox, Options, Primitive};

    use super::*;

    fn corner() -> PointSequence {
        let mut seq = PointSequence::polyline("corner", Options::default());
        seq.add_points(vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 10.0, 0.0], None)
            .unwrap();
        seq
    }

    fn down_through(x: f64, y: f64) -> Ray {
        Ray::new(DVec3::new(x, y, 100.0), DVec3::NEG_Z)
    }

    #[test]
    fn test_segment_hits() {
        let seq = corner();
        let params = RaycastParams::new(0.1, 0.1);

        let hits = seq.intersect(&down_through(5.0, 0.0), &params);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, HitKind::Segment);
        assert_eq!(hits[0].index, 0);
        assert!((hits[0].point - DVec3::new(5.0, 0.0, 0.0)).length() < 1e-9);
        assert!((hits[0].distance - 100.0).abs() < 1e-9);
        assert_eq!(hits[0].object, "corner");

        let hits = seq.intersect(&down_through(10.0, 5.0), &params);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Segment, 1));

        assert!(seq.intersect(&down_through(5.0, 5.0), &params).is_empty());
    }

    #[test]
    fn test_point_snap_precedence() {
        let seq = corner();
        let params = RaycastParams::new(0.1, 0.1).with_snap_mode(SnapMode::Points);
        let hits = seq.intersect(&down_through(10.02, 0.01), &params);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Point, 1));
        assert!((hits[0].point - DVec3::new(10.0, 0.0, 0.0)).length() < 1e-9);

        // a ray along a segment but away from any vertex is not a point hit
        assert!(seq.intersect(&down_through(5.0, 0.0), &params).is_empty());
    }

    #[test]
    fn test_default_mode_prefers_vertex() {
        let seq = corner();
        let hits = seq.intersect(&down_through(0.0, 0.0), &RaycastParams::default());
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Point, 0));
    }

    #[test]
    fn test_lines_mode_reports_joint_once() {
        let seq = corner();
        let params = RaycastParams::new(0.1, 0.1).with_snap_mode(SnapMode::Lines);
        let hits = seq.intersect(&down_through(10.0, 0.0), &params);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Segment, 0));

        let params = params.with_snap_mode(SnapMode::All);
        let hits = seq.intersect(&down_through(10.0, 0.0), &params);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, HitKind::Point);
    }

    #[test]
    fn test_closed_polyline_reports_first_vertex_once() {
        let mut seq = corner();
        seq.add_points(vec![0.0, 10.0, 0.0], None).unwrap();
        assert!(seq.close());
        let ray = down_through(0.0, 0.0);

        for mode in [SnapMode::Points, SnapMode::None, SnapMode::All] {
            let hits = seq.intersect(&ray, &RaycastParams::new(0.1, 0.1).with_snap_mode(mode));
            let found: Vec<_> = hits.iter().map(|h| (h.kind, h.index)).collect();
            assert_eq!(found, [(HitKind::Point, 0)], "{mode:?}");
        }

        let params = RaycastParams::new(0.1, 0.1).with_snap_mode(SnapMode::Lines);
        let hits = seq.intersect(&ray, &params);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Segment, 0));

        // the closing segment itself is still pickable away from the joint
        let hits = seq.intersect(&down_through(0.0, 5.0), &params);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Segment, 3));
    }

    #[test]
    fn test_perpendicular_and_bisector_children() {
        let seq = corner();
        let params = RaycastParams::new(0.1, 0.1)
            .with_snap_mode(SnapMode::Perpendicular)
            .with_reference_points(vec![DVec3::new(-5.0, 3.0, 0.0), DVec3::new(3.0, 8.0, 0.0)]);
        let hits = seq.intersect(&down_through(5.0, 0.0), &params);
        assert_eq!(hits.len(), 1);
        let child = hits[0].child.unwrap();
        assert!((child - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-9);

        // neither reference point projects inside segment 1
        let params = params.with_reference_points(vec![DVec3::new(20.0, -4.0, 0.0)]);
        assert!(seq.intersect(&down_through(10.0, 5.0), &params).is_empty());

        let params = RaycastParams::new(0.1, 0.1).with_snap_mode(SnapMode::Bisector);
        let hits = seq.intersect(&down_through(10.0, 2.0), &params);
        assert!((hits[0].child.unwrap() - DVec3::new(10.0, 5.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_clip_volume_excludes_segments() {
        let seq = corner();
        let clip = OrientedBox::new(DVec3::new(10.0, 10.0, 0.0), DVec3::splat(1.0), DMat3::IDENTITY);
        let params = RaycastParams::new(0.1, 0.1).with_clip(clip);
        // the ray misses the clip box
        assert!(seq.intersect(&down_through(5.0, 0.0), &params).is_empty());

        let clip = OrientedBox::new(DVec3::new(10.0, 5.0, 0.0), DVec3::new(1.0, 6.0, 1.0), DMat3::IDENTITY);
        let params = RaycastParams::new(0.1, 0.1).with_clip(clip);
        let hits = seq.intersect(&down_through(10.0, 5.0), &params);
        assert_eq!((hits[0].kind, hits[0].index), (HitKind::Segment, 1));
    }

    #[test]
    fn test_thresholds_scale_with_transform() {
        let mut seq = corner();
        seq.set_transform(DMat4::from_scale_rotation_translation(
            DVec3::splat(2.0),
            DQuat::IDENTITY,
            DVec3::new(0.0, 0.0, 5.0),
        ));
        // world segment 0 spans x in [0, 20] at z = 5
        let params = RaycastParams::new(0.1, 0.1);
        let hits = seq.intersect(&down_through(12.0, 0.08), &params);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].point - DVec3::new(12.0, 0.0, 5.0)).length() < 1e-9);
        assert!((hits[0].distance - 95.0).abs() < 1e-9);
        assert!(seq.intersect(&down_through(12.0, 0.12), &params).is_empty());
    }

    #[test]
    fn test_point_cloud_skips_hidden_points() {
        let mut cloud = PointSequence::point_cloud("cloud", Options::default());
        cloud
            .add_points(vec![0.0, 0.0, 0.0, 0.0, 0.0, -5.0, 3.0, 0.0, 0.0], None)
            .unwrap();
        let ray = down_through(0.0, 0.0);
        let hits = cloud.intersect(&ray, &RaycastParams::default());
        assert_eq!(hits.iter().map(|h| h.index).collect::<Vec<_>>(), [0, 1]);

        cloud.hide_points(&[0]).unwrap();
        let hits = cloud.intersect(&ray, &RaycastParams::default());
        assert_eq!(hits.iter().map(|h| h.index).collect::<Vec<_>>(), [1]);

        let lines_only = RaycastParams::default().with_snap_mode(SnapMode::Lines);
        assert!(cloud.intersect(&ray, &lines_only).is_empty());

        cloud.set_enabled(false);
        assert!(cloud.intersect(&ray, &RaycastParams::default()).is_empty());
    }
}

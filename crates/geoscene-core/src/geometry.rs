//! Math primitives used by picking, clipping and bounding volume maintenance.
//!
//! All types work in double precision. Survey coordinates are routinely in the
//! millions (projected eastings/northings), so the world-facing side of the API
//! never rounds through `f32`.

use glam::{DMat3, DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

const PARALLEL_EPSILON: f64 = 1e-12;

/// A half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: DVec3,
    /// Unit direction of the ray.
    pub direction: DVec3,
}

/// Closest-approach information between a ray and a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentApproach {
    /// Squared distance between the two closest points.
    pub distance_sq: f64,
    /// Closest point on the ray.
    pub on_ray: DVec3,
    /// Closest point on the segment.
    pub on_segment: DVec3,
    /// Parameter of `on_segment` along the segment, in `[0, 1]`.
    pub segment_t: f64,
}

impl Ray {
    /// Creates a ray, normalizing the direction.
    #[must_use]
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Returns the point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Transforms the ray by an affine matrix.
    #[must_use]
    pub fn transformed(&self, matrix: &DMat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Returns the point on the ray closest to `point`.
    #[must_use]
    pub fn closest_point_to_point(&self, point: DVec3) -> DVec3 {
        let t = (point - self.origin).dot(self.direction);
        if t < 0.0 {
            self.origin
        } else {
            self.at(t)
        }
    }

    /// Squared distance from the ray to `point`.
    #[must_use]
    pub fn distance_sq_to_point(&self, point: DVec3) -> f64 {
        self.closest_point_to_point(point).distance_squared(point)
    }

    /// Closest approach between the ray and the segment `[v0, v1]`.
    #[must_use]
    pub fn approach_segment(&self, v0: DVec3, v1: DVec3) -> SegmentApproach {
        let d1 = self.direction;
        let d2 = v1 - v0;
        let r = self.origin - v0;
        let a = d1.dot(d1);
        let e = d2.dot(d2);
        let f = d2.dot(r);

        let (ray_t, segment_t) = if e <= PARALLEL_EPSILON {
            // Degenerate segment, treat as a point.
            ((-d1.dot(r) / a).max(0.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let c = d1.dot(r);
            let denom = a * e - b * b;
            let mut ray_t = if denom > PARALLEL_EPSILON {
                ((b * f - c * e) / denom).max(0.0)
            } else {
                0.0
            };
            let mut segment_t = (b * ray_t + f) / e;
            if segment_t < 0.0 {
                segment_t = 0.0;
                ray_t = (-c / a).max(0.0);
            } else if segment_t > 1.0 {
                segment_t = 1.0;
                ray_t = ((b - c) / a).max(0.0);
            }
            (ray_t, segment_t)
        };

        let on_ray = self.at(ray_t);
        let on_segment = v0 + d2 * segment_t;
        SegmentApproach {
            distance_sq: on_ray.distance_squared(on_segment),
            on_ray,
            on_segment,
            segment_t,
        }
    }

    /// Returns whether the ray passes through the sphere.
    #[must_use]
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.distance_sq_to_point(sphere.center) <= sphere.radius * sphere.radius
    }

    /// Slab test against an axis-aligned box, returning the entry parameter.
    #[must_use]
    pub fn intersect_box(&self, aabb: &Aabb) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            if d.abs() < PARALLEL_EPSILON {
                if o < aabb.min[axis] || o > aabb.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (aabb.min[axis] - o) * inv;
            let mut t1 = (aabb.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }

    /// Intersection parameter with a plane, if the ray hits it in front of the origin.
    #[must_use]
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f64> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -(plane.normal.dot(self.origin) + plane.constant) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// An inverted box that any point expands.
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Creates a box from two corners.
    #[must_use]
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Computes the bounds of a set of points; `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.expand_by_point(p);
        }
        (!aabb.is_empty()).then_some(aabb)
    }

    /// Returns whether the box contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Grows the box to include `point`.
    pub fn expand_by_point(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Returns the smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent of the box along each axis.
    #[must_use]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Returns whether `point` lies inside or on the box.
    #[must_use]
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns the axis-aligned bounds of this box after an affine transform.
    #[must_use]
    pub fn transformed(&self, matrix: &DMat4) -> Self {
        let mut out = Self::EMPTY;
        for i in 0..8 {
            let corner = DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.expand_by_point(matrix.transform_point3(corner));
        }
        out
    }
}

/// A bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// Sphere center.
    pub center: DVec3,
    /// Sphere radius.
    pub radius: f64,
}

impl BoundingSphere {
    /// Fits a sphere around the points, centered on their bounding box.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec3>,
        I::IntoIter: Clone,
    {
        let iter = points.into_iter();
        let center = Aabb::from_points(iter.clone())?.center();
        let radius_sq = iter.fold(0.0_f64, |acc, p| acc.max(center.distance_squared(p)));
        Some(Self {
            center,
            radius: radius_sq.sqrt(),
        })
    }

    /// Returns a copy with the radius grown by `amount`.
    #[must_use]
    pub fn expanded(&self, amount: f64) -> Self {
        Self {
            center: self.center,
            radius: self.radius + amount,
        }
    }
}

/// An oriented bounding box, used as a clipping volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    /// Box center in world space.
    pub center: DVec3,
    /// Half extents along the box axes.
    pub half_size: DVec3,
    /// Orthonormal box axes as matrix columns.
    pub rotation: DMat3,
}

impl OrientedBox {
    /// Creates an oriented box.
    #[must_use]
    pub fn new(center: DVec3, half_size: DVec3, rotation: DMat3) -> Self {
        Self {
            center,
            half_size,
            rotation,
        }
    }

    /// Expresses a world point in the box frame.
    fn to_local(&self, point: DVec3) -> DVec3 {
        self.rotation.transpose() * (point - self.center)
    }

    /// Returns whether `point` lies inside or on the box.
    #[must_use]
    pub fn contains_point(&self, point: DVec3) -> bool {
        let local = self.to_local(point).abs();
        local.cmple(self.half_size + DVec3::splat(1e-9)).all()
    }

    /// Returns whether the ray passes through the box.
    #[must_use]
    pub fn intersects_ray(&self, ray: &Ray) -> bool {
        let local_ray = Ray::new(
            self.to_local(ray.origin),
            self.rotation.transpose() * ray.direction,
        );
        local_ray
            .intersect_box(&Aabb::new(-self.half_size, self.half_size))
            .is_some()
    }
}

/// A plane in Hessian normal form: `normal · p + constant = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal.
    pub normal: DVec3,
    /// Negative signed distance of the plane from the origin along the normal.
    pub constant: f64,
}

impl Plane {
    /// Creates a plane through `point` with the given normal.
    #[must_use]
    pub fn from_normal_and_point(normal: DVec3, point: DVec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    /// Signed distance from the plane to `point`.
    #[must_use]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.constant
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        point - self.normal * self.distance_to_point(point)
    }

    fn from_row(row: DVec4) -> Self {
        let normal = row.truncate();
        let len = normal.length();
        if len < PARALLEL_EPSILON {
            return Self {
                normal: DVec3::ZERO,
                constant: row.w,
            };
        }
        Self {
            normal: normal / len,
            constant: row.w / len,
        }
    }
}

/// A view frustum bounded by six inward-facing planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near and far planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the frustum from a view-projection matrix with `[0, 1]` clip depth.
    #[must_use]
    pub fn from_matrix(view_projection: &DMat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);
        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Returns whether `point` is inside all six planes.
    #[must_use]
    pub fn contains_point(&self, point: DVec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

/// Average of the axis scale factors of an affine matrix.
#[must_use]
pub fn average_scale(matrix: &DMat4) -> f64 {
    let sx = matrix.x_axis.truncate().length();
    let sy = matrix.y_axis.truncate().length();
    let sz = matrix.z_axis.truncate().length();
    (sx + sy + sz) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_segment_perpendicular() {
        let ray = Ray::new(DVec3::new(5.0, 0.0, 10.0), DVec3::NEG_Z);
        let approach = ray.approach_segment(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
        assert!(approach.distance_sq < 1e-12);
        assert!((approach.on_segment - DVec3::new(5.0, 0.0, 0.0)).length() < 1e-9);
        assert!((approach.segment_t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ray_segment_clamped_to_endpoint() {
        let ray = Ray::new(DVec3::new(12.0, 1.0, 10.0), DVec3::NEG_Z);
        let approach = ray.approach_segment(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
        assert!((approach.segment_t - 1.0).abs() < 1e-12);
        assert!((approach.distance_sq - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_segment_parallel() {
        let ray = Ray::new(DVec3::new(-5.0, 1.0, 0.0), DVec3::X);
        let approach = ray.approach_segment(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
        assert!((approach.distance_sq - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_behind_origin_is_clamped() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::NEG_Z);
        assert_eq!(ray.closest_point_to_point(DVec3::ZERO), ray.origin);
        assert!((ray.distance_sq_to_point(DVec3::ZERO) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_ray_box_and_sphere() {
        let ray = Ray::new(DVec3::new(0.5, 0.5, 5.0), DVec3::NEG_Z);
        let aabb = Aabb::new(DVec3::ZERO, DVec3::ONE);
        assert!((ray.intersect_box(&aabb).unwrap() - 4.0).abs() < 1e-12);
        let miss = Ray::new(DVec3::new(2.0, 2.0, 5.0), DVec3::NEG_Z);
        assert!(miss.intersect_box(&aabb).is_none());

        let sphere = BoundingSphere {
            center: DVec3::ZERO,
            radius: 1.0,
        };
        assert!(ray.intersects_sphere(&sphere));
        assert!(!miss.intersects_sphere(&sphere));
        assert!(miss.intersects_sphere(&sphere.expanded(2.0)));
    }

    #[test]
    fn test_aabb_transform() {
        let aabb = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let moved = aabb.transformed(&DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0)));
        assert_eq!(moved.min, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(moved.max, DVec3::new(11.0, 1.0, 1.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_bounding_sphere_from_points() {
        let pts = [DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)];
        let sphere = BoundingSphere::from_points(pts).unwrap();
        assert_eq!(sphere.center, DVec3::new(1.0, 0.0, 0.0));
        assert!((sphere.radius - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_oriented_box() {
        let rotation = DMat3::from_rotation_z(std::f64::consts::FRAC_PI_4);
        let obb = OrientedBox::new(DVec3::ZERO, DVec3::new(1.0, 0.1, 1.0), rotation);
        // A point along the rotated x axis is inside, the same distance along world x is not.
        assert!(obb.contains_point(rotation * DVec3::new(0.9, 0.0, 0.0)));
        assert!(!obb.contains_point(DVec3::new(0.9, 0.0, 0.0)));

        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        assert!(obb.intersects_ray(&ray));
        let away = Ray::new(DVec3::new(5.0, 5.0, 5.0), DVec3::NEG_Z);
        assert!(!obb.intersects_ray(&away));
    }

    #[test]
    fn test_plane_projection() {
        let plane = Plane::from_normal_and_point(DVec3::Z, DVec3::new(0.0, 0.0, 2.0));
        assert!((plane.distance_to_point(DVec3::new(1.0, 1.0, 5.0)) - 3.0).abs() < 1e-12);
        assert_eq!(
            plane.project_point(DVec3::new(1.0, 1.0, 5.0)),
            DVec3::new(1.0, 1.0, 2.0)
        );
        let ray = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::NEG_Z);
        assert!((ray.intersect_plane(&plane).unwrap() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_frustum_contains() {
        let view = DMat4::look_at_rh(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        let proj = DMat4::perspective_rh(std::f64::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_matrix(&(proj * view));
        assert!(frustum.contains_point(DVec3::ZERO));
        assert!(!frustum.contains_point(DVec3::new(0.0, 0.0, 20.0)));
        assert!(!frustum.contains_point(DVec3::new(50.0, 0.0, 0.0)));
    }

    #[test]
    fn test_average_scale() {
        let m = DMat4::from_scale(DVec3::new(1.0, 2.0, 3.0));
        assert!((average_scale(&m) - 2.0).abs() < 1e-12);
    }
}

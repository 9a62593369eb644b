//! Section planes for cutting geological cross-sections.
//!
//! A section plane is a bounded rectangle placed in the scene. It is a solid
//! primitive: it reports surface hits, and lines or points drawn flush against
//! it win picking ties.

use std::any::Any;

use geoscene_core::{
    Aabb, DMat3, DMat4, DVec3, Hit, HitKind, MarkerRegistry, Plane, Primitive, Ray, Raycast,
    RaycastParams,
};

/// A bounded, oriented section plane.
///
/// The plane is defined by a point (origin) and a normal direction, in the
/// parent frame given by the transform. Its in-plane axes are horizontal
/// (`u`) and dip direction (`v`), unless the plane itself is horizontal.
#[derive(Debug, Clone)]
pub struct SectionPlane {
    /// Unique name of the section plane.
    name: String,
    /// Center of the rectangle.
    origin: DVec3,
    /// Unit normal; points toward kept geometry.
    normal: DVec3,
    /// Half width along `u` and half height along `v`.
    half_extents: [f64; 2],
    /// Whether the plane is visible and pickable.
    enabled: bool,
    /// Fill color.
    color: [u8; 3],
    /// Transparency of the fill (0.0 = transparent, 1.0 = opaque).
    transparency: f32,
    transform: DMat4,
    parent: Option<String>,
}

impl SectionPlane {
    /// Creates a vertical east-west section through the origin, 100 units
    /// wide and tall.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_pose(name, DVec3::ZERO, DVec3::Y)
    }

    /// Creates a section plane with a specific pose.
    pub fn with_pose(name: impl Into<String>, origin: DVec3, normal: DVec3) -> Self {
        Self {
            name: name.into(),
            origin,
            normal: normal.normalize_or_zero(),
            half_extents: [50.0, 50.0],
            enabled: true,
            color: [128, 128, 128],
            transparency: 0.3,
            transform: DMat4::IDENTITY,
            parent: None,
        }
    }

    /// Returns the center of the plane.
    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Sets both origin and normal at once.
    pub fn set_pose(&mut self, origin: DVec3, normal: DVec3) -> &mut Self {
        self.origin = origin;
        self.normal = normal.normalize_or_zero();
        self
    }

    /// Half width and half height.
    #[must_use]
    pub fn half_extents(&self) -> [f64; 2] {
        self.half_extents
    }

    /// Sets the half width and half height.
    pub fn set_half_extents(&mut self, half_width: f64, half_height: f64) -> &mut Self {
        self.half_extents = [half_width.abs(), half_height.abs()];
        self
    }

    /// Returns the fill color.
    #[must_use]
    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// Sets the fill color.
    pub fn set_color(&mut self, color: [u8; 3]) -> &mut Self {
        self.color = color;
        self
    }

    /// Returns the fill transparency.
    #[must_use]
    pub fn transparency(&self) -> f32 {
        self.transparency
    }

    /// Sets the fill transparency.
    pub fn set_transparency(&mut self, transparency: f32) -> &mut Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }

    /// Name of the primitive this plane belongs to.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Attaches the plane to a parent primitive for hit ordering.
    pub fn set_parent(&mut self, parent: Option<String>) -> &mut Self {
        self.parent = parent;
        self
    }

    /// In-plane axes `(u, v)` in the parent frame.
    #[must_use]
    pub fn axes(&self) -> (DVec3, DVec3) {
        let horizontal = DVec3::Z.cross(self.normal);
        let u = if horizontal.length_squared() < 1e-12 {
            DVec3::X
        } else {
            horizontal.normalize()
        };
        (u, self.normal.cross(u))
    }

    /// Corners of the rectangle in world space.
    #[must_use]
    pub fn corners(&self) -> [DVec3; 4] {
        let (u, v) = self.axes();
        let (du, dv) = (u * self.half_extents[0], v * self.half_extents[1]);
        [
            self.origin - du - dv,
            self.origin + du - dv,
            self.origin + du + dv,
            self.origin - du + dv,
        ]
        .map(|p| self.transform.transform_point3(p))
    }

    /// The unbounded plane in world space.
    #[must_use]
    pub fn plane(&self) -> Plane {
        let normal = DMat3::from_mat4(self.transform).inverse().transpose() * self.normal;
        Plane::from_normal_and_point(normal, self.transform.transform_point3(self.origin))
    }

    /// Returns the signed distance from a world point to the plane.
    ///
    /// Positive values are on the normal side (kept), negative on the opposite.
    #[must_use]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.plane().distance_to_point(point)
    }

    /// Returns whether a world point is on the kept side of the plane.
    #[must_use]
    pub fn is_kept(&self, point: DVec3) -> bool {
        !self.enabled || self.signed_distance(point) >= 0.0
    }

    /// Projects a world point onto the plane.
    #[must_use]
    pub fn project(&self, point: DVec3) -> DVec3 {
        self.plane().project_point(point)
    }
}

impl Default for SectionPlane {
    fn default() -> Self {
        Self::new("section")
    }
}

/// GPU-compatible section plane uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SectionPlaneUniforms {
    /// World center of the plane.
    pub origin: [f32; 3],
    /// Whether the plane is enabled (1.0) or disabled (0.0).
    pub enabled: f32,
    /// World normal of the plane.
    pub normal: [f32; 3],
    /// Fill opacity.
    pub transparency: f32,
}

impl From<&SectionPlane> for SectionPlaneUniforms {
    fn from(section: &SectionPlane) -> Self {
        let plane = section.plane();
        let origin = section.transform.transform_point3(section.origin);
        Self {
            origin: origin.as_vec3().to_array(),
            enabled: if section.enabled { 1.0 } else { 0.0 },
            normal: plane.normal.as_vec3().to_array(),
            transparency: section.transparency,
        }
    }
}

impl Raycast for SectionPlane {
    fn raycast(&self, ray: &Ray, _params: &RaycastParams, hits: &mut Vec<Hit>) {
        if !self.enabled {
            return;
        }
        let local_ray = ray.transformed(&self.transform.inverse());
        let local_plane = Plane::from_normal_and_point(self.normal, self.origin);
        let Some(t) = local_ray.intersect_plane(&local_plane) else {
            return;
        };
        let local = local_ray.at(t);
        let (u, v) = self.axes();
        let offset = local - self.origin;
        if offset.dot(u).abs() > self.half_extents[0] || offset.dot(v).abs() > self.half_extents[1] {
            return;
        }
        let point = self.transform.transform_point3(local);
        hits.push(Hit {
            distance: ray.origin.distance(point),
            point,
            index: 0,
            kind: HitKind::Surface,
            object: self.name.clone(),
            child: None,
            solid: true,
            parent: self.parent.clone(),
        });
    }
}

impl Primitive for SectionPlane {
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
        "SectionPlane"
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.corners())
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

    fn is_solid(&self) -> bool {
        true
    }

    fn dispose(&mut self, _markers: &mut MarkerRegistry) {
        self.enabled = false;
        log::debug!("section plane '{}' disposed", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_plane_creation() {
        let plane = SectionPlane::new("test");
        assert_eq!(plane.name(), "test");
        assert_eq!(plane.origin(), DVec3::ZERO);
        assert_eq!(plane.normal(), DVec3::Y);
        assert!(plane.is_enabled());
        assert!(plane.is_solid());
    }

    #[test]
    fn test_section_plane_pose() {
        let mut plane = SectionPlane::new("test");
        plane.set_pose(DVec3::new(1.0, 2.0, 3.0), DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(plane.origin(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(plane.normal(), DVec3::X);
    }

    #[test]
    fn test_signed_distance_and_is_kept() {
        let mut plane = SectionPlane::with_pose("test", DVec3::ZERO, DVec3::Y);
        assert!(plane.signed_distance(DVec3::new(0.0, 1.0, 0.0)) > 0.0);
        assert!(plane.signed_distance(DVec3::new(0.0, -1.0, 0.0)) < 0.0);
        assert!(plane.signed_distance(DVec3::new(1.0, 0.0, 1.0)).abs() < 1e-12);

        assert!(plane.is_kept(DVec3::new(0.0, 1.0, 0.0)));
        assert!(!plane.is_kept(DVec3::new(0.0, -1.0, 0.0)));
        plane.set_enabled(false);
        assert!(plane.is_kept(DVec3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn test_project_follows_transform() {
        let mut plane = SectionPlane::with_pose("test", DVec3::ZERO, DVec3::Y);
        plane.set_transform(DMat4::from_translation(DVec3::new(0.0, 10.0, 0.0)));
        let projected = plane.project(DVec3::new(1.0, 5.0, 2.0));
        assert!((projected - DVec3::new(1.0, 10.0, 2.0)).length() < 1e-9);
    }

    #[test]
    fn test_vertical_section_axes_and_bounds() {
        let mut plane = SectionPlane::with_pose("test", DVec3::ZERO, DVec3::Y);
        plane.set_half_extents(10.0, 5.0);
        let (u, v) = plane.axes();
        assert!((u - DVec3::NEG_X).length() < 1e-12);
        assert!((v.abs() - DVec3::Z).length() < 1e-12);
        let bounds = plane.bounding_box().unwrap();
        assert!((bounds.size() - DVec3::new(20.0, 0.0, 10.0)).length() < 1e-9);
    }

    #[test]
    fn test_raycast_hits_inside_rectangle_only() {
        let mut plane = SectionPlane::with_pose("sec", DVec3::ZERO, DVec3::Z);
        plane.set_half_extents(2.0, 2.0).set_parent(Some("hole".into()));
        let params = RaycastParams::default();

        let mut hits = Vec::new();
        plane.raycast(&Ray::new(DVec3::new(1.0, 1.0, 10.0), DVec3::NEG_Z), &params, &mut hits);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].solid);
        assert_eq!(hits[0].kind, HitKind::Surface);
        assert_eq!(hits[0].parent.as_deref(), Some("hole"));
        assert!((hits[0].distance - 10.0).abs() < 1e-9);

        hits.clear();
        plane.raycast(&Ray::new(DVec3::new(3.0, 0.0, 10.0), DVec3::NEG_Z), &params, &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_uniforms() {
        let plane = SectionPlane::with_pose("test", DVec3::new(1.0, 2.0, 3.0), DVec3::Z);
        let uniforms = SectionPlaneUniforms::from(&plane);
        assert_eq!(uniforms.origin, [1.0, 2.0, 3.0]);
        assert_eq!(uniforms.normal, [0.0, 0.0, 1.0]);
        assert_eq!(uniforms.enabled, 1.0);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 32);
    }
}

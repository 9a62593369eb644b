//! The scene: registered primitives, shared markers and multi-object picking.

use geoscene_core::{
    sort_hits, Aabb, GeoSceneError, Hit, MarkerRegistry, Options, Primitive, Ray, RaycastParams,
    Registry, Result,
};
use geoscene_structures::{PointSequence, SectionPlane};

/// Owns every registered primitive together with the marker textures they
/// share.
///
/// Names are unique across all primitive types.
#[derive(Default)]
pub struct Scene {
    registry: Registry,
    markers: MarkerRegistry,
    options: Options,
}

impl Scene {
    /// Creates an empty scene whose primitives copy `options` at creation.
    #[must_use]
    pub fn new(options: Options) -> Self {
        log::info!("scene created");
        Self {
            registry: Registry::new(),
            markers: MarkerRegistry::new(),
            options,
        }
    }

    /// Options handed to newly registered primitives.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replaces the options used for primitives registered from now on.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Shared marker textures.
    #[must_use]
    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    /// Number of registered primitives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Names of all registered primitives, in name order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.registry.iter().map(|p| p.name().to_string()).collect()
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.registry.contains(name) {
            log::error!("a primitive named '{name}' already exists");
            return Err(GeoSceneError::PrimitiveExists(name.to_string()));
        }
        Ok(())
    }

    fn insert<T: Primitive>(&mut self, primitive: T) -> Result<&mut T> {
        let name = primitive.name().to_string();
        self.ensure_free(&name)?;
        log::info!("registered {} '{name}'", primitive.type_name());
        self.registry.register(Box::new(primitive))?;
        self.registry
            .get_as_mut::<T>(&name)
            .ok_or(GeoSceneError::PrimitiveNotFound(name))
    }

    /// Registers an arbitrary primitive.
    pub fn register(&mut self, primitive: Box<dyn Primitive>) -> Result<()> {
        self.ensure_free(primitive.name())?;
        log::info!("registered {} '{}'", primitive.type_name(), primitive.name());
        self.registry.register(primitive)
    }

    /// Registers an empty polyline.
    pub fn register_polyline(&mut self, name: impl Into<String>) -> Result<&mut PointSequence> {
        let polyline = PointSequence::polyline(name, self.options.clone());
        self.insert(polyline)
    }

    /// Registers an empty interval-pair trace.
    pub fn register_trace(&mut self, name: impl Into<String>) -> Result<&mut PointSequence> {
        let trace = PointSequence::trace(name, self.options.clone());
        self.insert(trace)
    }

    /// Registers an empty point cloud, optionally drawn with a shared marker.
    pub fn register_point_cloud(
        &mut self,
        name: impl Into<String>,
        marker: Option<&str>,
    ) -> Result<&mut PointSequence> {
        let name = name.into();
        self.ensure_free(&name)?;
        let cloud = match marker {
            Some(symbol) => PointSequence::point_cloud_with_marker(
                name,
                self.options.clone(),
                &mut self.markers,
                symbol,
            )?,
            None => PointSequence::point_cloud(name, self.options.clone()),
        };
        self.insert(cloud)
    }

    /// Registers a section plane.
    pub fn register_section_plane(&mut self, plane: SectionPlane) -> Result<&mut SectionPlane> {
        self.insert(plane)
    }

    /// Looks up a primitive by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Primitive> {
        self.registry.get(name)
    }

    /// Looks up a primitive of a concrete type.
    #[must_use]
    pub fn get_as<T: Primitive>(&self, name: &str) -> Option<&T> {
        self.registry.get_as(name)
    }

    /// Looks up a primitive of a concrete type for editing.
    pub fn get_as_mut<T: Primitive>(&mut self, name: &str) -> Option<&mut T> {
        self.registry.get_as_mut(name)
    }

    /// Looks up a polyline, trace or point cloud.
    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<&PointSequence> {
        self.get_as(name)
    }

    /// Looks up a polyline, trace or point cloud for editing.
    pub fn sequence_mut(&mut self, name: &str) -> Option<&mut PointSequence> {
        self.get_as_mut(name)
    }

    /// Removes and disposes a primitive, releasing its marker reference.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(mut primitive) = self.registry.remove(name) else {
            log::error!("no primitive named '{name}'");
            return Err(GeoSceneError::PrimitiveNotFound(name.to_string()));
        };
        primitive.dispose(&mut self.markers);
        log::info!("removed {} '{name}'", primitive.type_name());
        Ok(())
    }

    /// Removes and disposes every primitive.
    pub fn clear(&mut self) {
        for mut primitive in self.registry.drain() {
            primitive.dispose(&mut self.markers);
        }
        log::info!("scene cleared");
    }

    /// Enables or disables a primitive for picking and rendering.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let Some(primitive) = self.registry.get_mut(name) else {
            log::error!("no primitive named '{name}'");
            return Err(GeoSceneError::PrimitiveNotFound(name.to_string()));
        };
        primitive.set_enabled(enabled);
        Ok(())
    }

    /// Raycast parameters seeded from the scene thresholds.
    #[must_use]
    pub fn default_params(&self) -> RaycastParams {
        RaycastParams::new(self.options.line_threshold, self.options.point_threshold)
    }

    /// Casts a world ray against every enabled primitive.
    ///
    /// Hits are ordered by distance with the thin-over-solid tie-break
    /// applied across primitives.
    #[must_use]
    pub fn raycast(&self, ray: &Ray, params: &RaycastParams) -> Vec<Hit> {
        let mut hits = Vec::new();
        for primitive in self.registry.iter().filter(|p| p.is_enabled()) {
            primitive.raycast(ray, params, &mut hits);
        }
        sort_hits(&mut hits, self.options.tie_epsilon);
        hits
    }

    /// Nearest hit of [`Scene::raycast`], if any.
    #[must_use]
    pub fn pick(&self, ray: &Ray, params: &RaycastParams) -> Option<Hit> {
        self.raycast(ray, params).into_iter().next()
    }

    /// World bounding box of all enabled primitives.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.registry
            .iter()
            .filter(|p| p.is_enabled())
            .filter_map(|p| p.bounding_box())
            .reduce(|a, b| a.union(&b))
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use geoscene_core::DVec3;

    use super::*;

    #[test]
    fn test_duplicate_names_rejected_across_types() {
        let mut scene = Scene::default();
        scene.register_polyline("a").unwrap();
        assert!(matches!(
            scene.register_trace("a"),
            Err(GeoSceneError::PrimitiveExists(_))
        ));
        assert!(matches!(
            scene.register_point_cloud("a", Some("circle")),
            Err(GeoSceneError::PrimitiveExists(_))
        ));
        assert_eq!(scene.markers().users("circle"), 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_remove_releases_marker() {
        let mut scene = Scene::default();
        scene.register_point_cloud("c1", Some("square")).unwrap();
        scene.register_point_cloud("c2", Some("square")).unwrap();
        assert_eq!(scene.markers().users("square"), 2);
        scene.remove("c1").unwrap();
        assert_eq!(scene.markers().users("square"), 1);
        scene.remove("c2").unwrap();
        assert!(scene.markers().is_empty());
        assert!(scene.remove("c2").is_err());
    }

    #[test]
    fn test_bounding_box_skips_disabled() {
        let mut scene = Scene::default();
        scene
            .register_polyline("a")
            .unwrap()
            .add_points(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0], None)
            .unwrap();
        scene
            .register_polyline("b")
            .unwrap()
            .add_points(vec![10.0, 10.0, 10.0, 11.0, 11.0, 11.0], None)
            .unwrap();
        let bounds = scene.bounding_box().unwrap();
        assert!((bounds.max - DVec3::splat(11.0)).length() < 1e-6);

        scene.set_enabled("b", false).unwrap();
        let bounds = scene.bounding_box().unwrap();
        assert!((bounds.max - DVec3::ONE).length() < 1e-6);
    }
}

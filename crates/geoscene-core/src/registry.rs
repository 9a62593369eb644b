//! Primitive registry for managing registered primitives.

use std::collections::BTreeMap;

use crate::error::{GeoSceneError, Result};
use crate::structure::Primitive;

/// Registry for managing all primitives in a scene.
///
/// Names are unique across primitive types, since hits refer to primitives by
/// name alone. Iteration order is by name.
#[derive(Default)]
pub struct Registry {
    primitives: BTreeMap<String, Box<dyn Primitive>>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a primitive with the registry.
    ///
    /// Returns an error if a primitive with the same name already exists.
    pub fn register(&mut self, primitive: Box<dyn Primitive>) -> Result<()> {
        let name = primitive.name().to_string();
        if self.primitives.contains_key(&name) {
            return Err(GeoSceneError::PrimitiveExists(name));
        }
        self.primitives.insert(name, primitive);
        Ok(())
    }

    /// Gets a reference to a primitive by name.
    pub fn get(&self, name: &str) -> Option<&dyn Primitive> {
        self.primitives.get(name).map(AsRef::as_ref)
    }

    /// Gets a mutable reference to a primitive by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Primitive>> {
        self.primitives.get_mut(name)
    }

    /// Gets a primitive by name downcast to a concrete type.
    pub fn get_as<T: Primitive>(&self, name: &str) -> Option<&T> {
        self.get(name)?.as_any().downcast_ref::<T>()
    }

    /// Gets a mutable primitive by name downcast to a concrete type.
    pub fn get_as_mut<T: Primitive>(&mut self, name: &str) -> Option<&mut T> {
        self.primitives
            .get_mut(name)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Checks if a primitive with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.primitives.contains_key(name)
    }

    /// Removes a primitive by name.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Primitive>> {
        self.primitives.remove(name)
    }

    /// Removes and returns every primitive.
    pub fn drain(&mut self) -> Vec<Box<dyn Primitive>> {
        std::mem::take(&mut self.primitives).into_values().collect()
    }

    /// Returns an iterator over all primitives.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Primitive> {
        self.primitives.values().map(AsRef::as_ref)
    }

    /// Returns the total number of registered primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Returns all primitives of a given type.
    pub fn get_all_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a dyn Primitive> + 'a {
        self.iter().filter(move |p| p.type_name() == type_name)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use glam::DMat4;

    use super::*;
    use crate::geometry::{Aabb, Ray};
    use crate::markers::MarkerRegistry;
    use crate::pick::{Hit, Raycast, RaycastParams};

    struct Marker {
        name: String,
        kind: &'static str,
    }

    impl Raycast for Marker {
        fn raycast(&self, _ray: &Ray, _params: &RaycastParams, _hits: &mut Vec<Hit>) {}
    }

    impl Primitive for Marker {
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
            self.kind
        }
        fn bounding_box(&self) -> Option<Aabb> {
            None
        }
        fn transform(&self) -> DMat4 {
            DMat4::IDENTITY
        }
        fn set_transform(&mut self, _transform: DMat4) {}
        fn is_enabled(&self) -> bool {
            true
        }
        fn set_enabled(&mut self, _enabled: bool) {}
        fn dispose(&mut self, _markers: &mut MarkerRegistry) {}
    }

    fn marker(name: &str, kind: &'static str) -> Box<dyn Primitive> {
        Box::new(Marker {
            name: name.to_string(),
            kind,
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(marker("a", "Polyline")).unwrap();
        registry.register(marker("b", "PointCloud")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert!(registry.get_as::<Marker>("b").is_some());
        assert_eq!(registry.get_all_of_type("Polyline").count(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = Registry::new();
        registry.register(marker("a", "Polyline")).unwrap();
        let err = registry.register(marker("a", "PointCloud")).unwrap_err();
        assert!(matches!(err, GeoSceneError::PrimitiveExists(name) if name == "a"));
    }

    #[test]
    fn test_remove_and_drain() {
        let mut registry = Registry::new();
        registry.register(marker("a", "Polyline")).unwrap();
        registry.register(marker("b", "Polyline")).unwrap();
        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.drain().len(), 1);
        assert!(registry.is_empty());
    }
}

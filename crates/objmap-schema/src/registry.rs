//! Concurrent type registry

use crate::model::TypeDescriptor;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Thread-safe registry of type descriptors keyed by type name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: DashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Register a descriptor, replacing any previous one with the same name
    pub fn register(&self, descriptor: TypeDescriptor) {
        trace!(type_name = %descriptor.name, properties = descriptor.properties.len(), "registering type");
        self.types
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    /// Get a descriptor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a type exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Property names of a type in declaration order
    #[must_use]
    pub fn property_names(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).map(|d| d.property_names())
    }

    /// Remove a descriptor
    pub fn remove(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.remove(name).map(|(_, d)| d)
    }

    /// Registered type names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = TypeRegistry::new();
        registry.register(TypeDescriptor::new("UserDto").with_properties(["userId", "firstName"]));

        assert!(registry.contains("UserDto"));
        assert_eq!(
            registry.property_names("UserDto"),
            Some(vec!["userId".to_string(), "firstName".to_string()])
        );
        assert_eq!(registry.property_names("Missing"), None);
    }

    #[test]
    fn test_register_replaces_existing() {
        let registry = TypeRegistry::new();
        registry.register(TypeDescriptor::new("A").with_property("x"));
        registry.register(TypeDescriptor::new("A").with_property("y"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.property_names("A"), Some(vec!["y".to_string()]));
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(TypeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.register(TypeDescriptor::new(format!("T{i}")).with_property("id"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.names()[0], "T0");
    }
}

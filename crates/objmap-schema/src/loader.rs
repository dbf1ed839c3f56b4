//! Descriptor loader with inheritance support
//!
//! Descriptor files list types and their properties:
//!
//! ```yaml
//! types:
//!   - name: BaseEntity
//!     properties: [id, created_at]
//!   - name: UserEntity
//!     extends: BaseEntity
//!     properties:
//!       - first_name
//!       - name: email
//!         type: string
//!         nullable: false
//! ```

use crate::inheritance::{InheritanceGraph, merge_descriptors};
use crate::model::{PropertyDescriptor, TypeDescriptor};
use crate::registry::TypeRegistry;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Serializable descriptor file format
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    #[serde(default)]
    types: Vec<TypeFile>,
}

#[derive(Debug, Deserialize, Clone)]
struct TypeFile {
    name: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyFile>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
enum PropertyFile {
    Name(String),
    Full {
        name: String,
        #[serde(default, rename = "type")]
        data_type: Option<String>,
        #[serde(default = "default_nullable")]
        nullable: bool,
    },
}

fn default_nullable() -> bool {
    true
}

impl From<PropertyFile> for PropertyDescriptor {
    fn from(file: PropertyFile) -> Self {
        match file {
            PropertyFile::Name(name) => PropertyDescriptor::new(name),
            PropertyFile::Full {
                name,
                data_type,
                nullable,
            } => PropertyDescriptor {
                name,
                data_type,
                nullable,
            },
        }
    }
}

impl From<TypeFile> for TypeDescriptor {
    fn from(file: TypeFile) -> Self {
        TypeDescriptor {
            name: file.name,
            parent: file.extends,
            properties: file.properties.into_iter().map(Into::into).collect(),
        }
    }
}

/// Loads descriptor files into a [`TypeRegistry`], resolving `extends`
pub struct DescriptorLoader {
    registry: Arc<TypeRegistry>,
}

impl DescriptorLoader {
    /// Create a loader with a fresh registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(TypeRegistry::new()),
        }
    }

    /// Create a loader that registers into an existing registry
    #[must_use]
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> Arc<TypeRegistry> {
        Arc::clone(&self.registry)
    }

    /// Load descriptors from a file; `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON. Returns the names of the registered types.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, parsed, or resolved.
    pub fn load_file(&self, path: &Path) -> Result<Vec<String>> {
        trace!("Loading descriptors from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_yaml(&content)
        } else {
            self.load_json(&content)
        }
    }

    /// Load descriptors from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error when parsing or inheritance resolution fails.
    pub fn load_yaml(&self, yaml: &str) -> Result<Vec<String>> {
        let file: DescriptorFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        self.register_all(file)
    }

    /// Load descriptors from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error when parsing or inheritance resolution fails.
    pub fn load_json(&self, json: &str) -> Result<Vec<String>> {
        let file: DescriptorFile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        self.register_all(file)
    }

    fn register_all(&self, file: DescriptorFile) -> Result<Vec<String>> {
        let pending: HashMap<String, TypeDescriptor> = file
            .types
            .iter()
            .cloned()
            .map(|t| (t.name.clone(), TypeDescriptor::from(t)))
            .collect();

        let mut graph = InheritanceGraph::new();
        for descriptor in pending.values() {
            if let Some(parent) = &descriptor.parent {
                if graph.would_create_cycle(&descriptor.name, parent) {
                    return Err(Error::Inheritance(format!(
                        "Circular dependency detected: {} -> {}",
                        descriptor.name, parent
                    )));
                }
                graph.add_edge(&descriptor.name, parent);
            }
        }

        // Resolve everything before registering so a failing file leaves the
        // registry untouched.
        let mut resolved = Vec::with_capacity(file.types.len());
        for entry in &file.types {
            resolved.push(self.resolve(&entry.name, &pending)?);
        }

        let names: Vec<String> = resolved.iter().map(|d| d.name.clone()).collect();
        for descriptor in resolved {
            self.registry.register(descriptor);
        }
        info!("Registered {} type descriptors", names.len());
        Ok(names)
    }

    /// Resolve one type by walking its `extends` chain up to a root type or an
    /// already-registered (hence already merged) descriptor.
    fn resolve(
        &self,
        name: &str,
        pending: &HashMap<String, TypeDescriptor>,
    ) -> Result<TypeDescriptor> {
        let mut chain: Vec<TypeDescriptor> = Vec::new();
        let mut current = pending
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        loop {
            let parent_name = current.parent.clone();
            chain.push(current);

            let Some(parent_name) = parent_name else {
                break;
            };

            if let Some(parent) = pending.get(&parent_name) {
                current = parent.clone();
            } else if let Some(registered) = self.registry.get(&parent_name) {
                debug!("Resolved parent {} from registry", parent_name);
                chain.push(registered.as_ref().clone());
                break;
            } else {
                return Err(Error::Inheritance(format!(
                    "Parent type not found: {parent_name} (referenced by {name})"
                )));
            }
        }

        chain.reverse();
        let mut iter = chain.into_iter();
        let mut merged = iter
            .next()
            .ok_or_else(|| Error::Inheritance("Cannot merge empty chain".to_string()))?;
        for descriptor in iter {
            merged = merge_descriptors(&merged, &descriptor);
        }

        trace!(
            "Resolved {} with properties {:?}",
            merged.name,
            merged.property_names()
        );
        Ok(merged)
    }
}

impl Default for DescriptorLoader {
    fn default() -> Self {
        Self::new()
    }
}

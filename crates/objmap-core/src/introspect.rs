//! Type introspection seam
//!
//! The engine never reflects on types itself. It asks a [`TypeIntrospector`]
//! for the ordered property list of a type and for a normalized key/value
//! view of a source value.

use crate::{Error, Result};
use objmap_schema::TypeRegistry;
use objmap_value::{Object, Value, is_path};
use std::collections::BTreeMap;

/// Type identifier for "any associative map". Mappings against this type
/// skip property reflection on that side.
pub const ARRAY_TYPE: &str = "array";

/// Returns true for the generic associative-map type identifier
#[must_use]
pub fn is_generic_map(type_name: &str) -> bool {
    type_name == ARRAY_TYPE
}

/// Normalized associative view of a mapping source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceView {
    root: Value,
}

impl SourceView {
    /// Wrap an object as a source view
    #[must_use]
    pub fn new(object: Object) -> Self {
        Self {
            root: Value::Object(object),
        }
    }

    /// An empty, untyped view
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Object::new())
    }

    /// Declared type of the source record, if any
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.root.type_name()
    }

    /// Top-level fields
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        // root is always an object
        static EMPTY: BTreeMap<String, Value> = BTreeMap::new();
        self.root.as_object().map_or(&EMPTY, |o| &o.fields)
    }

    /// The view as a value
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Look up a literal key, falling back to dot-path resolution
    #[must_use]
    pub fn get(&self, reference: &str) -> Option<&Value> {
        match self.fields().get(reference) {
            Some(value) => Some(value),
            None if is_path(reference) => self.root.get_path(reference),
            None => None,
        }
    }

    /// Check whether a key or path is present
    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.get(reference).is_some()
    }
}

impl Default for SourceView {
    fn default() -> Self {
        Self::empty()
    }
}

/// Supplies property lists and normalized source views
pub trait TypeIntrospector: Send + Sync {
    /// Whether the type identifier can be resolved
    fn has_type(&self, type_name: &str) -> bool;

    /// Public property names of a type in stable declaration order
    fn list_properties(&self, type_name: &str) -> Option<Vec<String>>;

    /// Reduce a source (record, list, or JSON text) to an associative view.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be viewed as a map.
    fn normalize(&self, source: &Value) -> Result<SourceView> {
        match source {
            Value::Object(object) => Ok(SourceView::new(object.clone())),
            Value::Null => Ok(SourceView::empty()),
            Value::List(items) => Ok(SourceView::new(Object {
                type_name: None,
                fields: items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v.clone()))
                    .collect(),
            })),
            Value::String(text) => match Value::parse_json(text)? {
                Value::Object(object) => Ok(SourceView::new(object)),
                other => Err(Error::Source(format!(
                    "JSON source must be an object, got {}",
                    other.kind()
                ))),
            },
            other => Err(Error::Source(format!(
                "cannot map from a {} source",
                other.kind()
            ))),
        }
    }
}

impl TypeIntrospector for TypeRegistry {
    fn has_type(&self, type_name: &str) -> bool {
        self.contains(type_name)
    }

    fn list_properties(&self, type_name: &str) -> Option<Vec<String>> {
        self.property_names(type_name)
    }
}

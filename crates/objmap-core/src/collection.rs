//! Element-wise mapping of collections

use crate::introspect::{SourceView, is_generic_map};
use crate::mapper::{Mapper, MapperInner};
use crate::transformer::Transform;
use crate::{Error, Result};
use objmap_value::{Object, Value};
use std::sync::{Arc, Weak};

/// Transformer mapping every element of a list, or of an untyped map, to
/// `element_type` through the mapper that created it.
///
/// With `preserve_keys` an associative input keeps its keys; otherwise the
/// output is re-indexed into a list. With `recursive` nested lists are
/// mapped element-wise as well instead of being handed to the mapper whole.
#[derive(Debug, Clone)]
pub struct CollectionTransformer {
    element_type: String,
    mapper: Weak<MapperInner>,
    preserve_keys: bool,
    recursive: bool,
}

impl CollectionTransformer {
    pub fn new(element_type: impl Into<String>, mapper: &Mapper) -> Self {
        Self {
            element_type: element_type.into(),
            mapper: Arc::downgrade(mapper.inner()),
            preserve_keys: false,
            recursive: false,
        }
    }

    #[must_use]
    pub fn preserve_keys(mut self, preserve: bool) -> Self {
        self.preserve_keys = preserve;
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    fn mapper(&self) -> Result<Mapper> {
        self.mapper
            .upgrade()
            .map(Mapper::from_inner)
            .ok_or_else(|| Error::Transform("collection mapper has been dropped".to_string()))
    }

    fn map_collection(&self, mapper: &Mapper, value: Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.map_element(mapper, item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Object(object) if object.type_name.is_none() => {
                if self.preserve_keys {
                    let mut out = Object::new();
                    for (key, item) in object.fields {
                        out.set(key, self.map_element(mapper, item)?);
                    }
                    Ok(Value::Object(out))
                } else {
                    object
                        .fields
                        .into_values()
                        .map(|item| self.map_element(mapper, item))
                        .collect::<Result<Vec<_>>>()
                        .map(Value::List)
                }
            }
            other => Err(Error::Transform(format!(
                "collection transformer expects a list or map, got {}",
                other.kind()
            ))),
        }
    }

    fn map_element(&self, mapper: &Mapper, item: Value) -> Result<Value> {
        match item {
            Value::Null => Ok(Value::Null),
            Value::List(_) if self.recursive => self.map_collection(mapper, item),
            other => mapper.map(&other, &self.element_type),
        }
    }
}

impl Transform for CollectionTransformer {
    fn transform(&self, value: Value, _source: &SourceView) -> Result<Value> {
        let mapper = self.mapper()?;
        self.map_collection(&mapper, value)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let mapper = self.mapper().map_err(|e| e.to_string())?;
        if !is_generic_map(&self.element_type)
            && !mapper.introspector().has_type(&self.element_type)
        {
            return Err(format!(
                "element type '{}' cannot be resolved",
                self.element_type
            ));
        }
        Ok(())
    }
}

//! Destination construction seam

use crate::introspect::is_generic_map;
use crate::{Error, Result};
use objmap_value::{Object, Value};
use std::collections::BTreeMap;

/// Builds destination instances from resolved property values
pub trait ObjectFactory: Send + Sync {
    /// Construct a new destination instance.
    ///
    /// # Errors
    ///
    /// Returns an error when the destination cannot be constructed.
    fn instantiate(&self, type_name: &str, values: BTreeMap<String, Value>) -> Result<Value>;

    /// Write resolved values into an existing destination instance.
    ///
    /// # Errors
    ///
    /// Returns an error when the target cannot hold properties.
    fn populate(&self, target: &mut Value, values: BTreeMap<String, Value>) -> Result<()>;
}

/// Default factory producing [`Value::Object`] records tagged with the
/// destination type name
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordFactory;

impl ObjectFactory for RecordFactory {
    fn instantiate(&self, type_name: &str, values: BTreeMap<String, Value>) -> Result<Value> {
        let type_name = (!is_generic_map(type_name)).then(|| type_name.to_string());
        Ok(Value::Object(Object {
            type_name,
            fields: values,
        }))
    }

    fn populate(&self, target: &mut Value, values: BTreeMap<String, Value>) -> Result<()> {
        let object = target.as_object_mut().ok_or_else(|| {
            Error::Mapping("map-to-existing target must be an object".to_string())
        })?;
        object.fields.extend(values);
        Ok(())
    }
}

//! Process-wide mapper
//!
//! Convenience access to a single shared [`Mapper`]. The instance is built
//! with defaults on first use unless one was installed with [`configure`].

use crate::Result;
use crate::mapper::Mapper;
use objmap_value::Value;
use std::sync::{LazyLock, PoisonError, RwLock};
use tracing::debug;

static GLOBAL: LazyLock<RwLock<Option<Mapper>>> = LazyLock::new(|| RwLock::new(None));

/// Install `mapper` as the global instance, returning the previous one
pub fn configure(mapper: Mapper) -> Option<Mapper> {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    debug!("Global mapper configured");
    slot.replace(mapper)
}

/// The global mapper, constructed with defaults on first use
#[must_use]
pub fn global() -> Mapper {
    if let Some(mapper) = GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return mapper.clone();
    }

    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    slot.get_or_insert_with(|| {
        debug!("Creating default global mapper");
        Mapper::new()
    })
    .clone()
}

/// Drop the global instance; the next [`global`] call builds a fresh one
pub fn reset() {
    GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}

/// Map `source` with the global mapper
///
/// # Errors
///
/// See [`Mapper::map`].
pub fn map(source: &Value, destination_type: &str) -> Result<Value> {
    global().map(source, destination_type)
}

/// Map every source with the global mapper
///
/// # Errors
///
/// See [`Mapper::map_array`].
pub fn map_array(sources: &[Value], destination_type: &str) -> Result<Vec<Value>> {
    global().map_array(sources, destination_type)
}

//! Shared registry of property mappings per type pair

use crate::property_mapping::PropertyMapping;
use crate::{Error, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Ordered (source, destination) type pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub source_type: String,
    pub destination_type: String,
}

impl PairKey {
    pub fn new(source_type: impl Into<String>, destination_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            destination_type: destination_type.into(),
        }
    }

    /// The pair with source and destination swapped
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(&self.destination_type, &self.source_type)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source_type, self.destination_type)
    }
}

/// Members and sealed flag of one type pair
#[derive(Debug, Default)]
pub struct PairState {
    pub members: BTreeMap<String, PropertyMapping>,
    pub sealed: bool,
}

pub(crate) type PairHandle = Arc<RwLock<PairState>>;

/// Cloneable handle over the shared per-pair registry. Every clone, and
/// every `TypeMapping` built on it, observes the same registrations.
#[derive(Debug, Clone, Default)]
pub struct MappingStorage {
    pairs: Arc<DashMap<PairKey, PairHandle>>,
}

impl MappingStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the state of a pair
    pub(crate) fn pair(&self, key: &PairKey) -> PairHandle {
        Arc::clone(self.pairs.entry(key.clone()).or_default().value())
    }

    /// Get the state of a pair if it was ever configured
    pub(crate) fn existing(&self, key: &PairKey) -> Option<PairHandle> {
        self.pairs.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether any configuration exists for the pair
    #[must_use]
    pub fn contains(&self, key: &PairKey) -> bool {
        self.pairs.contains_key(key)
    }

    /// Store a property mapping, replacing any previous one for `property`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sealed`] when the pair is sealed.
    pub fn put(&self, key: &PairKey, property: &str, mapping: PropertyMapping) -> Result<()> {
        let pair = self.pair(key);
        let mut state = write(&pair)?;
        if state.sealed {
            return Err(Error::Sealed {
                source_type: key.source_type.clone(),
                destination_type: key.destination_type.clone(),
                property: property.to_string(),
            });
        }
        state.members.insert(property.to_string(), mapping);
        Ok(())
    }

    /// Get a copy of a property mapping
    ///
    /// # Errors
    ///
    /// Returns an error if the pair lock is poisoned.
    pub fn get(&self, key: &PairKey, property: &str) -> Result<Option<PropertyMapping>> {
        match self.existing(key) {
            Some(pair) => Ok(read(&pair)?.members.get(property).cloned()),
            None => Ok(None),
        }
    }

    /// Snapshot of all property mappings of a pair
    ///
    /// # Errors
    ///
    /// Returns an error if the pair lock is poisoned.
    pub fn members(&self, key: &PairKey) -> Result<BTreeMap<String, PropertyMapping>> {
        match self.existing(key) {
            Some(pair) => Ok(read(&pair)?.members.clone()),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Whether the pair has been sealed
    ///
    /// # Errors
    ///
    /// Returns an error if the pair lock is poisoned.
    pub fn is_sealed(&self, key: &PairKey) -> Result<bool> {
        match self.existing(key) {
            Some(pair) => Ok(read(&pair)?.sealed),
            None => Ok(false),
        }
    }

    /// Configured pairs, sorted
    #[must_use]
    pub fn pairs(&self) -> Vec<PairKey> {
        let mut keys: Vec<PairKey> = self.pairs.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

pub(crate) fn read(pair: &PairHandle) -> Result<RwLockReadGuard<'_, PairState>> {
    pair.read()
        .map_err(|_| Error::Mapping("Failed to lock mapping storage".to_string()))
}

pub(crate) fn write(pair: &PairHandle) -> Result<RwLockWriteGuard<'_, PairState>> {
    pair.write()
        .map_err(|_| Error::Mapping("Failed to lock mapping storage".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_pair_key_display() {
        let key = PairKey::new("UserEntity", "UserDto");
        assert_eq!(key.to_string(), "UserEntity->UserDto");
        assert_eq!(key.reversed().to_string(), "UserDto->UserEntity");
    }

    #[test]
    fn test_clones_share_registrations() {
        let storage = MappingStorage::new();
        let other = storage.clone();
        let key = PairKey::new("A", "B");

        let mut mapping = PropertyMapping::new();
        mapping.map_from("x");
        storage.put(&key, "y", mapping).unwrap();

        let seen = other.get(&key, "y").unwrap().unwrap();
        assert_eq!(seen.source_property(), Some("x"));
        assert!(other.contains(&key));
        assert!(!other.contains(&key.reversed()));
    }

    #[test]
    fn test_put_replaces_whole_mapping() {
        let storage = MappingStorage::new();
        let key = PairKey::new("A", "B");

        let mut first = PropertyMapping::new();
        first.ignore();
        storage.put(&key, "name", first).unwrap();

        let mut second = PropertyMapping::new();
        second.map_from("x");
        storage.put(&key, "name", second).unwrap();

        let stored = storage.get(&key, "name").unwrap().unwrap();
        assert!(!stored.is_ignored());
        assert_eq!(stored.source_property(), Some("x"));
    }

    #[test]
    fn test_concurrent_puts_are_all_kept() {
        let storage = MappingStorage::new();
        let key = PairKey::new("A", "B");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = storage.clone();
                let key = key.clone();
                thread::spawn(move || {
                    let mut mapping = PropertyMapping::new();
                    mapping.map_from(format!("src{i}"));
                    storage.put(&key, &format!("dst{i}"), mapping).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(storage.members(&key).unwrap().len(), 8);
    }
}

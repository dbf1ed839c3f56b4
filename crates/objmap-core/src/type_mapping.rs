//! Type-pair configuration and sealing

use crate::introspect::{TypeIntrospector, is_generic_map};
use crate::property_mapping::PropertyMapping;
use crate::storage::{self, MappingStorage, PairKey, PairState};
use crate::transformer::TransformerRegistry;
use crate::{ConfigurationIssue, Error, Result};
use objmap_value::is_path;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration handle for one ordered (source, destination) type pair.
///
/// Handles are cheap to clone; all handles for the same pair on the same
/// storage share members and sealed state.
#[derive(Clone)]
pub struct TypeMapping {
    key: PairKey,
    storage: MappingStorage,
    introspector: Arc<dyn TypeIntrospector>,
    transformers: TransformerRegistry,
}

impl TypeMapping {
    pub fn new(
        key: PairKey,
        storage: MappingStorage,
        introspector: Arc<dyn TypeIntrospector>,
        transformers: TransformerRegistry,
    ) -> Self {
        // make the pair visible to storage even before the first member
        storage.pair(&key);
        Self {
            key,
            storage,
            introspector,
            transformers,
        }
    }

    #[must_use]
    pub fn key(&self) -> &PairKey {
        &self.key
    }

    #[must_use]
    pub fn source_type(&self) -> &str {
        &self.key.source_type
    }

    #[must_use]
    pub fn destination_type(&self) -> &str {
        &self.key.destination_type
    }

    /// Configure a destination member. The closure receives a fresh
    /// [`PropertyMapping`] which replaces any previous one for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sealed`] once the mapping is sealed.
    pub fn for_member(
        &self,
        name: &str,
        configure: impl FnOnce(&mut PropertyMapping),
    ) -> Result<&Self> {
        let mut mapping = PropertyMapping::new();
        configure(&mut mapping);
        self.storage.put(&self.key, name, mapping)?;
        debug!("Configured member {} on {}", name, self.key);
        Ok(self)
    }

    /// Current mapping for a member
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn get_mapping(&self, name: &str) -> Result<Option<PropertyMapping>> {
        self.storage.get(&self.key, name)
    }

    /// Snapshot of all configured members
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn members(&self) -> Result<BTreeMap<String, PropertyMapping>> {
        self.storage.members(&self.key)
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn has_member(&self, name: &str) -> Result<bool> {
        Ok(self.get_mapping(name)?.is_some())
    }

    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn is_sealed(&self) -> Result<bool> {
        self.storage.is_sealed(&self.key)
    }

    /// Validate and freeze the configuration. Sealing an already sealed
    /// mapping succeeds without validating again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the offending member and rule.
    pub fn seal(&self) -> Result<()> {
        let pair = self.storage.pair(&self.key);
        let mut state = storage::write(&pair).map_err(|e| self.internal(&e))?;
        if state.sealed {
            return Ok(());
        }

        self.validate(&state)?;
        state.sealed = true;
        info!(
            "Sealed mapping {} with {} members",
            self.key,
            state.members.len()
        );
        Ok(())
    }

    fn validate(&self, state: &PairState) -> Result<()> {
        let source_type = self.source_type();
        let destination_type = self.destination_type();
        let members = &state.members;

        // a. destination type
        let destination_properties = if is_generic_map(destination_type) {
            None
        } else {
            if !self.introspector.has_type(destination_type) {
                return Err(self.config_error(
                    None,
                    ConfigurationIssue::UnknownDestinationType(destination_type.to_string()),
                ));
            }
            Some(
                self.introspector
                    .list_properties(destination_type)
                    .unwrap_or_default(),
            )
        };

        // b. destination properties
        if let Some(properties) = &destination_properties {
            for name in members.keys() {
                if !properties.iter().any(|p| p == name) {
                    return Err(self.config_error(
                        Some(name),
                        ConfigurationIssue::UnknownDestinationProperty(name.clone()),
                    ));
                }
            }
        }

        // c. mapped and ignored
        for (name, mapping) in members {
            if mapping.is_ignored() && mapping.is_mapped() {
                return Err(self.config_error(Some(name), ConfigurationIssue::MappedAndIgnored));
            }
        }

        // d. plain source properties
        let source_properties = if is_generic_map(source_type) {
            None
        } else if let Some(properties) = self.introspector.list_properties(source_type) {
            Some(properties)
        } else {
            debug!(
                "Source type {} is not known, skipping source property checks",
                source_type
            );
            None
        };
        if let Some(properties) = &source_properties {
            for (name, mapping) in members {
                let Some(source_property) = mapping.source_property() else {
                    continue;
                };
                if is_path(source_property) || mapping.is_ignored() {
                    continue;
                }
                if !properties.iter().any(|p| p == source_property) {
                    return Err(self.config_error(
                        Some(name),
                        ConfigurationIssue::UnknownSourceProperty {
                            source_type: source_type.to_string(),
                            property: source_property.to_string(),
                        },
                    ));
                }
            }
        }

        // e. transformer shapes, then condition rules
        for (name, mapping) in members {
            if let Some(transformer) = mapping.transformer() {
                let reason = transformer
                    .invalid_reason(&self.transformers)
                    .map_err(|e| self.internal(&e))?;
                if let Some(reason) = reason {
                    return Err(self.config_error(
                        Some(name),
                        ConfigurationIssue::InvalidTransformer(reason),
                    ));
                }
            }
            if let Some(reason) = mapping.condition().and_then(|c| c.invalid_reason()) {
                return Err(
                    self.config_error(Some(name), ConfigurationIssue::InvalidCondition(reason))
                );
            }
        }

        Ok(())
    }

    fn config_error(&self, property: Option<&str>, issue: ConfigurationIssue) -> Error {
        Error::configuration(
            self.source_type(),
            self.destination_type(),
            property,
            issue,
        )
    }

    fn internal(&self, error: &Error) -> Error {
        self.config_error(None, ConfigurationIssue::Internal(error.to_string()))
    }

    /// The transformer registry used to check named transformers
    #[must_use]
    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    /// Plain `map_from` pairs (destination, source) usable for inversion
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn plain_links(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .members()?
            .into_iter()
            .filter(|(_, m)| !m.is_ignored() && m.transformer().is_none())
            .filter_map(|(dest, m)| {
                m.source_property()
                    .filter(|s| !is_path(s))
                    .map(|s| (dest, s.to_string()))
            })
            .collect())
    }
}

impl fmt::Debug for TypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapping").field("key", &self.key).finish()
    }
}

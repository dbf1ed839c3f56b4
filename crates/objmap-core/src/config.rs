//! Mapper configuration options

use crate::cache::CachePolicy;
use crate::convention_mapper::DEFAULT_THRESHOLD;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a [`crate::Mapper`]
///
/// ```yaml
/// use_conventions: true
/// confidence_threshold: 0.9
/// cache:
///   policy: persistent
///   path: /var/cache/objmap/plans.json
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Discover unconfigured members by naming convention (default: true)
    pub use_conventions: bool,
    /// Minimum convention confidence, clamped to `[0, 1]` (default: 0.8)
    pub confidence_threshold: f64,
    /// Plan cache lifetime (default: in process)
    pub cache: CachePolicy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            use_conventions: true,
            confidence_threshold: DEFAULT_THRESHOLD,
            cache: CachePolicy::InProcess,
        }
    }
}

impl MapperConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable convention discovery
    #[must_use]
    pub fn use_conventions(mut self, enabled: bool) -> Self {
        self.use_conventions = enabled;
        self
    }

    /// Set the convention confidence threshold
    #[must_use]
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the cache policy
    #[must_use]
    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.cache = policy;
        self
    }

    /// Parse a YAML configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Parse(format!("Invalid mapper config: {e}")))
    }

    /// Parse a JSON configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Parse(format!("Invalid mapper config: {e}")))
    }

    /// Load a configuration file; `.json` files are read as JSON, everything
    /// else as YAML
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Parse(format!("Failed to read {}: {e}", path.display())))?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }
}

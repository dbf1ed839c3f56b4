//! Convention-based property discovery

use crate::conventions::{NamingConvention, default_conventions};
use crate::introspect::{TypeIntrospector, is_generic_map};
use crate::type_mapping::TypeMapping;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default minimum confidence for accepting a discovered pair
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// A destination property matched to a source property by name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredMatch {
    pub destination: String,
    pub source: String,
    pub confidence: f64,
}

/// Infers source properties for destination properties by name
#[derive(Clone)]
pub struct ConventionMapper {
    conventions: Vec<Arc<dyn NamingConvention>>,
    threshold: f64,
    introspector: Arc<dyn TypeIntrospector>,
}

impl ConventionMapper {
    /// Mapper with the built-in conventions and the default threshold
    pub fn new(introspector: Arc<dyn TypeIntrospector>) -> Self {
        Self {
            conventions: default_conventions(),
            threshold: DEFAULT_THRESHOLD,
            introspector,
        }
    }

    /// Append a convention; it is tried after every convention already
    /// registered
    pub fn register_convention(&mut self, convention: Arc<dyn NamingConvention>) {
        debug!("Registered naming convention {}", convention.name());
        self.conventions.push(convention);
    }

    #[must_use]
    pub fn conventions(&self) -> &[Arc<dyn NamingConvention>] {
        &self.conventions
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Set the acceptance threshold, clamped to `[0, 1]`. NaN is ignored.
    ///
    /// A match is accepted when its confidence is at least the threshold
    /// and above zero, so a threshold of `0.0` still rejects pairs no
    /// convention recognizes.
    pub fn set_confidence_threshold(&mut self, threshold: f64) {
        if threshold.is_nan() {
            warn!("Ignoring NaN convention threshold");
            return;
        }
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    /// First convention, in priority order, that recognizes the name
    #[must_use]
    pub fn detect_convention(&self, name: &str) -> Option<Arc<dyn NamingConvention>> {
        self.conventions
            .iter()
            .find(|c| c.matches(name))
            .map(Arc::clone)
    }

    /// Convention recognized for the most properties of a type. Ties go to
    /// the convention with the higher priority.
    #[must_use]
    pub fn detect_type_convention(&self, type_name: &str) -> Option<Arc<dyn NamingConvention>> {
        let properties = self.introspector.list_properties(type_name)?;
        let mut votes = vec![0usize; self.conventions.len()];
        for property in &properties {
            if let Some(index) = self.conventions.iter().position(|c| c.matches(property)) {
                votes[index] += 1;
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (index, &count) in votes.iter().enumerate() {
            if count > 0 && best.is_none_or(|(_, top)| count > top) {
                best = Some((index, count));
            }
        }
        best.map(|(index, _)| Arc::clone(&self.conventions[index]))
    }

    /// Highest confidence any single convention assigns to the pair
    #[must_use]
    pub fn calculate_confidence(&self, source: &str, destination: &str) -> f64 {
        self.conventions
            .iter()
            .map(|c| c.calculate_match_confidence(source, destination))
            .fold(0.0, f64::max)
            .clamp(0.0, 1.0)
    }

    /// Best source match for each destination property from explicit
    /// property lists. Only matches at or above the threshold are returned.
    #[must_use]
    pub fn discover_properties(
        &self,
        source_properties: &[String],
        destination_properties: &[String],
    ) -> Vec<DiscoveredMatch> {
        let mut matches = Vec::new();
        for destination in destination_properties {
            let mut best: Option<(&String, f64)> = None;
            for source in source_properties {
                let confidence = self.calculate_confidence(source, destination);
                // strictly greater keeps the first-declared source on ties
                if best.is_none_or(|(_, top)| confidence > top) {
                    best = Some((source, confidence));
                }
            }

            match best {
                Some((source, confidence)) if confidence >= self.threshold && confidence > 0.0 => {
                    trace!(
                        "Discovered {} <- {} ({:.2})",
                        destination, source, confidence
                    );
                    matches.push(DiscoveredMatch {
                        destination: destination.clone(),
                        source: source.clone(),
                        confidence,
                    });
                }
                Some((source, confidence)) => {
                    trace!(
                        "Rejected {} <- {} ({:.2} below {:.2})",
                        destination, source, confidence, self.threshold
                    );
                }
                None => {}
            }
        }
        matches
    }

    /// Discovered pairs with their confidence for a type pair. Generic-map
    /// or unknown types yield nothing.
    #[must_use]
    pub fn discover_with_confidence(
        &self,
        source_type: &str,
        destination_type: &str,
    ) -> Vec<DiscoveredMatch> {
        if is_generic_map(source_type) || is_generic_map(destination_type) {
            return Vec::new();
        }
        let (Some(source), Some(destination)) = (
            self.introspector.list_properties(source_type),
            self.introspector.list_properties(destination_type),
        ) else {
            debug!(
                "No property lists for {} -> {}, skipping discovery",
                source_type, destination_type
            );
            return Vec::new();
        };
        let matches = self.discover_properties(&source, &destination);
        debug!(
            "Discovered {} of {} properties for {} -> {}",
            matches.len(),
            destination.len(),
            source_type,
            destination_type
        );
        matches
    }

    /// Accepted destination → source pairs for a type pair
    #[must_use]
    pub fn discover_mappings(
        &self,
        source_type: &str,
        destination_type: &str,
    ) -> BTreeMap<String, String> {
        self.discover_with_confidence(source_type, destination_type)
            .into_iter()
            .map(|m| (m.destination, m.source))
            .collect()
    }

    /// Register discovered pairs as `map_from` members, leaving explicitly
    /// configured members alone. Returns the number of members added.
    ///
    /// # Errors
    ///
    /// Returns an error when the mapping is sealed or storage fails.
    pub fn apply_conventions(&self, mapping: &TypeMapping) -> Result<usize> {
        let mut applied = 0;
        for (destination, source) in
            self.discover_mappings(mapping.source_type(), mapping.destination_type())
        {
            if mapping.has_member(&destination)? {
                continue;
            }
            mapping.for_member(&destination, |m| {
                m.map_from(source);
            })?;
            applied += 1;
        }
        Ok(applied)
    }
}

impl fmt::Debug for ConventionMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionMapper")
            .field("conventions", &self.conventions)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MappingStorage, PairKey};
    use crate::transformer::TransformerRegistry;
    use objmap_schema::{TypeDescriptor, TypeRegistry};

    fn registry() -> Arc<TypeRegistry> {
        let registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("UserRecord").with_properties(["user_id", "first_name", "last_name"]),
        );
        registry.register(
            TypeDescriptor::new("UserDto").with_properties(["userId", "firstName", "email"]),
        );
        registry.register(
            TypeDescriptor::new("Accessors").with_properties(["getName", "isActive", "email"]),
        );
        Arc::new(registry)
    }

    #[test]
    fn test_detect_convention_prefers_prefix() {
        let mapper = ConventionMapper::new(registry());
        assert_eq!(mapper.detect_convention("getUserId").unwrap().name(), "prefix");
        assert_eq!(mapper.detect_convention("user_id").unwrap().name(), "abbreviation");
        assert_eq!(mapper.detect_convention("first_name").unwrap().name(), "snake_case");
        assert_eq!(mapper.detect_convention("FirstName").unwrap().name(), "pascal_case");
        assert!(mapper.detect_convention("__").is_none());
    }

    #[test]
    fn test_detect_type_convention() {
        let mapper = ConventionMapper::new(registry());
        assert_eq!(
            mapper.detect_type_convention("UserRecord").unwrap().name(),
            "snake_case"
        );
        assert_eq!(
            mapper.detect_type_convention("Accessors").unwrap().name(),
            "prefix"
        );
        assert!(mapper.detect_type_convention("Missing").is_none());
    }

    #[test]
    fn test_pairwise_confidence() {
        let mapper = ConventionMapper::new(registry());
        assert!((mapper.calculate_confidence("firstName", "firstName") - 1.0).abs() < 1e-9);
        assert!((mapper.calculate_confidence("firstName", "first_name") - 0.85).abs() < 1e-9);
        assert!(mapper.calculate_confidence("firstName", "lastName") < 0.3);
        assert!((mapper.calculate_confidence("user_id", "UserId") - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_discover_mappings() {
        let mapper = ConventionMapper::new(registry());
        let discovered = mapper.discover_mappings("UserRecord", "UserDto");
        assert_eq!(discovered.get("userId").map(String::as_str), Some("user_id"));
        assert_eq!(discovered.get("firstName").map(String::as_str), Some("first_name"));
        assert!(!discovered.contains_key("email"));
    }

    #[test]
    fn test_threshold_clamps_and_filters() {
        let mut mapper = ConventionMapper::new(registry());
        mapper.set_confidence_threshold(1.5);
        assert!((mapper.threshold() - 1.0).abs() < f64::EPSILON);
        assert!(mapper.discover_mappings("UserRecord", "UserDto").is_empty());

        mapper.set_confidence_threshold(-3.0);
        assert!(mapper.threshold().abs() < f64::EPSILON);
        mapper.set_confidence_threshold(f64::NAN);
        assert!(mapper.threshold().abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_threshold_rejects_unrelated_names() {
        let mut mapper = ConventionMapper::new(registry());
        mapper.set_confidence_threshold(0.0);
        let destinations = vec!["firstName".to_string()];

        let unrelated = vec!["zip".to_string()];
        assert!(mapper.discover_properties(&unrelated, &destinations).is_empty());

        let related = vec!["zip".to_string(), "first_name".to_string()];
        let matches = mapper.discover_properties(&related, &destinations);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source, "first_name");
    }

    #[test]
    fn test_ties_go_to_first_declared_source() {
        let mapper = ConventionMapper::new(registry());
        let sources = vec!["first_name".to_string(), "first-name".to_string()];
        let matches = mapper.discover_properties(&sources, &["firstName".to_string()]);
        assert_eq!(matches[0].source, "first_name");

        let sources = vec!["first-name".to_string(), "first_name".to_string()];
        let matches = mapper.discover_properties(&sources, &["firstName".to_string()]);
        assert_eq!(matches[0].source, "first-name");
    }

    #[test]
    fn test_generic_map_short_circuits() {
        let mapper = ConventionMapper::new(registry());
        assert!(mapper.discover_mappings("array", "UserDto").is_empty());
        assert!(mapper.discover_mappings("UserRecord", "array").is_empty());
    }

    #[test]
    fn test_apply_conventions_keeps_explicit_members() {
        let registry = registry();
        let mapper = ConventionMapper::new(registry.clone());
        let mapping = TypeMapping::new(
            PairKey::new("UserRecord", "UserDto"),
            MappingStorage::new(),
            registry,
            TransformerRegistry::new(),
        );
        mapping
            .for_member("firstName", |m| {
                m.map_from("last_name");
            })
            .unwrap();

        assert_eq!(mapper.apply_conventions(&mapping).unwrap(), 1);
        assert_eq!(
            mapping
                .get_mapping("firstName")
                .unwrap()
                .unwrap()
                .source_property(),
            Some("last_name")
        );
        assert_eq!(
            mapping.get_mapping("userId").unwrap().unwrap().source_property(),
            Some("user_id")
        );
    }
}

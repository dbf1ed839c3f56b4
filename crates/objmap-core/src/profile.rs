//! Mapping profiles
//!
//! A profile bundles `create_map` calls and runs them once when added to a
//! [`Mapper`]. Profiles can be written in code ([`MappingProfile`]) or
//! declared in YAML ([`DeclarativeProfile`]):
//!
//! ```yaml
//! name: users
//! maps:
//!   - source: UserEntity
//!     destination: UserDto
//!     reverse: true
//!     members:
//!       fullName:
//!         map_from: name
//!         transform: trim
//!       password:
//!         ignore: true
//!       status:
//!         default: active
//!         only_if:
//!           op: exists
//!           field: status
//!   - source: Account
//!     destination: AccountDto
//!     pairs:
//!       - [accountId, id]
//! ```

use crate::condition::ConditionRule;
use crate::mapper::Mapper;
use crate::{Error, Result};
use objmap_value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A named bundle of mapping configuration
pub trait MappingProfile: Send + Sync {
    /// Unique profile name; a mapper runs each name once
    fn name(&self) -> &str;

    /// Register type mappings on the mapper.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from the mapper.
    fn configure(&self, mapper: &Mapper) -> Result<()>;
}

/// Profile read from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeProfile {
    pub name: String,
    #[serde(default)]
    pub maps: Vec<MapDefinition>,
}

/// One type pair of a declarative profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub source: String,
    pub destination: String,
    /// Also create the inverted `destination -> source` map
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub members: BTreeMap<String, MemberDefinition>,
    /// `[source_member, destination_member]` pairs mapped in both
    /// directions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<(String, String)>,
    /// Seal the map once configured
    #[serde(default)]
    pub seal: bool,
}

/// Configuration of one destination member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_from: Option<String>,
    /// Name of a registered transformer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_if: Option<ConditionRule>,
}

/// Profile parse error with the YAML location, when known
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, " at line {line}, column {col}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::Parse(error.to_string())
    }
}

impl DeclarativeProfile {
    /// Parse a profile from YAML
    ///
    /// # Errors
    ///
    /// Returns an error when YAML parsing fails.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, ParseError> {
        serde_yaml::from_str(yaml).map_err(|e| ParseError {
            message: format!("Failed to parse profile: {e}"),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
        })
    }

    /// Parse a profile from a file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> std::result::Result<Self, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseError {
            message: format!("Failed to read file: {e}"),
            line: None,
            column: None,
        })?;
        Self::from_yaml(&content)
    }

    /// Serialize the profile to YAML
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_yaml(&self) -> std::result::Result<String, ParseError> {
        serde_yaml::to_string(self).map_err(|e| ParseError {
            message: format!("Failed to serialize: {e}"),
            line: None,
            column: None,
        })
    }
}

impl MappingProfile for DeclarativeProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&self, mapper: &Mapper) -> Result<()> {
        for map in &self.maps {
            let mapping = mapper.create_map(&map.source, &map.destination);
            for (destination, member) in &map.members {
                mapping.for_member(destination, |m| {
                    if let Some(source) = &member.map_from {
                        m.map_from(source.clone());
                    }
                    if let Some(name) = &member.transform {
                        m.using_named(name.clone());
                    }
                    if let Some(rule) = &member.only_if {
                        m.only_if_rule(rule.clone());
                    }
                    if let Some(default) = &member.default {
                        m.default_value(default.clone());
                    }
                    if member.ignore {
                        m.ignore();
                    }
                })?;
            }

            if !map.pairs.is_empty() {
                let bidirectional = mapper.create_map_bidirectional(&map.source, &map.destination);
                for (source_member, destination_member) in &map.pairs {
                    bidirectional.for_members(source_member, destination_member)?;
                }
            }

            if map.reverse {
                mapper.create_reverse_map(&map.source, &map.destination)?;
            }
            if map.seal {
                mapping.seal()?;
            }
            debug!(
                "Profile {} configured {} -> {}",
                self.name, map.source, map.destination
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objmap_schema::{TypeDescriptor, TypeRegistry};
    use objmap_value::Object;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PROFILE: &str = r"
name: users
maps:
  - source: UserEntity
    destination: UserDto
    reverse: true
    members:
      fullName:
        map_from: name
        transform: trim
      password:
        ignore: true
      status:
        default: active
        only_if:
          op: equals
          field: state
          value: enabled
";

    fn mapper() -> Mapper {
        let types = TypeRegistry::new();
        types.register(
            TypeDescriptor::new("UserEntity").with_properties(["id", "name", "state", "password"]),
        );
        types.register(
            TypeDescriptor::new("UserDto").with_properties(["id", "fullName", "status", "password"]),
        );
        Mapper::builder().introspector(Arc::new(types)).build()
    }

    #[test]
    fn test_parse_profile() {
        let profile = DeclarativeProfile::from_yaml(PROFILE).unwrap();
        assert_eq!(profile.name, "users");
        let map = &profile.maps[0];
        assert!(map.reverse);
        assert_eq!(map.members["fullName"].map_from.as_deref(), Some("name"));
        assert!(map.members["password"].ignore);
        assert_eq!(map.members["status"].default, Some(Value::from("active")));
        assert!(matches!(
            map.members["status"].only_if,
            Some(ConditionRule::Equals { .. })
        ));
    }

    #[test]
    fn test_parse_error_has_location() {
        let error = DeclarativeProfile::from_yaml("name: x\nmaps: [\n").unwrap_err();
        assert!(error.line.is_some());
        assert!(error.to_string().contains("line"));

        let error = DeclarativeProfile::from_yaml("maps: []\n").unwrap_err();
        assert!(error.message.contains("name"));
    }

    #[test]
    fn test_apply_profile() {
        let mapper = mapper();
        let profile = DeclarativeProfile::from_yaml(PROFILE).unwrap();
        assert!(mapper.add_profile(&profile).unwrap());

        let entity = Value::Object(
            Object::typed("UserEntity")
                .with("id", 3)
                .with("name", "  Ann Lee ")
                .with("state", "disabled")
                .with("password", "secret"),
        );
        let dto = mapper.map(&entity, "UserDto").unwrap();
        assert_eq!(dto.get_path("fullName"), Some(&Value::from("Ann Lee")));
        assert_eq!(dto.get_path("status"), Some(&Value::from("active")));
        assert_eq!(dto.get_path("id"), Some(&Value::Integer(3)));
        assert!(dto.get_path("password").is_none());

        // transformed members are not inverted
        let reverse = mapper.type_mapping("UserDto", "UserEntity").unwrap();
        assert!(reverse.get_mapping("name").unwrap().is_none());
    }

    #[test]
    fn test_profile_runs_once() {
        struct Counting(AtomicUsize);
        impl MappingProfile for Counting {
            fn name(&self) -> &str {
                "counting"
            }
            fn configure(&self, _mapper: &Mapper) -> Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let mapper = mapper();
        let profile = Counting(AtomicUsize::new(0));
        assert!(mapper.add_profile(&profile).unwrap());
        assert!(!mapper.add_profile(&profile).unwrap());
        assert_eq!(profile.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_profile_can_be_retried() {
        let mapper = mapper();
        let profile = DeclarativeProfile::from_yaml(
            "name: broken\nmaps:\n  - source: UserEntity\n    destination: UserDto\n    seal: true\n    members:\n      nickname:\n        map_from: name\n",
        )
        .unwrap();
        assert!(mapper.add_profile(&profile).is_err());
        // the stored member still fails sealing on the second attempt
        assert!(mapper.add_profile(&profile).is_err());
    }

    #[test]
    fn test_to_yaml_round_trip() {
        let profile = DeclarativeProfile::from_yaml(PROFILE).unwrap();
        let yaml = profile.to_yaml().unwrap();
        assert_eq!(DeclarativeProfile::from_yaml(&yaml).unwrap(), profile);
    }
}

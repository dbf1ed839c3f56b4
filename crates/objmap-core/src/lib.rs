//! # objmap-core
//!
//! Mapping configuration and resolution engine.
//!
//! A [`Mapper`] turns a source value into a destination record. Per-property
//! rules live in [`PropertyMapping`]s grouped by [`TypeMapping`] (one per
//! ordered source/destination type pair). Properties without explicit rules
//! are matched by name, either exactly or through naming-convention
//! discovery ([`ConventionMapper`]). Resolved plans are memoized in a
//! [`MappingCache`].

pub mod cache;
pub mod collection;
pub mod condition;
pub mod config;
pub mod convention_mapper;
pub mod conventions;
pub mod factory;
pub mod global;
pub mod introspect;
pub mod mapper;
pub mod plan;
pub mod profile;
pub mod property_mapping;
pub mod storage;
pub mod transformer;
pub mod type_mapping;

pub use cache::{CachePolicy, MappingCache};
pub use collection::CollectionTransformer;
pub use condition::{Condition, ConditionRule};
pub use config::MapperConfig;
pub use convention_mapper::{ConventionMapper, DiscoveredMatch};
pub use conventions::NamingConvention;
pub use factory::{ObjectFactory, RecordFactory};
pub use introspect::{ARRAY_TYPE, SourceView, TypeIntrospector};
pub use mapper::{BidirectionalMapping, Mapper, MapperBuilder};
pub use objmap_value::{Object, Value};
pub use plan::{PlanMember, PlanOrigin, ResolvedPlan};
pub use profile::{DeclarativeProfile, MappingProfile};
pub use property_mapping::PropertyMapping;
pub use storage::{MappingStorage, PairKey};
pub use transformer::{Transform, Transformer, TransformerRegistry};
pub use type_mapping::TypeMapping;

use thiserror::Error;

/// Errors that can occur during mapping
#[derive(Error, Debug)]
pub enum Error {
    /// A type mapping failed validation while sealing
    #[error(
        "Invalid mapping {source_type} -> {destination_type}{member}: {issue}",
        member = member_label(.property.as_deref())
    )]
    Configuration {
        source_type: String,
        destination_type: String,
        property: Option<String>,
        issue: ConfigurationIssue,
    },

    /// A member was configured after the type mapping was sealed
    #[error(
        "Mapping {source_type} -> {destination_type} is sealed; cannot configure member '{property}'"
    )]
    Sealed {
        source_type: String,
        destination_type: String,
        property: String,
    },

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Profile parse error: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Value(#[from] objmap_value::Error),

    #[error(transparent)]
    Schema(#[from] objmap_schema::Error),
}

/// The configuration rule a type mapping violated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationIssue {
    #[error("destination type '{0}' cannot be resolved")]
    UnknownDestinationType(String),

    #[error("destination type has no property '{0}'")]
    UnknownDestinationProperty(String),

    #[error("source type '{source_type}' has no property '{property}'")]
    UnknownSourceProperty {
        source_type: String,
        property: String,
    },

    #[error("member is both mapped and ignored")]
    MappedAndIgnored,

    #[error("invalid transformer: {0}")]
    InvalidTransformer(String),

    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    #[error("validation failed: {0}")]
    Internal(String),
}

fn member_label(property: Option<&str>) -> String {
    property.map(|p| format!(" (member '{p}')")).unwrap_or_default()
}

impl Error {
    /// Build a configuration error for a type pair
    pub fn configuration(
        source_type: impl Into<String>,
        destination_type: impl Into<String>,
        property: Option<&str>,
        issue: ConfigurationIssue,
    ) -> Self {
        Self::Configuration {
            source_type: source_type.into(),
            destination_type: destination_type.into(),
            property: property.map(str::to_string),
            issue,
        }
    }

    /// The violated rule, for configuration errors
    #[must_use]
    pub fn issue(&self) -> Option<&ConfigurationIssue> {
        match self {
            Self::Configuration { issue, .. } => Some(issue),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

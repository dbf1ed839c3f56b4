//! Per-property mapping rules

use crate::condition::{Condition, ConditionRule};
use crate::introspect::SourceView;
use crate::transformer::{Transform, Transformer, TransformerRegistry};
use crate::Result;
use objmap_value::Value;
use std::sync::Arc;
use tracing::trace;

/// Mapping rule for one destination property.
///
/// Configuration methods overwrite their own slot and return `&mut Self` so
/// they can be chained inside a `for_member` closure:
///
/// ```
/// use objmap_core::{PropertyMapping, Value};
///
/// let mut member = PropertyMapping::new();
/// member.map_from("customer.email").using_named("lowercase").default_value("n/a");
/// assert_eq!(member.source_property(), Some("customer.email"));
/// assert!(member.has_default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyMapping {
    source_property: Option<String>,
    transformer: Option<Transformer>,
    condition: Option<Condition>,
    default_value: Option<Value>,
    ignored: bool,
}

impl PropertyMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value from a source key or dot path
    pub fn map_from(&mut self, source_property: impl Into<String>) -> &mut Self {
        self.source_property = Some(source_property.into());
        self
    }

    /// Set the transformer
    pub fn using(&mut self, transformer: Transformer) -> &mut Self {
        self.transformer = Some(transformer);
        self
    }

    /// Set a `(value, source)` closure as the transformer
    pub fn using_fn(
        &mut self,
        f: impl Fn(Value, &SourceView) -> Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.using(Transformer::function(f))
    }

    /// Set a transformer object
    pub fn using_transform(&mut self, transform: Arc<dyn Transform>) -> &mut Self {
        self.using(Transformer::Object(transform))
    }

    /// Use a transformer registered under `name`
    pub fn using_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.using(Transformer::named(name))
    }

    /// Gate the transformation on a predicate
    pub fn only_if(
        &mut self,
        predicate: impl Fn(&SourceView) -> Result<bool> + Send + Sync + 'static,
    ) -> &mut Self {
        self.condition = Some(Condition::predicate(predicate));
        self
    }

    /// Gate the transformation on a declarative rule
    pub fn only_if_rule(&mut self, rule: ConditionRule) -> &mut Self {
        self.condition = Some(Condition::Rule(rule));
        self
    }

    /// Value used when the resolved value is null. `Value::Null` is a valid
    /// default and still counts as having one.
    pub fn default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default_value = Some(value.into());
        self
    }

    /// Exclude the property. Wins over every other setting.
    pub fn ignore(&mut self) -> &mut Self {
        self.ignored = true;
        self
    }

    #[must_use]
    pub fn source_property(&self) -> Option<&str> {
        self.source_property.as_deref()
    }

    #[must_use]
    pub fn transformer(&self) -> Option<&Transformer> {
        self.transformer.as_ref()
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    #[must_use]
    pub fn get_default(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Whether a source property or transformer is configured
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.source_property.is_some() || self.transformer.is_some()
    }

    /// Run the pipeline with the built-in transformer registry
    ///
    /// # Errors
    ///
    /// Propagates transformer and condition errors unmodified.
    pub fn transform(&self, raw: Value, source: &SourceView) -> Result<Value> {
        self.transform_with(raw, source, TransformerRegistry::builtin())
    }

    /// Run the pipeline: ignore, condition, transformer, default.
    ///
    /// # Errors
    ///
    /// Propagates transformer and condition errors unmodified.
    pub fn transform_with(
        &self,
        raw: Value,
        source: &SourceView,
        registry: &TransformerRegistry,
    ) -> Result<Value> {
        if self.ignored {
            return Ok(Value::Null);
        }

        let gated = match &self.condition {
            Some(condition) => !condition.evaluate(source)?,
            None => false,
        };

        let value = if gated {
            trace!("Condition false, skipping transformation");
            Value::Null
        } else if let Some(transformer) = &self.transformer {
            transformer.apply(raw, source, registry)?
        } else {
            raw
        };

        match (&value, &self.default_value) {
            (Value::Null, Some(default)) => Ok(default.clone()),
            _ => Ok(value),
        }
    }
}

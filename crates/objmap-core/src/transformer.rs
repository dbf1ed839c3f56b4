//! Value transformers
//!
//! A transformer turns the raw source value of a property into the
//! destination value. Three shapes are accepted: a closure over
//! `(value, source)`, an object implementing [`Transform`], or the name of a
//! transformer registered in a [`TransformerRegistry`].

use crate::introspect::SourceView;
use crate::{Error, Result};
use objmap_value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

/// Closure transformer signature
pub type TransformFn = Arc<dyn Fn(Value, &SourceView) -> Result<Value> + Send + Sync>;

/// Object transformer capability
pub trait Transform: Send + Sync {
    /// Transform a raw source value. Errors propagate to the caller of `map`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be transformed.
    fn transform(&self, value: Value, source: &SourceView) -> Result<Value>;

    /// Checked when the owning type mapping is sealed; `Err` carries the reason
    /// the transformer is unusable.
    ///
    /// # Errors
    ///
    /// Returns the reason the transformer cannot be used.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// A configured transformer
#[derive(Clone)]
pub enum Transformer {
    /// Two-argument closure `(value, source)`
    Function(TransformFn),

    /// Object implementing [`Transform`]
    Object(Arc<dyn Transform>),

    /// Reference to a registered transformer
    Named(String),
}

impl Transformer {
    /// Wrap a `(value, source)` closure
    pub fn function(f: impl Fn(Value, &SourceView) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    /// Wrap a single-argument function that ignores the source
    pub fn value_fn(f: impl Fn(Value) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(move |value, _| f(value)))
    }

    /// Wrap a transformer object
    pub fn object(transform: impl Transform + 'static) -> Self {
        Self::Object(Arc::new(transform))
    }

    /// Reference a registered transformer by name
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Run the transformer
    ///
    /// # Errors
    ///
    /// Returns the transformer's own error unmodified, or a transform error
    /// when a named transformer is not registered.
    pub fn apply(
        &self,
        value: Value,
        source: &SourceView,
        registry: &TransformerRegistry,
    ) -> Result<Value> {
        match self {
            Self::Function(f) => f(value, source),
            Self::Object(transform) => transform.transform(value, source),
            Self::Named(name) => registry
                .get(name)?
                .ok_or_else(|| Error::Transform(format!("Unknown transformer '{name}'")))?
                .transform(value, source),
        }
    }

    /// Why this transformer cannot be used, if it cannot.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub fn invalid_reason(&self, registry: &TransformerRegistry) -> Result<Option<String>> {
        match self {
            Self::Function(_) => Ok(None),
            Self::Object(transform) => Ok(transform.validate().err()),
            Self::Named(name) => Ok((!registry.contains(name)?)
                .then(|| format!("no transformer named '{name}' is registered"))),
        }
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Transformer::Function"),
            Self::Object(_) => f.write_str("Transformer::Object"),
            Self::Named(name) => write!(f, "Transformer::Named({name:?})"),
        }
    }
}

/// Adapter turning a plain value function into a [`Transform`]
struct ValueFn(fn(&Value) -> Result<Value>);

impl Transform for ValueFn {
    fn transform(&self, value: Value, _source: &SourceView) -> Result<Value> {
        (self.0)(&value)
    }
}

/// Thread-safe registry of named transformers
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: Arc<RwLock<HashMap<String, Arc<dyn Transform>>>>,
}

static BUILTIN: LazyLock<TransformerRegistry> = LazyLock::new(TransformerRegistry::with_builtins);

impl TransformerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in transformers
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut map: HashMap<String, Arc<dyn Transform>> = HashMap::new();
        let builtins: [(&str, fn(&Value) -> Result<Value>); 8] = [
            ("uppercase", transform_uppercase),
            ("lowercase", transform_lowercase),
            ("trim", transform_trim),
            ("to_string", transform_to_string),
            ("to_integer", transform_to_integer),
            ("to_decimal", transform_to_decimal),
            ("to_boolean", transform_to_boolean),
            ("null_if_empty", transform_null_if_empty),
        ];
        for (name, f) in builtins {
            map.insert(name.to_string(), Arc::new(ValueFn(f)));
        }
        Self {
            transformers: Arc::new(RwLock::new(map)),
        }
    }

    /// Process-wide registry of built-in transformers
    #[must_use]
    pub fn builtin() -> &'static TransformerRegistry {
        &BUILTIN
    }

    /// Register a transformer object under a name, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register(&self, name: impl Into<String>, transform: Arc<dyn Transform>) -> Result<()> {
        let mut transformers = self
            .transformers
            .write()
            .map_err(|_| Error::Mapping("Failed to lock transformer registry".to_string()))?;
        transformers.insert(name.into(), transform);
        Ok(())
    }

    /// Register a `(value, source)` closure under a name
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register_fn(
        &self,
        name: impl Into<String>,
        f: impl Fn(Value, &SourceView) -> Result<Value> + Send + Sync + 'static,
    ) -> Result<()> {
        struct Closure<F>(F);
        impl<F> Transform for Closure<F>
        where
            F: Fn(Value, &SourceView) -> Result<Value> + Send + Sync,
        {
            fn transform(&self, value: Value, source: &SourceView) -> Result<Value> {
                (self.0)(value, source)
            }
        }
        self.register(name, Arc::new(Closure(f)))
    }

    /// Get a transformer by name
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn get(&self, name: &str) -> Result<Option<Arc<dyn Transform>>> {
        let transformers = self
            .transformers
            .read()
            .map_err(|_| Error::Mapping("Failed to lock transformer registry".to_string()))?;
        Ok(transformers.get(name).cloned())
    }

    /// Check if a transformer is registered
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Registered transformer names, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn names(&self) -> Result<Vec<String>> {
        let transformers = self
            .transformers
            .read()
            .map_err(|_| Error::Mapping("Failed to lock transformer registry".to_string()))?;
        let mut names: Vec<String> = transformers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("names", &self.names().unwrap_or_default())
            .finish()
    }
}

fn map_string(value: &Value, label: &str, f: impl Fn(&str) -> String) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(f(s))),
        Value::Null => Ok(Value::Null),
        _ => value
            .as_string()
            .map(|s| Value::String(f(&s)))
            .ok_or_else(|| Error::Transform(format!("Cannot {label} a {} value", value.kind()))),
    }
}

/// Convert string to uppercase
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_uppercase(value: &Value) -> Result<Value> {
    map_string(value, "uppercase", str::to_uppercase)
}

/// Convert string to lowercase
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_lowercase(value: &Value) -> Result<Value> {
    map_string(value, "lowercase", str::to_lowercase)
}

/// Trim whitespace from string
///
/// # Errors
///
/// Returns an error if the value cannot be represented as a string.
pub fn transform_trim(value: &Value) -> Result<Value> {
    map_string(value, "trim", |s| s.trim().to_string())
}

/// Render a scalar as a string
///
/// # Errors
///
/// Returns an error for lists and objects.
pub fn transform_to_string(value: &Value) -> Result<Value> {
    map_string(value, "stringify", str::to_string)
}

/// Parse or narrow a value to an integer
///
/// # Errors
///
/// Returns an error when the value has no integer interpretation.
#[allow(clippy::cast_possible_truncation)]
pub fn transform_to_integer(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Decimal(d) if d.is_finite() => Ok(Value::Integer(d.trunc() as i64)),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        other => other
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| Error::Transform(format!("Cannot convert {} to integer", other.kind()))),
    }
}

/// Parse or widen a value to a decimal
///
/// # Errors
///
/// Returns an error when the value has no numeric interpretation.
pub fn transform_to_decimal(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        other => other
            .as_f64()
            .map(Value::Decimal)
            .ok_or_else(|| Error::Transform(format!("Cannot convert {} to decimal", other.kind()))),
    }
}

/// Interpret a value as a boolean
///
/// # Errors
///
/// Returns an error when the value has no boolean interpretation.
pub fn transform_to_boolean(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        other => other
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| Error::Transform(format!("Cannot convert {} to boolean", other.kind()))),
    }
}

/// Turn empty or whitespace-only strings into null
///
/// # Errors
///
/// Never fails.
pub fn transform_null_if_empty(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_string_transforms() {
        assert_eq!(
            transform_uppercase(&Value::from("hello")).unwrap(),
            Value::from("HELLO")
        );
        assert_eq!(
            transform_lowercase(&Value::from("HeLLo")).unwrap(),
            Value::from("hello")
        );
        assert_eq!(
            transform_trim(&Value::from("  hi  ")).unwrap(),
            Value::from("hi")
        );
        assert_eq!(transform_uppercase(&Value::Null).unwrap(), Value::Null);
        assert_eq!(
            transform_to_string(&Value::Integer(12)).unwrap(),
            Value::from("12")
        );
        assert!(transform_uppercase(&Value::List(vec![])).is_err());
    }

    #[test]
    fn test_builtin_numeric_transforms() {
        assert_eq!(
            transform_to_integer(&Value::from(" 42 ")).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            transform_to_integer(&Value::Decimal(3.9)).unwrap(),
            Value::Integer(3)
        );
        assert_eq!(
            transform_to_decimal(&Value::Integer(2)).unwrap(),
            Value::Decimal(2.0)
        );
        assert_eq!(
            transform_to_boolean(&Value::from("no")).unwrap(),
            Value::Boolean(false)
        );
        assert!(transform_to_integer(&Value::from("abc")).is_err());
        assert_eq!(
            transform_null_if_empty(&Value::from("  ")).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_registry_lookup_and_custom_registration() {
        let registry = TransformerRegistry::with_builtins();
        assert!(registry.contains("uppercase").unwrap());
        assert!(!registry.contains("reverse").unwrap());

        registry
            .register_fn("reverse", |value, _| {
                Ok(value
                    .as_str()
                    .map_or(Value::Null, |s| Value::String(s.chars().rev().collect())))
            })
            .unwrap();
        assert!(registry.contains("reverse").unwrap());

        let out = Transformer::named("reverse")
            .apply(Value::from("abc"), &SourceView::empty(), &registry)
            .unwrap();
        assert_eq!(out, Value::from("cba"));
    }

    #[test]
    fn test_cloned_registry_shares_entries() {
        let registry = TransformerRegistry::new();
        let clone = registry.clone();
        clone
            .register_fn("noop", |value, _| Ok(value))
            .unwrap();
        assert_eq!(registry.names().unwrap(), vec!["noop"]);
    }

    #[test]
    fn test_unknown_named_transformer() {
        let registry = TransformerRegistry::new();
        let transformer = Transformer::named("missing");
        assert!(transformer.invalid_reason(&registry).unwrap().is_some());
        assert!(matches!(
            transformer.apply(Value::Null, &SourceView::empty(), &registry),
            Err(Error::Transform(_))
        ));
    }

    #[test]
    fn test_function_shapes_are_always_valid() {
        let registry = TransformerRegistry::new();
        let two_arg = Transformer::function(|value, source| {
            Ok(source.get("suffix").cloned().unwrap_or(value))
        });
        let one_arg = Transformer::value_fn(|value| Ok(value));
        assert!(two_arg.invalid_reason(&registry).unwrap().is_none());
        assert!(one_arg.invalid_reason(&registry).unwrap().is_none());
    }
}

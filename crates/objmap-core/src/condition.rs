//! Member conditions
//!
//! A condition is evaluated against the normalized source before a member's
//! transformer runs. When it evaluates to false the member resolves to its
//! default value, or null.

use crate::introspect::SourceView;
use crate::{Error, Result};
use objmap_value::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Closure predicate signature
pub type PredicateFn = Arc<dyn Fn(&SourceView) -> Result<bool> + Send + Sync>;

/// A configured member condition
#[derive(Clone)]
pub enum Condition {
    /// Arbitrary predicate over the source
    Predicate(PredicateFn),

    /// Declarative rule
    Rule(ConditionRule),
}

impl Condition {
    /// Wrap a predicate closure
    pub fn predicate(f: impl Fn(&SourceView) -> Result<bool> + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Evaluate the condition
    ///
    /// # Errors
    ///
    /// Returns the predicate's error, or an error for an invalid rule pattern.
    pub fn evaluate(&self, source: &SourceView) -> Result<bool> {
        match self {
            Self::Predicate(f) => f(source),
            Self::Rule(rule) => rule.evaluate(source),
        }
    }

    /// Why this condition cannot be evaluated, if it cannot
    #[must_use]
    pub fn invalid_reason(&self) -> Option<String> {
        match self {
            Self::Predicate(_) => None,
            Self::Rule(rule) => rule.validate().err(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Condition::Predicate"),
            Self::Rule(rule) => f.debug_tuple("Condition::Rule").field(rule).finish(),
        }
    }
}

impl From<ConditionRule> for Condition {
    fn from(rule: ConditionRule) -> Self {
        Self::Rule(rule)
    }
}

/// Declarative condition over source fields. Field references may be dot
/// paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConditionRule {
    /// Field exists and is not null or an empty string
    Exists { field: String },

    /// Field equals value; scalars compare by their string form
    Equals { field: String, value: Value },

    /// String field contains value
    Contains { field: String, value: String },

    /// String field matches a regular expression
    Matches { field: String, pattern: String },

    /// Logical AND of conditions
    And { conditions: Vec<ConditionRule> },

    /// Logical OR of conditions
    Or { conditions: Vec<ConditionRule> },

    /// Logical NOT of condition
    Not { condition: Box<ConditionRule> },
}

impl ConditionRule {
    /// Evaluate the rule against a source
    ///
    /// # Errors
    ///
    /// Returns an error if a `matches` pattern is not a valid regex.
    pub fn evaluate(&self, source: &SourceView) -> Result<bool> {
        match self {
            Self::Exists { field } => Ok(match source.get(field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            }),
            Self::Equals { field, value } => Ok(source
                .get(field)
                .is_some_and(|actual| loosely_equal(actual, value))),
            Self::Contains { field, value } => Ok(source
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(value.as_str()))),
            Self::Matches { field, pattern } => {
                let regex = compile(pattern)?;
                Ok(source
                    .get(field)
                    .and_then(Value::as_string)
                    .is_some_and(|s| regex.is_match(&s)))
            }
            Self::And { conditions } => {
                for condition in conditions {
                    if !condition.evaluate(source)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or { conditions } => {
                for condition in conditions {
                    if condition.evaluate(source)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not { condition } => Ok(!condition.evaluate(source)?),
        }
    }

    /// Check that every pattern in the rule compiles
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid pattern.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Matches { pattern, .. } => compile(pattern).map(|_| ()).map_err(|e| e.to_string()),
            Self::And { conditions } | Self::Or { conditions } => {
                conditions.iter().try_for_each(Self::validate)
            }
            Self::Not { condition } => condition.validate(),
            Self::Exists { .. } | Self::Equals { .. } | Self::Contains { .. } => Ok(()),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Mapping(format!("Invalid pattern '{pattern}': {e}")))
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual.as_string(), expected.as_string()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objmap_value::Object;

    fn source() -> SourceView {
        SourceView::new(
            Object::typed("Order")
                .with("status", "shipped")
                .with("total", 42)
                .with("note", "")
                .with("customer", Object::new().with("email", "a@example.com")),
        )
    }

    #[test]
    fn test_exists() {
        let s = source();
        assert!(ConditionRule::Exists { field: "status".into() }.evaluate(&s).unwrap());
        assert!(!ConditionRule::Exists { field: "note".into() }.evaluate(&s).unwrap());
        assert!(!ConditionRule::Exists { field: "missing".into() }.evaluate(&s).unwrap());
        assert!(
            ConditionRule::Exists { field: "customer.email".into() }
                .evaluate(&s)
                .unwrap()
        );
    }

    #[test]
    fn test_equals_compares_scalars_loosely() {
        let s = source();
        let rule = ConditionRule::Equals {
            field: "total".into(),
            value: Value::from("42"),
        };
        assert!(rule.evaluate(&s).unwrap());
        let rule = ConditionRule::Equals {
            field: "status".into(),
            value: Value::from("pending"),
        };
        assert!(!rule.evaluate(&s).unwrap());
    }

    #[test]
    fn test_matches_and_logic() {
        let s = source();
        let rule = ConditionRule::And {
            conditions: vec![
                ConditionRule::Matches {
                    field: "customer.email".into(),
                    pattern: r"^[^@]+@example\.com$".into(),
                },
                ConditionRule::Not {
                    condition: Box::new(ConditionRule::Contains {
                        field: "status".into(),
                        value: "cancel".into(),
                    }),
                },
            ],
        };
        assert!(rule.evaluate(&s).unwrap());

        let rule = ConditionRule::Or {
            conditions: vec![
                ConditionRule::Exists { field: "note".into() },
                ConditionRule::Equals {
                    field: "status".into(),
                    value: Value::from("open"),
                },
            ],
        };
        assert!(!rule.evaluate(&s).unwrap());
    }

    #[test]
    fn test_invalid_pattern() {
        let rule = ConditionRule::Not {
            condition: Box::new(ConditionRule::Matches {
                field: "status".into(),
                pattern: "([a-z".into(),
            }),
        };
        assert!(rule.validate().is_err());
        assert!(rule.evaluate(&source()).is_err());
        assert!(Condition::from(rule).invalid_reason().is_some());
    }

    #[test]
    fn test_predicate() {
        let condition = Condition::predicate(|s| Ok(s.contains("status")));
        assert!(condition.evaluate(&source()).unwrap());
        assert!(condition.invalid_reason().is_none());
    }

    #[test]
    fn test_parse_rule_from_yaml() {
        let yaml = "op: and\nconditions:\n  - op: exists\n    field: status\n  - op: equals\n    field: total\n    value: 42\n";
        let rule: ConditionRule = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(rule, ConditionRule::And { ref conditions } if conditions.len() == 2));
        assert!(rule.evaluate(&source()).unwrap());
    }
}

//! Naming conventions
//!
//! A convention recognizes a property naming style, converts names to and
//! from a canonical lowercase token string (`"firstName"` → `"first name"`)
//! and scores how likely two names refer to the same property.

mod abbreviation;
mod camel;
mod kebab;
mod pascal;
mod prefix;
mod snake;

pub use abbreviation::AbbreviationConvention;
pub use camel::CamelCaseConvention;
pub use kebab::KebabCaseConvention;
pub use pascal::PascalCaseConvention;
pub use prefix::PrefixConvention;
pub use snake::SnakeCaseConvention;

use std::fmt::Debug;
use std::sync::Arc;

/// Score for identical names or identical token sequences in one style
pub const EXACT_CONFIDENCE: f64 = 1.0;
/// Same tokens written in different casing styles
pub const CROSS_CONVENTION_CONFIDENCE: f64 = 0.85;
/// One side carries a verb prefix the other lacks
pub const PREFIX_ONE_SIDED_CONFIDENCE: f64 = 0.9;
/// Abbreviation expands to exactly the other name
pub const ABBREVIATION_CONFIDENCE: f64 = 0.8;
/// Upper bound for partial token overlap after expansion
pub const ABBREVIATION_PARTIAL_CAP: f64 = 0.7;

/// A property naming style
pub trait NamingConvention: Send + Sync + Debug {
    /// Short identifier, e.g. `camel_case`
    fn name(&self) -> &str;

    /// Whether `name` looks like it is written in this style
    fn matches(&self, name: &str) -> bool;

    /// Canonical lowercase, space-separated token string
    fn normalize(&self, name: &str) -> String {
        split_words(name).join(" ")
    }

    /// Render a canonical token string in this style
    fn denormalize(&self, tokens: &str) -> String;

    /// Confidence in `[0, 1]` that the two names refer to the same property
    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64;
}

/// Built-in conventions in detection priority order
#[must_use]
pub fn default_conventions() -> Vec<Arc<dyn NamingConvention>> {
    vec![
        Arc::new(PrefixConvention::new()),
        Arc::new(AbbreviationConvention::new()),
        Arc::new(SnakeCaseConvention),
        Arc::new(KebabCaseConvention),
        Arc::new(PascalCaseConvention),
        Arc::new(CamelCaseConvention),
    ]
}

/// Split a property name into lowercase words on separators (`_`, `-`,
/// space, `.`) and case boundaries. Acronyms stay together:
/// `HTTPServer` → `["http", "server"]`, `userID` → `["user", "id"]`.
#[must_use]
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ' | '.') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Join words in camelCase
pub(crate) fn to_camel(words: &[&str]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Shared scoring for the casing conventions
pub(crate) fn casing_confidence(
    convention: &dyn NamingConvention,
    source: &str,
    destination: &str,
) -> f64 {
    if source == destination {
        return EXACT_CONFIDENCE;
    }
    if split_words(source) != split_words(destination) {
        return 0.0;
    }
    match (convention.matches(source), convention.matches(destination)) {
        (true, true) => EXACT_CONFIDENCE,
        (true, false) | (false, true) => CROSS_CONVENTION_CONFIDENCE,
        (false, false) => 0.0,
    }
}

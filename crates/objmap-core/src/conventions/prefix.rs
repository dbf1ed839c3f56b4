use super::{
    EXACT_CONFIDENCE, NamingConvention, PREFIX_ONE_SIDED_CONFIDENCE, split_words, to_camel,
};

const DEFAULT_PREFIXES: &[&str] = &[
    "get", "set", "is", "has", "find", "fetch", "retrieve", "update", "create", "delete", "remove",
    "build", "parse", "format", "convert", "validate", "make",
];

/// Accessor-style names with a leading verb: `getUserId`, `is_active`
#[derive(Debug, Clone)]
pub struct PrefixConvention {
    prefixes: Vec<String>,
}

impl PrefixConvention {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    /// Recognize an additional prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into().to_lowercase());
        self
    }

    /// Words after a recognized prefix. A bare prefix (`get`) has no
    /// remainder and does not count as prefixed.
    fn remainder(&self, name: &str) -> Option<Vec<String>> {
        let words = split_words(name);
        match words.split_first() {
            Some((first, rest)) if !rest.is_empty() && self.prefixes.iter().any(|p| p == first) => {
                Some(rest.to_vec())
            }
            _ => None,
        }
    }
}

impl Default for PrefixConvention {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingConvention for PrefixConvention {
    fn name(&self) -> &str {
        "prefix"
    }

    fn matches(&self, name: &str) -> bool {
        self.remainder(name).is_some()
    }

    fn denormalize(&self, tokens: &str) -> String {
        let words: Vec<&str> = tokens.split_whitespace().collect();
        to_camel(&words)
    }

    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64 {
        match (self.remainder(source), self.remainder(destination)) {
            (Some(a), Some(b)) if a == b => EXACT_CONFIDENCE,
            (Some(_), Some(_)) | (None, None) => 0.0,
            (Some(rest), None) => {
                if rest == split_words(destination) {
                    PREFIX_ONE_SIDED_CONFIDENCE
                } else {
                    0.0
                }
            }
            (None, Some(rest)) => {
                if rest == split_words(source) {
                    PREFIX_ONE_SIDED_CONFIDENCE
                } else {
                    0.0
                }
            }
        }
    }
}

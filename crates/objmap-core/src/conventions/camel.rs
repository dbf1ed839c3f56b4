use super::{NamingConvention, casing_confidence, to_camel};
use regex::Regex;
use std::sync::LazyLock;

static CAMEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*([A-Z][a-z0-9]*)*$").expect("valid camel pattern")
});

/// `firstName`
#[derive(Debug, Default, Clone, Copy)]
pub struct CamelCaseConvention;

impl NamingConvention for CamelCaseConvention {
    fn name(&self) -> &str {
        "camel_case"
    }

    fn matches(&self, name: &str) -> bool {
        CAMEL.is_match(name)
    }

    fn denormalize(&self, tokens: &str) -> String {
        let words: Vec<&str> = tokens.split_whitespace().collect();
        to_camel(&words)
    }

    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64 {
        casing_confidence(self, source, destination)
    }
}

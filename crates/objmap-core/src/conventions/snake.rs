use super::{NamingConvention, casing_confidence};
use regex::Regex;
use std::sync::LazyLock;

static SNAKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)+$").expect("valid snake pattern")
});

/// `first_name`
#[derive(Debug, Default, Clone, Copy)]
pub struct SnakeCaseConvention;

impl NamingConvention for SnakeCaseConvention {
    fn name(&self) -> &str {
        "snake_case"
    }

    fn matches(&self, name: &str) -> bool {
        SNAKE.is_match(name)
    }

    fn denormalize(&self, tokens: &str) -> String {
        tokens.split_whitespace().collect::<Vec<_>>().join("_")
    }

    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64 {
        casing_confidence(self, source, destination)
    }
}

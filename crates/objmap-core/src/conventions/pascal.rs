use super::{NamingConvention, capitalize, casing_confidence};
use regex::Regex;
use std::sync::LazyLock;

static PASCAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z0-9]*([A-Z][a-z0-9]*)*$").expect("valid pascal pattern")
});

/// `FirstName`
#[derive(Debug, Default, Clone, Copy)]
pub struct PascalCaseConvention;

impl NamingConvention for PascalCaseConvention {
    fn name(&self) -> &str {
        "pascal_case"
    }

    fn matches(&self, name: &str) -> bool {
        PASCAL.is_match(name)
    }

    fn denormalize(&self, tokens: &str) -> String {
        tokens.split_whitespace().map(capitalize).collect()
    }

    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64 {
        casing_confidence(self, source, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        let c = PascalCaseConvention;
        assert!(c.matches("UserId"));
        assert!(!c.matches("userId"));
        assert_eq!(c.denormalize("user id"), "UserId");
        assert!((c.calculate_match_confidence("user_id", "UserId") - 0.85).abs() < 1e-9);
        assert!((c.calculate_match_confidence("UserID", "UserId") - 1.0).abs() < 1e-9);
    }
}

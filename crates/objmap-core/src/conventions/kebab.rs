use super::{NamingConvention, casing_confidence};
use regex::Regex;
use std::sync::LazyLock;

static KEBAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)+$").expect("valid kebab pattern")
});

/// `first-name`
#[derive(Debug, Default, Clone, Copy)]
pub struct KebabCaseConvention;

impl NamingConvention for KebabCaseConvention {
    fn name(&self) -> &str {
        "kebab_case"
    }

    fn matches(&self, name: &str) -> bool {
        KEBAB.is_match(name)
    }

    fn denormalize(&self, tokens: &str) -> String {
        tokens.split_whitespace().collect::<Vec<_>>().join("-")
    }

    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64 {
        casing_confidence(self, source, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        let c = KebabCaseConvention;
        assert!(c.matches("first-name"));
        assert!(!c.matches("first_name"));
        assert_eq!(c.denormalize("first name"), "first-name");
        assert!((c.calculate_match_confidence("firstName", "first-name") - 0.85).abs() < 1e-9);
    }
}

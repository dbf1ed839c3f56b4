use super::{
    ABBREVIATION_CONFIDENCE, ABBREVIATION_PARTIAL_CAP, NamingConvention, split_words, to_camel,
};
use std::collections::{BTreeMap, BTreeSet};

const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("id", "identifier"),
    ("desc", "description"),
    ("addr", "address"),
    ("dob", "date of birth"),
    ("qty", "quantity"),
    ("amt", "amount"),
    ("num", "number"),
    ("tel", "telephone"),
    ("msg", "message"),
    ("img", "image"),
    ("pwd", "password"),
    ("cat", "category"),
    ("org", "organization"),
    ("dept", "department"),
    ("mgr", "manager"),
    ("ts", "timestamp"),
];

/// Names using dictionary abbreviations: `userId` ~ `userIdentifier`,
/// `productDesc` ~ `product_description`
#[derive(Debug, Clone)]
pub struct AbbreviationConvention {
    expansions: BTreeMap<String, String>,
}

impl AbbreviationConvention {
    #[must_use]
    pub fn new() -> Self {
        Self {
            expansions: DEFAULT_ABBREVIATIONS
                .iter()
                .map(|(short, long)| ((*short).to_string(), (*long).to_string()))
                .collect(),
        }
    }

    /// Add or replace a dictionary entry; matching is case-insensitive
    #[must_use]
    pub fn with_abbreviation(mut self, short: &str, expansion: &str) -> Self {
        self.expansions
            .insert(short.to_lowercase(), expansion.to_lowercase());
        self
    }

    /// Expanded token set of a name and whether any token was expanded
    fn expand(&self, name: &str) -> (BTreeSet<String>, bool) {
        let mut expanded = false;
        let mut tokens = BTreeSet::new();
        for word in split_words(name) {
            match self.expansions.get(&word) {
                Some(long) => {
                    expanded = true;
                    tokens.extend(long.split_whitespace().map(str::to_string));
                }
                None => {
                    tokens.insert(word);
                }
            }
        }
        (tokens, expanded)
    }
}

impl Default for AbbreviationConvention {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingConvention for AbbreviationConvention {
    fn name(&self) -> &str {
        "abbreviation"
    }

    fn matches(&self, name: &str) -> bool {
        split_words(name)
            .iter()
            .any(|w| self.expansions.contains_key(w))
    }

    fn denormalize(&self, tokens: &str) -> String {
        let mut words: Vec<&str> = tokens.split_whitespace().collect();
        // longest expansions first so "date of birth" wins over shorter ones
        let mut entries: Vec<(&String, &String)> = self.expansions.iter().collect();
        entries.sort_by_key(|(_, long)| std::cmp::Reverse(long.split_whitespace().count()));

        for (short, long) in entries {
            let pattern: Vec<&str> = long.split_whitespace().collect();
            let mut i = 0;
            while i + pattern.len() <= words.len() {
                if words[i..i + pattern.len()] == pattern[..] {
                    words.splice(i..i + pattern.len(), [short.as_str()]);
                }
                i += 1;
            }
        }
        to_camel(&words)
    }

    fn calculate_match_confidence(&self, source: &str, destination: &str) -> f64 {
        let (a, a_expanded) = self.expand(source);
        let (b, b_expanded) = self.expand(destination);
        if !(a_expanded || b_expanded) || a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return ABBREVIATION_CONFIDENCE;
        }
        let common = a.intersection(&b).count();
        if common == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let overlap = (2 * common) as f64 / (a.len() + b.len()) as f64;
        overlap.min(ABBREVIATION_PARTIAL_CAP)
    }
}

//! Sensitive-data redaction: hide-rule matching over the rendered
//! message text.
//!
//! Every matching hide rule applies the same fixed placeholder, so
//! rule order cannot change the outcome; the substring-kind
//! expressions are therefore folded into one Aho-Corasick automaton
//! and checked in a single pass, with regex-kind expressions checked
//! through the pattern cache.

use aho_corasick::AhoCorasick;

use crate::cache::PatternCache;
use crate::rules::{HideRule, MatchSpec};

/// Placeholder written over the human-readable message fields when a
/// hide rule matches.
pub const HIDDEN_MESSAGE: &str = "The message logged has been removed due to the hide-message \
     configuration; it may contain sensitive data.";

/// Pre-compiled hide-rule matcher, built once per configuration.
pub(crate) struct HideMatcher {
    literals: Vec<String>,
    automaton: Option<AhoCorasick>,
    regexes: Vec<String>,
}

impl HideMatcher {
    pub fn new(rules: &[HideRule]) -> Self {
        let mut literals = Vec::new();
        let mut regexes = Vec::new();
        for rule in rules {
            match &rule.match_spec {
                MatchSpec::Substring { expression } => literals.push(expression.clone()),
                MatchSpec::Regex { expression, .. } => regexes.push(expression.clone()),
            }
        }

        let automaton = if literals.is_empty() {
            None
        } else {
            match AhoCorasick::new(&literals) {
                Ok(automaton) => Some(automaton),
                Err(error) => {
                    // Fall back to a per-literal scan.
                    tracing::warn!(%error, "failed to build hide-rule literal automaton");
                    None
                }
            }
        };

        Self {
            literals,
            automaton,
            regexes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.regexes.is_empty()
    }

    /// True when any hide rule matches `rendered`. An uncompilable
    /// regex expression is treated as non-matching and logged, never
    /// raised.
    pub fn matches(&self, rendered: &str, patterns: &PatternCache) -> bool {
        if let Some(automaton) = &self.automaton {
            if automaton.is_match(rendered) {
                return true;
            }
        } else if self
            .literals
            .iter()
            .any(|literal| rendered.contains(literal.as_str()))
        {
            return true;
        }

        for expression in &self.regexes {
            let Some(pattern) = patterns.pattern(expression) else {
                tracing::debug!(%expression, "unable to compile hide-rule expression");
                continue;
            };
            if pattern.is_match(rendered) {
                return true;
            }
        }

        false
    }
}

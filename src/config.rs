//! Translator configuration: ordered rule lists and conversion knobs.
//!
//! Configuration is plain serde data loaded from YAML. Structural
//! problems (empty expressions, zero-based parameter groups) are
//! rejected at load time; an expression with invalid regex *syntax* is
//! deliberately NOT a load error — it is cached as a non-matching
//! sentinel at evaluation time so one bad expression cannot take the
//! whole rule list down.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TranslateError};
use crate::rules::{ClassificationRule, HideRule, MatchSpec};

/// Sentinel target UEI meaning "drop this message" rather than
/// "reclassify it".
pub const DISCARD_UEI: &str = "DISCARD-MATCHING-MESSAGES";

/// Name of the default deployment location. Messages from here resolve
/// synchronously from their embedded source address and never consult
/// the resolution cache.
pub const DEFAULT_LOCATION: &str = "Default";

/// True when `location` names the default/local deployment zone.
pub fn is_default_location(location: &str) -> bool {
    location == DEFAULT_LOCATION
}

/// Configuration for [`MessageConverter`](crate::convert::MessageConverter).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TranslatorConfig {
    /// Target UEI that discards the message instead of reclassifying it.
    pub discard_uei: String,
    /// Preserve the raw datagram text verbatim as the `rawmessage`
    /// event parameter.
    pub include_raw_message: bool,
    /// Ordered UEI classification rules; first full match wins.
    pub rules: Vec<ClassificationRule>,
    /// Ordered sensitive-data hide rules.
    pub hide_rules: Vec<HideRule>,
    /// Bound on the hostname-resolution wait, in milliseconds. `None`
    /// blocks the converting worker until the lookup collaborator
    /// answers, which stalls the worker indefinitely under a hung
    /// resolver — size worker pools accordingly or set a bound.
    pub lookup_timeout_ms: Option<u64>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            discard_uei: DISCARD_UEI.to_string(),
            include_raw_message: false,
            rules: Vec::new(),
            hide_rules: Vec::new(),
            lookup_timeout_ms: None,
        }
    }
}

impl TranslatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a configuration from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TranslatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Structural validation, run once at load time.
    pub fn validate(&self) -> Result<()> {
        if self.discard_uei.is_empty() {
            return Err(TranslateError::InvalidConfig(
                "discard-uei must not be empty".to_string(),
            ));
        }

        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.uei.is_empty() {
                return Err(TranslateError::InvalidConfig(format!(
                    "rule #{idx}: uei must not be empty"
                )));
            }
            validate_match_spec(&rule.match_spec, &format!("rule #{idx}"))?;
            for assignment in &rule.parameter_assignments {
                if assignment.name.is_empty() {
                    return Err(TranslateError::InvalidConfig(format!(
                        "rule #{idx}: parameter assignment with empty name"
                    )));
                }
                if assignment.group == 0 {
                    return Err(TranslateError::InvalidConfig(format!(
                        "rule #{idx}: parameter '{}' references group 0; groups are 1-based",
                        assignment.name
                    )));
                }
            }
        }

        for (idx, hide) in self.hide_rules.iter().enumerate() {
            validate_match_spec(&hide.match_spec, &format!("hide-rule #{idx}"))?;
        }

        Ok(())
    }

    // Builder methods, mainly for tests and embedders that assemble
    // configuration in code rather than YAML.

    pub fn with_discard_uei(mut self, uei: impl Into<String>) -> Self {
        self.discard_uei = uei.into();
        self
    }

    pub fn with_rule(mut self, rule: ClassificationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_hide_rule(mut self, hide: HideRule) -> Self {
        self.hide_rules.push(hide);
        self
    }

    pub fn with_raw_message(mut self, include: bool) -> Self {
        self.include_raw_message = include;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The resolution-wait bound as a `Duration`, if one is configured.
    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_ms.map(Duration::from_millis)
    }
}

fn validate_match_spec(spec: &MatchSpec, context: &str) -> Result<()> {
    if spec.expression().is_empty() {
        return Err(TranslateError::InvalidConfig(format!(
            "{context}: match expression must not be empty"
        )));
    }
    Ok(())
}

//! Rule data model for classification and redaction.
//!
//! Rules are plain, validated-at-load data: a tagged [`MatchSpec`]
//! discriminates substring from regex matching, and the surrounding
//! rule types carry the gating sets and parameter assignments. Rule
//! order inside the configuration is significant — classification is a
//! single ordered pass in which the first full match wins.

use serde::Deserialize;

use crate::message::{Facility, Severity};

/// Body-match specification shared by classification and hide rules.
///
/// `Substring` is literal containment against the message body and
/// never extracts parameters. `Regex` is an unanchored find; with
/// `default_parameter_mapping` enabled, every capture group is emitted
/// as a positional `groupN` parameter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MatchSpec {
    Substring {
        expression: String,
    },
    Regex {
        expression: String,
        #[serde(default, rename = "default-parameter-mapping")]
        default_parameter_mapping: bool,
    },
}

impl MatchSpec {
    pub fn expression(&self) -> &str {
        match self {
            MatchSpec::Substring { expression } => expression,
            MatchSpec::Regex { expression, .. } => expression,
        }
    }
}

/// Explicit mapping from a regex capture group to a named event
/// parameter. A group that did not participate in the match yields the
/// parameter with an empty string value, never an absent parameter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ParameterAssignment {
    pub name: String,
    /// 1-based capture group index.
    pub group: usize,
}

/// One ordered UEI classification rule.
///
/// Empty facility/severity sets match any value. The optional
/// process/hostname/host-address expressions gate the rule with an
/// unanchored regex find; an absent expression is vacuously true, an
/// absent message field fails the gate.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassificationRule {
    /// Target UEI assigned on match, or the configured discard UEI.
    pub uei: String,
    #[serde(default)]
    pub facilities: Vec<Facility>,
    #[serde(default)]
    pub severities: Vec<Severity>,
    #[serde(default)]
    pub process_match: Option<String>,
    #[serde(default)]
    pub hostname_match: Option<String>,
    #[serde(default)]
    pub hostaddr_match: Option<String>,
    #[serde(rename = "match")]
    pub match_spec: MatchSpec,
    #[serde(default)]
    pub parameter_assignments: Vec<ParameterAssignment>,
}

/// One sensitive-data hide rule, evaluated against the fully rendered
/// message text. `default-parameter-mapping` has no effect here.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HideRule {
    #[serde(rename = "match")]
    pub match_spec: MatchSpec,
}

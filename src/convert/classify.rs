//! UEI classification: one ordered pass over the rule list.
//!
//! Each rule gates on facility/severity membership and optional
//! process/hostname/host-address expressions, then applies its body
//! match. The first rule whose gates and body match all succeed wins;
//! a winning rule targeting the discard UEI aborts the conversion.

use crate::cache::PatternCache;
use crate::event::EventParam;
use crate::message::SyslogMessage;
use crate::rules::{ClassificationRule, MatchSpec};

/// Result of the classification pass.
#[derive(Debug, PartialEq)]
pub(crate) enum RuleOutcome {
    /// A rule matched: rewrite the draft UEI and append the extracted
    /// parameters.
    Matched {
        uei: String,
        parameters: Vec<EventParam>,
    },
    /// A discard-UEI rule matched: abort the conversion, no event.
    Discarded { reason: String },
    /// No rule matched: the facility/severity default UEI stands.
    NoMatch,
}

pub(crate) fn classify(
    rules: &[ClassificationRule],
    discard_uei: &str,
    message: &SyslogMessage,
    patterns: &PatternCache,
) -> RuleOutcome {
    for rule in rules {
        if !gates_pass(rule, message, patterns) {
            continue;
        }

        let extracted = match &rule.match_spec {
            MatchSpec::Substring { expression } => {
                // Literal containment; substring matches never extract
                // parameters.
                if message.text.contains(expression.as_str()) {
                    Some(Vec::new())
                } else {
                    None
                }
            }
            MatchSpec::Regex {
                expression,
                default_parameter_mapping,
            } => match_regex(
                rule,
                expression,
                *default_parameter_mapping,
                &message.text,
                patterns,
            ),
        };

        let Some(parameters) = extracted else {
            tracing::trace!(
                uei = %rule.uei,
                expression = rule.match_spec.expression(),
                "message body did not match rule"
            );
            continue;
        };

        if rule.uei == discard_uei {
            tracing::trace!(uei = %rule.uei, "rule target equals discard UEI, discarding message");
            return RuleOutcome::Discarded {
                reason: format!(
                    "matched discard rule with expression '{}'",
                    rule.match_spec.expression()
                ),
            };
        }

        tracing::trace!(uei = %rule.uei, "reclassified message");
        return RuleOutcome::Matched {
            uei: rule.uei.clone(),
            parameters,
        };
    }

    RuleOutcome::NoMatch
}

/// Unanchored regex find against the body. On a find, extract the
/// default positional parameters (when enabled) and the explicit
/// assignments; a group that did not participate yields an empty
/// string. Extraction only applies when the pattern has capture groups.
fn match_regex(
    rule: &ClassificationRule,
    expression: &str,
    default_parameter_mapping: bool,
    body: &str,
    patterns: &PatternCache,
) -> Option<Vec<EventParam>> {
    let Some(pattern) = patterns.pattern(expression) else {
        tracing::debug!(%expression, "unable to create pattern for rule expression");
        return None;
    };

    let caps = pattern.captures(body)?;
    let mut parameters = Vec::new();
    let group_count = caps.len().saturating_sub(1);
    if group_count > 0 {
        if default_parameter_mapping {
            for group in 1..=group_count {
                let value = caps.get(group).map(|m| m.as_str()).unwrap_or_default();
                parameters.push(EventParam::new(format!("group{group}"), value));
            }
        }
        for assignment in &rule.parameter_assignments {
            let value = caps
                .get(assignment.group)
                .map(|m| m.as_str())
                .unwrap_or_default();
            parameters.push(EventParam::new(assignment.name.clone(), value));
        }
    }

    Some(parameters)
}

fn gates_pass(rule: &ClassificationRule, message: &SyslogMessage, patterns: &PatternCache) -> bool {
    if !(rule.facilities.is_empty() || rule.facilities.contains(&message.facility)) {
        return false;
    }
    if !(rule.severities.is_empty() || rule.severities.contains(&message.severity)) {
        return false;
    }

    let host_address = message.host_address.map(|addr| addr.to_string());
    find_gate(
        rule.process_match.as_deref(),
        message.process_name.as_deref(),
        patterns,
        "process-match",
    ) && find_gate(
        rule.hostname_match.as_deref(),
        message.hostname.as_deref(),
        patterns,
        "hostname-match",
    ) && find_gate(
        rule.hostaddr_match.as_deref(),
        host_address.as_deref(),
        patterns,
        "hostaddr-match",
    )
}

/// Unanchored "contains a match" gate. An absent expression is
/// vacuously true; an absent input or uncompilable expression fails
/// the gate.
fn find_gate(
    expression: Option<&str>,
    input: Option<&str>,
    patterns: &PatternCache,
    context: &str,
) -> bool {
    let Some(expression) = expression else {
        return true;
    };
    let Some(input) = input else {
        return false;
    };
    let Some(pattern) = patterns.pattern(expression) else {
        tracing::debug!(%expression, context, "unable to get pattern for gating expression");
        return false;
    };
    if pattern.is_match(input) {
        tracing::trace!(context, %expression, input, "gating expression matched");
        true
    } else {
        false
    }
}

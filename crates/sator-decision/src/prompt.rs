//! Prompt shape validation.

use std::collections::BTreeSet;

use sator_core::constants::MAX_PROMPT_OPTIONS;
use sator_core::errors::DecisionError;
use sator_core::models::{ActionType, PromptKind, PromptRequest};

/// Check a prompt against its kind's option-count rule and the decision's allowed actions.
pub fn validate(
    decision_id: &str,
    request: &PromptRequest,
    allowed: &[ActionType],
) -> Result<(), DecisionError> {
    let invalid = |reason: String| DecisionError::InvalidPrompt {
        decision_id: decision_id.to_string(),
        reason,
    };

    if request.text.trim().is_empty() {
        return Err(invalid("prompt text is empty".to_string()));
    }
    if request.event_ref.trim().is_empty() {
        return Err(invalid("event reference is empty".to_string()));
    }
    if !(0.0..=1.0).contains(&request.severity) {
        return Err(invalid(format!("severity {} outside [0, 1]", request.severity)));
    }

    let n = request.options.len();
    let count_ok = match request.kind {
        PromptKind::Acknowledge => n == 1,
        PromptKind::Binary => n == 2,
        PromptKind::MultiChoice => (2..=MAX_PROMPT_OPTIONS).contains(&n),
        PromptKind::Escalate => (1..=MAX_PROMPT_OPTIONS).contains(&n),
    };
    if !count_ok {
        return Err(invalid(format!("{:?} prompt cannot carry {n} option(s)", request.kind)));
    }
    if request.kind == PromptKind::Escalate
        && !request.options.iter().any(|o| o.action == ActionType::Escalate)
    {
        return Err(invalid("escalate prompt has no escalate option".to_string()));
    }

    let mut seen = BTreeSet::new();
    for option in &request.options {
        if option.id.trim().is_empty() {
            return Err(invalid("option id is empty".to_string()));
        }
        if !seen.insert(option.id.as_str()) {
            return Err(invalid(format!("duplicate option id '{}'", option.id)));
        }
        if !allowed.contains(&option.action) {
            return Err(invalid(format!(
                "option '{}' maps to {}, which is not an allowed action",
                option.id, option.action
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sator_core::models::PromptOption;

    fn request(kind: PromptKind, options: Vec<PromptOption>) -> PromptRequest {
        PromptRequest {
            event_ref: "evt-1".into(),
            severity: 0.7,
            kind,
            options,
            text: "Flow divergence on loop 2".into(),
            expires_in_sec: Some(30),
        }
    }

    const ALL: [ActionType; 3] = [ActionType::Act, ActionType::Escalate, ActionType::Defer];

    #[test]
    fn binary_needs_exactly_two() {
        let one = request(PromptKind::Binary, vec![PromptOption::new("a", "Act", ActionType::Act)]);
        assert!(validate("d", &one, &ALL).is_err());
        let two = request(
            PromptKind::Binary,
            vec![
                PromptOption::new("a", "Act", ActionType::Act),
                PromptOption::new("b", "Defer", ActionType::Defer),
            ],
        );
        assert!(validate("d", &two, &ALL).is_ok());
    }

    #[test]
    fn escalate_kind_requires_escalate_option() {
        let r = request(PromptKind::Escalate, vec![PromptOption::new("a", "Act", ActionType::Act)]);
        assert!(validate("d", &r, &ALL).is_err());
    }

    #[test]
    fn options_must_be_allowed_actions() {
        let r = request(PromptKind::Acknowledge, vec![PromptOption::new("a", "Act", ActionType::Act)]);
        let err = validate("d", &r, &[ActionType::Defer]).unwrap_err();
        assert!(matches!(err, DecisionError::InvalidPrompt { .. }));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let r = request(
            PromptKind::MultiChoice,
            vec![
                PromptOption::new("a", "Act", ActionType::Act),
                PromptOption::new("a", "Defer", ActionType::Defer),
            ],
        );
        assert!(validate("d", &r, &ALL).is_err());
    }
}

//! Mode machine: observe ↔ decision, either → replay, replay → observe.

use chrono::{DateTime, Utc};

use sator_core::errors::DecisionError;
use sator_core::models::{DecisionMode, DecisionTransition};

/// Validate and build the transition record. Self-transitions are rejected.
pub fn transition(
    decision_id: &str,
    from: DecisionMode,
    to: DecisionMode,
    triggered_by: &str,
    reason: Option<String>,
    at: DateTime<Utc>,
) -> Result<DecisionTransition, DecisionError> {
    if !from.can_transition_to(to) {
        return Err(DecisionError::InvalidModeTransition {
            decision_id: decision_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(DecisionTransition {
        decision_id: decision_id.to_string(),
        from_mode: from,
        to_mode: to,
        triggered_by: triggered_by.to_string(),
        timestamp: at,
        reason,
    })
}

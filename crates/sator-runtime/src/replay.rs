//! Point-in-time reconstruction from immutable records.
//!
//! Evidence, conflicts, transitions and artifacts are never rewritten, so the
//! state at any past instant can be derived by filtering on their timestamps.

use chrono::{DateTime, Utc};

use sator_core::constants::SYSTEM_TIMEOUT_OPERATOR;
use sator_core::models::{
    ActionType, Artifact, Decision, DecisionMode, DecisionState, DecisionTransition, Evidence,
    EvidenceConflict,
};

use crate::views::DecisionAsOf;

/// Evidence the engine knew about at `at`: observed and ingested by then.
pub(crate) fn evidence_as_of(evidence: Vec<Evidence>, at: DateTime<Utc>) -> Vec<Evidence> {
    evidence
        .into_iter()
        .filter(|e| e.observed_at <= at && e.ingested_at <= at)
        .collect()
}

/// Conflicts open at `at`, with later resolutions stripped.
pub(crate) fn open_conflicts_as_of(
    conflicts: Vec<EvidenceConflict>,
    at: DateTime<Utc>,
) -> Vec<EvidenceConflict> {
    conflicts
        .into_iter()
        .filter(|c| c.open_at(at))
        .map(|mut c| {
            c.resolved = false;
            c.resolution = None;
            c
        })
        .collect()
}

pub(crate) fn decision_as_of(
    decision: &Decision,
    transitions: &[DecisionTransition],
    artifact: Option<&Artifact>,
    at: DateTime<Utc>,
) -> Option<DecisionAsOf> {
    if decision.created_at > at {
        return None;
    }
    let own: Vec<&DecisionTransition> = transitions
        .iter()
        .filter(|t| t.decision_id == decision.id)
        .collect();
    Some(DecisionAsOf {
        decision_id: decision.id.clone(),
        lineage_id: decision.lineage_id.clone(),
        mode: mode_at(decision.mode, &own, at),
        state: state_at(decision, artifact, at),
    })
}

fn mode_at(current: DecisionMode, transitions: &[&DecisionTransition], at: DateTime<Utc>) -> DecisionMode {
    match transitions.iter().rev().find(|t| t.timestamp <= at) {
        Some(t) => t.to_mode,
        None => transitions.first().map_or(current, |t| t.from_mode),
    }
}

fn state_at(decision: &Decision, artifact: Option<&Artifact>, at: DateTime<Utc>) -> DecisionState {
    if let Some((outcome, resolved_at)) = resolution(decision) {
        if resolved_at <= at {
            return match artifact {
                Some(a) if a.created_at <= at => DecisionState::Closed {
                    outcome,
                    artifact_id: a.id.clone(),
                },
                _ => DecisionState::Resolved { outcome },
            };
        }
    }
    match &decision.prompt {
        Some(p) if p.issued_at <= at => DecisionState::AwaitingResponse,
        _ => DecisionState::Open,
    }
}

/// Outcome and the instant it took effect. A timeout took effect at expiry,
/// even when it was applied lazily afterwards.
fn resolution(decision: &Decision) -> Option<(ActionType, DateTime<Utc>)> {
    let outcome = decision.action_taken?;
    let taken_at = decision.action_taken_at?;
    let effective = if decision.operator_id.as_deref() == Some(SYSTEM_TIMEOUT_OPERATOR) {
        taken_at.min(decision.timebox_expires_at)
    } else {
        taken_at
    };
    Some((outcome, effective))
}

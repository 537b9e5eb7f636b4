//! Read models returned by the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sator_core::models::{
    AnchorStatus, Decision, DecisionMode, DecisionPrompt, DecisionState, Evidence,
    EvidenceConflict, Recommendation, TrustBreakdown,
};

/// A decision with its pending prompt and advisory recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionView {
    pub decision: Decision,
    pub pending_prompt: Option<DecisionPrompt>,
    /// Countdown left on the pending prompt.
    pub remaining_secs: Option<u64>,
    pub recommendation: Recommendation,
    /// Artifact sealed for this decision, once closed.
    pub artifact_id: Option<String>,
    pub anchor_status: AnchorStatus,
}

/// One decision as it stood at a past instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionAsOf {
    pub decision_id: String,
    pub lineage_id: String,
    pub mode: DecisionMode,
    pub state: DecisionState,
}

/// Engine state rebuilt from immutable records as of `at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayState {
    pub at: DateTime<Utc>,
    pub evidence: Vec<Evidence>,
    pub trust: TrustBreakdown,
    /// Detected by `at` and not yet resolved at `at`.
    pub open_conflicts: Vec<EvidenceConflict>,
    pub decisions: Vec<DecisionAsOf>,
}

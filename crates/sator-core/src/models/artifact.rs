use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflict::{ConflictStatus, EvidenceConflict};
use super::decision::{ActionType, Decision, DecisionState, DecisionTransition};
use super::evidence::Evidence;
use super::trust::TrustBreakdown;
use crate::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    DecisionReceipt,
    DeferralReceipt,
    EscalationReceipt,
    LegalPosturePacket,
}

impl ArtifactType {
    pub fn for_outcome(outcome: ActionType) -> Self {
        match outcome {
            ActionType::Act => Self::DecisionReceipt,
            ActionType::Defer => Self::DeferralReceipt,
            ActionType::Escalate => Self::EscalationReceipt,
        }
    }
}

/// A conflict as it stood when the decision was sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictSnapshot {
    pub status: ConflictStatus,
    pub conflict: EvidenceConflict,
}

impl From<&EvidenceConflict> for ConflictSnapshot {
    fn from(conflict: &EvidenceConflict) -> Self {
        Self {
            status: conflict.status(),
            conflict: conflict.clone(),
        }
    }
}

/// Frozen snapshot sealed into a trust receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptContent {
    pub decision: Decision,
    pub evidence: Vec<Evidence>,
    pub conflicts: Vec<ConflictSnapshot>,
    pub trust: Option<TrustBreakdown>,
    pub transitions: Vec<DecisionTransition>,
    pub sealed_at: DateTime<Utc>,
}

/// One decision's line in a legal posture packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTimelineEntry {
    pub decision_id: String,
    pub lineage_id: String,
    pub created_at: DateTime<Utc>,
    pub state: DecisionState,
    pub action_taken: Option<ActionType>,
    pub action_taken_at: Option<DateTime<Utc>>,
    pub operator_id: Option<String>,
    pub uncertainty_score: Score,
}

impl From<&Decision> for DecisionTimelineEntry {
    fn from(d: &Decision) -> Self {
        Self {
            decision_id: d.id.clone(),
            lineage_id: d.lineage_id.clone(),
            created_at: d.created_at,
            state: d.state.clone(),
            action_taken: d.action_taken,
            action_taken_at: d.action_taken_at,
            operator_id: d.operator_id.clone(),
            uncertainty_score: d.uncertainty_score,
        }
    }
}

/// Aggregate over many decisions for legal review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalPosturePacket {
    pub decision_timeline: Vec<DecisionTimelineEntry>,
    pub mode_transitions: Vec<DecisionTransition>,
    /// Artifact hashes in sealing order.
    pub evidence_chain: Vec<String>,
    /// Artifact ids in sealing order.
    pub receipts: Vec<String>,
    pub system_config: serde_json::Value,
    /// Digest of every other field of the packet.
    pub tamper_evident_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactContent {
    Receipt(ReceiptContent),
    LegalPosture(LegalPosturePacket),
}

/// An immutable, hash-linked record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub decision_id: String,
    pub lineage_id: String,
    pub created_at: DateTime<Utc>,
    pub content: ArtifactContent,
    /// `H(canonical(content) || previous_hash)`, hex.
    pub hash: String,
    pub previous_hash: Option<String>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

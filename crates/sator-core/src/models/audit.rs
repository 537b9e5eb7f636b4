use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    EvidenceIngested,
    ConflictDetected,
    ConflictResolved,
    DecisionOpened,
    PromptRaised,
    DecisionResolved,
    ModeChanged,
    ArtifactSealed,
    AnchorSubmitted,
    AnchorStatusChanged,
    IncidentOpened,
    IncidentUpdated,
    IncidentTransitioned,
    OperationRejected,
}

/// Hash-chained ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub kind: AuditEventKind,
    /// Evidence, conflict, decision or artifact id the entry is about.
    pub subject_id: String,
    pub detail: serde_json::Value,
    pub trust_score: Option<Score>,
    pub contradiction: bool,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub hash: String,
}

/// Timeline row served to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub kind: AuditEventKind,
    pub subject_id: String,
    pub summary: String,
    pub trust_score: Option<Score>,
    pub contradiction: bool,
}

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflict::{EvidenceConflict, SeverityBand};
use super::decision::ActionType;

/// Incident lifecycle: `monitoring → open → triaged → (dispatched →) closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentState {
    Monitoring,
    Open,
    Triaged,
    Dispatched,
    Closed,
}

impl IncidentState {
    pub fn can_transition_to(self, to: IncidentState) -> bool {
        use IncidentState::*;
        matches!(
            (self, to),
            (Monitoring, Open)
                | (Open, Triaged)
                | (Triaged, Dispatched)
                | (Triaged, Closed)
                | (Dispatched, Closed)
        )
    }
}

impl fmt::Display for IncidentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monitoring => "monitoring",
            Self::Open => "open",
            Self::Triaged => "triaged",
            Self::Dispatched => "dispatched",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl IncidentSeverity {
    /// Severity of an incident raised by `conflict`.
    pub fn from_conflict(conflict: &EvidenceConflict) -> Self {
        match conflict.band {
            SeverityBand::Low => Self::Info,
            SeverityBand::Medium => Self::Warning,
            SeverityBand::High if conflict.severity.value() >= 0.9 => Self::Emergency,
            SeverityBand::High => Self::Critical,
        }
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// Append-only record of a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentTransition {
    pub incident_id: String,
    pub from_state: IncidentState,
    pub to_state: IncidentState,
    pub triggered_by: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// An operational incident opened from one or more contradictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub description: String,
    pub state: IncidentState,
    pub severity: IncidentSeverity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub triaged_at: Option<DateTime<Utc>>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub conflict_ids: Vec<String>,
    /// Evidence touched by the linked conflicts.
    pub evidence_ids: BTreeSet<String>,
    pub decision_id: Option<String>,
    pub receipt_ids: Vec<String>,
    pub assigned_operator_id: Option<String>,
    pub action_taken: Option<ActionType>,
    pub action_details: Option<String>,
    pub resolution_summary: Option<String>,
    pub transitions: Vec<IncidentTransition>,
}

impl Incident {
    pub fn is_closed(&self) -> bool {
        self.state == IncidentState::Closed
    }

    /// Whether any of `ids` is evidence this incident already covers.
    pub fn touches<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> bool {
        ids.into_iter().any(|id| self.evidence_ids.contains(id))
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::Score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Numeric readings of the same quantity diverge.
    ValueDivergence,
    /// Categorical readings of the same quantity disagree (e.g. valve open vs closed).
    StateMismatch,
}

/// Severity band derived from divergence thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Low,
    Medium,
    High,
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategyKind {
    WeightedAverage,
    PreferHigherReliability,
    ManualOverride,
}

/// Audit record of how a conflict was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub strategy: ResolutionStrategyKind,
    /// Human-readable resolution for the audit trail. Never empty.
    pub summary: String,
    pub resolved_value: Option<f64>,
    /// Evidence the resolution discounted, if any.
    pub flagged_evidence_id: Option<String>,
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
}

/// A detected disagreement between evidence items on the same quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceConflict {
    pub id: String,
    /// At least two ids, sorted.
    pub evidence_ids: Vec<String>,
    pub conflict_type: ConflictType,
    pub quantity: String,
    pub description: String,
    pub severity: Score,
    pub band: SeverityBand,
    pub divergence: f64,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolution: Option<ConflictResolution>,
}

impl EvidenceConflict {
    pub fn involves(&self, evidence_id: &str) -> bool {
        self.evidence_ids.iter().any(|id| id == evidence_id)
    }

    pub fn status(&self) -> ConflictStatus {
        if self.resolved {
            ConflictStatus::Resolved
        } else {
            ConflictStatus::Open
        }
    }

    /// Whether the conflict was still open at `at`.
    pub fn open_at(&self, at: DateTime<Utc>) -> bool {
        self.detected_at <= at
            && match &self.resolution {
                Some(r) => r.resolved_at > at,
                None => true,
            }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Open,
    Resolved,
}

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Coarse lifecycle phase, orthogonal to per-decision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    Observe,
    Decision,
    Replay,
}

impl DecisionMode {
    pub fn can_transition_to(self, to: DecisionMode) -> bool {
        use DecisionMode::*;
        matches!(
            (self, to),
            (Observe, Decision)
                | (Decision, Observe)
                | (Observe, Replay)
                | (Decision, Replay)
                | (Replay, Observe)
        )
    }
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Observe => "observe",
            Self::Decision => "decision",
            Self::Replay => "replay",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Act,
    Escalate,
    Defer,
}

impl ActionType {
    /// Past-tense outcome label.
    pub fn outcome(self) -> &'static str {
        match self {
            Self::Act => "acted",
            Self::Escalate => "escalated",
            Self::Defer => "deferred",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Act => "act",
            Self::Escalate => "escalate",
            Self::Defer => "defer",
        };
        f.write_str(s)
    }
}

/// Per-decision lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DecisionState {
    Open,
    AwaitingResponse,
    Resolved { outcome: ActionType },
    Closed { outcome: ActionType, artifact_id: String },
}

impl DecisionState {
    /// Resolved and closed decisions accept no further responses.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Closed { .. })
    }

    pub fn outcome(&self) -> Option<ActionType> {
        match self {
            Self::Resolved { outcome } | Self::Closed { outcome, .. } => Some(*outcome),
            Self::Open | Self::AwaitingResponse => None,
        }
    }
}

impl fmt::Display for DecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::AwaitingResponse => f.write_str("awaiting_response"),
            Self::Resolved { outcome } => write!(f, "resolved({})", outcome.outcome()),
            Self::Closed { outcome, .. } => write!(f, "closed({})", outcome.outcome()),
        }
    }
}

/// Shape of the option set offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Acknowledge,
    Binary,
    MultiChoice,
    Escalate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOption {
    pub id: String,
    pub label: String,
    pub action: ActionType,
}

impl PromptOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>, action: ActionType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action,
        }
    }
}

/// Operator input request raised when an event crosses the severity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub event_ref: String,
    pub severity: f64,
    pub kind: PromptKind,
    pub options: Vec<PromptOption>,
    pub text: String,
    /// Falls back to the configured default timebox.
    pub expires_in_sec: Option<u64>,
}

/// A pending prompt with its countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPrompt {
    pub decision_id: String,
    pub event_ref: String,
    pub kind: PromptKind,
    pub options: Vec<PromptOption>,
    pub text: String,
    pub expires_in_sec: u64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DecisionPrompt {
    pub fn option(&self, option_id: &str) -> Option<&PromptOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Seconds left on the countdown, never negative.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}

/// A decision over one evidence window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    /// Lineage (incident or evidence window) the decision belongs to.
    pub lineage_id: String,
    pub mode: DecisionMode,
    pub state: DecisionState,
    pub created_at: DateTime<Utc>,
    pub evidence_ids: BTreeSet<String>,
    pub allowed_actions: Vec<ActionType>,
    pub trust_score: Score,
    pub uncertainty_score: Score,
    pub timebox_seconds: u64,
    pub timebox_expires_at: DateTime<Utc>,
    pub action_taken: Option<ActionType>,
    pub action_details: Option<String>,
    pub action_taken_at: Option<DateTime<Utc>>,
    pub operator_id: Option<String>,
    pub prompt: Option<DecisionPrompt>,
}

impl Decision {
    /// Live decisions hold their lineage's window open.
    pub fn is_live(&self) -> bool {
        !matches!(self.state, DecisionState::Closed { .. })
    }

    pub fn pending_prompt(&self) -> Option<&DecisionPrompt> {
        match self.state {
            DecisionState::AwaitingResponse => self.prompt.as_ref(),
            _ => None,
        }
    }
}

/// Append-only record of a mode change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTransition {
    pub decision_id: String,
    pub from_mode: DecisionMode,
    pub to_mode: DecisionMode,
    pub triggered_by: String,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl UncertaintyLevel {
    /// Bucket a composite trust score.
    pub fn from_trust(trust: Score) -> Self {
        let t = trust.value();
        if t >= 0.8 {
            Self::Low
        } else if t >= 0.5 {
            Self::Moderate
        } else if t >= 0.3 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

/// Advisory action derived from trust and open conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: ActionType,
    pub rationale: String,
    pub uncertainty_level: UncertaintyLevel,
}

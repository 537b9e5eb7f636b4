use super::error_code::{self, SatorErrorCode};

/// Decision state machine errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecisionError {
    #[error("decision {decision_id} not found")]
    NotFound { decision_id: String },

    #[error("decision {decision_id}: option '{option}' is not in the prompt's option set")]
    UnknownOption { decision_id: String, option: String },

    #[error("decision {decision_id} is closed to mutation (state: {state})")]
    DecisionClosed { decision_id: String, state: String },

    #[error("decision {decision_id} has no pending prompt")]
    NoPendingPrompt { decision_id: String },

    #[error("decision {decision_id}: invalid prompt: {reason}")]
    InvalidPrompt { decision_id: String, reason: String },

    #[error("decision {decision_id}: {requested} allowed actions exceeds cap of {cap}")]
    ActionCapExceeded {
        decision_id: String,
        requested: usize,
        cap: usize,
    },

    #[error("lineage {lineage_id} already has live decision {decision_id}")]
    WindowAlreadyLive {
        lineage_id: String,
        decision_id: String,
    },

    #[error("decision {decision_id}: mode transition {from} -> {to} is not allowed")]
    InvalidModeTransition {
        decision_id: String,
        from: String,
        to: String,
    },

    #[error("decision {decision_id} is not resolved (state: {state})")]
    NotResolved { decision_id: String, state: String },

    #[error("lineage {lineage_id}: timebox of {secs}s is outside 1..={max}s")]
    TimeboxOutOfRange {
        lineage_id: String,
        secs: u64,
        max: u64,
    },
}

impl DecisionError {
    pub fn closed(decision_id: impl Into<String>, state: impl ToString) -> Self {
        Self::DecisionClosed {
            decision_id: decision_id.into(),
            state: state.to_string(),
        }
    }

    /// Decision id, or lineage id for lineage-scoped failures.
    pub fn subject_id(&self) -> &str {
        match self {
            Self::NotFound { decision_id }
            | Self::UnknownOption { decision_id, .. }
            | Self::DecisionClosed { decision_id, .. }
            | Self::NoPendingPrompt { decision_id }
            | Self::InvalidPrompt { decision_id, .. }
            | Self::ActionCapExceeded { decision_id, .. }
            | Self::InvalidModeTransition { decision_id, .. }
            | Self::NotResolved { decision_id, .. } => decision_id,
            Self::WindowAlreadyLive { lineage_id, .. }
            | Self::TimeboxOutOfRange { lineage_id, .. } => lineage_id,
        }
    }
}

impl SatorErrorCode for DecisionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_code::DECISION_NOT_FOUND,
            Self::UnknownOption { .. } => error_code::UNKNOWN_OPTION,
            Self::DecisionClosed { .. } => error_code::DECISION_CLOSED,
            Self::NoPendingPrompt { .. } => error_code::NO_PENDING_PROMPT,
            Self::InvalidPrompt { .. } => error_code::INVALID_PROMPT,
            Self::ActionCapExceeded { .. } => error_code::ACTION_CAP_EXCEEDED,
            Self::WindowAlreadyLive { .. } => error_code::WINDOW_ALREADY_LIVE,
            Self::InvalidModeTransition { .. } => error_code::INVALID_MODE_TRANSITION,
            Self::NotResolved { .. } => error_code::DECISION_NOT_RESOLVED,
            Self::TimeboxOutOfRange { .. } => error_code::TIMEBOX_OUT_OF_RANGE,
        }
    }
}

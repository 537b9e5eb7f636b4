use super::error_code::{self, SatorErrorCode};

/// Anchoring gateway and notary client errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnchorError {
    #[error("artifact {artifact_id} has no anchor record")]
    NotAnchored { artifact_id: String },

    #[error("anchor submission for artifact {artifact_id} failed: {reason}")]
    SubmissionFailed { artifact_id: String, reason: String },

    #[error("anchor call for artifact {artifact_id} timed out after {timeout_ms}ms")]
    Timeout { artifact_id: String, timeout_ms: u64 },

    #[error("anchor for artifact {artifact_id} is already approved")]
    AlreadyApproved { artifact_id: String },

    #[error("anchor for artifact {artifact_id} is {status}, expected {expected}")]
    InvalidState {
        artifact_id: String,
        status: String,
        expected: String,
    },

    #[error("tamper detected on anchored artifact {artifact_id}: anchored {anchored}, recomputed {recomputed}")]
    TamperDetected {
        artifact_id: String,
        anchored: String,
        recomputed: String,
    },

    #[error("unknown anchor transaction {tx_ref}")]
    UnknownTransaction { tx_ref: String },
}

impl AnchorError {
    /// Artifact id, or transaction reference when the artifact is unknown.
    pub fn subject_id(&self) -> &str {
        match self {
            Self::NotAnchored { artifact_id }
            | Self::SubmissionFailed { artifact_id, .. }
            | Self::Timeout { artifact_id, .. }
            | Self::AlreadyApproved { artifact_id }
            | Self::InvalidState { artifact_id, .. }
            | Self::TamperDetected { artifact_id, .. } => artifact_id,
            Self::UnknownTransaction { tx_ref } => tx_ref,
        }
    }

    /// Timeouts and transport failures are retried by the caller, never fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SubmissionFailed { .. } | Self::Timeout { .. })
    }
}

impl SatorErrorCode for AnchorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAnchored { .. } => error_code::ANCHOR_NOT_FOUND,
            Self::SubmissionFailed { .. } => error_code::ANCHOR_SUBMISSION_FAILED,
            Self::Timeout { .. } => error_code::ANCHOR_TIMEOUT,
            Self::AlreadyApproved { .. } => error_code::ANCHOR_ALREADY_APPROVED,
            Self::InvalidState { .. } => error_code::ANCHOR_INVALID_STATE,
            Self::TamperDetected { .. } => error_code::TAMPER_DETECTED,
            Self::UnknownTransaction { .. } => error_code::ANCHOR_UNKNOWN_TX,
        }
    }
}

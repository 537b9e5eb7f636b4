use super::error_code::{self, SatorErrorCode};

/// Artifact chain errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("chain conflict on lineage {lineage_id}: expected head '{expected}', actual head '{actual}'")]
    ChainConflict {
        lineage_id: String,
        expected: String,
        actual: String,
    },

    #[error("tamper detected on artifact {artifact_id}: stored {stored}, recomputed {recomputed}")]
    TamperDetected {
        artifact_id: String,
        stored: String,
        recomputed: String,
    },

    #[error("artifact {artifact_id} not found")]
    NotFound { artifact_id: String },

    #[error("artifact {artifact_id} links to '{actual_previous}' but its predecessor hashes to '{expected_previous}'")]
    BrokenLink {
        artifact_id: String,
        expected_previous: String,
        actual_previous: String,
    },

    #[error("decision {decision_id} cannot be sealed before it is resolved (state: {state})")]
    DecisionNotResolved { decision_id: String, state: String },

    #[error("decision {decision_id} is already sealed as artifact {artifact_id}")]
    AlreadySealed {
        decision_id: String,
        artifact_id: String,
    },

    #[error("legal posture packet needs at least one decision")]
    EmptyPacket,

    #[error("artifact {artifact_id} could not be canonically encoded: {reason}")]
    Encoding { artifact_id: String, reason: String },
}

impl ChainError {
    pub fn encoding(artifact_id: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::Encoding {
            artifact_id: artifact_id.into(),
            reason: err.to_string(),
        }
    }

    pub fn subject_id(&self) -> &str {
        match self {
            Self::ChainConflict { lineage_id, .. } => lineage_id,
            Self::TamperDetected { artifact_id, .. }
            | Self::NotFound { artifact_id }
            | Self::BrokenLink { artifact_id, .. }
            | Self::Encoding { artifact_id, .. } => artifact_id,
            Self::DecisionNotResolved { decision_id, .. }
            | Self::AlreadySealed { decision_id, .. } => decision_id,
            Self::EmptyPacket => "",
        }
    }
}

impl SatorErrorCode for ChainError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ChainConflict { .. } => error_code::CHAIN_CONFLICT,
            Self::TamperDetected { .. } => error_code::TAMPER_DETECTED,
            Self::NotFound { .. } => error_code::ARTIFACT_NOT_FOUND,
            Self::BrokenLink { .. } => error_code::BROKEN_LINK,
            Self::DecisionNotResolved { .. } => error_code::DECISION_NOT_RESOLVED,
            Self::AlreadySealed { .. } => error_code::ALREADY_SEALED,
            Self::EmptyPacket => error_code::EMPTY_PACKET,
            Self::Encoding { .. } => error_code::SERIALIZATION_ERROR,
        }
    }
}

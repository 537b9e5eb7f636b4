use super::error_code::{self, SatorErrorCode};

/// Evidence ingestion and lookup errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvidenceError {
    #[error("invalid evidence {evidence_id}: {reason}")]
    InvalidEvidence { evidence_id: String, reason: String },

    #[error("evidence {evidence_id} already ingested")]
    DuplicateEvidence { evidence_id: String },

    #[error("evidence {evidence_id} not found")]
    NotFound { evidence_id: String },
}

impl EvidenceError {
    pub fn invalid(evidence_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEvidence {
            evidence_id: evidence_id.into(),
            reason: reason.into(),
        }
    }

    pub fn evidence_id(&self) -> &str {
        match self {
            Self::InvalidEvidence { evidence_id, .. }
            | Self::DuplicateEvidence { evidence_id }
            | Self::NotFound { evidence_id } => evidence_id,
        }
    }
}

impl SatorErrorCode for EvidenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEvidence { .. } => error_code::INVALID_EVIDENCE,
            Self::DuplicateEvidence { .. } => error_code::DUPLICATE_EVIDENCE,
            Self::NotFound { .. } => error_code::EVIDENCE_NOT_FOUND,
        }
    }
}

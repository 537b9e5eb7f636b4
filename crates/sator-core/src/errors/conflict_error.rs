use super::error_code::{self, SatorErrorCode};

/// Conflict ledger and resolution errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConflictError {
    #[error("conflict {conflict_id} not found")]
    NotFound { conflict_id: String },

    #[error("conflict {conflict_id} is already resolved")]
    AlreadyResolved { conflict_id: String },

    #[error("conflict {conflict_id} cannot be resolved: {reason}")]
    Unresolvable { conflict_id: String, reason: String },
}

impl ConflictError {
    pub fn conflict_id(&self) -> &str {
        match self {
            Self::NotFound { conflict_id }
            | Self::AlreadyResolved { conflict_id }
            | Self::Unresolvable { conflict_id, .. } => conflict_id,
        }
    }
}

impl SatorErrorCode for ConflictError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_code::CONFLICT_NOT_FOUND,
            Self::AlreadyResolved { .. } => error_code::CONFLICT_ALREADY_RESOLVED,
            Self::Unresolvable { .. } => error_code::CONFLICT_UNRESOLVABLE,
        }
    }
}

use super::error_code::{self, SatorErrorCode};

/// Incident lifecycle errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IncidentError {
    #[error("incident {incident_id} not found")]
    NotFound { incident_id: String },

    #[error("incident {incident_id}: transition {from} -> {to} is not allowed")]
    InvalidTransition {
        incident_id: String,
        from: String,
        to: String,
    },

    #[error("incident {incident_id} is closed")]
    Closed { incident_id: String },

    #[error("incident {incident_id} is already linked to decision {decision_id}")]
    AlreadyLinked {
        incident_id: String,
        decision_id: String,
    },
}

impl IncidentError {
    pub fn incident_id(&self) -> &str {
        match self {
            Self::NotFound { incident_id }
            | Self::InvalidTransition { incident_id, .. }
            | Self::Closed { incident_id }
            | Self::AlreadyLinked { incident_id, .. } => incident_id,
        }
    }
}

impl SatorErrorCode for IncidentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_code::INCIDENT_NOT_FOUND,
            Self::InvalidTransition { .. } => error_code::INVALID_INCIDENT_TRANSITION,
            Self::Closed { .. } => error_code::INCIDENT_CLOSED,
            Self::AlreadyLinked { .. } => error_code::INCIDENT_ALREADY_LINKED,
        }
    }
}

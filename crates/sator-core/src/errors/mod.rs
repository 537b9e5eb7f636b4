//! Error handling for the SATOR core.
//! One error enum per subsystem, `thiserror` only.

pub mod anchor_error;
pub mod chain_error;
pub mod config_error;
pub mod conflict_error;
pub mod decision_error;
pub mod error_code;
pub mod evidence_error;
pub mod incident_error;

pub use anchor_error::AnchorError;
pub use chain_error::ChainError;
pub use config_error::ConfigError;
pub use conflict_error::ConflictError;
pub use decision_error::DecisionError;
pub use error_code::SatorErrorCode;
pub use evidence_error::EvidenceError;
pub use incident_error::IncidentError;

/// Top-level error aggregating every subsystem via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum SatorError {
    #[error("evidence error: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("conflict error: {0}")]
    Conflict(#[from] ConflictError),

    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("anchor error: {0}")]
    Anchor(#[from] AnchorError),

    #[error("incident error: {0}")]
    Incident(#[from] IncidentError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SatorErrorCode for SatorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Evidence(e) => e.error_code(),
            Self::Conflict(e) => e.error_code(),
            Self::Decision(e) => e.error_code(),
            Self::Chain(e) => e.error_code(),
            Self::Anchor(e) => e.error_code(),
            Self::Incident(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Serialization(_) => error_code::SERIALIZATION_ERROR,
        }
    }
}

impl SatorError {
    /// The id (evidence, conflict, decision, artifact or lineage) the failure is traceable to.
    pub fn subject_id(&self) -> Option<&str> {
        match self {
            Self::Evidence(e) => Some(e.evidence_id()),
            Self::Conflict(e) => Some(e.conflict_id()),
            Self::Decision(e) => Some(e.subject_id()),
            Self::Chain(e) => Some(e.subject_id()),
            Self::Anchor(e) => Some(e.subject_id()),
            Self::Incident(e) => Some(e.incident_id()),
            Self::Config(_) | Self::Serialization(_) => None,
        }
    }
}

/// Convenience alias.
pub type SatorResult<T> = Result<T, SatorError>;

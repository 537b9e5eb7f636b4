use crate::errors::ConflictError;
use crate::models::{Evidence, EvidenceConflict, ResolutionStrategyKind};

/// What a strategy decided, before the ledger stamps who and when.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionProposal {
    pub summary: String,
    pub resolved_value: Option<f64>,
    pub flagged_evidence_id: Option<String>,
}

/// Pluggable conflict resolution. Every strategy must produce a non-empty summary.
pub trait IResolutionStrategy: Send + Sync {
    fn kind(&self) -> ResolutionStrategyKind;

    /// `evidence` holds the records referenced by `conflict.evidence_ids`.
    fn resolve(
        &self,
        conflict: &EvidenceConflict,
        evidence: &[Evidence],
    ) -> Result<ResolutionProposal, ConflictError>;
}

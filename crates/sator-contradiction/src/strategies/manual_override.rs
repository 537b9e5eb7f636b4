use sator_core::errors::ConflictError;
use sator_core::models::{Evidence, EvidenceConflict, ResolutionStrategyKind};
use sator_core::traits::{IResolutionStrategy, ResolutionProposal};

/// Operator-supplied resolution. The note is the audit summary.
#[derive(Debug, Clone)]
pub struct ManualOverride {
    note: String,
}

impl ManualOverride {
    pub fn new(note: impl Into<String>) -> Self {
        Self { note: note.into() }
    }
}

impl IResolutionStrategy for ManualOverride {
    fn kind(&self) -> ResolutionStrategyKind {
        ResolutionStrategyKind::ManualOverride
    }

    fn resolve(
        &self,
        conflict: &EvidenceConflict,
        _evidence: &[Evidence],
    ) -> Result<ResolutionProposal, ConflictError> {
        let note = self.note.trim();
        if note.is_empty() {
            return Err(ConflictError::Unresolvable {
                conflict_id: conflict.id.clone(),
                reason: "manual override requires a note".to_string(),
            });
        }
        Ok(ResolutionProposal {
            summary: format!("manual override: {note}"),
            resolved_value: None,
            flagged_evidence_id: None,
        })
    }
}

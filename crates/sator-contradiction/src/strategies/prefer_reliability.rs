use sator_core::errors::ConflictError;
use sator_core::models::{Evidence, EvidenceConflict, ResolutionStrategyKind};
use sator_core::traits::{IResolutionStrategy, ResolutionProposal};

use super::{least_reliable, most_reliable, participants};

/// Keep the most reliable source's reading, discard the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferHigherReliability;

impl IResolutionStrategy for PreferHigherReliability {
    fn kind(&self) -> ResolutionStrategyKind {
        ResolutionStrategyKind::PreferHigherReliability
    }

    fn resolve(
        &self,
        conflict: &EvidenceConflict,
        evidence: &[Evidence],
    ) -> Result<ResolutionProposal, ConflictError> {
        let items = participants(conflict, evidence)?;
        let (Some(kept), Some(flagged)) = (most_reliable(&items), least_reliable(&items)) else {
            return Err(ConflictError::Unresolvable {
                conflict_id: conflict.id.clone(),
                reason: "no evidence to compare".to_string(),
            });
        };
        let discarded = items
            .iter()
            .filter(|e| e.id != kept.id)
            .map(|e| format!("{} ({:.2})", e.source, e.trust_score.value()))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ResolutionProposal {
            summary: format!(
                "using {} (reliability: {:.2}); {discarded} discarded",
                kept.source,
                kept.trust_score.value()
            ),
            resolved_value: kept.reading().and_then(|r| r.numeric()),
            flagged_evidence_id: Some(flagged.id.clone()),
        })
    }
}

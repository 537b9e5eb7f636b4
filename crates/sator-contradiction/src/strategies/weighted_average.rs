use sator_core::errors::ConflictError;
use sator_core::models::{ConflictType, Evidence, EvidenceConflict, ResolutionStrategyKind};
use sator_core::traits::{IResolutionStrategy, ResolutionProposal};

use super::{least_reliable, participants, reading_text, PreferHigherReliability};

/// Reliability-weighted mean of the readings; the least reliable source is flagged.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAverage;

impl IResolutionStrategy for WeightedAverage {
    fn kind(&self) -> ResolutionStrategyKind {
        ResolutionStrategyKind::WeightedAverage
    }

    fn resolve(
        &self,
        conflict: &EvidenceConflict,
        evidence: &[Evidence],
    ) -> Result<ResolutionProposal, ConflictError> {
        if conflict.conflict_type == ConflictType::StateMismatch {
            return PreferHigherReliability.resolve(conflict, evidence);
        }
        let items = participants(conflict, evidence)?;

        let mut weighted = Vec::with_capacity(items.len());
        for e in &items {
            let value = e
                .reading()
                .and_then(|r| r.numeric())
                .ok_or_else(|| ConflictError::Unresolvable {
                    conflict_id: conflict.id.clone(),
                    reason: format!("evidence {} has no numeric reading", e.id),
                })?;
            weighted.push((value, e.trust_score.value()));
        }
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        let resolved = if total <= f64::EPSILON {
            weighted.iter().map(|(v, _)| v).sum::<f64>() / weighted.len() as f64
        } else {
            weighted.iter().map(|(v, w)| v * w).sum::<f64>() / total
        };

        let unit = items
            .first()
            .and_then(|e| e.reading())
            .and_then(|r| r.unit)
            .map(|u| format!(" {u}"))
            .unwrap_or_default();
        let sources = items
            .iter()
            .map(|e| {
                format!(
                    "{} ({}, w={:.2})",
                    e.source,
                    reading_text(e),
                    e.trust_score.value()
                )
            })
            .collect::<Vec<_>>()
            .join(" and ");
        let flagged = least_reliable(&items);
        let flagged_text = flagged
            .map(|e| format!("; lower-reliability source {} flagged", e.source))
            .unwrap_or_default();

        Ok(ResolutionProposal {
            summary: format!("weighted average applied: {resolved:.2}{unit} from {sources}{flagged_text}"),
            resolved_value: Some(resolved),
            flagged_evidence_id: flagged.map(|e| e.id.clone()),
        })
    }
}

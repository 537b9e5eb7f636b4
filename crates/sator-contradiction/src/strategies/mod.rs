//! Resolution strategies.
//!
//! Every strategy yields a non-empty, human-readable summary for the audit trail.
//! Categorical conflicts have no meaningful average, so the numeric strategies fall
//! back to preferring the higher-reliability source for them.

pub mod manual_override;
pub mod prefer_reliability;
pub mod weighted_average;

pub use manual_override::ManualOverride;
pub use prefer_reliability::PreferHigherReliability;
pub use weighted_average::WeightedAverage;

use serde_json::Value;

use sator_core::errors::ConflictError;
use sator_core::models::{Evidence, EvidenceConflict, ResolutionStrategyKind};
use sator_core::traits::IResolutionStrategy;

/// A caller's choice of how to resolve a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    WeightedAverage,
    PreferHigherReliability,
    ManualOverride { note: String },
}

impl Resolution {
    pub fn kind(&self) -> ResolutionStrategyKind {
        match self {
            Self::WeightedAverage => ResolutionStrategyKind::WeightedAverage,
            Self::PreferHigherReliability => ResolutionStrategyKind::PreferHigherReliability,
            Self::ManualOverride { .. } => ResolutionStrategyKind::ManualOverride,
        }
    }
}

/// Strategy implementing a [`Resolution`].
pub fn strategy_for(resolution: &Resolution) -> Box<dyn IResolutionStrategy> {
    match resolution {
        Resolution::WeightedAverage => Box::new(WeightedAverage),
        Resolution::PreferHigherReliability => Box::new(PreferHigherReliability),
        Resolution::ManualOverride { note } => Box::new(ManualOverride::new(note.clone())),
    }
}

/// The conflict's evidence, in the conflict's id order. Fails if any is missing.
pub(crate) fn participants<'a>(
    conflict: &EvidenceConflict,
    evidence: &'a [Evidence],
) -> Result<Vec<&'a Evidence>, ConflictError> {
    let mut found = Vec::with_capacity(conflict.evidence_ids.len());
    for id in &conflict.evidence_ids {
        let e = evidence
            .iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| ConflictError::Unresolvable {
                conflict_id: conflict.id.clone(),
                reason: format!("evidence {id} is not available"),
            })?;
        found.push(e);
    }
    if found.len() < 2 {
        return Err(ConflictError::Unresolvable {
            conflict_id: conflict.id.clone(),
            reason: "a conflict needs at least two evidence items".to_string(),
        });
    }
    Ok(found)
}

/// Least reliable participant; later observation wins ties.
pub(crate) fn least_reliable<'a>(items: &[&'a Evidence]) -> Option<&'a Evidence> {
    items.iter().copied().min_by(|a, b| {
        a.trust_score
            .value()
            .total_cmp(&b.trust_score.value())
            .then(b.observed_at.cmp(&a.observed_at))
            .then(b.id.cmp(&a.id))
    })
}

/// Most reliable participant; later observation wins ties.
pub(crate) fn most_reliable<'a>(items: &[&'a Evidence]) -> Option<&'a Evidence> {
    items.iter().copied().max_by(|a, b| {
        a.trust_score
            .value()
            .total_cmp(&b.trust_score.value())
            .then(a.observed_at.cmp(&b.observed_at))
            .then(b.id.cmp(&a.id))
    })
}

/// Short rendering of a reading for summaries.
pub(crate) fn reading_text(e: &Evidence) -> String {
    match e.value.get("reading") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
        None => "n/a".to_string(),
    }
}

//! Factor pattern → reason code mapping.

use std::collections::BTreeSet;

use sator_core::models::{EvidenceConflict, ReasonCode, SeverityBand};

use crate::factors::{CorroborationSummary, FreshnessSummary};

/// Corroboration at or above this is reported as high.
pub const HIGH_CORROBORATION: f64 = 0.9;
/// Corroboration below this is reported as weak.
pub const WEAK_CORROBORATION: f64 = 0.6;
/// Mean reliability at or above this is reported as high.
pub const HIGH_RELIABILITY: f64 = 0.9;
/// Mean reliability below this is reported as low.
pub const LOW_RELIABILITY: f64 = 0.7;

pub struct ReasonInputs<'a> {
    pub empty: bool,
    pub corroboration: &'a CorroborationSummary,
    pub reliability: f64,
    pub freshness: &'a FreshnessSummary,
    pub unresolved: &'a [&'a EvidenceConflict],
    pub residual: f64,
}

/// Sorted, deduplicated reason codes.
pub fn derive(inputs: &ReasonInputs<'_>) -> Vec<ReasonCode> {
    let mut codes = BTreeSet::new();

    if inputs.empty {
        codes.insert(ReasonCode::NoEvidence);
    } else {
        if inputs.corroboration.corroborated_groups == 0 {
            codes.insert(ReasonCode::SingleSourceOnly);
        } else if inputs.corroboration.value >= HIGH_CORROBORATION {
            codes.insert(ReasonCode::HighCorroboration);
        } else if inputs.corroboration.value < WEAK_CORROBORATION {
            codes.insert(ReasonCode::WeakCorroboration);
        }

        if inputs.reliability >= HIGH_RELIABILITY {
            codes.insert(ReasonCode::HighSourceReliability);
        } else if inputs.reliability < LOW_RELIABILITY {
            codes.insert(ReasonCode::LowSourceReliability);
        }

        if inputs.freshness.external_stale {
            codes.insert(ReasonCode::ExternalFeedStale);
        }
        if inputs.freshness.internal_stale {
            codes.insert(ReasonCode::StaleSourceData);
        }
    }

    if inputs
        .unresolved
        .iter()
        .any(|c| c.band == SeverityBand::High)
    {
        codes.insert(ReasonCode::MajorDivergence);
    } else if !inputs.unresolved.is_empty() {
        codes.insert(ReasonCode::MinorDivergence);
    }

    if inputs.residual > 0.0 {
        codes.insert(ReasonCode::UnmodeledUncertainty);
    }

    codes.into_iter().collect()
}

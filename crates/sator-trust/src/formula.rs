use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use sator_core::config::TrustConfig;
use sator_core::models::{Evidence, EvidenceConflict, FactorKind, TrustBreakdown, TrustFactor};
use sator_core::Score;

use crate::factors::{self, corroboration, freshness, penalty, reliability};
use crate::reason_codes::{self, ReasonInputs};

/// Score an evidence set against the unresolved conflicts that touch it.
///
/// Evidence is put into (observed_at, seq, id) order and conflicts into id order first,
/// so the result does not depend on input ordering.
pub fn compute_breakdown(
    evidence: &[Evidence],
    conflicts: &[EvidenceConflict],
    as_of: DateTime<Utc>,
    config: &TrustConfig,
) -> TrustBreakdown {
    let mut ordered: Vec<Evidence> = evidence.to_vec();
    ordered.sort_by(|a, b| {
        a.observed_at
            .cmp(&b.observed_at)
            .then(a.seq.cmp(&b.seq))
            .then(a.id.cmp(&b.id))
    });
    ordered.dedup_by(|a, b| a.id == b.id);

    let ids: BTreeSet<&str> = ordered.iter().map(|e| e.id.as_str()).collect();
    let relevant: Vec<&EvidenceConflict> = conflicts
        .iter()
        .filter(|c| !c.resolved && c.evidence_ids.iter().any(|id| ids.contains(id.as_str())))
        .collect();

    let empty = ordered.is_empty();
    let corroboration = if empty {
        factors::CorroborationSummary {
            value: 0.0,
            corroborated_groups: 0,
            agreeing: 0,
            compared: 0,
        }
    } else {
        corroboration::calculate(
            &ordered,
            config.corroboration_tolerance,
            config.uncorroborated_value,
        )
    };
    let reliability = reliability::calculate(&ordered);
    let freshness = freshness::calculate(
        &ordered,
        as_of,
        config.freshness_half_life_secs,
        config.freshness_floor,
        config.stale_threshold,
    );
    let severity_sum = penalty::severity_sum(&relevant);
    let penalty_value = penalty::calculate(
        severity_sum,
        config.penalty_per_severity,
        config.max_penalty,
    );

    let factors = vec![
        TrustFactor::new(
            FactorKind::Corroboration,
            corroboration.value,
            config.corroboration_weight,
            config.corroboration_weight * corroboration.value,
        ),
        TrustFactor::new(
            FactorKind::Reliability,
            reliability,
            config.reliability_weight,
            config.reliability_weight * reliability,
        ),
        TrustFactor::new(
            FactorKind::ContradictionPenalty,
            severity_sum,
            config.penalty_per_severity,
            penalty_value,
        ),
        TrustFactor::new(
            FactorKind::Freshness,
            freshness.value,
            config.freshness_weight,
            config.freshness_weight * freshness.value,
        ),
        TrustFactor::new(
            FactorKind::UnknownFactors,
            config.unknown_residual,
            1.0,
            if config.unknown_residual == 0.0 {
                0.0
            } else {
                -config.unknown_residual
            },
        ),
    ];
    let composite = Score::new(factors.iter().map(|f| f.value).sum());

    let reason_codes = reason_codes::derive(&ReasonInputs {
        empty,
        corroboration: &corroboration,
        reliability,
        freshness: &freshness,
        unresolved: &relevant,
        residual: config.unknown_residual,
    });

    TrustBreakdown {
        composite,
        factors,
        reason_codes,
        evidence_count: ordered.len(),
        unresolved_conflicts: relevant.len(),
        as_of,
    }
}

//! Property tests: score bounds and determinism.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use sator_core::models::*;
use sator_core::Score;
use sator_trust::TrustScorer;

fn make_evidence(i: usize, source: u8, reading: f64, secs_ago: i64, reliability: f64) -> Evidence {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    Evidence {
        id: format!("ev-{i}"),
        evidence_type: EvidenceType::Sensor,
        source: format!("source-{source}"),
        value: serde_json::json!({ "quantity": "flow_rate", "reading": reading, "unit": "L/min" }),
        observed_at: t0 - Duration::seconds(secs_ago),
        ingested_at: t0,
        seq: i as u64 + 1,
        trust_level: TrustLevel::Medium,
        trust_score: Score::new(reliability),
        trust_reason: None,
        tags: Default::default(),
    }
}

fn arb_evidence() -> impl Strategy<Value = Vec<Evidence>> {
    prop::collection::vec(
        (0u8..6, -500.0f64..500.0, 0i64..20_000, 0.0f64..=1.0),
        0..12,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (s, r, age, w))| make_evidence(i, s, r, age, w))
            .collect()
    })
}

fn arb_conflicts(n_evidence: usize) -> impl Strategy<Value = Vec<EvidenceConflict>> {
    prop::collection::vec((0..n_evidence.max(1), 0..n_evidence.max(1), 0.0f64..=1.0, any::<bool>()), 0..6)
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(k, (a, b, sev, resolved))| EvidenceConflict {
                    id: format!("c-{k}"),
                    evidence_ids: vec![format!("ev-{a}"), format!("ev-{b}")],
                    conflict_type: ConflictType::ValueDivergence,
                    quantity: "flow_rate".into(),
                    description: String::new(),
                    severity: Score::new(sev),
                    band: SeverityBand::Medium,
                    divergence: sev,
                    detected_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
                    resolved,
                    resolution: None,
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn composite_is_always_within_unit_interval(
        (evidence, conflicts) in arb_evidence().prop_flat_map(|ev| {
            let n = ev.len();
            (Just(ev), arb_conflicts(n))
        })
    ) {
        let scorer = TrustScorer::new();
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let breakdown = scorer.calculate_breakdown(&evidence, &conflicts, as_of);
        let c = breakdown.composite.value();
        prop_assert!((0.0..=1.0).contains(&c));
        let penalty = breakdown.factor(FactorKind::ContradictionPenalty).unwrap().value;
        prop_assert!(penalty <= 0.0);
        prop_assert!(penalty >= -scorer.config().max_penalty);
    }

    #[test]
    fn identical_sets_yield_identical_scores_and_codes(evidence in arb_evidence()) {
        let scorer = TrustScorer::new();
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let first = scorer.calculate_breakdown(&evidence, &[], as_of);
        let mut shuffled = evidence.clone();
        shuffled.reverse();
        let second = scorer.calculate_breakdown(&shuffled, &[], as_of);
        prop_assert_eq!(first.composite, second.composite);
        prop_assert_eq!(first.reason_codes, second.reason_codes);
        prop_assert_eq!(first.factors, second.factors);
    }

    #[test]
    fn reason_codes_are_sorted_and_unique(evidence in arb_evidence()) {
        let scorer = TrustScorer::new();
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let breakdown = scorer.calculate_breakdown(&evidence, &[], as_of);
        let mut sorted = breakdown.reason_codes.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted, breakdown.reason_codes);
    }
}

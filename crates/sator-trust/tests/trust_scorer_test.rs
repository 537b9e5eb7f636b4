//! Tests for the trust scorer: factor weighting, reason codes, scenario bounds.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sator_core::config::TrustConfig;
use sator_core::models::*;
use sator_core::{Score, SourceRegistry};
use sator_trust::TrustScorer;
use test_fixtures::{load_fixture, EvidenceFixture, TrustScenario};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn make_evidence(
    id: &str,
    kind: EvidenceType,
    source: &str,
    payload: serde_json::Value,
    observed_at: DateTime<Utc>,
    reliability: f64,
    seq: u64,
) -> Evidence {
    Evidence {
        id: id.to_string(),
        evidence_type: kind,
        source: source.to_string(),
        value: payload,
        observed_at,
        ingested_at: observed_at,
        seq,
        trust_level: Score::new(reliability).level(),
        trust_score: Score::new(reliability),
        trust_reason: None,
        tags: Default::default(),
    }
}

fn make_reading(id: &str, source: &str, quantity: &str, reading: f64, unit: &str, secs_ago: i64, reliability: f64, seq: u64) -> Evidence {
    make_evidence(
        id,
        EvidenceType::Sensor,
        source,
        serde_json::json!({ "quantity": quantity, "reading": reading, "unit": unit }),
        t0() - Duration::seconds(secs_ago),
        reliability,
        seq,
    )
}

fn from_fixture(f: &EvidenceFixture, base: DateTime<Utc>, seq: u64) -> Evidence {
    let registry = SourceRegistry::default();
    let reliability = f.trust_score.unwrap_or_else(|| registry.reliability(&f.source));
    let kind: EvidenceType = serde_json::from_value(serde_json::json!(f.evidence_type)).unwrap();
    make_evidence(
        &f.id,
        kind,
        &f.source,
        serde_json::json!({ "quantity": f.quantity, "reading": f.reading, "unit": f.unit }),
        base + Duration::seconds(f.offset_secs),
        reliability,
        seq,
    )
}

fn make_conflict(id: &str, a: &str, b: &str, severity: f64, band: SeverityBand) -> EvidenceConflict {
    EvidenceConflict {
        id: id.to_string(),
        evidence_ids: vec![a.to_string(), b.to_string()],
        conflict_type: ConflictType::ValueDivergence,
        quantity: "flow_rate".into(),
        description: "test".into(),
        severity: Score::new(severity),
        band,
        divergence: severity / 10.0,
        detected_at: t0(),
        resolved: false,
        resolution: None,
    }
}

fn codes(breakdown: &TrustBreakdown) -> Vec<&'static str> {
    breakdown.reason_codes.iter().map(|c| c.code()).collect()
}

// ── Flow-sensor divergence scenario ─────────────────────────────────────

#[test]
fn flow_divergence_drops_composite_from_baseline() {
    let scenario: TrustScenario = load_fixture("scenarios/flow_divergence.json");
    let base: DateTime<Utc> = scenario.base_time.parse().unwrap();
    let scorer = TrustScorer::new();

    let mut evidence: Vec<Evidence> = scenario
        .baseline
        .iter()
        .enumerate()
        .map(|(i, f)| from_fixture(f, base, i as u64 + 1))
        .collect();
    let baseline = scorer.calculate_breakdown(&evidence, &[], base);
    let b = baseline.composite.value();
    assert!(
        b >= scenario.expected.baseline_min && b <= scenario.expected.baseline_max,
        "baseline {b}"
    );
    assert_eq!(codes(&baseline), scenario.expected.baseline_codes);

    for (i, f) in scenario.incoming.iter().enumerate() {
        evidence.push(from_fixture(f, base, 100 + i as u64));
    }
    // 14 / 248 relative divergence, severity = divergence / high threshold.
    let conflict = make_conflict("c-flow", "ev-flow-a", "ev-flow-b", 14.0 / 248.0 / 0.10, SeverityBand::Medium);
    let after = scorer.calculate_breakdown(&evidence, &[conflict], base);
    let a = after.composite.value();
    assert!(
        a >= scenario.expected.after_min && a <= scenario.expected.after_max,
        "after {a}"
    );
    assert!(a < b);
    assert_eq!(codes(&after), scenario.expected.after_codes);

    let penalty = after.factor(FactorKind::ContradictionPenalty).unwrap();
    assert!(penalty.value < 0.0);
    assert!(penalty.value >= -scorer.config().max_penalty);
    assert_eq!(penalty.impact, Impact::Negative);
}

// ── Factor structure ────────────────────────────────────────────────────

#[test]
fn breakdown_carries_all_five_labelled_factors() {
    let scorer = TrustScorer::new();
    let ev = vec![make_reading("a", "primary_sensor_array", "p", 10.0, "bar", 0, 0.98, 1)];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    let labels: Vec<&str> = breakdown.factors.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Evidence Corroboration",
            "Source Reliability Avg",
            "Contradiction Penalty",
            "Data Freshness",
            "Unknown Factors"
        ]
    );
    let penalty = breakdown.factor(FactorKind::ContradictionPenalty).unwrap();
    assert_eq!(penalty.value, 0.0);
    assert_eq!(penalty.impact, Impact::Neutral);
    assert_eq!(breakdown.factor(FactorKind::UnknownFactors).unwrap().impact, Impact::Negative);
}

#[test]
fn composite_is_the_clamped_sum_of_factor_values() {
    let scorer = TrustScorer::new();
    let ev = vec![
        make_reading("a", "x", "p", 10.0, "bar", 0, 0.9, 1),
        make_reading("b", "y", "p", 10.1, "bar", 0, 0.8, 2),
    ];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    let sum: f64 = breakdown.factors.iter().map(|f| f.value).sum();
    assert!((breakdown.composite.value() - sum.clamp(0.0, 1.0)).abs() < 1e-12);
}

#[test]
fn empty_evidence_scores_zero_with_no_evidence_code() {
    let scorer = TrustScorer::new();
    let breakdown = scorer.calculate_breakdown(&[], &[], t0());
    assert_eq!(breakdown.composite.value(), 0.0);
    assert!(breakdown.has_code(ReasonCode::NoEvidence));
    assert_eq!(breakdown.evidence_count, 0);
}

#[test]
fn single_source_readings_are_flagged_uncorroborated() {
    let scorer = TrustScorer::new();
    let ev = vec![make_reading("a", "x", "p", 10.0, "bar", 0, 0.9, 1)];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    assert!(breakdown.has_code(ReasonCode::SingleSourceOnly));
    let c = breakdown.factor(FactorKind::Corroboration).unwrap();
    assert_eq!(c.raw, scorer.config().uncorroborated_value);
}

#[test]
fn disagreeing_readings_weaken_corroboration() {
    let scorer = TrustScorer::new();
    let ev = vec![
        make_reading("a", "x", "p", 10.0, "bar", 0, 0.9, 1),
        make_reading("b", "y", "p", 20.0, "bar", 0, 0.9, 2),
    ];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    assert_eq!(breakdown.factor(FactorKind::Corroboration).unwrap().raw, 0.0);
    assert!(breakdown.has_code(ReasonCode::WeakCorroboration));
}

#[test]
fn categorical_readings_corroborate_by_weighted_majority() {
    let scorer = TrustScorer::new();
    let valve = |id: &str, source: &str, state: &str, r: f64, seq: u64| {
        make_evidence(
            id,
            EvidenceType::Sensor,
            source,
            serde_json::json!({ "quantity": "valve_v7", "reading": state }),
            t0(),
            r,
            seq,
        )
    };
    let ev = vec![
        valve("a", "s1", "open", 0.9, 1),
        valve("b", "s2", "open", 0.8, 2),
        valve("c", "s3", "closed", 0.95, 3),
    ];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    let raw = breakdown.factor(FactorKind::Corroboration).unwrap().raw;
    assert!((raw - 2.0 / 3.0).abs() < 1e-12);
}

// ── Freshness ───────────────────────────────────────────────────────────

#[test]
fn freshness_halves_every_half_life() {
    let scorer = TrustScorer::new();
    let ev = vec![make_reading("a", "x", "p", 1.0, "bar", 1800, 0.9, 1)];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    let f = breakdown.factor(FactorKind::Freshness).unwrap();
    assert!((f.raw - 0.5).abs() < 1e-9);
}

#[test]
fn freshness_is_floored() {
    let scorer = TrustScorer::new();
    let ev = vec![make_reading("a", "x", "p", 1.0, "bar", 86_400, 0.9, 1)];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    assert_eq!(breakdown.factor(FactorKind::Freshness).unwrap().raw, 0.10);
    assert!(breakdown.has_code(ReasonCode::StaleSourceData));
}

#[test]
fn stale_external_feed_has_its_own_code() {
    let scorer = TrustScorer::new();
    let ev = vec![
        make_evidence(
            "ext",
            EvidenceType::External,
            "external_feed_alpha",
            serde_json::json!({ "headline": "grid frequency dip" }),
            t0() - Duration::hours(2),
            0.87,
            1,
        ),
        make_reading("a", "primary_sensor_array", "p", 1.0, "bar", 0, 0.98, 2),
    ];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    assert!(breakdown.has_code(ReasonCode::ExternalFeedStale));
    assert!(!breakdown.has_code(ReasonCode::StaleSourceData));
}

#[test]
fn freshness_uses_each_sources_latest_observation() {
    let scorer = TrustScorer::new();
    let ev = vec![
        make_reading("old", "x", "p", 1.0, "bar", 7200, 0.9, 1),
        make_reading("new", "x", "p", 1.0, "bar", 0, 0.9, 2),
    ];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    assert_eq!(breakdown.factor(FactorKind::Freshness).unwrap().raw, 1.0);
}

// ── Contradiction penalty ───────────────────────────────────────────────

#[test]
fn penalty_is_capped() {
    let scorer = TrustScorer::new();
    let ev = vec![
        make_reading("a", "x", "p", 1.0, "bar", 0, 0.9, 1),
        make_reading("b", "y", "p", 9.0, "bar", 0, 0.9, 2),
    ];
    let conflicts: Vec<EvidenceConflict> = (0..10)
        .map(|i| make_conflict(&format!("c{i}"), "a", "b", 1.0, SeverityBand::High))
        .collect();
    let breakdown = scorer.calculate_breakdown(&ev, &conflicts, t0());
    let penalty = breakdown.factor(FactorKind::ContradictionPenalty).unwrap();
    assert_eq!(penalty.value, -0.30);
    assert!(breakdown.has_code(ReasonCode::MajorDivergence));
    assert!(breakdown.composite.value() >= 0.0);
}

#[test]
fn resolved_and_unrelated_conflicts_do_not_penalize() {
    let scorer = TrustScorer::new();
    let ev = vec![make_reading("a", "x", "p", 1.0, "bar", 0, 0.9, 1)];
    let mut resolved = make_conflict("c1", "a", "z", 0.8, SeverityBand::High);
    resolved.resolved = true;
    let unrelated = make_conflict("c2", "q", "r", 0.8, SeverityBand::High);
    let breakdown = scorer.calculate_breakdown(&ev, &[resolved, unrelated], t0());
    assert_eq!(breakdown.factor(FactorKind::ContradictionPenalty).unwrap().value, 0.0);
    assert_eq!(breakdown.unresolved_conflicts, 0);
}

// ── Configuration and caching ───────────────────────────────────────────

#[test]
fn custom_weights_are_respected() {
    let config = TrustConfig {
        corroboration_weight: 0.0,
        reliability_weight: 1.0,
        freshness_weight: 0.0,
        unknown_residual: 0.0,
        ..TrustConfig::default()
    };
    let scorer = TrustScorer::with_config(config);
    let ev = vec![make_reading("a", "x", "p", 1.0, "bar", 0, 0.64, 1)];
    let breakdown = scorer.calculate_breakdown(&ev, &[], t0());
    assert!((breakdown.composite.value() - 0.64).abs() < 1e-12);
    assert!(!breakdown.has_code(ReasonCode::UnmodeledUncertainty));
    assert!(breakdown.has_code(ReasonCode::LowSourceReliability));
}

#[test]
fn cached_scorer_returns_identical_breakdowns() {
    let scorer = TrustScorer::new().with_cache(16);
    let ev = vec![
        make_reading("a", "x", "p", 1.0, "bar", 30, 0.9, 1),
        make_reading("b", "y", "p", 1.01, "bar", 10, 0.8, 2),
    ];
    let first = scorer.calculate_breakdown(&ev, &[], t0());
    let reversed: Vec<Evidence> = ev.iter().rev().cloned().collect();
    let second = scorer.calculate_breakdown(&reversed, &[], t0());
    assert_eq!(first, second);
    assert_eq!(scorer.cache().unwrap().len(), 1);
}

#[test]
fn cached_scorer_distinguishes_readings_behind_reused_ids() {
    let cached = TrustScorer::new().with_cache(16);
    let plain = TrustScorer::new();
    let agreeing = vec![
        make_reading("a", "x", "p", 100.0, "bar", 30, 0.9, 1),
        make_reading("b", "y", "p", 100.0, "bar", 10, 0.9, 2),
    ];
    let diverging = vec![
        make_reading("a", "x", "p", 100.0, "bar", 30, 0.9, 1),
        make_reading("b", "y", "p", 300.0, "bar", 10, 0.9, 2),
    ];
    assert_eq!(
        cached.calculate_breakdown(&agreeing, &[], t0()),
        plain.calculate_breakdown(&agreeing, &[], t0())
    );
    assert_eq!(
        cached.calculate_breakdown(&diverging, &[], t0()),
        plain.calculate_breakdown(&diverging, &[], t0())
    );
    assert_eq!(cached.cache().unwrap().len(), 2);
}

#[test]
fn cached_scorer_keys_on_conflict_members() {
    let cached = TrustScorer::new().with_cache(16);
    let plain = TrustScorer::new();
    let ev = vec![
        make_reading("a", "x", "p", 1.0, "bar", 30, 0.9, 1),
        make_reading("b", "y", "p", 1.0, "bar", 10, 0.9, 2),
    ];
    let touching = [make_conflict("c1", "a", "b", 0.6, SeverityBand::Medium)];
    let elsewhere = [make_conflict("c1", "q", "r", 0.6, SeverityBand::Medium)];
    assert_eq!(
        cached.calculate_breakdown(&ev, &touching, t0()),
        plain.calculate_breakdown(&ev, &touching, t0())
    );
    assert_eq!(
        cached.calculate_breakdown(&ev, &elsewhere, t0()),
        plain.calculate_breakdown(&ev, &elsewhere, t0())
    );
    assert_eq!(cached.cache().unwrap().len(), 2);
}

#[test]
fn parallel_window_scoring_matches_sequential() {
    let scorer = TrustScorer::new();
    let evidence: Vec<Evidence> = (0..12)
        .map(|i| make_reading(&format!("e{i}"), &format!("s{}", i % 3), "p", 10.0 + i as f64 * 0.01, "bar", 600 * i, 0.85, i as u64 + 1))
        .collect();
    let snapshot = EvidenceSnapshot {
        watermark: 12,
        taken_at: t0(),
        evidence,
    };
    let windows: Vec<TimeWindow> = (0..4)
        .map(|k| TimeWindow::ending_at(t0() - Duration::seconds(1800 * k), Duration::seconds(1800)))
        .collect();
    let parallel = scorer.score_windows(&snapshot, &windows, &[]);
    let sequential: Vec<TrustBreakdown> = windows
        .iter()
        .map(|w| scorer.score_window(&snapshot, w, &[]))
        .collect();
    assert_eq!(parallel, sequential);
}

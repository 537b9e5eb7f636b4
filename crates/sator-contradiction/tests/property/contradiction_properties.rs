//! Property tests: severity bounds, band monotonicity, symmetry.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sator_contradiction::divergence::{band, divergence, severity};
use sator_contradiction::ContradictionDetector;
use sator_core::config::ContradictionConfig;
use sator_core::models::*;
use sator_core::Score;

fn reading(id: &str, source: &str, value: f64) -> Evidence {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    Evidence {
        id: id.to_string(),
        evidence_type: EvidenceType::Sensor,
        source: source.to_string(),
        value: serde_json::json!({ "quantity": "flow_rate", "reading": value, "unit": "L/min" }),
        observed_at: at,
        ingested_at: at,
        seq: 0,
        trust_level: TrustLevel::Medium,
        trust_score: Score::new(0.8),
        trust_reason: None,
        tags: Default::default(),
    }
}

proptest! {
    #[test]
    fn divergence_is_symmetric_and_bounded(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
        let d = divergence(a, b);
        prop_assert!((0.0..=1.0).contains(&d));
        prop_assert_eq!(d, divergence(b, a));
    }

    #[test]
    fn severity_is_within_unit_interval(d in 0.0f64..=1.0) {
        let s = severity(d, &ContradictionConfig::default());
        prop_assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn band_is_monotonic_in_divergence(d1 in 0.0f64..=1.0, d2 in 0.0f64..=1.0) {
        let config = ContradictionConfig::default();
        let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
        prop_assert!(band(lo, &config) <= band(hi, &config));
    }

    #[test]
    fn detection_is_order_independent(a in 1.0f64..500.0, b in 1.0f64..500.0) {
        let detector = ContradictionDetector::default();
        let forward = detector.detect(&[reading("x", "s1", a), reading("y", "s2", b)]);
        let backward = detector.detect(&[reading("y", "s2", b), reading("x", "s1", a)]);
        prop_assert_eq!(forward.len(), backward.len());
        for (f, r) in forward.iter().zip(backward.iter()) {
            prop_assert_eq!(&f.evidence_ids, &r.evidence_ids);
            prop_assert_eq!(f.band, r.band);
            prop_assert_eq!(f.severity, r.severity);
        }
    }
}

//! Property tests: ingestion sequencing and window ordering for any ingest order.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use sator_core::clock::ManualClock;
use sator_core::config::EvidenceConfig;
use sator_core::models::*;
use sator_core::SourceRegistry;
use sator_evidence::EvidenceStore;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// (seconds before t0 the reading was observed, reading, seconds the clock advances first)
fn arb_ingests() -> impl Strategy<Value = Vec<(i64, f64, i64)>> {
    prop::collection::vec((0i64..200, 0.0f64..500.0, 0i64..3), 1..24)
}

fn ingest_all(items: &[(i64, f64, i64)]) -> EvidenceStore {
    let clock = ManualClock::new(t0());
    let store = EvidenceStore::new(
        EvidenceConfig::default(),
        SourceRegistry::default(),
        Arc::new(clock.clone()),
    );
    for (i, (age, reading, step)) in items.iter().enumerate() {
        clock.advance_secs(*step);
        let new = NewEvidence::sensor(
            format!("flow-{}", i % 3),
            "flow_rate",
            *reading,
            "L/min",
            t0() - Duration::seconds(*age),
        );
        store.ingest(new).unwrap();
    }
    store
}

proptest! {
    #[test]
    fn ingestion_times_and_sequence_are_strictly_increasing(items in arb_ingests()) {
        let store = ingest_all(&items);
        let mut by_seq = store.snapshot().evidence;
        by_seq.sort_by_key(|e| e.seq);

        let seqs: Vec<u64> = by_seq.iter().map(|e| e.seq).collect();
        let expected: Vec<u64> = (1..=items.len() as u64).collect();
        prop_assert_eq!(seqs, expected);
        prop_assert_eq!(store.watermark(), items.len() as u64);
        for pair in by_seq.windows(2) {
            prop_assert!(pair[0].ingested_at < pair[1].ingested_at);
        }
    }

    #[test]
    fn window_queries_are_ordered_by_observation(
        items in arb_ingests(),
        from in 0i64..200,
        span in 1i64..200,
    ) {
        let store = ingest_all(&items);
        let window = TimeWindow::new(
            t0() - Duration::seconds(from),
            t0() - Duration::seconds(from) + Duration::seconds(span),
        );
        let found = store.query_by_window(&window, None);
        for pair in found.windows(2) {
            prop_assert!(
                (pair[0].observed_at, pair[0].seq) < (pair[1].observed_at, pair[1].seq)
            );
        }
        prop_assert!(found.iter().all(|e| window.contains(e.observed_at)));
        let inside = store
            .snapshot()
            .evidence
            .iter()
            .filter(|e| window.contains(e.observed_at))
            .count();
        prop_assert_eq!(found.len(), inside);
    }
}

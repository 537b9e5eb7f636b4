//! Tests for degradation tracking, alerting, counters and span helpers.

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use sator_core::{Clock, ManualClock};
use sator_observability::degradation::RecoveryStatus;
use sator_observability::metrics::fields;
use sator_observability::tracing_setup::spans::names;
use sator_observability::{
    evaluate_alerts, init_tracing_with_filter, AlertLevel, Counter, DegradationTracker,
    EngineCounters,
};

fn tracker() -> (DegradationTracker, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    (DegradationTracker::with_clock(Arc::new(clock.clone())), clock)
}

#[test]
fn degradation_recorded_then_recovered() {
    let (tracker, clock) = tracker();
    tracker.record_failure("anchor", "notary timeout after 5000ms", "left pending");
    assert!(tracker.is_degraded("anchor"));
    assert_eq!(tracker.active_degradations().len(), 1);

    clock.advance_secs(90);
    tracker.mark_recovered("anchor");
    assert!(!tracker.is_degraded("anchor"));
    let events = tracker.events();
    assert_eq!(events[0].recovery_status, RecoveryStatus::Recovered);
    assert_eq!(events[0].recovered_at, Some(clock.now()));
    assert!(tracker.degraded_duration("anchor").is_none());
}

#[test]
fn frequent_degradations_raise_a_warning() {
    let (tracker, clock) = tracker();
    for _ in 0..4 {
        tracker.record_failure("anchor", "submission failed", "left pending");
        clock.advance_secs(60);
    }
    tracker.record_failure("audit", "encoding failed", "entry skipped");

    let alerts = evaluate_alerts(&tracker);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert_eq!(alerts[0].component, "anchor");
}

#[test]
fn day_long_degradation_is_critical() {
    let (tracker, clock) = tracker();
    tracker.record_failure("anchor", "notary unreachable", "left pending");
    clock.advance_secs(25 * 3600);

    let alerts = evaluate_alerts(&tracker);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Critical);
}

#[test]
fn recent_count_respects_window() {
    let (tracker, clock) = tracker();
    tracker.record_failure("anchor", "timeout", "pending");
    clock.advance_secs(7200);
    tracker.record_failure("anchor", "timeout", "pending");
    assert_eq!(tracker.count_recent("anchor", 3600), 1);
}

#[test]
fn counters_are_shared_across_threads() {
    let counters = Arc::new(EngineCounters::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counters = Arc::clone(&counters);
            thread::spawn(move || {
                for _ in 0..250 {
                    counters.incr(Counter::EvidenceIngested);
                }
                counters.add(Counter::AnchorFailures, 2);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let snapshot = counters.snapshot();
    assert_eq!(snapshot.evidence_ingested, 1000);
    assert_eq!(snapshot.anchor_failures, 8);
    assert_eq!(snapshot.decisions_opened, 0);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json[fields::EVIDENCE_INGESTED], 1000);
}

#[test]
fn span_macros_use_named_spans() {
    init_tracing_with_filter("sator=trace");
    let span = sator_observability::decision_span!("decision-1", "submit");
    let _guard = span.enter();
    if let Some(meta) = span.metadata() {
        assert_eq!(meta.name(), names::DECISION);
    }
    let anchor = sator_observability::anchor_span!("artifact-1");
    if let Some(meta) = anchor.metadata() {
        assert_eq!(meta.name(), names::ANCHOR);
    }
}

#[test]
fn tracing_init_is_idempotent() {
    init_tracing_with_filter("sator=debug");
    init_tracing_with_filter("sator=trace");
    sator_observability::init_tracing();
}

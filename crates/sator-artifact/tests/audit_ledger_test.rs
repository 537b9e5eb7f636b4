//! Tests for the hash-chained audit ledger and its timeline projection.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sator_artifact::audit_ledger::{entry_hash, verify_entries};
use sator_artifact::{AuditLedger, AuditRecord};
use sator_core::errors::ChainError;
use sator_core::models::{AuditEventKind, TimeWindow};
use sator_core::{ManualClock, Score};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn ledger() -> (AuditLedger, ManualClock) {
    let clock = ManualClock::new(t0());
    (AuditLedger::with_clock(Arc::new(clock.clone())), clock)
}

#[test]
fn entries_link_from_genesis() {
    let (ledger, clock) = ledger();
    let first = ledger
        .append(AuditRecord::new(AuditEventKind::EvidenceIngested, "ev-flow-a", "Flow Sensor A ingested"))
        .unwrap();
    clock.advance_secs(5);
    let second = ledger
        .append(
            AuditRecord::new(AuditEventKind::ConflictDetected, "conflict-1", "flow_rate divergence 5.6%")
                .with_field("band", "medium")
                .with_trust(Score::new(0.866))
                .with_contradiction(true),
        )
        .unwrap();

    assert_eq!(first.seq, 0);
    assert_eq!(first.previous_hash, "");
    assert_eq!(second.previous_hash, first.hash);
    assert_eq!(second.detail["band"], "medium");
    assert_eq!(ledger.head_hash(), second.hash);
    assert_eq!(ledger.verify().unwrap(), 2);
}

#[test]
fn edited_entry_fails_verification() {
    let (ledger, _) = ledger();
    for i in 0..3 {
        ledger
            .append(AuditRecord::new(AuditEventKind::EvidenceIngested, format!("ev-{i}"), "ingested"))
            .unwrap();
    }
    let mut entries = ledger.entries();
    entries[1].subject_id = "ev-forged".to_string();
    let err = verify_entries(&entries).unwrap_err();
    assert!(matches!(err, ChainError::TamperDetected { ref artifact_id, .. } if artifact_id == "audit#1"));
}

#[test]
fn rehashed_edit_breaks_the_next_link() {
    let (ledger, _) = ledger();
    for i in 0..3 {
        ledger
            .append(AuditRecord::new(AuditEventKind::EvidenceIngested, format!("ev-{i}"), "ingested"))
            .unwrap();
    }
    let mut entries = ledger.entries();
    entries[1].subject_id = "ev-forged".to_string();
    entries[1].hash = entry_hash(&entries[1]).unwrap();
    let err = verify_entries(&entries).unwrap_err();
    assert!(matches!(err, ChainError::BrokenLink { ref artifact_id, .. } if artifact_id == "audit#2"));
}

#[test]
fn timeline_filters_by_window_and_keeps_flags() {
    let (ledger, clock) = ledger();
    ledger
        .append(AuditRecord::new(AuditEventKind::EvidenceIngested, "ev-1", "early").with_trust(Score::new(0.94)))
        .unwrap();
    clock.advance_secs(120);
    ledger
        .append(
            AuditRecord::new(AuditEventKind::ConflictDetected, "conflict-1", "divergence")
                .with_trust(Score::new(0.87))
                .with_contradiction(true),
        )
        .unwrap();

    let window = TimeWindow::new(t0() + Duration::seconds(60), t0() + Duration::seconds(600));
    let rows = ledger.timeline(&window);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].summary, "divergence");
    assert_eq!(rows[0].trust_score, Some(Score::new(0.87)));
    assert!(rows[0].contradiction);

    assert_eq!(ledger.timeline(&TimeWindow::unbounded()).len(), 2);
    assert_eq!(ledger.for_subject("ev-1").len(), 1);
}

#[test]
fn concurrent_appends_keep_one_chain() {
    let (ledger, _) = ledger();
    let ledger = Arc::new(ledger);
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for i in 0..25 {
                    ledger
                        .append(AuditRecord::new(
                            AuditEventKind::EvidenceIngested,
                            format!("ev-{t}-{i}"),
                            "ingested",
                        ))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(ledger.len(), 200);
    assert_eq!(ledger.verify().unwrap(), 200);
    let seqs: Vec<u64> = ledger.entries().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, (0..200).collect::<Vec<_>>());
}

//! Engine counters.
//!
//! [`EngineCounters`] is shared by reference across components; every counter
//! is an atomic so recording never takes a lock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Field names used when counters are emitted as structured log fields.
pub mod fields {
    pub const EVIDENCE_INGESTED: &str = "evidence_ingested";
    pub const EVIDENCE_REJECTED: &str = "evidence_rejected";
    pub const CONFLICTS_DETECTED: &str = "conflicts_detected";
    pub const CONFLICTS_RESOLVED: &str = "conflicts_resolved";
    pub const DECISIONS_OPENED: &str = "decisions_opened";
    pub const DECISIONS_RESOLVED: &str = "decisions_resolved";
    pub const DECISIONS_TIMED_OUT: &str = "decisions_timed_out";
    pub const ARTIFACTS_SEALED: &str = "artifacts_sealed";
    pub const ANCHORS_SUBMITTED: &str = "anchors_submitted";
    pub const ANCHOR_FAILURES: &str = "anchor_failures";
    pub const TAMPER_DETECTED: &str = "tamper_detected";
    pub const OPERATIONS_REJECTED: &str = "operations_rejected";
    pub const INCIDENTS_OPENED: &str = "incidents_opened";
    pub const INCIDENTS_CLOSED: &str = "incidents_closed";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    EvidenceIngested,
    EvidenceRejected,
    ConflictsDetected,
    ConflictsResolved,
    DecisionsOpened,
    DecisionsResolved,
    DecisionsTimedOut,
    ArtifactsSealed,
    AnchorsSubmitted,
    AnchorFailures,
    TamperDetected,
    OperationsRejected,
    IncidentsOpened,
    IncidentsClosed,
}

#[derive(Debug, Default)]
pub struct EngineCounters {
    evidence_ingested: AtomicU64,
    evidence_rejected: AtomicU64,
    conflicts_detected: AtomicU64,
    conflicts_resolved: AtomicU64,
    decisions_opened: AtomicU64,
    decisions_resolved: AtomicU64,
    decisions_timed_out: AtomicU64,
    artifacts_sealed: AtomicU64,
    anchors_submitted: AtomicU64,
    anchor_failures: AtomicU64,
    tamper_detected: AtomicU64,
    operations_rejected: AtomicU64,
    incidents_opened: AtomicU64,
    incidents_closed: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub evidence_ingested: u64,
    pub evidence_rejected: u64,
    pub conflicts_detected: u64,
    pub conflicts_resolved: u64,
    pub decisions_opened: u64,
    pub decisions_resolved: u64,
    pub decisions_timed_out: u64,
    pub artifacts_sealed: u64,
    pub anchors_submitted: u64,
    pub anchor_failures: u64,
    pub tamper_detected: u64,
    pub operations_rejected: u64,
    pub incidents_opened: u64,
    pub incidents_closed: u64,
}

impl EngineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: Counter, n: u64) {
        self.slot(counter).fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        use Counter::*;
        CounterSnapshot {
            evidence_ingested: self.get(EvidenceIngested),
            evidence_rejected: self.get(EvidenceRejected),
            conflicts_detected: self.get(ConflictsDetected),
            conflicts_resolved: self.get(ConflictsResolved),
            decisions_opened: self.get(DecisionsOpened),
            decisions_resolved: self.get(DecisionsResolved),
            decisions_timed_out: self.get(DecisionsTimedOut),
            artifacts_sealed: self.get(ArtifactsSealed),
            anchors_submitted: self.get(AnchorsSubmitted),
            anchor_failures: self.get(AnchorFailures),
            tamper_detected: self.get(TamperDetected),
            operations_rejected: self.get(OperationsRejected),
            incidents_opened: self.get(IncidentsOpened),
            incidents_closed: self.get(IncidentsClosed),
        }
    }

    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::EvidenceIngested => &self.evidence_ingested,
            Counter::EvidenceRejected => &self.evidence_rejected,
            Counter::ConflictsDetected => &self.conflicts_detected,
            Counter::ConflictsResolved => &self.conflicts_resolved,
            Counter::DecisionsOpened => &self.decisions_opened,
            Counter::DecisionsResolved => &self.decisions_resolved,
            Counter::DecisionsTimedOut => &self.decisions_timed_out,
            Counter::ArtifactsSealed => &self.artifacts_sealed,
            Counter::AnchorsSubmitted => &self.anchors_submitted,
            Counter::AnchorFailures => &self.anchor_failures,
            Counter::TamperDetected => &self.tamper_detected,
            Counter::OperationsRejected => &self.operations_rejected,
            Counter::IncidentsOpened => &self.incidents_opened,
            Counter::IncidentsClosed => &self.incidents_closed,
        }
    }
}

//! AuditTrail: turns subsystem events into hash-chained audit ledger entries
//! and keeps the engine counters current.

use std::sync::{Arc, RwLock};

use tracing::warn;

use sator_anchor::{AnchorEvent, AnchorListener};
use sator_artifact::{AuditLedger, AuditRecord};
use sator_contradiction::ConflictListener;
use sator_core::errors::{SatorError, SatorErrorCode};
use sator_core::models::{
    AnchorStatus, Artifact, AuditEventKind, Evidence, EvidenceConflict, IncidentState,
    IngestionEvent,
};
use sator_core::traits::IngestionListener;
use sator_core::Score;
use sator_decision::{DecisionEvent, DecisionListener};
use sator_observability::tracing_setup::events;
use sator_observability::{Counter, EngineCounters};

use crate::incidents::{IncidentEvent, IncidentListener};

pub struct AuditTrail {
    ledger: Arc<AuditLedger>,
    counters: Arc<EngineCounters>,
    /// Most recent composite trust the engine computed.
    current_trust: RwLock<Option<Score>>,
}

impl AuditTrail {
    pub fn new(ledger: Arc<AuditLedger>, counters: Arc<EngineCounters>) -> Self {
        Self {
            ledger,
            counters,
            current_trust: RwLock::new(None),
        }
    }

    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    pub fn counters(&self) -> &Arc<EngineCounters> {
        &self.counters
    }

    pub fn note_trust(&self, score: Score) {
        *self
            .current_trust
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(score);
    }

    pub fn current_trust(&self) -> Option<Score> {
        *self.current_trust.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a rejected operation with its error code and traceable id.
    pub fn rejected(&self, operation: &str, err: &SatorError) {
        let subject = err.subject_id().unwrap_or("-").to_string();
        let code = err.error_code();
        self.counters.incr(Counter::OperationsRejected);
        if matches!(err, SatorError::Evidence(_)) {
            self.counters.incr(Counter::EvidenceRejected);
        }
        warn!(operation, code, subject_id = %subject, error = %err, "operation rejected");
        self.append(
            AuditRecord::new(
                AuditEventKind::OperationRejected,
                subject,
                format!("{operation} rejected: {code}"),
            )
            .with_field("operation", operation)
            .with_field("error_code", code)
            .with_field("error", err.to_string()),
        );
    }

    pub fn sealed(&self, artifact: &Artifact, trust: Option<Score>) {
        self.counters.incr(Counter::ArtifactsSealed);
        let mut record = AuditRecord::new(
            AuditEventKind::ArtifactSealed,
            artifact.id.clone(),
            format!("{:?} sealed for {}", artifact.artifact_type, artifact.decision_id),
        )
        .with_field("decision_id", artifact.decision_id.clone())
        .with_field("lineage_id", artifact.lineage_id.clone())
        .with_field("hash", artifact.hash.clone());
        if let Some(score) = trust.or_else(|| self.current_trust()) {
            record = record.with_trust(score);
        }
        self.append(record);
    }

    fn append(&self, record: AuditRecord) {
        if let Err(err) = self.ledger.append(record) {
            warn!(error = %err, "audit entry could not be recorded");
        }
    }

    fn with_current_trust(&self, record: AuditRecord) -> AuditRecord {
        match self.current_trust() {
            Some(score) => record.with_trust(score),
            None => record,
        }
    }
}

impl IngestionListener for AuditTrail {
    fn on_ingested(&self, event: &IngestionEvent, evidence: &Evidence) {
        self.counters.incr(Counter::EvidenceIngested);
        let mut record = AuditRecord::new(
            AuditEventKind::EvidenceIngested,
            evidence.id.clone(),
            format!("evidence from {} ingested", evidence.source),
        )
        .with_field("seq", event.seq)
        .with_field("source", evidence.source.clone())
        .with_field("observed_at", evidence.observed_at.to_rfc3339())
        .with_trust(evidence.trust_score);
        if let Some(quantity) = &event.quantity {
            record = record.with_field("quantity", quantity.clone());
        }
        self.append(record);
    }
}

impl ConflictListener for AuditTrail {
    fn on_detected(&self, conflict: &EvidenceConflict) {
        self.counters.incr(Counter::ConflictsDetected);
        events::conflict_detected(&conflict.id, &conflict.evidence_ids, &conflict.band.to_string());
        let record = AuditRecord::new(
            AuditEventKind::ConflictDetected,
            conflict.id.clone(),
            conflict.description.clone(),
        )
        .with_field("evidence_ids", conflict.evidence_ids.clone())
        .with_field("band", conflict.band.to_string())
        .with_field("divergence", conflict.divergence)
        .with_contradiction(true);
        self.append(self.with_current_trust(record));
    }

    fn on_resolved(&self, conflict: &EvidenceConflict) {
        self.counters.incr(Counter::ConflictsResolved);
        let (summary, resolved_by) = conflict
            .resolution
            .as_ref()
            .map(|r| (r.summary.clone(), r.resolved_by.clone()))
            .unwrap_or_else(|| ("conflict resolved".to_string(), String::new()));
        let record = AuditRecord::new(AuditEventKind::ConflictResolved, conflict.id.clone(), summary)
            .with_field("resolved_by", resolved_by)
            .with_field("evidence_ids", conflict.evidence_ids.clone());
        self.append(self.with_current_trust(record));
    }
}

impl DecisionListener for AuditTrail {
    fn on_decision_event(&self, event: &DecisionEvent) {
        let record = match event {
            DecisionEvent::Opened(d) => {
                self.counters.incr(Counter::DecisionsOpened);
                let allowed: Vec<String> = d.allowed_actions.iter().map(ToString::to_string).collect();
                AuditRecord::new(
                    AuditEventKind::DecisionOpened,
                    d.id.clone(),
                    format!("decision opened for {}", d.lineage_id),
                )
                .with_field("lineage_id", d.lineage_id.clone())
                .with_field("allowed_actions", allowed)
                .with_trust(d.trust_score)
            }
            DecisionEvent::PromptRaised(p) => AuditRecord::new(
                AuditEventKind::PromptRaised,
                p.decision_id.clone(),
                p.text.clone(),
            )
            .with_field("event_ref", p.event_ref.clone())
            .with_field("expires_in_sec", p.expires_in_sec),
            DecisionEvent::Resolved { decision, timed_out } => {
                self.counters.incr(Counter::DecisionsResolved);
                if *timed_out {
                    self.counters.incr(Counter::DecisionsTimedOut);
                    events::decision_timed_out(&decision.id, decision.timebox_seconds);
                }
                AuditRecord::new(
                    AuditEventKind::DecisionResolved,
                    decision.id.clone(),
                    format!("decision {}", decision.state),
                )
                .with_field("operator_id", decision.operator_id.clone().unwrap_or_default())
                .with_field("timed_out", *timed_out)
                .with_trust(decision.trust_score)
            }
            DecisionEvent::ModeChanged(t) => AuditRecord::new(
                AuditEventKind::ModeChanged,
                t.decision_id.clone(),
                format!("mode {} -> {}", t.from_mode, t.to_mode),
            )
            .with_field("triggered_by", t.triggered_by.clone()),
            // Sealing is recorded by the engine with the artifact id as subject.
            DecisionEvent::Closed(_) => return,
        };
        self.append(record);
    }
}

impl AnchorListener for AuditTrail {
    fn on_anchor_event(&self, event: &AnchorEvent) {
        let trust = Score::new(f64::from(event.record().trust_score) / 100.0);
        let entry = match event {
            AnchorEvent::Submitted(r) => {
                self.counters.incr(Counter::AnchorsSubmitted);
                AuditRecord::new(
                    AuditEventKind::AnchorSubmitted,
                    r.artifact_id.clone(),
                    format!("anchor submitted ({})", r.status),
                )
                .with_field("tx_ref", r.tx_ref.clone().unwrap_or_default())
                .with_field("attempts", r.attempts)
            }
            AnchorEvent::SubmissionFailed { record, error } => {
                self.counters.incr(Counter::AnchorFailures);
                AuditRecord::new(
                    AuditEventKind::AnchorStatusChanged,
                    record.artifact_id.clone(),
                    "anchor submission failed; left pending",
                )
                .with_field("error", error.clone())
                .with_field("attempts", record.attempts)
            }
            AnchorEvent::StatusChanged { from, record } => {
                if record.status == AnchorStatus::Tampered {
                    self.counters.incr(Counter::TamperDetected);
                }
                AuditRecord::new(
                    AuditEventKind::AnchorStatusChanged,
                    record.artifact_id.clone(),
                    format!("anchor {from} -> {}", record.status),
                )
                .with_contradiction(record.status == AnchorStatus::Tampered)
            }
        };
        self.append(entry.with_trust(trust));
    }
}

impl IncidentListener for AuditTrail {
    fn on_incident_event(&self, event: &IncidentEvent) {
        let record = match event {
            IncidentEvent::Opened(incident) => {
                self.counters.incr(Counter::IncidentsOpened);
                AuditRecord::new(
                    AuditEventKind::IncidentOpened,
                    incident.id.clone(),
                    incident.title.clone(),
                )
                .with_field("severity", incident.severity.to_string())
                .with_field("conflict_ids", incident.conflict_ids.clone())
                .with_contradiction(true)
            }
            IncidentEvent::Updated { incident, change } => {
                AuditRecord::new(AuditEventKind::IncidentUpdated, incident.id.clone(), change.clone())
                    .with_field("state", incident.state.to_string())
            }
            IncidentEvent::Transitioned { incident, transition } => {
                if transition.to_state == IncidentState::Closed {
                    self.counters.incr(Counter::IncidentsClosed);
                }
                AuditRecord::new(
                    AuditEventKind::IncidentTransitioned,
                    incident.id.clone(),
                    format!("incident {} -> {}", transition.from_state, transition.to_state),
                )
                .with_field("triggered_by", transition.triggered_by.clone())
                .with_field("reason", transition.reason.clone())
            }
        };
        self.append(self.with_current_trust(record));
    }
}

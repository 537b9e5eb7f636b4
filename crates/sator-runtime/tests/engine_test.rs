//! End-to-end tests through the engine facade.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sator_core::clock::ManualClock;
use sator_core::errors::{AnchorError, DecisionError, SatorError, SatorErrorCode};
use sator_core::models::*;
use sator_core::Score;
use sator_decision::{ConflictPosture, DecisionResponse, OpenDecision};
use sator_evidence::ConflictFilter;
use sator_runtime::{EngineOptions, SatorEngine};
use test_fixtures::{load_fixture, EvidenceFixture, TimeoutScenario, TrustScenario};

struct Harness {
    engine: SatorEngine,
    clock: ManualClock,
    base: DateTime<Utc>,
    scenario: TrustScenario,
}

fn new_evidence(f: &EvidenceFixture, base: DateTime<Utc>) -> NewEvidence {
    let mut new = NewEvidence::sensor(
        f.source.clone(),
        f.quantity.as_deref().unwrap_or_default(),
        f.reading.as_ref().and_then(|r| r.as_f64()).unwrap_or_default(),
        f.unit.as_deref().unwrap_or_default(),
        base + Duration::seconds(f.offset_secs),
    )
    .with_id(f.id.clone());
    if let Some(score) = f.trust_score {
        new = new.with_trust_score(score);
    }
    new
}

/// Ingest each record one second after it was observed, leaving the clock at base time.
fn ingest_all<'a>(h: &Harness, fixtures: impl IntoIterator<Item = &'a EvidenceFixture>) {
    for f in fixtures {
        h.clock.set(h.base + Duration::seconds(f.offset_secs + 1));
        h.engine.submit_evidence(new_evidence(f, h.base)).unwrap();
    }
    h.clock.set(h.base);
}

fn harness() -> Harness {
    harness_with_toml("")
}

fn harness_with_toml(toml: &str) -> Harness {
    let scenario: TrustScenario = load_fixture("scenarios/flow_divergence.json");
    let base: DateTime<Utc> = scenario.base_time.parse().unwrap();
    let clock = ManualClock::new(base - Duration::minutes(5));
    let engine = SatorEngine::new(
        EngineOptions::new()
            .with_toml(toml)
            .with_clock(Arc::new(clock.clone())),
    )
    .unwrap();
    Harness {
        engine,
        clock,
        base,
        scenario,
    }
}

fn window(h: &Harness) -> TimeWindow {
    TimeWindow::new(h.base - Duration::minutes(5), h.base + Duration::seconds(1))
}

fn codes(breakdown: &TrustBreakdown) -> Vec<&'static str> {
    breakdown.reason_codes.iter().map(|c| c.code()).collect()
}

fn prompt() -> PromptRequest {
    PromptRequest {
        event_ref: "evt-flow-divergence".into(),
        severity: 0.56,
        kind: PromptKind::Binary,
        options: vec![
            PromptOption::new("act-proceed", "Proceed with isolation", ActionType::Act),
            PromptOption::new("escalate-supervisor", "Escalate to supervisor", ActionType::Escalate),
        ],
        text: "Flow sensors disagree on loop 2".into(),
        expires_in_sec: Some(30),
    }
}

/// Opens a decision over the whole scenario and resolves it with `act-proceed`.
fn resolved_decision(h: &Harness) -> Decision {
    ingest_all(h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    let d = h.engine.open_decision("incident-7", &window(h)).unwrap();
    h.engine.raise_prompt(&d.id, prompt()).unwrap();
    h.clock.advance_secs(10);
    h.engine
        .submit_decision(DecisionResponse::new(&d.id, "act-proceed", "operator:jdoe"))
        .unwrap()
}

// ── Trust and contradictions ────────────────────────────────────────────

#[test]
fn divergent_flow_reading_lowers_trust_and_opens_one_conflict() {
    let h = harness();
    ingest_all(&h, &h.scenario.baseline);
    let baseline = h.engine.trust_breakdown(&window(&h));
    let b = baseline.composite.value();
    assert!(
        b >= h.scenario.expected.baseline_min && b <= h.scenario.expected.baseline_max,
        "baseline {b}"
    );
    assert_eq!(codes(&baseline), h.scenario.expected.baseline_codes);

    ingest_all(&h, &h.scenario.incoming);
    let after = h.engine.trust_breakdown(&window(&h));
    let a = after.composite.value();
    assert!(
        a >= h.scenario.expected.after_min && a <= h.scenario.expected.after_max,
        "after {a}"
    );
    assert_eq!(codes(&after), h.scenario.expected.after_codes);

    let open = h.engine.contradictions(&ConflictFilter::open());
    assert_eq!(open.len(), h.scenario.expected.conflict_count);
    assert_eq!(open[0].band.to_string(), h.scenario.expected.conflict_band);

    let conflicting: Vec<String> = h
        .engine
        .evidence(&window(&h))
        .into_iter()
        .filter(|e| e.trust_level == TrustLevel::Conflicting)
        .map(|e| e.id)
        .collect();
    assert_eq!(conflicting, vec!["ev-flow-a".to_string(), "ev-flow-b".to_string()]);
}

#[test]
fn acknowledging_the_incident_restores_trust() {
    let h = harness();
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    let before = h.engine.trust_breakdown(&window(&h)).composite;
    let conflict = h.engine.contradictions(&ConflictFilter::open()).remove(0);

    let resolved = h
        .engine
        .acknowledge_incident(&conflict.id, "operator:jdoe", "flow sensor B recalibrated")
        .unwrap();
    assert!(resolved.resolved);
    assert_eq!(resolved.resolution.as_ref().unwrap().resolved_by, "operator:jdoe");
    assert!(h.engine.contradictions(&ConflictFilter::open()).is_empty());
    assert!(h.engine.trust_breakdown(&window(&h)).composite > before);

    let incident = h.engine.incidents().remove(0);
    assert_eq!(incident.conflict_ids, vec![conflict.id.clone()]);
    assert_eq!(incident.state, IncidentState::Triaged);
    assert_eq!(incident.assigned_operator_id.as_deref(), Some("operator:jdoe"));

    let again = h
        .engine
        .acknowledge_incident(&conflict.id, "operator:jdoe", "twice")
        .unwrap_err();
    assert_eq!(again.error_code(), "CONFLICT_ALREADY_RESOLVED");
}

#[test]
fn timeline_records_ingestion_before_the_conflict_it_triggers() {
    let h = harness();
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    h.engine.trust_breakdown(&window(&h));

    let timeline = h.engine.timeline(&TimeWindow::unbounded());
    let kinds: Vec<AuditEventKind> = timeline.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventKind::EvidenceIngested,
            AuditEventKind::EvidenceIngested,
            AuditEventKind::EvidenceIngested,
            AuditEventKind::EvidenceIngested,
            AuditEventKind::ConflictDetected,
            AuditEventKind::IncidentOpened,
        ]
    );
    let conflict = &timeline[4];
    assert!(conflict.contradiction);
    assert!(timeline[5].contradiction);
    assert_eq!(timeline[5].subject_id, h.engine.incidents()[0].id);
    assert!(timeline[..4].iter().all(|e| !e.contradiction && e.trust_score.is_some()));
    assert_eq!(timeline[3].subject_id, "ev-flow-b");

    let counters = h.engine.counters();
    assert_eq!(counters.evidence_ingested, 4);
    assert_eq!(counters.conflicts_detected, 1);
    assert_eq!(counters.incidents_opened, 1);
}

#[test]
fn rejected_writes_are_audited_with_their_error_code() {
    let h = harness();
    ingest_all(&h, &h.scenario.baseline);
    let duplicate = new_evidence(&h.scenario.baseline[0], h.base);
    let err = h.engine.submit_evidence(duplicate).unwrap_err();
    assert!(matches!(err, SatorError::Evidence(_)));
    assert_eq!(err.error_code(), "DUPLICATE_EVIDENCE");

    let err = h.engine.seal_decision("decision-missing").unwrap_err();
    assert_eq!(err.error_code(), "DECISION_NOT_FOUND");

    let rejected: Vec<TimelineEntry> = h
        .engine
        .timeline(&TimeWindow::unbounded())
        .into_iter()
        .filter(|e| e.kind == AuditEventKind::OperationRejected)
        .collect();
    assert_eq!(rejected.len(), 2);
    assert_eq!(rejected[0].subject_id, "ev-temp-primary");
    assert!(rejected[0].summary.contains("DUPLICATE_EVIDENCE"));
    assert_eq!(rejected[1].subject_id, "decision-missing");

    let counters = h.engine.counters();
    assert_eq!(counters.operations_rejected, 2);
    assert_eq!(counters.evidence_rejected, 1);
    assert_eq!(h.engine.verify_integrity().unwrap().0, 5);
}

// ── Incidents ───────────────────────────────────────────────────────────

#[test]
fn conflict_above_prompt_threshold_opens_an_incident_that_follows_its_decision() {
    let h = harness();
    let d = resolved_decision(&h);
    let conflict = h.engine.contradictions(&ConflictFilter::open()).remove(0);

    let incidents = h.engine.incidents();
    assert_eq!(incidents.len(), 1);
    let incident = &incidents[0];
    assert_eq!(incident.conflict_ids, vec![conflict.id.clone()]);
    assert_eq!(incident.severity, IncidentSeverity::Warning);
    assert!(incident.evidence_ids.contains("ev-flow-b"));
    assert_eq!(incident.decision_id.as_deref(), Some(d.id.as_str()));
    assert_eq!(incident.state, IncidentState::Dispatched);
    assert_eq!(incident.assigned_operator_id.as_deref(), Some("operator:jdoe"));
    assert_eq!(incident.action_taken, Some(ActionType::Act));

    let receipt = h.engine.seal_decision(&d.id).unwrap();
    let closed = h.engine.incident(&incident.id).unwrap();
    assert_eq!(closed.receipt_ids, vec![receipt.id.clone()]);
    assert!(closed.closed_at.is_some());
    let states: Vec<IncidentState> = closed.transitions.iter().map(|t| t.to_state).collect();
    assert_eq!(
        states,
        vec![
            IncidentState::Open,
            IncidentState::Triaged,
            IncidentState::Dispatched,
            IncidentState::Closed,
        ]
    );
    assert_eq!(closed.transitions[0].from_state, IncidentState::Monitoring);
    assert!(h.engine.open_incidents().is_empty());

    let counters = h.engine.counters();
    assert_eq!(counters.incidents_opened, 1);
    assert_eq!(counters.incidents_closed, 1);
}

#[test]
fn incident_transitions_follow_the_lifecycle_table() {
    let h = harness();
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    let incident = h.engine.open_incidents().remove(0);
    assert_eq!(incident.state, IncidentState::Open);

    let err = h
        .engine
        .close_incident(&incident.id, "operator:kim", "too early")
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INCIDENT_TRANSITION");

    h.engine.assign_incident(&incident.id, "operator:kim").unwrap();
    let triaged = h
        .engine
        .triage_incident(&incident.id, "operator:jdoe", "flow sensor B suspect")
        .unwrap();
    assert_eq!(triaged.assigned_operator_id.as_deref(), Some("operator:kim"));
    assert!(triaged.triaged_at.is_some());

    let dispatched = h
        .engine
        .dispatch_incident(
            &incident.id,
            "operator:kim",
            ActionType::Escalate,
            Some("field crew to loop 2".into()),
        )
        .unwrap();
    assert_eq!(dispatched.state, IncidentState::Dispatched);
    assert_eq!(dispatched.action_details.as_deref(), Some("field crew to loop 2"));

    let closed = h
        .engine
        .close_incident(&incident.id, "operator:kim", "flow sensor B replaced")
        .unwrap();
    assert_eq!(closed.state, IncidentState::Closed);
    assert_eq!(closed.resolution_summary.as_deref(), Some("flow sensor B replaced"));

    let err = h
        .engine
        .triage_incident(&incident.id, "operator:kim", "again")
        .unwrap_err();
    assert_eq!(err.error_code(), "INCIDENT_CLOSED");
    let err = h
        .engine
        .triage_incident("incident-missing", "operator:kim", "?")
        .unwrap_err();
    assert_eq!(err.error_code(), "INCIDENT_NOT_FOUND");

    let timeline = h.engine.timeline(&TimeWindow::unbounded());
    let rejected: Vec<&str> = timeline
        .iter()
        .filter(|e| e.kind == AuditEventKind::OperationRejected)
        .map(|e| e.subject_id.as_str())
        .collect();
    assert_eq!(rejected, vec![incident.id.as_str(), incident.id.as_str(), "incident-missing"]);
    let lifecycle: Vec<AuditEventKind> = timeline
        .iter()
        .filter(|e| e.subject_id == incident.id && e.kind != AuditEventKind::OperationRejected)
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        lifecycle,
        vec![
            AuditEventKind::IncidentOpened,
            AuditEventKind::IncidentUpdated,
            AuditEventKind::IncidentTransitioned,
            AuditEventKind::IncidentTransitioned,
            AuditEventKind::IncidentTransitioned,
        ]
    );
}

#[test]
fn conflicts_below_the_prompt_threshold_open_no_incident() {
    let h = harness_with_toml("[decision]\nprompt_severity_threshold = 0.9\n");
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    assert_eq!(h.engine.contradictions(&ConflictFilter::open()).len(), 1);
    assert!(h.engine.incidents().is_empty());
    assert_eq!(h.engine.counters().incidents_opened, 0);
}

// ── Decisions and sealing ───────────────────────────────────────────────

#[test]
fn decision_carries_trust_and_recommendation_from_its_window() {
    let h = harness();
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    let d = h.engine.open_decision("incident-7", &window(&h)).unwrap();
    assert_eq!(d.evidence_ids.len(), 4);
    let t = d.trust_score.value();
    assert!(t >= h.scenario.expected.after_min && t <= h.scenario.expected.after_max, "trust {t}");
    assert!((d.uncertainty_score.value() - (1.0 - t)).abs() < 1e-9);

    h.engine.raise_prompt(&d.id, prompt()).unwrap();
    h.clock.advance_secs(12);
    let view = h.engine.decision(&d.id).unwrap();
    assert_eq!(view.decision.state, DecisionState::AwaitingResponse);
    assert_eq!(view.remaining_secs, Some(18));
    assert!(view.pending_prompt.is_some());
    assert!(!view.recommendation.rationale.is_empty());
    assert_eq!(view.artifact_id, None);
    assert_eq!(view.anchor_status, AnchorStatus::NotAnchored);
}

#[test]
fn sealing_a_resolved_decision_closes_it_with_a_receipt() {
    let h = harness();
    let d = resolved_decision(&h);
    let artifact = h.engine.seal_decision(&d.id).unwrap();
    assert_eq!(artifact.artifact_type, ArtifactType::DecisionReceipt);
    assert_eq!(artifact.decision_id, d.id);
    assert_eq!(artifact.previous_hash, None);

    let ArtifactContent::Receipt(receipt) = &artifact.content else {
        panic!("expected a receipt");
    };
    assert_eq!(receipt.evidence.len(), 4);
    assert_eq!(receipt.conflicts.len(), 1);
    assert!(receipt.trust.is_some());

    let view = h.engine.decision(&d.id).unwrap();
    assert!(matches!(view.decision.state, DecisionState::Closed { .. }));
    assert_eq!(view.artifact_id.as_deref(), Some(artifact.id.as_str()));

    let err = h.engine.seal_decision(&d.id).unwrap_err();
    assert!(matches!(err, SatorError::Chain(_) | SatorError::Decision(_)));
    assert_eq!(h.engine.counters().artifacts_sealed, 1);
}

#[test]
fn unresolved_decision_cannot_be_sealed() {
    let h = harness();
    ingest_all(&h, &h.scenario.baseline);
    let d = h.engine.open_decision("incident-7", &window(&h)).unwrap();
    let err = h.engine.seal_decision(&d.id).unwrap_err();
    assert_eq!(err.error_code(), "DECISION_NOT_RESOLVED");
}

#[test]
fn legal_posture_packet_references_sealed_receipts() {
    let h = harness();
    let d = resolved_decision(&h);
    let receipt = h.engine.seal_decision(&d.id).unwrap();

    let packet = h.engine.compile_legal_posture(&[]).unwrap();
    assert_eq!(packet.artifact_type, ArtifactType::LegalPosturePacket);
    let ArtifactContent::LegalPosture(content) = &packet.content else {
        panic!("expected a legal posture packet");
    };
    assert_eq!(content.decision_timeline.len(), 1);
    assert_eq!(content.receipts, vec![receipt.id.clone()]);
    assert_eq!(content.evidence_chain, vec![receipt.hash.clone()]);
    assert!(content.system_config.get("trust").is_some());

    let (entries, artifacts) = h.engine.verify_integrity().unwrap();
    assert!(entries > 0);
    assert_eq!(artifacts, 2);

    let err = h
        .engine
        .compile_legal_posture(&["decision-missing".to_string()])
        .unwrap_err();
    assert_eq!(err.error_code(), "DECISION_NOT_FOUND");
}

#[test]
fn sealing_against_a_stale_head_is_rejected_with_chain_conflict() {
    let h = harness();
    let first = resolved_decision(&h);
    let genesis = h.engine.chain().head("incident-7");
    assert_eq!(genesis, "");
    h.engine.seal_decision_on(&first.id, &genesis).unwrap();

    let d = h.engine.open_decision("incident-7", &window(&h)).unwrap();
    h.engine.raise_prompt(&d.id, prompt()).unwrap();
    h.engine
        .submit_decision(DecisionResponse::new(&d.id, "escalate-supervisor", "operator:jdoe"))
        .unwrap();

    let err = h.engine.seal_decision_on(&d.id, &genesis).unwrap_err();
    assert_eq!(err.error_code(), "CHAIN_CONFLICT");
    assert!(matches!(
        h.engine.decision(&d.id).unwrap().decision.state,
        DecisionState::Resolved { .. }
    ));

    let head = h.engine.chain().head("incident-7");
    let second = h.engine.seal_decision_on(&d.id, &head).unwrap();
    assert_eq!(second.previous_hash.as_deref(), Some(head.as_str()));
    assert_eq!(h.engine.counters().operations_rejected, 1);
}

#[test]
fn unrepresentable_prompt_expiry_is_rejected_and_audited() {
    let h = harness();
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    let d = h.engine.open_decision("incident-7", &window(&h)).unwrap();
    let mut request = prompt();
    request.expires_in_sec = Some(u64::MAX);
    let err = h.engine.raise_prompt(&d.id, request).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_PROMPT");
    assert_eq!(h.engine.decision(&d.id).unwrap().decision.state, DecisionState::Open);

    h.engine.raise_prompt(&d.id, prompt()).unwrap();
    assert!(h
        .engine
        .submit_decision(DecisionResponse::new(&d.id, "act-proceed", "operator:jdoe"))
        .is_ok());
}

#[test]
fn late_response_is_rejected_after_automatic_deferral() {
    let scenario: TimeoutScenario = load_fixture("scenarios/prompt_timeout.json");
    let base: DateTime<Utc> = scenario.base_time.parse().unwrap();
    let clock = ManualClock::new(base);
    let engine = SatorEngine::new(EngineOptions::new().with_clock(Arc::new(clock.clone()))).unwrap();

    let d = engine
        .open_decision_with(
            OpenDecision::new("incident-7", Score::new(0.864))
                .with_posture(ConflictPosture { open: 1, high_open: false }),
        )
        .unwrap();
    let mut request = prompt();
    request.expires_in_sec = Some(scenario.expires_in_sec);
    engine.raise_prompt(&d.id, request).unwrap();

    clock.advance_secs(scenario.late_submit_at_sec);
    let err = engine
        .submit_decision(DecisionResponse::new(&d.id, &scenario.late_option, "operator:jdoe"))
        .unwrap_err();
    assert!(matches!(err, SatorError::Decision(DecisionError::DecisionClosed { .. })));

    let view = engine.decision(&d.id).unwrap();
    assert_eq!(view.decision.operator_id.as_deref(), Some(scenario.expected_operator.as_str()));
    assert_eq!(view.decision.action_taken, Some(ActionType::Defer));
    assert_eq!(scenario.expected_outcome, "defer");

    let counters = engine.counters();
    assert_eq!(counters.decisions_timed_out, 1);
    assert_eq!(counters.operations_rejected, 1);

    let kinds: Vec<AuditEventKind> = engine
        .timeline(&TimeWindow::unbounded())
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventKind::DecisionOpened,
            AuditEventKind::ModeChanged,
            AuditEventKind::PromptRaised,
            AuditEventKind::DecisionResolved,
            AuditEventKind::OperationRejected,
        ]
    );
}

// ── Anchoring ───────────────────────────────────────────────────────────

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn anchored_receipt_confirms_verifies_and_detects_tampering() {
    let h = harness();
    let d = resolved_decision(&h);
    let artifact = h.engine.seal_decision(&d.id).unwrap();

    // Outside a runtime nothing is scheduled; the record just waits in `pending`.
    let record = h.engine.anchor_artifact(&artifact.id).unwrap();
    assert_eq!(record.status, AnchorStatus::Pending);
    assert_eq!(record.artifact_hash, artifact.hash);
    assert!(record.trust_score >= 85 && record.trust_score <= 89);

    let rt = runtime();
    let submitted = rt.block_on(h.engine.submit_anchor(&artifact.id)).unwrap();
    let tx_ref = submitted.tx_ref.clone().unwrap();
    h.engine.anchors().client().confirm(&tx_ref).unwrap();
    assert_eq!(
        rt.block_on(h.engine.poll_anchor(&artifact.id)).unwrap(),
        AnchorStatus::Confirmed
    );

    let verified = h.engine.verify_anchor(&artifact.id).unwrap();
    assert_eq!(verified.status, AnchorStatus::Verified);
    assert!(h.engine.artifact(&artifact.id).unwrap().verified);
    assert_eq!(h.engine.anchor_status(&artifact.id), AnchorStatus::Verified);

    let mut forged = artifact.clone();
    if let ArtifactContent::Receipt(receipt) = &mut forged.content {
        receipt.decision.operator_id = Some("operator:someone-else".into());
    }
    let err = h.engine.verify_exported(&forged).unwrap_err();
    assert!(matches!(err, SatorError::Anchor(AnchorError::TamperDetected { .. })));
    assert_eq!(h.engine.anchor_record(&artifact.id).unwrap().status, AnchorStatus::Tampered);
    assert_eq!(h.engine.counters().tamper_detected, 1);
}

#[test]
fn failed_anchor_is_degraded_until_retried() {
    let h = harness();
    let d = resolved_decision(&h);
    let artifact = h.engine.seal_decision(&d.id).unwrap();
    h.engine.anchors().client().fail_next(1);
    h.engine.anchor_artifact(&artifact.id).unwrap();

    let rt = runtime();
    let err = rt.block_on(h.engine.submit_anchor(&artifact.id)).unwrap_err();
    assert_eq!(err.error_code(), "ANCHOR_SUBMISSION_FAILED");
    assert_eq!(h.engine.anchor_status(&artifact.id), AnchorStatus::Pending);
    assert!(h.engine.degradation().is_degraded("anchor"));
    assert_eq!(h.engine.counters().anchor_failures, 1);

    assert_eq!(rt.block_on(h.engine.retry_anchors()), 1);
    assert!(h.engine.anchor_record(&artifact.id).unwrap().tx_ref.is_some());
    assert!(!h.engine.degradation().is_degraded("anchor"));
    assert!(h.engine.alerts().is_empty());
}

#[tokio::test]
async fn anchoring_inside_a_runtime_submits_in_the_background() {
    let h = harness();
    let d = resolved_decision(&h);
    let artifact = h.engine.seal_decision(&d.id).unwrap();
    let record = h.engine.anchor_artifact(&artifact.id).unwrap();
    assert!(record.tx_ref.is_none());

    for _ in 0..10 {
        if h.engine.anchor_record(&artifact.id).and_then(|r| r.tx_ref).is_some() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(h.engine.anchor_record(&artifact.id).unwrap().tx_ref.is_some());
    assert_eq!(h.engine.anchors().client().transactions_for(&artifact.id).len(), 1);
}

#[test]
fn legal_posture_anchor_uses_mean_decision_certainty() {
    let h = harness();
    let d = resolved_decision(&h);
    h.engine.seal_decision(&d.id).unwrap();
    let packet = h.engine.compile_legal_posture(&[]).unwrap();
    let record = h.engine.anchor_artifact(&packet.id).unwrap();
    assert_eq!(record.trust_score, d.trust_score.as_percent());
}

// ── Replay ──────────────────────────────────────────────────────────────

#[test]
fn reconstruction_ignores_later_evidence_and_resolutions() {
    let h = harness();
    ingest_all(&h, h.scenario.baseline.iter().chain(h.scenario.incoming.iter()));
    let conflict = h.engine.contradictions(&ConflictFilter::open()).remove(0);
    let at_base = h.engine.trust_breakdown(&window(&h));

    h.clock.advance_secs(60);
    h.engine
        .acknowledge_incident(&conflict.id, "operator:jdoe", "recalibrated")
        .unwrap();

    let before_b = h.engine.reconstruct_at(h.base - Duration::seconds(8));
    assert_eq!(before_b.evidence.len(), 3);
    assert!(before_b.open_conflicts.is_empty());
    assert!(before_b.decisions.is_empty());

    let replayed = h.engine.reconstruct_at(h.base);
    assert_eq!(replayed.evidence.len(), 4);
    assert_eq!(replayed.open_conflicts.len(), 1);
    assert!(!replayed.open_conflicts[0].resolved);
    assert!((replayed.trust.composite.value() - at_base.composite.value()).abs() < 1e-9);
    assert!(before_b.trust.composite > replayed.trust.composite);

    let now = h.engine.reconstruct_at(h.base + Duration::seconds(60));
    assert!(now.open_conflicts.is_empty());
}

#[test]
fn reconstruction_reports_decision_state_at_each_instant() {
    let h = harness();
    let d = resolved_decision(&h);
    h.clock.advance_secs(5);
    h.engine.seal_decision(&d.id).unwrap();

    let state_at = |secs: i64| {
        h.engine
            .reconstruct_at(h.base + Duration::seconds(secs))
            .decisions
            .into_iter()
            .find(|s| s.decision_id == d.id)
            .map(|s| s.state)
    };
    assert_eq!(state_at(-1), None);
    assert_eq!(state_at(5), Some(DecisionState::AwaitingResponse));
    assert_eq!(state_at(12), Some(DecisionState::Resolved { outcome: ActionType::Act }));
    assert!(matches!(state_at(20), Some(DecisionState::Closed { .. })));
}

#[test]
fn engine_accepts_toml_configuration() {
    let toml = r#"
        [anchor]
        issuer = "plant-7"
        require_approval = true
    "#;
    let engine = SatorEngine::new(EngineOptions::new().with_toml(toml)).unwrap();
    assert_eq!(engine.config().anchor.issuer, "plant-7");
    assert!(engine.config().anchor.require_approval);

    let err = SatorEngine::new(EngineOptions::new().with_toml("[trust\n")).err().unwrap();
    assert_eq!(err.error_code(), "CONFIG_ERROR");
}

//! SatorEngine: owns every subsystem and exposes the read/write API.
//!
//! Subsystems talk to each other through listeners registered here:
//! ingestion feeds the contradiction monitor, conflicts and decisions feed the
//! incident manager, and every subsystem feeds the audit trail. Rejected writes are recorded in the audit ledger with their
//! error code before the error is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use sator_anchor::{AnchorGateway, LocalNotary};
use sator_artifact::{ArtifactChain, AuditLedger, SealRequest};
use sator_contradiction::{ContradictionDetector, ContradictionMonitor, Resolution};
use sator_core::clock::Clock;
use sator_core::errors::{
    ChainError, DecisionError, EvidenceError, SatorError, SatorErrorCode, SatorResult,
};
use sator_core::models::{
    ActionType, AnchorRecord, AnchorStatus, Artifact, ArtifactContent, Decision, DecisionMode,
    DecisionPrompt, DecisionTransition, Evidence, EvidenceConflict, Incident, IncidentState,
    NewEvidence, PromptRequest, TimeWindow, TimelineEntry, TrustBreakdown,
};
use sator_core::traits::IAnchorClient;
use sator_core::{SatorConfig, Score, SourceRegistry};
use sator_decision::{recommend, ConflictPosture, DecisionMachine, DecisionResponse, OpenDecision};
use sator_evidence::{ConflictFilter, ConflictLedger, EvidenceStore};
use sator_observability::tracing_setup::events;
use sator_observability::{
    evaluate_alerts, CounterSnapshot, DegradationAlert, DegradationTracker, EngineCounters,
};
use sator_trust::TrustScorer;

use crate::audit::AuditTrail;
use crate::incidents::IncidentManager;
use crate::options::EngineOptions;
use crate::replay;
use crate::views::{DecisionView, ReplayState};

pub struct SatorEngine<C: IAnchorClient = LocalNotary> {
    config: SatorConfig,
    clock: Arc<dyn Clock>,
    store: Arc<EvidenceStore>,
    conflicts: Arc<ConflictLedger>,
    monitor: Arc<ContradictionMonitor>,
    scorer: TrustScorer,
    decisions: DecisionMachine,
    incidents: Arc<IncidentManager>,
    chain: ArtifactChain,
    anchors: AnchorGateway<C>,
    audit: Arc<AuditTrail>,
    degradation: Arc<DegradationTracker>,
}

impl SatorEngine<LocalNotary> {
    /// Engine anchoring to an in-process notary.
    pub fn new(options: EngineOptions) -> SatorResult<Self> {
        Self::with_client(LocalNotary::new(), options)
    }
}

impl<C: IAnchorClient> SatorEngine<C> {
    pub fn with_client(client: C, options: EngineOptions) -> SatorResult<Self> {
        let config = options.resolve_config()?;
        let clock = options.resolve_clock();

        let registry = SourceRegistry::from_config(&config.trust);
        let store = Arc::new(EvidenceStore::new(
            config.evidence.clone(),
            registry,
            Arc::clone(&clock),
        ));
        let conflicts = Arc::new(ConflictLedger::new());
        let monitor = Arc::new(ContradictionMonitor::new(
            ContradictionDetector::with_clock(config.contradiction.clone(), Arc::clone(&clock)),
            Arc::clone(&store),
            Arc::clone(&conflicts),
            Arc::clone(&clock),
        ));
        let mut scorer = TrustScorer::with_config(config.trust.clone());
        if config.trust.cache_capacity > 0 {
            scorer = scorer.with_cache(config.trust.cache_capacity);
        }
        let decisions = DecisionMachine::new(config.decision.clone(), Arc::clone(&clock));
        let incidents = Arc::new(IncidentManager::new(
            config.decision.prompt_severity_threshold,
            Arc::clone(&clock),
        ));
        let chain = ArtifactChain::with_clock(Arc::clone(&clock));
        let degradation = Arc::new(DegradationTracker::with_clock(Arc::clone(&clock)));
        let anchors = AnchorGateway::with_parts(
            client,
            config.anchor.clone(),
            Arc::clone(&clock),
            Arc::clone(&degradation),
        );
        let audit = Arc::new(AuditTrail::new(
            Arc::new(AuditLedger::with_clock(Arc::clone(&clock))),
            Arc::new(EngineCounters::new()),
        ));

        // Audit before the monitor: an ingestion entry precedes the conflicts it triggers.
        store.register_listener(audit.clone());
        store.register_listener(monitor.clone());
        monitor.register_listener(audit.clone());
        monitor.register_listener(incidents.clone());
        decisions.register_listener(audit.clone());
        decisions.register_listener(incidents.clone());
        incidents.register_listener(audit.clone());
        anchors.register_listener(audit.clone());

        info!(
            issuer = %config.anchor.issuer,
            default_timebox_secs = config.decision.default_timebox_secs,
            "sator engine initialized"
        );
        Ok(Self {
            config,
            clock,
            store,
            conflicts,
            monitor,
            scorer,
            decisions,
            incidents,
            chain,
            anchors,
            audit,
            degradation,
        })
    }

    // ─── Reads ──────────────────────────────────────────────────────────

    /// Composite trust over the evidence observed in `window`.
    #[instrument(skip(self, window), fields(window = %window))]
    pub fn trust_breakdown(&self, window: &TimeWindow) -> TrustBreakdown {
        let snapshot = self.store.snapshot_window(window, None);
        let breakdown = self
            .scorer
            .score_window(&snapshot, window, &self.conflicts.unresolved());
        self.audit.note_trust(breakdown.composite);
        breakdown
    }

    /// Disjoint windows scored in parallel against one snapshot.
    pub fn trust_breakdowns(&self, windows: &[TimeWindow]) -> Vec<TrustBreakdown> {
        let snapshot = self.store.snapshot();
        self.scorer
            .score_windows(&snapshot, windows, &self.conflicts.unresolved())
    }

    /// Evidence observed in `window`, with `conflicting` reported for records
    /// in unresolved conflicts.
    pub fn evidence(&self, window: &TimeWindow) -> Vec<Evidence> {
        let mut evidence = self.store.query_by_window(window, None);
        for e in &mut evidence {
            e.trust_level = self.conflicts.effective_trust_level(e);
        }
        evidence
    }

    pub fn contradictions(&self, filter: &ConflictFilter) -> Vec<EvidenceConflict> {
        self.conflicts.list(filter)
    }

    /// Audit ledger entries in `window`, in ledger order.
    pub fn timeline(&self, window: &TimeWindow) -> Vec<TimelineEntry> {
        self.audit.ledger().timeline(window)
    }

    pub fn decision(&self, decision_id: &str) -> Option<DecisionView> {
        let decision = self.decisions.get(decision_id)?;
        let pending_prompt = decision.pending_prompt().cloned();
        let now = self.clock.now();
        let remaining_secs = pending_prompt.as_ref().map(|p| p.remaining_secs(now));
        let open = self.conflicts.unresolved_touching(&decision.evidence_ids);
        let recommendation = recommend(decision.trust_score, ConflictPosture::from_conflicts(&open));
        let artifact = self.chain.by_decision(decision_id);
        let anchor_status = artifact
            .as_ref()
            .map_or(AnchorStatus::NotAnchored, |a| self.anchors.check_status(a));
        Some(DecisionView {
            decision,
            pending_prompt,
            remaining_secs,
            recommendation,
            artifact_id: artifact.map(|a| a.id),
            anchor_status,
        })
    }

    pub fn decisions(&self) -> Vec<Decision> {
        self.decisions.list()
    }

    pub fn incident(&self, incident_id: &str) -> Option<Incident> {
        self.incidents.get(incident_id)
    }

    /// Every incident in the order it was opened.
    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.list()
    }

    pub fn open_incidents(&self) -> Vec<Incident> {
        self.incidents.unclosed()
    }

    pub fn artifact(&self, artifact_id: &str) -> Option<Artifact> {
        self.chain.get(artifact_id)
    }

    /// Anchor status, re-checking the artifact's hash when it is known.
    pub fn anchor_status(&self, artifact_id: &str) -> AnchorStatus {
        match self.chain.get(artifact_id) {
            Some(artifact) => self.anchors.check_status(&artifact),
            None => self.anchors.status(artifact_id),
        }
    }

    pub fn anchor_record(&self, artifact_id: &str) -> Option<AnchorRecord> {
        self.anchors.record(artifact_id)
    }

    // ─── Writes ─────────────────────────────────────────────────────────

    /// Validate and append a record. Contradiction detection runs before this returns.
    #[instrument(skip(self, new), fields(source = %new.source))]
    pub fn submit_evidence(&self, new: NewEvidence) -> SatorResult<Evidence> {
        let source = new.source.clone();
        let id = self
            .store
            .ingest(new)
            .inspect_err(|e| events::evidence_rejected(&source, e.error_code(), &e.to_string()));
        let id = self.guard("submit_evidence", id)?;
        let evidence = self
            .store
            .get(&id)
            .ok_or(EvidenceError::NotFound { evidence_id: id });
        self.guard("submit_evidence", evidence)
    }

    /// Open a decision over the evidence observed in `window`, deriving trust,
    /// conflict posture and the allowed actions from it.
    #[instrument(skip(self, window), fields(window = %window))]
    pub fn open_decision(&self, lineage_id: &str, window: &TimeWindow) -> SatorResult<Decision> {
        let evidence = self.store.query_by_window(window, None);
        let open = self
            .conflicts
            .unresolved_touching(evidence.iter().map(|e| &e.id));
        let as_of = window.end.min(self.clock.now());
        let breakdown = self.scorer.calculate_breakdown(&evidence, &open, as_of);
        self.audit.note_trust(breakdown.composite);
        let request = OpenDecision::new(lineage_id, breakdown.composite)
            .with_evidence(evidence.iter().map(|e| e.id.clone()))
            .with_posture(ConflictPosture::from_conflicts(&open));
        self.open_decision_with(request)
    }

    pub fn open_decision_with(&self, request: OpenDecision) -> SatorResult<Decision> {
        self.guard("open_decision", self.decisions.open(request))
    }

    pub fn raise_prompt(
        &self,
        decision_id: &str,
        request: PromptRequest,
    ) -> SatorResult<DecisionPrompt> {
        self.guard("raise_prompt", self.decisions.raise_prompt(decision_id, request))
    }

    /// Apply an operator response. A late response fails with `DecisionClosed`
    /// after the automatic deferral has been recorded.
    pub fn submit_decision(&self, response: DecisionResponse) -> SatorResult<Decision> {
        self.guard("submit_decision", self.decisions.submit(response))
    }

    pub fn resolve_conflict(
        &self,
        conflict_id: &str,
        resolution: &Resolution,
        resolved_by: &str,
    ) -> SatorResult<EvidenceConflict> {
        self.guard(
            "resolve_conflict",
            self.monitor.resolve(conflict_id, resolution, resolved_by),
        )
    }

    /// Operator acknowledgement: resolves the conflict as a manual override and
    /// triages the incident tracking it, if that incident is still open.
    pub fn acknowledge_incident(
        &self,
        conflict_id: &str,
        operator_id: &str,
        note: &str,
    ) -> SatorResult<EvidenceConflict> {
        let resolution = Resolution::ManualOverride {
            note: note.to_string(),
        };
        let resolved = self.resolve_conflict(conflict_id, &resolution, operator_id)?;
        if let Some(incident) = self.incidents.for_conflict(conflict_id) {
            if incident.state == IncidentState::Open {
                self.guard(
                    "acknowledge_incident",
                    self.incidents.triage(&incident.id, operator_id, note),
                )?;
            }
        }
        Ok(resolved)
    }

    pub fn triage_incident(
        &self,
        incident_id: &str,
        operator_id: &str,
        assessment: &str,
    ) -> SatorResult<Incident> {
        self.guard(
            "triage_incident",
            self.incidents.triage(incident_id, operator_id, assessment),
        )
    }

    pub fn assign_incident(&self, incident_id: &str, operator_id: &str) -> SatorResult<Incident> {
        self.guard("assign_incident", self.incidents.assign(incident_id, operator_id))
    }

    pub fn dispatch_incident(
        &self,
        incident_id: &str,
        operator_id: &str,
        action: ActionType,
        details: Option<String>,
    ) -> SatorResult<Incident> {
        self.guard(
            "dispatch_incident",
            self.incidents.dispatch(incident_id, operator_id, action, details),
        )
    }

    pub fn close_incident(
        &self,
        incident_id: &str,
        operator_id: &str,
        summary: &str,
    ) -> SatorResult<Incident> {
        self.guard(
            "close_incident",
            self.incidents.close(incident_id, operator_id, summary),
        )
    }

    /// Link a decision opened outside [`SatorEngine::open_decision`]'s evidence overlap.
    pub fn link_incident_decision(
        &self,
        incident_id: &str,
        decision_id: &str,
    ) -> SatorResult<Incident> {
        let exists = self.decisions.get(decision_id).ok_or_else(|| DecisionError::NotFound {
            decision_id: decision_id.to_string(),
        });
        self.guard("link_incident_decision", exists)?;
        self.guard(
            "link_incident_decision",
            self.incidents.link_decision(incident_id, decision_id),
        )
    }

    pub fn transition_mode(
        &self,
        decision_id: &str,
        to: DecisionMode,
        triggered_by: &str,
        reason: Option<String>,
    ) -> SatorResult<DecisionTransition> {
        self.guard(
            "transition_mode",
            self.decisions
                .transition_mode(decision_id, to, triggered_by, reason),
        )
    }

    /// Apply overdue timeouts without waiting for a countdown task.
    pub fn sweep_expired(&self) -> Vec<Decision> {
        self.decisions.sweep_expired()
    }

    /// Seal a resolved decision into a receipt, then close it and the
    /// incident linked to it.
    pub fn seal_decision(&self, decision_id: &str) -> SatorResult<Artifact> {
        self.seal(decision_id, None)
    }

    /// Seal only if the decision's lineage head is still `expected_previous`
    /// (empty for a lineage with no receipts). A stale head fails with
    /// `CHAIN_CONFLICT` and leaves the decision resolved.
    pub fn seal_decision_on(
        &self,
        decision_id: &str,
        expected_previous: &str,
    ) -> SatorResult<Artifact> {
        self.seal(decision_id, Some(expected_previous))
    }

    fn seal(&self, decision_id: &str, expected_previous: Option<&str>) -> SatorResult<Artifact> {
        let span = sator_observability::seal_span!(decision_id);
        let _entered = span.enter();

        let decision = self.decisions.get(decision_id).ok_or_else(|| DecisionError::NotFound {
            decision_id: decision_id.to_string(),
        });
        let decision = self.guard("seal_decision", decision)?;
        let evidence = self.store.get_many(&decision.evidence_ids);
        let touching = self.conflicts.touching(&decision.evidence_ids);
        let open: Vec<EvidenceConflict> = touching.iter().filter(|c| !c.resolved).cloned().collect();
        let trust = self
            .scorer
            .calculate_breakdown(&evidence, &open, self.clock.now());
        let composite = trust.composite;
        let request = SealRequest::new(decision)
            .with_evidence(evidence)
            .with_conflicts(touching)
            .with_trust(trust)
            .with_transitions(self.decisions.transitions(Some(decision_id)));

        let sealed = match expected_previous {
            Some(head) => self.chain.seal_on(request, head),
            None => self.chain.seal(request),
        };
        let artifact = self.guard("seal_decision", sealed)?;
        self.audit.sealed(&artifact, Some(composite));
        self.incidents.link_receipt(decision_id, &artifact.id);
        self.guard(
            "seal_decision",
            self.decisions.close(decision_id, &artifact.id),
        )?;
        Ok(artifact)
    }

    /// Compile and seal a legal posture packet over `decision_ids`, or over
    /// every decision when empty.
    #[instrument(skip(self, decision_ids), fields(count = decision_ids.len()))]
    pub fn compile_legal_posture(&self, decision_ids: &[String]) -> SatorResult<Artifact> {
        let decisions = if decision_ids.is_empty() {
            Ok(self.decisions.list())
        } else {
            decision_ids
                .iter()
                .map(|id| {
                    self.decisions.get(id).ok_or_else(|| DecisionError::NotFound {
                        decision_id: id.clone(),
                    })
                })
                .collect::<Result<Vec<Decision>, DecisionError>>()
        };
        let decisions = self.guard("compile_legal_posture", decisions)?;
        let transitions = self.decisions.transitions(None);
        let snapshot = self.guard("compile_legal_posture", self.config.snapshot())?;
        let packet = self
            .chain
            .compile_legal_posture(&decisions, &transitions, snapshot);
        let artifact = self.guard("compile_legal_posture", packet)?;
        self.audit.sealed(&artifact, None);
        Ok(artifact)
    }

    /// Register an artifact for anchoring. The notary call runs in the
    /// background; this never blocks on it.
    pub fn anchor_artifact(&self, artifact_id: &str) -> SatorResult<AnchorRecord> {
        let artifact = self.guard("anchor_artifact", self.chain.verify(artifact_id))?;
        let trust = artifact_trust(&artifact);
        Ok(self.anchors.anchor(&artifact, trust))
    }

    /// One submission attempt from async code. Failures are already logged
    /// and recorded as degradations.
    pub async fn submit_anchor(&self, artifact_id: &str) -> SatorResult<AnchorRecord> {
        Ok(self.anchors.submit(artifact_id).await?)
    }

    /// Resubmit every anchor left pending by a failure. Returns how many were accepted.
    pub async fn retry_anchors(&self) -> usize {
        let mut accepted = 0;
        for artifact_id in self.anchors.retry_queue() {
            if self.anchors.submit(&artifact_id).await.is_ok() {
                accepted += 1;
            }
        }
        accepted
    }

    pub async fn poll_anchor(&self, artifact_id: &str) -> SatorResult<AnchorStatus> {
        Ok(self.anchors.poll(artifact_id).await?)
    }

    pub fn approve_anchor(&self, artifact_id: &str, approver: &str) -> SatorResult<AnchorRecord> {
        self.guard("approve_anchor", self.anchors.approve(artifact_id, approver))
    }

    /// Check the stored artifact against its anchored hash and mark it verified.
    pub fn verify_anchor(&self, artifact_id: &str) -> SatorResult<AnchorRecord> {
        let artifact = self.chain.get(artifact_id).ok_or_else(|| ChainError::NotFound {
            artifact_id: artifact_id.to_string(),
        });
        let artifact = self.guard("verify_anchor", artifact)?;
        self.verify_exported(&artifact)
    }

    /// Check a copy of an artifact (e.g. one handed back by an auditor)
    /// against its anchored hash.
    pub fn verify_exported(&self, artifact: &Artifact) -> SatorResult<AnchorRecord> {
        let record = self.guard("verify_anchor", self.anchors.verify(artifact))?;
        self.guard(
            "verify_anchor",
            self.chain.mark_verified(&artifact.id, self.clock.now()),
        )?;
        Ok(record)
    }

    // ─── Replay & integrity ─────────────────────────────────────────────

    /// State as of a past instant, rebuilt from immutable records. Pure read.
    pub fn reconstruct_at(&self, at: DateTime<Utc>) -> ReplayState {
        let evidence = replay::evidence_as_of(self.store.snapshot().evidence, at);
        let open_conflicts = replay::open_conflicts_as_of(self.conflicts.all(), at);
        let trust = self.scorer.calculate_breakdown(&evidence, &open_conflicts, at);
        let transitions = self.decisions.transitions(None);
        let decisions = self
            .decisions
            .list()
            .iter()
            .filter_map(|d| {
                let artifact = self.chain.by_decision(&d.id);
                replay::decision_as_of(d, &transitions, artifact.as_ref(), at)
            })
            .collect();
        ReplayState {
            at,
            evidence,
            trust,
            open_conflicts,
            decisions,
        }
    }

    /// Walk the audit ledger and every artifact lineage. Returns entries and
    /// artifacts checked.
    pub fn verify_integrity(&self) -> SatorResult<(usize, usize)> {
        let entries = self.audit.ledger().verify()?;
        let mut lineages: Vec<String> = self.chain.sealed().into_iter().map(|a| a.lineage_id).collect();
        lineages.sort();
        lineages.dedup();
        let mut artifacts = 0;
        for lineage in &lineages {
            artifacts += self.chain.verify_lineage(lineage)?;
        }
        Ok((entries, artifacts))
    }

    // ─── Accessors ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SatorConfig {
        &self.config
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.audit.counters().snapshot()
    }

    pub fn alerts(&self) -> Vec<DegradationAlert> {
        evaluate_alerts(&self.degradation)
    }

    pub fn degradation(&self) -> &Arc<DegradationTracker> {
        &self.degradation
    }

    pub fn audit_ledger(&self) -> &Arc<AuditLedger> {
        self.audit.ledger()
    }

    pub fn anchors(&self) -> &AnchorGateway<C> {
        &self.anchors
    }

    pub fn chain(&self) -> &ArtifactChain {
        &self.chain
    }

    pub fn incident_manager(&self) -> &Arc<IncidentManager> {
        &self.incidents
    }

    /// Record a rejection in the audit ledger before handing the error back.
    fn guard<T, E: Into<SatorError>>(&self, operation: &str, result: Result<T, E>) -> SatorResult<T> {
        result.map_err(|e| {
            let err = e.into();
            self.audit.rejected(operation, &err);
            err
        })
    }
}

/// Trust carried into an anchor: the sealed breakdown for receipts, mean
/// decision trust for packets.
fn artifact_trust(artifact: &Artifact) -> Score {
    match &artifact.content {
        ArtifactContent::Receipt(receipt) => receipt
            .trust
            .as_ref()
            .map_or(receipt.decision.trust_score, |t| t.composite),
        ArtifactContent::LegalPosture(packet) => {
            let timeline = &packet.decision_timeline;
            if timeline.is_empty() {
                return Score::new(0.0);
            }
            let sum: f64 = timeline.iter().map(|e| e.uncertainty_score.inverse().value()).sum();
            Score::new(sum / timeline.len() as f64)
        }
    }
}

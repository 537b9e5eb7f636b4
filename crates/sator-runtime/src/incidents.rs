//! IncidentManager: the operator-facing lifecycle wrapped around contradictions.
//!
//! A conflict at or above the prompt severity threshold opens an incident, or
//! joins an unclosed incident that already covers one of its evidence records.
//! Decisions over that evidence are linked when they open. An operator's
//! answer triages and dispatches the incident, and sealing the decision
//! closes it with the receipt attached.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sator_contradiction::ConflictListener;
use sator_core::clock::Clock;
use sator_core::constants::{SYSTEM_ACTOR, SYSTEM_TIMEOUT_OPERATOR};
use sator_core::errors::IncidentError;
use sator_core::models::{
    ActionType, Decision, EvidenceConflict, Incident, IncidentSeverity, IncidentState,
    IncidentTransition,
};
use sator_decision::{DecisionEvent, DecisionListener};

#[derive(Debug, Clone, PartialEq)]
pub enum IncidentEvent {
    Opened(Incident),
    /// A conflict, decision, receipt or operator was attached.
    Updated { incident: Incident, change: String },
    Transitioned {
        incident: Incident,
        transition: IncidentTransition,
    },
}

impl IncidentEvent {
    pub fn incident(&self) -> &Incident {
        match self {
            Self::Opened(incident)
            | Self::Updated { incident, .. }
            | Self::Transitioned { incident, .. } => incident,
        }
    }
}

/// Called after the change is stored.
pub trait IncidentListener: Send + Sync {
    fn on_incident_event(&self, event: &IncidentEvent);
}

pub struct IncidentManager {
    clock: Arc<dyn Clock>,
    /// Conflicts at or above this severity open an incident.
    threshold: f64,
    incidents: DashMap<String, Incident>,
    order: Mutex<Vec<String>>,
    listeners: RwLock<Vec<Arc<dyn IncidentListener>>>,
}

impl IncidentManager {
    pub fn new(threshold: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            threshold,
            incidents: DashMap::new(),
            order: Mutex::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn register_listener(&self, listener: Arc<dyn IncidentListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    pub fn get(&self, incident_id: &str) -> Option<Incident> {
        self.incidents.get(incident_id).map(|i| i.value().clone())
    }

    /// Every incident in the order it was opened.
    pub fn list(&self) -> Vec<Incident> {
        let ids = self.order.lock().unwrap_or_else(|e| e.into_inner()).clone();
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn unclosed(&self) -> Vec<Incident> {
        self.list().into_iter().filter(|i| !i.is_closed()).collect()
    }

    pub fn for_decision(&self, decision_id: &str) -> Option<Incident> {
        self.list()
            .into_iter()
            .find(|i| i.decision_id.as_deref() == Some(decision_id))
    }

    pub fn for_conflict(&self, conflict_id: &str) -> Option<Incident> {
        self.list()
            .into_iter()
            .find(|i| i.conflict_ids.iter().any(|c| c == conflict_id))
    }

    /// Open an incident for `conflict`, or attach it to an unclosed incident
    /// over the same evidence. `None` below the severity threshold or when the
    /// conflict is already tracked.
    pub fn track_conflict(&self, conflict: &EvidenceConflict) -> Option<Incident> {
        if conflict.severity.value() < self.threshold {
            debug!(conflict_id = %conflict.id, "conflict below incident threshold");
            return None;
        }
        if self.for_conflict(&conflict.id).is_some() {
            return None;
        }
        let severity = IncidentSeverity::from_conflict(conflict);
        let now = self.clock.now();

        let existing = self
            .unclosed()
            .into_iter()
            .find(|i| i.touches(&conflict.evidence_ids));
        if let Some(existing) = existing {
            let updated = self
                .modify(&existing.id, |incident| {
                    incident.conflict_ids.push(conflict.id.clone());
                    incident.evidence_ids.extend(conflict.evidence_ids.iter().cloned());
                    incident.severity = incident.severity.max(severity);
                    incident.updated_at = now;
                    Ok(())
                })
                .ok()?;
            self.emit(&IncidentEvent::Updated {
                incident: updated.clone(),
                change: format!("conflict {} linked", conflict.id),
            });
            return Some(updated);
        }

        let id = format!("incident-{}", Uuid::new_v4());
        let incident = Incident {
            id: id.clone(),
            title: format!("{} conflict on {}", conflict.band, conflict.quantity),
            description: conflict.description.clone(),
            state: IncidentState::Open,
            severity,
            created_at: now,
            updated_at: now,
            triaged_at: None,
            dispatched_at: None,
            closed_at: None,
            conflict_ids: vec![conflict.id.clone()],
            evidence_ids: conflict.evidence_ids.iter().cloned().collect(),
            decision_id: None,
            receipt_ids: Vec::new(),
            assigned_operator_id: None,
            action_taken: None,
            action_details: None,
            resolution_summary: None,
            transitions: vec![IncidentTransition {
                incident_id: id.clone(),
                from_state: IncidentState::Monitoring,
                to_state: IncidentState::Open,
                triggered_by: SYSTEM_ACTOR.to_string(),
                reason: format!("contradiction {} detected", conflict.id),
                timestamp: now,
            }],
        };
        self.incidents.insert(id.clone(), incident.clone());
        self.order.lock().unwrap_or_else(|e| e.into_inner()).push(id);
        info!(
            incident_id = %incident.id,
            conflict_id = %conflict.id,
            severity = %incident.severity,
            "incident opened"
        );
        self.emit(&IncidentEvent::Opened(incident.clone()));
        Some(incident)
    }

    /// Operator review: `open → triaged`. Assigns the operator if nobody is yet.
    pub fn triage(
        &self,
        incident_id: &str,
        operator_id: &str,
        assessment: &str,
    ) -> Result<Incident, IncidentError> {
        self.transition(incident_id, IncidentState::Triaged, operator_id, assessment, |i| {
            i.assigned_operator_id.get_or_insert_with(|| operator_id.to_string());
        })
    }

    /// Field action: `triaged → dispatched`.
    pub fn dispatch(
        &self,
        incident_id: &str,
        operator_id: &str,
        action: ActionType,
        details: Option<String>,
    ) -> Result<Incident, IncidentError> {
        let reason = format!("action dispatched: {action}");
        self.transition(incident_id, IncidentState::Dispatched, operator_id, &reason, |i| {
            i.action_taken = Some(action);
            i.action_details = details;
        })
    }

    /// `triaged | dispatched → closed`.
    pub fn close(
        &self,
        incident_id: &str,
        triggered_by: &str,
        summary: &str,
    ) -> Result<Incident, IncidentError> {
        self.transition(incident_id, IncidentState::Closed, triggered_by, summary, |i| {
            i.resolution_summary = Some(summary.to_string());
        })
    }

    pub fn assign(&self, incident_id: &str, operator_id: &str) -> Result<Incident, IncidentError> {
        let now = self.clock.now();
        let incident = self.modify(incident_id, |i| {
            if i.is_closed() {
                return Err(IncidentError::Closed {
                    incident_id: i.id.clone(),
                });
            }
            i.assigned_operator_id = Some(operator_id.to_string());
            i.updated_at = now;
            Ok(())
        })?;
        self.emit(&IncidentEvent::Updated {
            incident: incident.clone(),
            change: format!("assigned to {operator_id}"),
        });
        Ok(incident)
    }

    /// Attach the decision taken over this incident. An incident carries at most one.
    pub fn link_decision(
        &self,
        incident_id: &str,
        decision_id: &str,
    ) -> Result<Incident, IncidentError> {
        let now = self.clock.now();
        let incident = self.modify(incident_id, |i| {
            if i.is_closed() {
                return Err(IncidentError::Closed {
                    incident_id: i.id.clone(),
                });
            }
            match &i.decision_id {
                Some(linked) if linked != decision_id => Err(IncidentError::AlreadyLinked {
                    incident_id: i.id.clone(),
                    decision_id: linked.clone(),
                }),
                _ => {
                    i.decision_id = Some(decision_id.to_string());
                    i.updated_at = now;
                    Ok(())
                }
            }
        })?;
        self.emit(&IncidentEvent::Updated {
            incident: incident.clone(),
            change: format!("decision {decision_id} linked"),
        });
        Ok(incident)
    }

    /// Attach a sealed receipt to the incident linked to `decision_id`.
    pub fn link_receipt(&self, decision_id: &str, receipt_id: &str) -> Option<Incident> {
        let linked = self.for_decision(decision_id)?;
        let now = self.clock.now();
        let incident = self
            .modify(&linked.id, |i| {
                if !i.receipt_ids.iter().any(|r| r == receipt_id) {
                    i.receipt_ids.push(receipt_id.to_string());
                }
                i.updated_at = now;
                Ok(())
            })
            .ok()?;
        self.emit(&IncidentEvent::Updated {
            incident: incident.clone(),
            change: format!("receipt {receipt_id} linked"),
        });
        Some(incident)
    }

    fn transition<F>(
        &self,
        incident_id: &str,
        to: IncidentState,
        triggered_by: &str,
        reason: &str,
        apply: F,
    ) -> Result<Incident, IncidentError>
    where
        F: FnOnce(&mut Incident),
    {
        let now = self.clock.now();
        let mut recorded = None;
        let incident = self.modify(incident_id, |i| {
            if !i.state.can_transition_to(to) {
                return Err(if i.is_closed() {
                    IncidentError::Closed {
                        incident_id: i.id.clone(),
                    }
                } else {
                    IncidentError::InvalidTransition {
                        incident_id: i.id.clone(),
                        from: i.state.to_string(),
                        to: to.to_string(),
                    }
                });
            }
            let transition = IncidentTransition {
                incident_id: i.id.clone(),
                from_state: i.state,
                to_state: to,
                triggered_by: triggered_by.to_string(),
                reason: reason.to_string(),
                timestamp: now,
            };
            apply(i);
            stamp(i, to, now);
            i.state = to;
            i.updated_at = now;
            i.transitions.push(transition.clone());
            recorded = Some(transition);
            Ok(())
        })?;
        if let Some(transition) = recorded {
            info!(
                incident_id,
                from = %transition.from_state,
                to = %transition.to_state,
                triggered_by,
                "incident transitioned"
            );
            self.emit(&IncidentEvent::Transitioned {
                incident: incident.clone(),
                transition,
            });
        }
        Ok(incident)
    }

    /// Mutate one incident under its map entry and return the stored copy.
    fn modify<F>(&self, incident_id: &str, f: F) -> Result<Incident, IncidentError>
    where
        F: FnOnce(&mut Incident) -> Result<(), IncidentError>,
    {
        let mut entry = self
            .incidents
            .get_mut(incident_id)
            .ok_or_else(|| IncidentError::NotFound {
                incident_id: incident_id.to_string(),
            })?;
        f(entry.value_mut())?;
        Ok(entry.value().clone())
    }

    fn emit(&self, event: &IncidentEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in listeners {
            listener.on_incident_event(event);
        }
    }

    fn on_opened(&self, decision: &Decision) {
        let candidates: Vec<Incident> = self
            .unclosed()
            .into_iter()
            .filter(|i| i.decision_id.is_none() && i.touches(&decision.evidence_ids))
            .collect();
        for incident in candidates {
            if let Err(err) = self.link_decision(&incident.id, &decision.id) {
                warn!(incident_id = %incident.id, error = %err, "decision not linked");
            }
        }
    }

    fn on_resolved(&self, decision: &Decision, timed_out: bool) {
        let Some(incident) = self.for_decision(&decision.id) else {
            return;
        };
        let operator = match (&decision.operator_id, timed_out) {
            (_, true) | (None, _) => SYSTEM_TIMEOUT_OPERATOR,
            (Some(operator), false) => operator.as_str(),
        };
        if incident.state == IncidentState::Open {
            let assessment = if timed_out {
                format!("decision {} timed out", decision.id)
            } else {
                format!("decision {} answered", decision.id)
            };
            if let Err(err) = self.triage(&incident.id, operator, &assessment) {
                warn!(incident_id = %incident.id, error = %err, "incident not triaged");
                return;
            }
        }
        let triaged = self
            .get(&incident.id)
            .is_some_and(|i| i.state == IncidentState::Triaged);
        if let (true, Some(action)) = (triaged, decision.action_taken) {
            if let Err(err) =
                self.dispatch(&incident.id, operator, action, decision.action_details.clone())
            {
                warn!(incident_id = %incident.id, error = %err, "incident not dispatched");
            }
        }
    }

    fn on_closed(&self, decision: &Decision) {
        let Some(incident) = self.for_decision(&decision.id) else {
            return;
        };
        if incident.is_closed() {
            return;
        }
        let summary = format!("decision {} sealed", decision.id);
        if let Err(err) = self.close(&incident.id, SYSTEM_ACTOR, &summary) {
            warn!(incident_id = %incident.id, error = %err, "incident left open after sealing");
        }
    }
}

fn stamp(incident: &mut Incident, to: IncidentState, now: DateTime<Utc>) {
    match to {
        IncidentState::Triaged => incident.triaged_at = Some(now),
        IncidentState::Dispatched => incident.dispatched_at = Some(now),
        IncidentState::Closed => incident.closed_at = Some(now),
        IncidentState::Monitoring | IncidentState::Open => {}
    }
}

impl ConflictListener for IncidentManager {
    fn on_detected(&self, conflict: &EvidenceConflict) {
        self.track_conflict(conflict);
    }

    // Resolving a conflict leaves the incident where it is; operators move it.
    fn on_resolved(&self, _conflict: &EvidenceConflict) {}
}

impl DecisionListener for IncidentManager {
    fn on_decision_event(&self, event: &DecisionEvent) {
        match event {
            DecisionEvent::Opened(d) => self.on_opened(d),
            DecisionEvent::Resolved { decision, timed_out } => self.on_resolved(decision, *timed_out),
            DecisionEvent::Closed(d) => self.on_closed(d),
            DecisionEvent::PromptRaised(_) | DecisionEvent::ModeChanged(_) => {}
        }
    }
}

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use sator_core::clock::{system_clock, Clock};
use sator_core::config::DecisionConfig;
use sator_core::constants::{MAX_ALLOWED_ACTIONS, SYSTEM_ACTOR, SYSTEM_TIMEOUT_OPERATOR};
use sator_core::errors::DecisionError;
use sator_core::models::{
    ActionType, Decision, DecisionMode, DecisionPrompt, DecisionState, DecisionTransition,
    PromptRequest,
};
use sator_core::Score;

use crate::events::{DecisionEvent, DecisionListener};
use crate::policy::{self, ConflictPosture};
use crate::timer::Countdown;
use crate::{modes, prompt};

/// Parameters for opening a decision over an evidence window.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDecision {
    pub lineage_id: String,
    pub evidence_ids: BTreeSet<String>,
    /// Composite trust of the window at open time.
    pub trust: Score,
    pub posture: ConflictPosture,
    pub mode: DecisionMode,
    /// Falls back to the configured default.
    pub timebox_secs: Option<u64>,
    /// Explicit action set; derived from trust and posture when absent.
    pub allowed_actions: Option<Vec<ActionType>>,
}

impl OpenDecision {
    pub fn new(lineage_id: impl Into<String>, trust: Score) -> Self {
        Self {
            lineage_id: lineage_id.into(),
            evidence_ids: BTreeSet::new(),
            trust,
            posture: ConflictPosture::none(),
            mode: DecisionMode::Observe,
            timebox_secs: None,
            allowed_actions: None,
        }
    }

    pub fn with_evidence<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.evidence_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_posture(mut self, posture: ConflictPosture) -> Self {
        self.posture = posture;
        self
    }

    pub fn with_mode(mut self, mode: DecisionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timebox(mut self, secs: u64) -> Self {
        self.timebox_secs = Some(secs);
        self
    }

    pub fn with_allowed_actions(mut self, actions: Vec<ActionType>) -> Self {
        self.allowed_actions = Some(actions);
        self
    }
}

/// An operator's answer to a pending prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionResponse {
    pub decision_id: String,
    pub selected_option: String,
    pub operator_id: String,
    /// Free-text details; the option label is recorded when absent.
    pub details: Option<String>,
}

impl DecisionResponse {
    pub fn new(
        decision_id: impl Into<String>,
        selected_option: impl Into<String>,
        operator_id: impl Into<String>,
    ) -> Self {
        Self {
            decision_id: decision_id.into(),
            selected_option: selected_option.into(),
            operator_id: operator_id.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

struct Slot {
    decision: Decision,
    countdown: Option<Countdown>,
}

struct Shared {
    config: DecisionConfig,
    clock: Arc<dyn Clock>,
    decisions: DashMap<String, Arc<Mutex<Slot>>>,
    /// Lineage id → most recent decision id.
    lineages: DashMap<String, String>,
    transitions: Mutex<Vec<DecisionTransition>>,
    listeners: RwLock<Vec<Arc<dyn DecisionListener>>>,
    generations: AtomicU64,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// `now + secs`, or `None` when `secs` is zero, above `max`, or not representable.
fn expiry_after(now: DateTime<Utc>, secs: u64, max: u64) -> Option<DateTime<Utc>> {
    if secs == 0 || secs > max {
        return None;
    }
    let delta = Duration::try_seconds(i64::try_from(secs).ok()?)?;
    now.checked_add_signed(delta)
}

impl Shared {
    fn slot(&self, decision_id: &str) -> Result<Arc<Mutex<Slot>>, DecisionError> {
        self.decisions
            .get(decision_id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| DecisionError::NotFound {
                decision_id: decision_id.to_string(),
            })
    }

    fn emit(&self, events: &[DecisionEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for event in events {
            for listener in &listeners {
                listener.on_decision_event(event);
            }
        }
    }

    fn record_transition(&self, transition: DecisionTransition) {
        self.transitions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(transition);
    }

    /// Resolve to `deferred` on behalf of the timeout operator.
    fn apply_timeout(slot: &mut Slot, now: DateTime<Utc>) -> Decision {
        if let Some(mut countdown) = slot.countdown.take() {
            countdown.cancel();
        }
        let d = &mut slot.decision;
        d.state = DecisionState::Resolved {
            outcome: ActionType::Defer,
        };
        d.action_taken = Some(ActionType::Defer);
        d.action_details = Some(format!(
            "no response within {}s; deferred automatically",
            d.timebox_seconds
        ));
        d.action_taken_at = Some(now);
        d.operator_id = Some(SYSTEM_TIMEOUT_OPERATOR.to_string());
        info!(decision_id = %d.id, "decision timebox expired; deferred");
        d.clone()
    }

    /// Lazily apply an overdue timeout.
    fn expire_if_due(&self, slot: &mut Slot) -> Option<Decision> {
        let now = self.clock.now();
        if slot.decision.state == DecisionState::AwaitingResponse
            && now >= slot.decision.timebox_expires_at
        {
            Some(Self::apply_timeout(slot, now))
        } else {
            None
        }
    }

    /// Countdown callback. A stale generation or an already-resolved decision is a no-op.
    fn on_countdown(&self, decision_id: &str, generation: u64) {
        let Ok(slot) = self.slot(decision_id) else {
            return;
        };
        let resolved = {
            let mut guard = lock(&slot);
            let current = guard
                .countdown
                .as_ref()
                .is_some_and(|c| c.generation == generation);
            if !current || guard.decision.state != DecisionState::AwaitingResponse {
                debug!(decision_id, generation, "stale countdown ignored");
                return;
            }
            // This task is the countdown; let it finish rather than abort itself.
            if let Some(countdown) = guard.countdown.take() {
                countdown.detach();
            }
            let now = self.clock.now();
            Self::apply_timeout(&mut guard, now)
        };
        self.emit(&[DecisionEvent::Resolved {
            decision: resolved,
            timed_out: true,
        }]);
    }
}

/// Decision lifecycle engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DecisionMachine {
    shared: Arc<Shared>,
}

impl DecisionMachine {
    pub fn new(config: DecisionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                clock,
                decisions: DashMap::new(),
                lineages: DashMap::new(),
                transitions: Mutex::new(Vec::new()),
                listeners: RwLock::new(Vec::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.shared.config
    }

    pub fn register_listener(&self, listener: Arc<dyn DecisionListener>) {
        let mut guard = self
            .shared
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner());
        guard.push(listener);
    }

    /// Whether an event of this severity warrants operator input.
    pub fn should_prompt(&self, severity: f64) -> bool {
        severity >= self.shared.config.prompt_severity_threshold
    }

    /// Open a decision. A lineage holds at most one live (not yet closed) decision.
    #[instrument(skip(self, request), fields(lineage_id = %request.lineage_id))]
    pub fn open(&self, request: OpenDecision) -> Result<Decision, DecisionError> {
        let id = format!("decision-{}", Uuid::new_v4());
        let cap = self.shared.config.max_allowed_actions.min(MAX_ALLOWED_ACTIONS);
        let allowed_actions = match request.allowed_actions {
            Some(requested) if !requested.is_empty() => {
                let mut unique: Vec<ActionType> = Vec::with_capacity(requested.len());
                for action in requested {
                    if !unique.contains(&action) {
                        unique.push(action);
                    }
                }
                if unique.len() > cap {
                    return Err(DecisionError::ActionCapExceeded {
                        decision_id: id,
                        requested: unique.len(),
                        cap,
                    });
                }
                unique
            }
            _ => policy::allowed_actions(request.trust, request.posture, cap),
        };

        let timebox = request
            .timebox_secs
            .filter(|s| *s > 0)
            .unwrap_or(self.shared.config.default_timebox_secs);
        let now = self.shared.clock.now();
        let max = self.shared.config.max_timebox_secs;
        let expires_at = expiry_after(now, timebox, max).ok_or_else(|| {
            DecisionError::TimeboxOutOfRange {
                lineage_id: request.lineage_id.clone(),
                secs: timebox,
                max,
            }
        })?;
        let decision = Decision {
            id: id.clone(),
            lineage_id: request.lineage_id.clone(),
            mode: request.mode,
            state: DecisionState::Open,
            created_at: now,
            evidence_ids: request.evidence_ids,
            allowed_actions,
            trust_score: request.trust,
            uncertainty_score: request.trust.inverse(),
            timebox_seconds: timebox,
            timebox_expires_at: expires_at,
            action_taken: None,
            action_details: None,
            action_taken_at: None,
            operator_id: None,
            prompt: None,
        };

        match self.shared.lineages.entry(request.lineage_id.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get().clone();
                if self.is_live(&existing) {
                    return Err(DecisionError::WindowAlreadyLive {
                        lineage_id: request.lineage_id,
                        decision_id: existing,
                    });
                }
                self.insert(&decision);
                entry.insert(id.clone());
            }
            Entry::Vacant(entry) => {
                self.insert(&decision);
                entry.insert(id.clone());
            }
        }

        info!(
            decision_id = %id,
            trust = %decision.trust_score,
            allowed = ?decision.allowed_actions,
            "decision opened"
        );
        self.shared.emit(&[DecisionEvent::Opened(decision.clone())]);
        Ok(decision)
    }

    fn insert(&self, decision: &Decision) {
        self.shared.decisions.insert(
            decision.id.clone(),
            Arc::new(Mutex::new(Slot {
                decision: decision.clone(),
                countdown: None,
            })),
        );
    }

    fn is_live(&self, decision_id: &str) -> bool {
        self.shared
            .slot(decision_id)
            .map(|slot| lock(&slot).decision.is_live())
            .unwrap_or(false)
    }

    /// Move an open decision to `awaiting_response` and start its countdown.
    ///
    /// The prompt's expiry becomes the decision's timebox. A decision still in
    /// `observe` mode switches to `decision` mode.
    #[instrument(skip(self, request), fields(event_ref = %request.event_ref))]
    pub fn raise_prompt(
        &self,
        decision_id: &str,
        request: PromptRequest,
    ) -> Result<DecisionPrompt, DecisionError> {
        let slot = self.shared.slot(decision_id)?;
        let mut events = Vec::with_capacity(2);
        let prompt = {
            let mut guard = lock(&slot);
            match &guard.decision.state {
                DecisionState::Open => {}
                DecisionState::AwaitingResponse => {
                    return Err(DecisionError::InvalidPrompt {
                        decision_id: decision_id.to_string(),
                        reason: "a prompt is already pending".to_string(),
                    })
                }
                state => return Err(DecisionError::closed(decision_id, state)),
            }
            if guard.decision.mode == DecisionMode::Replay {
                return Err(DecisionError::InvalidPrompt {
                    decision_id: decision_id.to_string(),
                    reason: "decision is in replay mode".to_string(),
                });
            }
            if !self.should_prompt(request.severity) {
                return Err(DecisionError::InvalidPrompt {
                    decision_id: decision_id.to_string(),
                    reason: format!(
                        "severity {} is below the prompt threshold {}",
                        request.severity, self.shared.config.prompt_severity_threshold
                    ),
                });
            }
            prompt::validate(decision_id, &request, &guard.decision.allowed_actions)?;

            let secs = request
                .expires_in_sec
                .unwrap_or(self.shared.config.default_timebox_secs);
            let now = self.shared.clock.now();
            let max = self.shared.config.max_timebox_secs;
            let expires_at =
                expiry_after(now, secs, max).ok_or_else(|| DecisionError::InvalidPrompt {
                    decision_id: decision_id.to_string(),
                    reason: format!("expiry of {secs}s is outside 1..={max}s"),
                })?;
            let prompt = DecisionPrompt {
                decision_id: decision_id.to_string(),
                event_ref: request.event_ref,
                kind: request.kind,
                options: request.options,
                text: request.text,
                expires_in_sec: secs,
                issued_at: now,
                expires_at,
            };

            if guard.decision.mode == DecisionMode::Observe {
                let transition = modes::transition(
                    decision_id,
                    DecisionMode::Observe,
                    DecisionMode::Decision,
                    SYSTEM_ACTOR,
                    Some(format!("prompt raised for {}", prompt.event_ref)),
                    now,
                )?;
                guard.decision.mode = DecisionMode::Decision;
                self.shared.record_transition(transition.clone());
                events.push(DecisionEvent::ModeChanged(transition));
            }

            let d = &mut guard.decision;
            d.timebox_seconds = secs;
            d.timebox_expires_at = prompt.expires_at;
            d.prompt = Some(prompt.clone());
            d.state = DecisionState::AwaitingResponse;

            let generation = self.shared.generations.fetch_add(1, Ordering::Relaxed) + 1;
            let weak: Weak<Shared> = Arc::downgrade(&self.shared);
            let id = decision_id.to_string();
            let countdown = Countdown::arm(generation, secs, move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_countdown(&id, generation);
                }
            });
            if !countdown.is_scheduled() {
                debug!(decision_id, "no async runtime; expiry checked on access");
            }
            guard.countdown = Some(countdown);
            prompt
        };

        info!(decision_id, expires_in_sec = prompt.expires_in_sec, "prompt raised");
        events.push(DecisionEvent::PromptRaised(prompt.clone()));
        self.shared.emit(&events);
        Ok(prompt)
    }

    /// Apply an operator response to the pending prompt.
    ///
    /// A response arriving at or after expiry triggers the automatic deferral and
    /// fails with `DecisionClosed`. An unknown option leaves the prompt pending.
    #[instrument(skip(self, response), fields(decision_id = %response.decision_id, option = %response.selected_option))]
    pub fn submit(&self, response: DecisionResponse) -> Result<Decision, DecisionError> {
        let decision_id = response.decision_id.as_str();
        let slot = self.shared.slot(decision_id)?;
        let outcome = {
            let mut guard = lock(&slot);
            match &guard.decision.state {
                DecisionState::AwaitingResponse => {}
                DecisionState::Open => {
                    return Err(DecisionError::NoPendingPrompt {
                        decision_id: decision_id.to_string(),
                    })
                }
                state => return Err(DecisionError::closed(decision_id, state)),
            }

            if let Some(expired) = self.shared.expire_if_due(&mut guard) {
                Err(expired)
            } else {
                let option = guard
                    .decision
                    .prompt
                    .as_ref()
                    .and_then(|p| p.option(&response.selected_option))
                    .cloned()
                    .ok_or_else(|| DecisionError::UnknownOption {
                        decision_id: decision_id.to_string(),
                        option: response.selected_option.clone(),
                    })?;

                if let Some(mut countdown) = guard.countdown.take() {
                    countdown.cancel();
                }
                let now = self.shared.clock.now();
                let d = &mut guard.decision;
                d.state = DecisionState::Resolved {
                    outcome: option.action,
                };
                d.action_taken = Some(option.action);
                d.action_details = Some(response.details.clone().unwrap_or(option.label));
                d.action_taken_at = Some(now);
                d.operator_id = Some(response.operator_id.clone());
                Ok(d.clone())
            }
        };

        match outcome {
            Ok(decision) => {
                info!(decision_id, operator_id = %response.operator_id, state = %decision.state, "decision resolved");
                self.shared.emit(&[DecisionEvent::Resolved {
                    decision: decision.clone(),
                    timed_out: false,
                }]);
                Ok(decision)
            }
            Err(expired) => {
                warn!(decision_id, operator_id = %response.operator_id, "response arrived after timebox expiry");
                let state = expired.state.clone();
                self.shared.emit(&[DecisionEvent::Resolved {
                    decision: expired,
                    timed_out: true,
                }]);
                Err(DecisionError::closed(decision_id, state))
            }
        }
    }

    /// `resolved → closed` once the decision's artifact is sealed.
    #[instrument(skip(self))]
    pub fn close(&self, decision_id: &str, artifact_id: &str) -> Result<Decision, DecisionError> {
        let slot = self.shared.slot(decision_id)?;
        let mut events = Vec::with_capacity(2);
        let closed = {
            let mut guard = lock(&slot);
            if let Some(expired) = self.shared.expire_if_due(&mut guard) {
                events.push(DecisionEvent::Resolved {
                    decision: expired,
                    timed_out: true,
                });
            }
            let outcome = match &guard.decision.state {
                DecisionState::Resolved { outcome } => *outcome,
                DecisionState::Closed { .. } => {
                    return Err(DecisionError::closed(decision_id, &guard.decision.state))
                }
                state => {
                    return Err(DecisionError::NotResolved {
                        decision_id: decision_id.to_string(),
                        state: state.to_string(),
                    })
                }
            };
            guard.decision.state = DecisionState::Closed {
                outcome,
                artifact_id: artifact_id.to_string(),
            };
            guard.decision.clone()
        };
        info!(decision_id, artifact_id, "decision closed");
        events.push(DecisionEvent::Closed(closed.clone()));
        self.shared.emit(&events);
        Ok(closed)
    }

    /// Change a decision's mode. Closed decisions reject mode changes.
    #[instrument(skip(self, reason))]
    pub fn transition_mode(
        &self,
        decision_id: &str,
        to: DecisionMode,
        triggered_by: &str,
        reason: Option<String>,
    ) -> Result<DecisionTransition, DecisionError> {
        let slot = self.shared.slot(decision_id)?;
        let transition = {
            let mut guard = lock(&slot);
            if !guard.decision.is_live() {
                return Err(DecisionError::closed(decision_id, &guard.decision.state));
            }
            let transition = modes::transition(
                decision_id,
                guard.decision.mode,
                to,
                triggered_by,
                reason,
                self.shared.clock.now(),
            )?;
            guard.decision.mode = to;
            self.shared.record_transition(transition.clone());
            transition
        };
        info!(decision_id, from = %transition.from_mode, to = %transition.to_mode, "mode changed");
        self.shared
            .emit(&[DecisionEvent::ModeChanged(transition.clone())]);
        Ok(transition)
    }

    /// Apply every overdue timeout. Returns the decisions deferred by this call.
    pub fn sweep_expired(&self) -> Vec<Decision> {
        let slots: Vec<Arc<Mutex<Slot>>> = self
            .shared
            .decisions
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        let mut expired = Vec::new();
        for slot in slots {
            let mut guard = lock(&slot);
            if let Some(d) = self.shared.expire_if_due(&mut guard) {
                expired.push(d);
            }
        }
        let events: Vec<DecisionEvent> = expired
            .iter()
            .map(|d| DecisionEvent::Resolved {
                decision: d.clone(),
                timed_out: true,
            })
            .collect();
        self.shared.emit(&events);
        expired
    }

    /// Current state, with any overdue timeout applied first.
    pub fn get(&self, decision_id: &str) -> Option<Decision> {
        let slot = self.shared.slot(decision_id).ok()?;
        let (decision, expired) = {
            let mut guard = lock(&slot);
            let expired = self.shared.expire_if_due(&mut guard);
            (guard.decision.clone(), expired)
        };
        if let Some(d) = expired {
            self.shared.emit(&[DecisionEvent::Resolved {
                decision: d,
                timed_out: true,
            }]);
        }
        Some(decision)
    }

    pub fn pending_prompt(&self, decision_id: &str) -> Option<DecisionPrompt> {
        self.get(decision_id)
            .and_then(|d| d.pending_prompt().cloned())
    }

    /// The lineage's most recent decision, if it is still live.
    pub fn live_for(&self, lineage_id: &str) -> Option<Decision> {
        let id = self.shared.lineages.get(lineage_id)?.value().clone();
        self.get(&id).filter(Decision::is_live)
    }

    /// All decisions, oldest first.
    pub fn list(&self) -> Vec<Decision> {
        let ids: Vec<String> = self
            .shared
            .decisions
            .iter()
            .map(|e| e.key().clone())
            .collect();
        let mut out: Vec<Decision> = ids.iter().filter_map(|id| self.get(id)).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        out
    }

    /// Mode transitions in the order they were recorded, optionally for one decision.
    pub fn transitions(&self, decision_id: Option<&str>) -> Vec<DecisionTransition> {
        self.shared
            .transitions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|t| decision_id.map_or(true, |id| t.decision_id == id))
            .cloned()
            .collect()
    }

    /// Whether a countdown task is currently scheduled for the decision.
    pub fn has_countdown(&self, decision_id: &str) -> bool {
        self.shared
            .slot(decision_id)
            .map(|slot| {
                lock(&slot)
                    .countdown
                    .as_ref()
                    .is_some_and(Countdown::is_scheduled)
            })
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.shared.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.decisions.is_empty()
    }
}

impl Default for DecisionMachine {
    fn default() -> Self {
        Self::new(DecisionConfig::default(), system_clock())
    }
}

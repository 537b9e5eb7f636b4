//! Record every degradation event: component, failure, fallback, timestamp, recovery status.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sator_core::clock::{system_clock, Clock};
use sator_core::models::DegradationEvent;

use crate::tracing_setup::events;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Active,
    Recovered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDegradation {
    pub event: DegradationEvent,
    pub recovery_status: RecoveryStatus,
    pub recovered_at: Option<DateTime<Utc>>,
}

/// Shared, thread-safe degradation log. Anchoring tasks record into it from
/// the runtime while readers poll it.
#[derive(Debug)]
pub struct DegradationTracker {
    clock: Arc<dyn Clock>,
    events: Mutex<Vec<TrackedDegradation>>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, event: DegradationEvent) {
        events::degradation_triggered(&event.component, &event.failure, &event.fallback_used);
        self.lock().push(TrackedDegradation {
            event,
            recovery_status: RecoveryStatus::Active,
            recovered_at: None,
        });
    }

    /// Record a degradation stamped with the tracker's clock.
    pub fn record_failure(&self, component: &str, failure: &str, fallback: &str) {
        self.record(DegradationEvent {
            component: component.to_string(),
            failure: failure.to_string(),
            fallback_used: fallback.to_string(),
            timestamp: self.clock.now(),
        });
    }

    /// Mark every active degradation of `component` recovered.
    pub fn mark_recovered(&self, component: &str) {
        let now = self.clock.now();
        let mut recovered = 0usize;
        for tracked in self.lock().iter_mut() {
            if tracked.event.component == component
                && tracked.recovery_status == RecoveryStatus::Active
            {
                tracked.recovery_status = RecoveryStatus::Recovered;
                tracked.recovered_at = Some(now);
                recovered += 1;
            }
        }
        if recovered > 0 {
            tracing::info!(component, recovered, "component recovered");
        }
    }

    pub fn events(&self) -> Vec<TrackedDegradation> {
        self.lock().clone()
    }

    pub fn active_degradations(&self) -> Vec<TrackedDegradation> {
        self.lock()
            .iter()
            .filter(|t| t.recovery_status == RecoveryStatus::Active)
            .cloned()
            .collect()
    }

    pub fn is_degraded(&self, component: &str) -> bool {
        self.lock().iter().any(|t| {
            t.event.component == component && t.recovery_status == RecoveryStatus::Active
        })
    }

    /// Events for `component` in the last `window_secs`.
    pub fn count_recent(&self, component: &str, window_secs: i64) -> usize {
        let cutoff = self.clock.now() - Duration::seconds(window_secs);
        self.lock()
            .iter()
            .filter(|t| t.event.component == component && t.event.timestamp > cutoff)
            .count()
    }

    /// How long `component` has been continuously degraded.
    pub fn degraded_duration(&self, component: &str) -> Option<Duration> {
        let earliest = self
            .lock()
            .iter()
            .filter(|t| {
                t.event.component == component && t.recovery_status == RecoveryStatus::Active
            })
            .map(|t| t.event.timestamp)
            .min()?;
        Some(self.clock.now() - earliest)
    }

    /// Components seen so far, in first-seen order.
    pub fn components(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for tracked in self.lock().iter() {
            if !seen.contains(&tracked.event.component) {
                seen.push(tracked.event.component.clone());
            }
        }
        seen
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TrackedDegradation>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DegradationTracker {
    fn default() -> Self {
        Self::new()
    }
}

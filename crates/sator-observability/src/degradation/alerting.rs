//! Alert thresholds: more than 3 degradations of one component in an hour is a
//! warning; a component degraded for over 24 hours is critical.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::tracker::DegradationTracker;

const WARNING_EVENTS_PER_HOUR: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationAlert {
    pub level: AlertLevel,
    pub component: String,
    pub message: String,
}

pub fn evaluate_alerts(tracker: &DegradationTracker) -> Vec<DegradationAlert> {
    let mut alerts = Vec::new();
    for component in tracker.components() {
        if let Some(duration) = tracker.degraded_duration(&component) {
            if duration > Duration::hours(24) {
                alerts.push(DegradationAlert {
                    level: AlertLevel::Critical,
                    message: format!("{component} has been degraded for over 24 hours"),
                    component,
                });
                continue;
            }
        }

        let recent = tracker.count_recent(&component, 3600);
        if recent > WARNING_EVENTS_PER_HOUR {
            alerts.push(DegradationAlert {
                level: AlertLevel::Warning,
                message: format!("{component} has {recent} degradation events in the last hour"),
                component,
            });
        }
    }
    alerts
}

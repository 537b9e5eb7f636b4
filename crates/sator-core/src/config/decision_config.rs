use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::MAX_ALLOWED_ACTIONS;

/// Decision state machine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub default_timebox_secs: u64,
    /// Upper bound on any decision timebox or prompt expiry.
    pub max_timebox_secs: u64,
    /// Events at or above this severity raise a prompt.
    pub prompt_severity_threshold: f64,
    pub max_allowed_actions: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            default_timebox_secs: defaults::DEFAULT_TIMEBOX_SECS,
            max_timebox_secs: defaults::DEFAULT_MAX_TIMEBOX_SECS,
            prompt_severity_threshold: defaults::DEFAULT_PROMPT_SEVERITY_THRESHOLD,
            max_allowed_actions: MAX_ALLOWED_ACTIONS,
        }
    }
}

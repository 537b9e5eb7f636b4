use serde::{Deserialize, Serialize};

use super::defaults;

/// Contradiction detection configuration. Thresholds are relative divergences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContradictionConfig {
    pub low_threshold: f64,
    pub medium_threshold: f64,
    pub high_threshold: f64,
    /// Max gap between two observations for them to be compared.
    pub pairing_window_secs: i64,
    /// Resolve low-band conflicts by weighted average as soon as they are detected.
    pub auto_resolve_low: bool,
}

impl Default for ContradictionConfig {
    fn default() -> Self {
        Self {
            low_threshold: defaults::DEFAULT_LOW_THRESHOLD,
            medium_threshold: defaults::DEFAULT_MEDIUM_THRESHOLD,
            high_threshold: defaults::DEFAULT_HIGH_THRESHOLD,
            pairing_window_secs: defaults::DEFAULT_PAIRING_WINDOW_SECS,
            auto_resolve_low: defaults::DEFAULT_AUTO_RESOLVE_LOW,
        }
    }
}

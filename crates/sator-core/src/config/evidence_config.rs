use serde::{Deserialize, Serialize};

use super::defaults;

/// Evidence store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// How far into the future `observed_at` may be before ingestion rejects it.
    pub max_clock_skew_secs: i64,
    /// Buffered ingestion events per broadcast subscriber.
    pub broadcast_capacity: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            max_clock_skew_secs: defaults::DEFAULT_MAX_CLOCK_SKEW_SECS,
            broadcast_capacity: defaults::DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Trust scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    pub corroboration_weight: f64,
    pub reliability_weight: f64,
    pub freshness_weight: f64,
    /// Constant deduction reserved for unmodeled uncertainty.
    pub unknown_residual: f64,
    /// Penalty per unit of unresolved conflict severity.
    pub penalty_per_severity: f64,
    pub max_penalty: f64,
    /// Relative deviation from the weighted group mean still counted as agreement.
    pub corroboration_tolerance: f64,
    /// Corroboration value when no quantity has two or more readings.
    pub uncorroborated_value: f64,
    pub freshness_half_life_secs: u64,
    pub freshness_floor: f64,
    /// Freshness below this marks a source stale.
    pub stale_threshold: f64,
    pub default_reliability: f64,
    pub high_trust_threshold: f64,
    pub medium_trust_threshold: f64,
    pub cache_capacity: u64,
    /// Overrides merged over the built-in registry. Keys are normalized source names.
    pub source_reliability: BTreeMap<String, f64>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            corroboration_weight: defaults::DEFAULT_CORROBORATION_WEIGHT,
            reliability_weight: defaults::DEFAULT_RELIABILITY_WEIGHT,
            freshness_weight: defaults::DEFAULT_FRESHNESS_WEIGHT,
            unknown_residual: defaults::DEFAULT_UNKNOWN_RESIDUAL,
            penalty_per_severity: defaults::DEFAULT_PENALTY_PER_SEVERITY,
            max_penalty: defaults::DEFAULT_MAX_PENALTY,
            corroboration_tolerance: defaults::DEFAULT_CORROBORATION_TOLERANCE,
            uncorroborated_value: defaults::DEFAULT_UNCORROBORATED_VALUE,
            freshness_half_life_secs: defaults::DEFAULT_FRESHNESS_HALF_LIFE_SECS,
            freshness_floor: defaults::DEFAULT_FRESHNESS_FLOOR,
            stale_threshold: defaults::DEFAULT_STALE_THRESHOLD,
            default_reliability: defaults::DEFAULT_RELIABILITY,
            high_trust_threshold: defaults::DEFAULT_HIGH_TRUST_THRESHOLD,
            medium_trust_threshold: defaults::DEFAULT_MEDIUM_TRUST_THRESHOLD,
            cache_capacity: defaults::DEFAULT_TRUST_CACHE_CAPACITY,
            source_reliability: BTreeMap::new(),
        }
    }
}

//! Source reliability registry.

use std::collections::BTreeMap;

use crate::config::defaults::DEFAULT_SOURCE_RELIABILITY;
use crate::config::TrustConfig;
use crate::models::evidence::normalize_source;
use crate::models::TrustLevel;
use crate::score::Score;

/// Reliability weight per normalized source name.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegistry {
    weights: BTreeMap<String, f64>,
    default_reliability: f64,
    high_threshold: f64,
    medium_threshold: f64,
}

impl SourceRegistry {
    /// Built-in sources overlaid with `[trust.source_reliability]`.
    pub fn from_config(config: &TrustConfig) -> Self {
        let mut weights: BTreeMap<String, f64> = DEFAULT_SOURCE_RELIABILITY
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect();
        for (name, w) in &config.source_reliability {
            weights.insert(normalize_source(name), w.clamp(0.0, 1.0));
        }
        Self {
            weights,
            default_reliability: config.default_reliability,
            high_threshold: config.high_trust_threshold,
            medium_threshold: config.medium_trust_threshold,
        }
    }

    pub fn with_source(mut self, source: &str, reliability: f64) -> Self {
        self.weights
            .insert(normalize_source(source), reliability.clamp(0.0, 1.0));
        self
    }

    /// Registry weight, or the default for unknown sources.
    pub fn reliability(&self, source: &str) -> f64 {
        self.weights
            .get(&normalize_source(source))
            .copied()
            .unwrap_or(self.default_reliability)
    }

    pub fn is_known(&self, source: &str) -> bool {
        self.weights.contains_key(&normalize_source(source))
    }

    pub fn level_for(&self, score: Score) -> TrustLevel {
        score.level_with(self.high_threshold, self.medium_threshold)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::from_config(&TrustConfig::default())
    }
}

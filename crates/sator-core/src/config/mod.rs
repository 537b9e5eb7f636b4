//! Configuration for every subsystem, loaded from TOML.

pub mod anchor_config;
pub mod contradiction_config;
pub mod decision_config;
pub mod defaults;
pub mod evidence_config;
pub mod observability_config;
pub mod trust_config;

pub use anchor_config::AnchorConfig;
pub use contradiction_config::ContradictionConfig;
pub use decision_config::DecisionConfig;
pub use evidence_config::EvidenceConfig;
pub use observability_config::ObservabilityConfig;
pub use trust_config::TrustConfig;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ALLOWED_ACTIONS, MAX_TIMEBOX_SECS};
use crate::errors::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatorConfig {
    pub evidence: EvidenceConfig,
    pub trust: TrustConfig,
    pub contradiction: ContradictionConfig,
    pub decision: DecisionConfig,
    pub anchor: AnchorConfig,
    pub observability: ObservabilityConfig,
}

impl SatorConfig {
    /// Parse from TOML; missing sections and keys take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break score bounds or the action cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.trust;
        for (key, weight) in [
            ("trust.corroboration_weight", t.corroboration_weight),
            ("trust.reliability_weight", t.reliability_weight),
            ("trust.freshness_weight", t.freshness_weight),
            ("trust.unknown_residual", t.unknown_residual),
            ("trust.penalty_per_severity", t.penalty_per_severity),
            ("trust.max_penalty", t.max_penalty),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(key, "must be a finite, non-negative number"));
            }
        }
        if t.freshness_half_life_secs == 0 {
            return Err(invalid("trust.freshness_half_life_secs", "must be positive"));
        }
        for (key, value) in [
            ("trust.freshness_floor", t.freshness_floor),
            ("trust.default_reliability", t.default_reliability),
            ("trust.uncorroborated_value", t.uncorroborated_value),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(key, "must be within [0, 1]"));
            }
        }
        for (source, value) in &t.source_reliability {
            if !(0.0..=1.0).contains(value) {
                return Err(invalid(
                    &format!("trust.source_reliability.{source}"),
                    "must be within [0, 1]",
                ));
            }
        }
        if t.medium_trust_threshold > t.high_trust_threshold {
            return Err(invalid(
                "trust.medium_trust_threshold",
                "must not exceed trust.high_trust_threshold",
            ));
        }

        let c = &self.contradiction;
        if !(c.low_threshold > 0.0
            && c.low_threshold < c.medium_threshold
            && c.medium_threshold < c.high_threshold)
        {
            return Err(invalid(
                "contradiction",
                "thresholds must satisfy 0 < low < medium < high",
            ));
        }

        let d = &self.decision;
        if d.max_allowed_actions == 0 || d.max_allowed_actions > MAX_ALLOWED_ACTIONS {
            return Err(invalid(
                "decision.max_allowed_actions",
                &format!("must be within 1..={MAX_ALLOWED_ACTIONS}"),
            ));
        }
        if d.default_timebox_secs == 0 {
            return Err(invalid("decision.default_timebox_secs", "must be positive"));
        }
        // Keeps every expiry representable as a chrono timestamp offset.
        if d.max_timebox_secs == 0 || d.max_timebox_secs > MAX_TIMEBOX_SECS {
            return Err(invalid(
                "decision.max_timebox_secs",
                &format!("must be within 1..={MAX_TIMEBOX_SECS}"),
            ));
        }
        if d.default_timebox_secs > d.max_timebox_secs {
            return Err(invalid(
                "decision.default_timebox_secs",
                "must not exceed decision.max_timebox_secs",
            ));
        }
        Ok(())
    }

    /// Serializable snapshot embedded in legal posture packets.
    pub fn snapshot(&self) -> Result<serde_json::Value, ConfigError> {
        serde_json::to_value(self).map_err(|e| ConfigError::Snapshot {
            message: e.to_string(),
        })
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

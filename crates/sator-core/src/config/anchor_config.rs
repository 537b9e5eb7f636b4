use serde::{Deserialize, Serialize};

use super::defaults;

/// Anchoring gateway configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub issuer: String,
    pub submit_timeout_ms: u64,
    /// Anchors wait in `pending_approval` until a supervisor approves them.
    pub require_approval: bool,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            issuer: defaults::DEFAULT_ANCHOR_ISSUER.to_string(),
            submit_timeout_ms: defaults::DEFAULT_ANCHOR_SUBMIT_TIMEOUT_MS,
            require_approval: defaults::DEFAULT_ANCHOR_REQUIRE_APPROVAL,
        }
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    NotAnchored,
    Pending,
    PendingApproval,
    Confirmed,
    Verified,
    /// Recomputed hash no longer matches the anchored one. Sticky.
    Tampered,
}

impl AnchorStatus {
    /// States in which a hash has been handed to the notary.
    pub fn is_anchored(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::PendingApproval | Self::Confirmed | Self::Verified
        )
    }
}

impl fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotAnchored => "not_anchored",
            Self::Pending => "pending",
            Self::PendingApproval => "pending_approval",
            Self::Confirmed => "confirmed",
            Self::Verified => "verified",
            Self::Tampered => "tampered",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRecord {
    pub artifact_id: String,
    pub artifact_hash: String,
    /// Trust score scaled to 0..=100.
    pub trust_score: u8,
    pub issuer: String,
    pub status: AnchorStatus,
    pub tx_ref: Option<String>,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
}

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AnchorError;

/// Payload handed to the external notary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSubmission {
    pub artifact_id: String,
    pub artifact_hash: String,
    pub trust_score: u8,
    pub issuer: String,
    pub requires_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    pub tx_ref: String,
    pub accepted_at: DateTime<Utc>,
}

/// Notary-side view of an anchor transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAnchorState {
    Pending,
    Confirmed,
    Failed,
}

/// External notarization client.
pub trait IAnchorClient: Send + Sync + 'static {
    fn submit(
        &self,
        submission: AnchorSubmission,
    ) -> impl Future<Output = Result<AnchorReceipt, AnchorError>> + Send;

    fn fetch_status(
        &self,
        tx_ref: &str,
    ) -> impl Future<Output = Result<RemoteAnchorState, AnchorError>> + Send;
}

//! In-process notary. Accepts submissions into memory and lets the host (or a
//! test) confirm, fail, delay or reject them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use sator_core::errors::AnchorError;
use sator_core::traits::{AnchorReceipt, AnchorSubmission, IAnchorClient, RemoteAnchorState};

#[derive(Debug, Clone, PartialEq)]
pub struct NotarizedEntry {
    pub submission: AnchorSubmission,
    pub state: RemoteAnchorState,
}

#[derive(Debug, Default)]
pub struct LocalNotary {
    entries: DashMap<String, NotarizedEntry>,
    /// Number of upcoming submissions to reject.
    failures_pending: AtomicU32,
    latency: Mutex<Option<Duration>>,
    auto_confirm: bool,
}

impl LocalNotary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions are reported confirmed as soon as they are accepted.
    pub fn auto_confirming() -> Self {
        Self {
            auto_confirm: true,
            ..Self::default()
        }
    }

    /// Reject the next `n` submissions.
    pub fn fail_next(&self, n: u32) {
        self.failures_pending.store(n, Ordering::SeqCst);
    }

    /// Delay every call by `latency` (tokio time).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    pub fn confirm(&self, tx_ref: &str) -> Result<(), AnchorError> {
        self.set_state(tx_ref, RemoteAnchorState::Confirmed)
    }

    pub fn fail(&self, tx_ref: &str) -> Result<(), AnchorError> {
        self.set_state(tx_ref, RemoteAnchorState::Failed)
    }

    /// Accepted transactions carrying `artifact_id`.
    pub fn transactions_for(&self, artifact_id: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.submission.artifact_id == artifact_id)
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn entry(&self, tx_ref: &str) -> Option<NotarizedEntry> {
        self.entries.get(tx_ref).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set_state(&self, tx_ref: &str, state: RemoteAnchorState) -> Result<(), AnchorError> {
        let mut entry = self
            .entries
            .get_mut(tx_ref)
            .ok_or_else(|| AnchorError::UnknownTransaction {
                tx_ref: tx_ref.to_string(),
            })?;
        entry.state = state;
        Ok(())
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_failure(&self) -> bool {
        self.failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl IAnchorClient for LocalNotary {
    async fn submit(&self, submission: AnchorSubmission) -> Result<AnchorReceipt, AnchorError> {
        self.wait().await;
        if self.take_failure() {
            return Err(AnchorError::SubmissionFailed {
                artifact_id: submission.artifact_id,
                reason: "notary rejected the submission".to_string(),
            });
        }
        let tx_ref = format!("tx-{}", Uuid::new_v4().simple());
        let state = if self.auto_confirm {
            RemoteAnchorState::Confirmed
        } else {
            RemoteAnchorState::Pending
        };
        self.entries
            .insert(tx_ref.clone(), NotarizedEntry { submission, state });
        Ok(AnchorReceipt {
            tx_ref,
            accepted_at: Utc::now(),
        })
    }

    async fn fetch_status(&self, tx_ref: &str) -> Result<RemoteAnchorState, AnchorError> {
        self.wait().await;
        self.entries
            .get(tx_ref)
            .map(|e| e.state)
            .ok_or_else(|| AnchorError::UnknownTransaction {
                tx_ref: tx_ref.to_string(),
            })
    }
}

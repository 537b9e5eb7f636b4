//! AnchorGateway: per-artifact anchor records driven through
//! `not_anchored → pending → pending_approval → confirmed → verified`,
//! with `tampered` reachable from any anchored state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::runtime::Handle;
use tracing::{debug, info, warn, Instrument};

use sator_artifact::recompute_hash;
use sator_core::clock::{system_clock, Clock};
use sator_core::config::AnchorConfig;
use sator_core::errors::AnchorError;
use sator_core::models::{AnchorRecord, AnchorStatus, Artifact};
use sator_core::traits::{AnchorSubmission, IAnchorClient, RemoteAnchorState};
use sator_core::Score;
use sator_observability::tracing_setup::events;
use sator_observability::DegradationTracker;

use crate::events::{AnchorEvent, AnchorListener};

/// Component name used for degradation records.
pub const COMPONENT: &str = "anchor";
const FALLBACK: &str = "record left pending for retry";

struct Inner<C> {
    client: C,
    config: AnchorConfig,
    clock: Arc<dyn Clock>,
    records: DashMap<String, AnchorRecord>,
    /// Artifacts with a submission currently awaiting the notary.
    in_flight: DashSet<String>,
    degradation: Arc<DegradationTracker>,
    listeners: RwLock<Vec<Arc<dyn AnchorListener>>>,
}

/// Cheap to clone; clones share records and client.
pub struct AnchorGateway<C: IAnchorClient> {
    inner: Arc<Inner<C>>,
}

impl<C: IAnchorClient> Clone for AnchorGateway<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: IAnchorClient> AnchorGateway<C> {
    pub fn new(client: C, config: AnchorConfig) -> Self {
        Self::with_parts(client, config, system_clock(), Arc::new(DegradationTracker::new()))
    }

    pub fn with_parts(
        client: C,
        config: AnchorConfig,
        clock: Arc<dyn Clock>,
        degradation: Arc<DegradationTracker>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                config,
                clock,
                records: DashMap::new(),
                in_flight: DashSet::new(),
                degradation,
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn register_listener(&self, listener: Arc<dyn AnchorListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    pub fn client(&self) -> &C {
        &self.inner.client
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.inner.config
    }

    pub fn degradation(&self) -> &Arc<DegradationTracker> {
        &self.inner.degradation
    }

    /// Register `artifact` for anchoring and schedule the notary call.
    ///
    /// Idempotent per artifact id: a second call returns the existing record
    /// and only reschedules a submission when the last attempt failed.
    /// Never blocks on the notary. Without a tokio runtime nothing is
    /// scheduled; call [`AnchorGateway::submit`] from async code instead.
    pub fn anchor(&self, artifact: &Artifact, trust: Score) -> AnchorRecord {
        let record = match self.inner.records.entry(artifact.id.clone()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let record = AnchorRecord {
                    artifact_id: artifact.id.clone(),
                    artifact_hash: artifact.hash.clone(),
                    trust_score: trust.as_percent(),
                    issuer: self.inner.config.issuer.clone(),
                    status: AnchorStatus::Pending,
                    tx_ref: None,
                    attempts: 0,
                    last_error: None,
                    submitted_at: None,
                    confirmed_at: None,
                    approved_by: None,
                };
                slot.insert(record.clone());
                info!(artifact_id = %artifact.id, trust = record.trust_score, "anchor registered");
                record
            }
        };

        if needs_submission(&record) {
            self.schedule(&record.artifact_id);
        }
        record
    }

    fn schedule(&self, artifact_id: &str) {
        let Ok(handle) = Handle::try_current() else {
            debug!(artifact_id, "no async runtime; anchor submission deferred");
            return;
        };
        let gateway = self.clone();
        let id = artifact_id.to_string();
        let span = sator_observability::anchor_span!(id);
        handle.spawn(
            async move {
                // Failures are already logged and recorded by `submit`.
                let _ = gateway.submit(&id).await;
            }
            .instrument(span),
        );
    }

    /// Perform one submission attempt now.
    ///
    /// Returns the current record without calling the notary when the artifact
    /// already has a transaction reference, is past `pending`, or another
    /// attempt is in flight. Failures leave the record `pending` with
    /// `attempts` and `last_error` updated, and are returned for the caller to
    /// retry.
    pub async fn submit(&self, artifact_id: &str) -> Result<AnchorRecord, AnchorError> {
        let record = self.record(artifact_id).ok_or_else(|| AnchorError::NotAnchored {
            artifact_id: artifact_id.to_string(),
        })?;
        if !needs_submission(&record) {
            return Ok(record);
        }
        let Some(_in_flight) = InFlight::claim(&self.inner.in_flight, artifact_id) else {
            return Ok(record);
        };

        let submission = self.update(artifact_id, |r| {
            r.attempts += 1;
            AnchorSubmission {
                artifact_id: r.artifact_id.clone(),
                artifact_hash: r.artifact_hash.clone(),
                trust_score: r.trust_score,
                issuer: r.issuer.clone(),
                requires_approval: self.inner.config.require_approval,
            }
        });
        let Some(submission) = submission else {
            return Err(AnchorError::NotAnchored {
                artifact_id: artifact_id.to_string(),
            });
        };

        let timeout_ms = self.inner.config.submit_timeout_ms;
        let outcome = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.inner.client.submit(submission),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AnchorError::Timeout {
                artifact_id: artifact_id.to_string(),
                timeout_ms,
            }),
        };

        match outcome {
            Ok(receipt) => {
                let next = if self.inner.config.require_approval {
                    AnchorStatus::PendingApproval
                } else {
                    AnchorStatus::Pending
                };
                let record = self
                    .update(artifact_id, |r| {
                        r.tx_ref = Some(receipt.tx_ref.clone());
                        r.submitted_at = Some(receipt.accepted_at);
                        r.last_error = None;
                        if r.status == AnchorStatus::Pending {
                            r.status = next;
                        }
                        r.clone()
                    })
                    .ok_or_else(|| AnchorError::NotAnchored {
                        artifact_id: artifact_id.to_string(),
                    })?;
                info!(
                    artifact_id,
                    tx_ref = %receipt.tx_ref,
                    status = %record.status,
                    attempts = record.attempts,
                    "anchor submitted"
                );
                self.inner.degradation.mark_recovered(COMPONENT);
                self.emit(&AnchorEvent::Submitted(record.clone()));
                Ok(record)
            }
            Err(err) => {
                let message = err.to_string();
                let record = self.update(artifact_id, |r| {
                    r.last_error = Some(message.clone());
                    r.clone()
                });
                warn!(artifact_id, error = %message, "anchor submission failed; left pending");
                self.inner
                    .degradation
                    .record_failure(COMPONENT, &message, FALLBACK);
                if let Some(record) = record {
                    self.emit(&AnchorEvent::SubmissionFailed {
                        record,
                        error: message,
                    });
                }
                Err(err)
            }
        }
    }

    /// Ask the notary about a submitted transaction and apply the answer.
    ///
    /// A remote confirmation moves `pending` to `confirmed`; approval-gated
    /// records still wait for [`AnchorGateway::approve`]. A remote failure
    /// drops the transaction reference so the next submission starts afresh.
    pub async fn poll(&self, artifact_id: &str) -> Result<AnchorStatus, AnchorError> {
        let record = self.record(artifact_id).ok_or_else(|| AnchorError::NotAnchored {
            artifact_id: artifact_id.to_string(),
        })?;
        let Some(tx_ref) = record.tx_ref.clone() else {
            return Ok(record.status);
        };
        if record.status != AnchorStatus::Pending {
            return Ok(record.status);
        }

        let remote = self.inner.client.fetch_status(&tx_ref).await?;
        let now = self.inner.clock.now();
        match remote {
            RemoteAnchorState::Pending => Ok(record.status),
            RemoteAnchorState::Confirmed => {
                Ok(self.transition(artifact_id, AnchorStatus::Pending, |r| {
                    r.status = AnchorStatus::Confirmed;
                    r.confirmed_at = Some(now);
                }))
            }
            RemoteAnchorState::Failed => {
                let message = format!("notary reported transaction {tx_ref} failed");
                self.update(artifact_id, |r| {
                    r.tx_ref = None;
                    r.last_error = Some(message.clone());
                });
                warn!(artifact_id, tx_ref = %tx_ref, "anchor transaction failed remotely");
                self.inner
                    .degradation
                    .record_failure(COMPONENT, &message, FALLBACK);
                Ok(AnchorStatus::Pending)
            }
        }
    }

    /// Supervisor approval of an approval-gated anchor.
    pub fn approve(&self, artifact_id: &str, approver: &str) -> Result<AnchorRecord, AnchorError> {
        let now = self.inner.clock.now();
        let (from, record) = {
            let mut entry = self
                .inner
                .records
                .get_mut(artifact_id)
                .ok_or_else(|| AnchorError::NotAnchored {
                    artifact_id: artifact_id.to_string(),
                })?;
            match entry.status {
                AnchorStatus::PendingApproval => {}
                AnchorStatus::Confirmed | AnchorStatus::Verified => {
                    return Err(AnchorError::AlreadyApproved {
                        artifact_id: artifact_id.to_string(),
                    })
                }
                other => {
                    return Err(AnchorError::InvalidState {
                        artifact_id: artifact_id.to_string(),
                        status: other.to_string(),
                        expected: AnchorStatus::PendingApproval.to_string(),
                    })
                }
            }
            let from = entry.status;
            entry.status = AnchorStatus::Confirmed;
            entry.approved_by = Some(approver.to_string());
            entry.confirmed_at = Some(now);
            (from, entry.value().clone())
        };
        info!(artifact_id, approver, "anchor approved");
        self.emit(&AnchorEvent::StatusChanged {
            from,
            record: record.clone(),
        });
        Ok(record)
    }

    /// Recompute the artifact's hash and compare it with the anchored one.
    ///
    /// A match moves `confirmed` to `verified`. A mismatch moves any anchored
    /// state to `tampered`, which is sticky.
    pub fn verify(&self, artifact: &Artifact) -> Result<AnchorRecord, AnchorError> {
        let record = self.record(&artifact.id).ok_or_else(|| AnchorError::NotAnchored {
            artifact_id: artifact.id.clone(),
        })?;
        if let Some(recomputed) = self.mismatch(&record, artifact) {
            if record.status != AnchorStatus::Tampered {
                self.transition(&artifact.id, record.status, |r| {
                    r.status = AnchorStatus::Tampered;
                });
            }
            events::tamper_detected(&artifact.id, &record.artifact_hash, &recomputed);
            return Err(AnchorError::TamperDetected {
                artifact_id: artifact.id.clone(),
                anchored: record.artifact_hash,
                recomputed,
            });
        }

        match record.status {
            AnchorStatus::Verified => Ok(record),
            AnchorStatus::Confirmed => {
                self.transition(&artifact.id, AnchorStatus::Confirmed, |r| {
                    r.status = AnchorStatus::Verified;
                });
                self.record(&artifact.id).ok_or_else(|| AnchorError::NotAnchored {
                    artifact_id: artifact.id.clone(),
                })
            }
            AnchorStatus::Tampered => Err(AnchorError::TamperDetected {
                artifact_id: artifact.id.clone(),
                anchored: record.artifact_hash,
                recomputed: artifact.hash.clone(),
            }),
            other => Err(AnchorError::InvalidState {
                artifact_id: artifact.id.clone(),
                status: other.to_string(),
                expected: AnchorStatus::Confirmed.to_string(),
            }),
        }
    }

    /// Read-only status with a fresh hash check. Reports `tampered` on a
    /// mismatch without recording it; [`AnchorGateway::verify`] makes it sticky.
    pub fn check_status(&self, artifact: &Artifact) -> AnchorStatus {
        match self.record(&artifact.id) {
            None => AnchorStatus::NotAnchored,
            Some(record) if record.status.is_anchored() => {
                if self.mismatch(&record, artifact).is_some() {
                    AnchorStatus::Tampered
                } else {
                    record.status
                }
            }
            Some(record) => record.status,
        }
    }

    /// Stored status without a hash check.
    pub fn status(&self, artifact_id: &str) -> AnchorStatus {
        self.record(artifact_id)
            .map_or(AnchorStatus::NotAnchored, |r| r.status)
    }

    pub fn record(&self, artifact_id: &str) -> Option<AnchorRecord> {
        self.inner.records.get(artifact_id).map(|r| r.value().clone())
    }

    pub fn records(&self) -> Vec<AnchorRecord> {
        let mut records: Vec<AnchorRecord> =
            self.inner.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.artifact_id.cmp(&b.artifact_id));
        records
    }

    /// Pending records without a transaction reference, i.e. due for retry.
    pub fn retry_queue(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .records
            .iter()
            .filter(|r| needs_submission(r.value()))
            .map(|r| r.key().clone())
            .collect();
        ids.sort();
        ids
    }

    fn mismatch(&self, record: &AnchorRecord, artifact: &Artifact) -> Option<String> {
        let recomputed = match recompute_hash(artifact) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(artifact_id = %artifact.id, error = %err, "artifact could not be rehashed");
                return Some(String::new());
            }
        };
        if recomputed != record.artifact_hash || artifact.hash != record.artifact_hash {
            Some(recomputed)
        } else {
            None
        }
    }

    fn update<T>(&self, artifact_id: &str, f: impl FnOnce(&mut AnchorRecord) -> T) -> Option<T> {
        let mut entry = self.inner.records.get_mut(artifact_id)?;
        Some(f(entry.value_mut()))
    }

    /// Apply `f` only if the record is still in `from`; emits on change.
    fn transition(
        &self,
        artifact_id: &str,
        from: AnchorStatus,
        f: impl FnOnce(&mut AnchorRecord),
    ) -> AnchorStatus {
        let changed = {
            let Some(mut entry) = self.inner.records.get_mut(artifact_id) else {
                return AnchorStatus::NotAnchored;
            };
            if entry.status != from {
                return entry.status;
            }
            f(entry.value_mut());
            entry.value().clone()
        };
        info!(
            artifact_id,
            from = %from,
            to = %changed.status,
            "anchor status changed"
        );
        let status = changed.status;
        self.emit(&AnchorEvent::StatusChanged {
            from,
            record: changed,
        });
        status
    }

    fn emit(&self, event: &AnchorEvent) {
        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in listeners {
            listener.on_anchor_event(event);
        }
    }
}

/// Marks an artifact's submission in flight until dropped, including when the
/// submitting task is aborted mid-call.
struct InFlight<'a> {
    set: &'a DashSet<String>,
    artifact_id: String,
}

impl<'a> InFlight<'a> {
    fn claim(set: &'a DashSet<String>, artifact_id: &str) -> Option<Self> {
        set.insert(artifact_id.to_string()).then(|| Self {
            set,
            artifact_id: artifact_id.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.artifact_id);
    }
}

fn needs_submission(record: &AnchorRecord) -> bool {
    record.status == AnchorStatus::Pending && record.tx_ref.is_none()
}

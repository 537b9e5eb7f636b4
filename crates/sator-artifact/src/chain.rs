//! ArtifactChain: sealed artifacts linked per lineage by `H(content || previous_hash)`.
//!
//! Each lineage has one head guarded by its own mutex. Reading the head, hashing
//! and appending happen under that lock, so two seals on one lineage can never
//! link to the same predecessor.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sator_core::clock::{system_clock, Clock};
use sator_core::constants::{GENESIS_PREVIOUS_HASH, LEGAL_POSTURE_LINEAGE};
use sator_core::errors::ChainError;
use sator_core::hashing;
use sator_core::models::{
    Artifact, ArtifactContent, ArtifactType, ConflictSnapshot, Decision, DecisionState,
    DecisionTransition, Evidence, EvidenceConflict, LegalPosturePacket, ReceiptContent,
    TrustBreakdown,
};

use crate::legal_posture;

/// Everything frozen into a trust receipt. The chain takes ownership, so the
/// sealed artifact never aliases live store records.
#[derive(Debug, Clone)]
pub struct SealRequest {
    pub decision: Decision,
    pub evidence: Vec<Evidence>,
    pub conflicts: Vec<EvidenceConflict>,
    pub trust: Option<TrustBreakdown>,
    pub transitions: Vec<DecisionTransition>,
}

impl SealRequest {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            evidence: Vec::new(),
            conflicts: Vec::new(),
            trust: None,
            transitions: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<EvidenceConflict>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn with_trust(mut self, trust: TrustBreakdown) -> Self {
        self.trust = Some(trust);
        self
    }

    pub fn with_transitions(mut self, transitions: Vec<DecisionTransition>) -> Self {
        self.transitions = transitions;
        self
    }
}

#[derive(Debug, Default)]
struct LineageHead {
    hash: Option<String>,
    artifact_ids: Vec<String>,
}

impl LineageHead {
    fn current(&self) -> &str {
        self.hash.as_deref().unwrap_or(GENESIS_PREVIOUS_HASH)
    }
}

/// Thread-safe store of sealed artifacts.
pub struct ArtifactChain {
    clock: Arc<dyn Clock>,
    artifacts: DashMap<String, Artifact>,
    lineages: DashMap<String, Arc<Mutex<LineageHead>>>,
    /// Decision id → receipt id. Packets are not indexed here.
    by_decision: DashMap<String, String>,
    /// Every artifact id in sealing order across lineages.
    sealed_order: Mutex<Vec<String>>,
}

impl ArtifactChain {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            artifacts: DashMap::new(),
            lineages: DashMap::new(),
            by_decision: DashMap::new(),
            sealed_order: Mutex::new(Vec::new()),
        }
    }

    /// Seal a resolved decision onto the current head of its lineage.
    pub fn seal(&self, request: SealRequest) -> Result<Artifact, ChainError> {
        self.seal_receipt(request, None)
    }

    /// Seal only if the lineage head still equals `expected_previous`
    /// (empty string for a lineage with no artifacts yet).
    ///
    /// A stale expectation fails with `ChainConflict`; the caller re-reads
    /// [`ArtifactChain::head`] and retries.
    pub fn seal_on(
        &self,
        request: SealRequest,
        expected_previous: &str,
    ) -> Result<Artifact, ChainError> {
        self.seal_receipt(request, Some(expected_previous))
    }

    /// Seal a compiled legal posture packet on the dedicated packet lineage.
    pub fn seal_packet(&self, packet: LegalPosturePacket) -> Result<Artifact, ChainError> {
        let decision_id = packet
            .decision_timeline
            .last()
            .map(|entry| entry.decision_id.clone())
            .ok_or(ChainError::EmptyPacket)?;
        self.append(
            LEGAL_POSTURE_LINEAGE,
            &decision_id,
            ArtifactType::LegalPosturePacket,
            ArtifactContent::LegalPosture(packet),
            None,
        )
    }

    /// Compile a packet over `decisions` from the receipts sealed so far and seal it.
    pub fn compile_legal_posture(
        &self,
        decisions: &[Decision],
        transitions: &[DecisionTransition],
        system_config: serde_json::Value,
    ) -> Result<Artifact, ChainError> {
        let receipts = self.sealed();
        let packet = legal_posture::compile(decisions, transitions, &receipts, system_config)?;
        self.seal_packet(packet)
    }

    fn seal_receipt(
        &self,
        request: SealRequest,
        expected_previous: Option<&str>,
    ) -> Result<Artifact, ChainError> {
        let SealRequest {
            decision,
            mut evidence,
            mut conflicts,
            trust,
            mut transitions,
        } = request;

        let outcome = match &decision.state {
            DecisionState::Resolved { outcome } => *outcome,
            other => {
                return Err(ChainError::DecisionNotResolved {
                    decision_id: decision.id.clone(),
                    state: other.to_string(),
                })
            }
        };

        evidence.sort_by(|a, b| a.observed_at.cmp(&b.observed_at).then_with(|| a.id.cmp(&b.id)));
        evidence.dedup_by(|a, b| a.id == b.id);
        conflicts.sort_by(|a, b| a.detected_at.cmp(&b.detected_at).then_with(|| a.id.cmp(&b.id)));
        conflicts.dedup_by(|a, b| a.id == b.id);
        transitions.retain(|t| t.decision_id == decision.id);
        transitions.sort_by_key(|t| t.timestamp);

        let lineage_id = decision.lineage_id.clone();
        let decision_id = decision.id.clone();
        let content = ArtifactContent::Receipt(ReceiptContent {
            conflicts: conflicts.iter().map(ConflictSnapshot::from).collect(),
            decision,
            evidence,
            trust,
            transitions,
            sealed_at: self.clock.now(),
        });

        self.append(
            &lineage_id,
            &decision_id,
            ArtifactType::for_outcome(outcome),
            content,
            expected_previous,
        )
    }

    fn append(
        &self,
        lineage_id: &str,
        decision_id: &str,
        artifact_type: ArtifactType,
        content: ArtifactContent,
        expected_previous: Option<&str>,
    ) -> Result<Artifact, ChainError> {
        let head = self.lineage(lineage_id);
        let mut head = head.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(expected) = expected_previous {
            if expected != head.current() {
                warn!(
                    lineage_id,
                    decision_id,
                    expected,
                    actual = head.current(),
                    "seal rejected on stale lineage head"
                );
                return Err(ChainError::ChainConflict {
                    lineage_id: lineage_id.to_string(),
                    expected: expected.to_string(),
                    actual: head.current().to_string(),
                });
            }
        }

        let is_receipt = artifact_type != ArtifactType::LegalPosturePacket;
        if is_receipt {
            if let Some(existing) = self.by_decision.get(decision_id) {
                return Err(ChainError::AlreadySealed {
                    decision_id: decision_id.to_string(),
                    artifact_id: existing.value().clone(),
                });
            }
        }

        let id = format!("artifact-{}", Uuid::new_v4());
        let previous_hash = head.hash.clone();
        let hash = hashing::hash_linked(&content, previous_hash.as_deref())
            .map_err(|e| ChainError::encoding(&id, &e))?;

        let artifact = Artifact {
            id: id.clone(),
            artifact_type,
            decision_id: decision_id.to_string(),
            lineage_id: lineage_id.to_string(),
            created_at: self.clock.now(),
            content,
            hash: hash.clone(),
            previous_hash,
            verified: false,
            verified_at: None,
        };

        self.artifacts.insert(id.clone(), artifact.clone());
        if is_receipt {
            self.by_decision.insert(decision_id.to_string(), id.clone());
        }
        head.hash = Some(hash);
        head.artifact_ids.push(id.clone());
        self.sealed_order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(id);

        info!(
            artifact_id = %artifact.id,
            decision_id,
            lineage_id,
            artifact_type = ?artifact.artifact_type,
            position = head.artifact_ids.len(),
            "artifact sealed"
        );
        Ok(artifact)
    }

    fn lineage(&self, lineage_id: &str) -> Arc<Mutex<LineageHead>> {
        self.lineages
            .entry(lineage_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Hash of the most recently sealed artifact in the lineage, or the empty
    /// genesis hash.
    pub fn head(&self, lineage_id: &str) -> String {
        match self.lineages.get(lineage_id) {
            Some(head) => head
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .current()
                .to_string(),
            None => GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    pub fn get(&self, artifact_id: &str) -> Option<Artifact> {
        self.artifacts.get(artifact_id).map(|a| a.value().clone())
    }

    /// The receipt sealed for a decision.
    pub fn by_decision(&self, decision_id: &str) -> Option<Artifact> {
        let id = self.by_decision.get(decision_id)?.value().clone();
        self.get(&id)
    }

    /// Artifacts of a lineage in chain order.
    pub fn list_lineage(&self, lineage_id: &str) -> Vec<Artifact> {
        let ids = match self.lineages.get(lineage_id) {
            Some(head) => head
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .artifact_ids
                .clone(),
            None => return Vec::new(),
        };
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Every artifact in sealing order.
    pub fn sealed(&self) -> Vec<Artifact> {
        let ids = self
            .sealed_order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Artifacts created at or before `at`, in sealing order.
    pub fn sealed_before(&self, at: DateTime<Utc>) -> Vec<Artifact> {
        self.sealed()
            .into_iter()
            .filter(|a| a.created_at <= at)
            .collect()
    }

    /// Recompute a stored artifact's hash and compare.
    pub fn verify(&self, artifact_id: &str) -> Result<Artifact, ChainError> {
        let artifact = self.get(artifact_id).ok_or_else(|| ChainError::NotFound {
            artifact_id: artifact_id.to_string(),
        })?;
        verify_artifact(&artifact)?;
        Ok(artifact)
    }

    /// Walk a lineage from genesis, checking every link and every hash.
    /// Returns the number of artifacts checked.
    pub fn verify_lineage(&self, lineage_id: &str) -> Result<usize, ChainError> {
        let artifacts = self.list_lineage(lineage_id);
        verify_sequence(&artifacts)?;
        debug!(lineage_id, checked = artifacts.len(), "lineage verified");
        Ok(artifacts.len())
    }

    /// Set `verified`/`verified_at` after a successful hash check. The only
    /// mutation an artifact ever sees.
    pub fn mark_verified(
        &self,
        artifact_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Artifact, ChainError> {
        let mut entry = self
            .artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| ChainError::NotFound {
                artifact_id: artifact_id.to_string(),
            })?;
        verify_artifact(&entry)?;
        if !entry.verified {
            entry.verified = true;
            entry.verified_at = Some(at);
            info!(artifact_id, "artifact verified");
        }
        Ok(entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Default for ArtifactChain {
    fn default() -> Self {
        Self::new()
    }
}

/// `H(canonical(content) || previous_hash)` for an artifact as it stands.
pub fn recompute_hash(artifact: &Artifact) -> Result<String, ChainError> {
    hashing::hash_linked(&artifact.content, artifact.previous_hash.as_deref())
        .map_err(|e| ChainError::encoding(&artifact.id, &e))
}

/// Fails with `TamperDetected` when the stored hash no longer matches the
/// content, or when a packet's own tamper-evident hash no longer matches it.
pub fn verify_artifact(artifact: &Artifact) -> Result<(), ChainError> {
    let recomputed = recompute_hash(artifact)?;
    if recomputed != artifact.hash {
        warn!(artifact_id = %artifact.id, "artifact hash mismatch");
        return Err(ChainError::TamperDetected {
            artifact_id: artifact.id.clone(),
            stored: artifact.hash.clone(),
            recomputed,
        });
    }
    if let ArtifactContent::LegalPosture(packet) = &artifact.content {
        legal_posture::verify_packet(packet)
            .map_err(|e| rebind_artifact(e, &artifact.id))?;
    }
    Ok(())
}

/// Check an ordered run of artifacts as one chain starting at genesis.
pub fn verify_sequence(artifacts: &[Artifact]) -> Result<(), ChainError> {
    let mut expected_previous: Option<&str> = None;
    for artifact in artifacts {
        if artifact.previous_hash.as_deref() != expected_previous {
            return Err(ChainError::BrokenLink {
                artifact_id: artifact.id.clone(),
                expected_previous: expected_previous.unwrap_or(GENESIS_PREVIOUS_HASH).to_string(),
                actual_previous: artifact
                    .previous_hash
                    .clone()
                    .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string()),
            });
        }
        verify_artifact(artifact)?;
        expected_previous = Some(artifact.hash.as_str());
    }
    Ok(())
}

fn rebind_artifact(err: ChainError, artifact_id: &str) -> ChainError {
    match err {
        ChainError::TamperDetected {
            stored, recomputed, ..
        } => ChainError::TamperDetected {
            artifact_id: artifact_id.to_string(),
            stored,
            recomputed,
        },
        ChainError::Encoding { reason, .. } => ChainError::Encoding {
            artifact_id: artifact_id.to_string(),
            reason,
        },
        other => other,
    }
}

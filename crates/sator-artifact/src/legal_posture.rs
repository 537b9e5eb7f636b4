//! Legal posture packets: one tamper-evident aggregate over many decisions.

use std::collections::BTreeSet;

use sator_core::errors::ChainError;
use sator_core::hashing;
use sator_core::models::{
    Artifact, ArtifactType, Decision, DecisionTimelineEntry, DecisionTransition,
    LegalPosturePacket,
};

/// Build a packet over `decisions`.
///
/// `receipts` must be in sealing order; only receipts of the given decisions
/// are referenced. The packet's `tamper_evident_hash` covers every other field
/// and is independent of the per-receipt chain hashes.
pub fn compile(
    decisions: &[Decision],
    transitions: &[DecisionTransition],
    receipts: &[Artifact],
    system_config: serde_json::Value,
) -> Result<LegalPosturePacket, ChainError> {
    if decisions.is_empty() {
        return Err(ChainError::EmptyPacket);
    }

    let mut timeline: Vec<DecisionTimelineEntry> =
        decisions.iter().map(DecisionTimelineEntry::from).collect();
    timeline.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.decision_id.cmp(&b.decision_id))
    });
    timeline.dedup_by(|a, b| a.decision_id == b.decision_id);

    let ids: BTreeSet<&str> = timeline.iter().map(|e| e.decision_id.as_str()).collect();

    let mut mode_transitions: Vec<DecisionTransition> = transitions
        .iter()
        .filter(|t| ids.contains(t.decision_id.as_str()))
        .cloned()
        .collect();
    mode_transitions.sort_by_key(|t| t.timestamp);

    let sealed: Vec<&Artifact> = receipts
        .iter()
        .filter(|a| a.artifact_type != ArtifactType::LegalPosturePacket)
        .filter(|a| ids.contains(a.decision_id.as_str()))
        .collect();

    let mut packet = LegalPosturePacket {
        decision_timeline: timeline,
        mode_transitions,
        evidence_chain: sealed.iter().map(|a| a.hash.clone()).collect(),
        receipts: sealed.iter().map(|a| a.id.clone()).collect(),
        system_config,
        tamper_evident_hash: String::new(),
    };
    packet.tamper_evident_hash = packet_digest(&packet)?;
    Ok(packet)
}

/// Digest of the packet with its own `tamper_evident_hash` blanked.
pub fn packet_digest(packet: &LegalPosturePacket) -> Result<String, ChainError> {
    let mut unsealed = packet.clone();
    unsealed.tamper_evident_hash.clear();
    hashing::content_hash(&unsealed).map_err(|e| ChainError::encoding("", &e))
}

pub fn verify_packet(packet: &LegalPosturePacket) -> Result<(), ChainError> {
    let recomputed = packet_digest(packet)?;
    if recomputed == packet.tamper_evident_hash {
        Ok(())
    } else {
        Err(ChainError::TamperDetected {
            artifact_id: String::new(),
            stored: packet.tamper_evident_hash.clone(),
            recomputed,
        })
    }
}

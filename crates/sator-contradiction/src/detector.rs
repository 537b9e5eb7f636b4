use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use sator_core::clock::{system_clock, Clock};
use sator_core::config::ContradictionConfig;
use sator_core::models::{Evidence, EvidenceConflict};
use sator_core::Score;

use crate::detection::{self, PairFinding};

/// Pure pairwise contradiction detection.
///
/// Detection does not record anything; callers decide whether a finding is new.
pub struct ContradictionDetector {
    config: ContradictionConfig,
    clock: Arc<dyn Clock>,
}

impl ContradictionDetector {
    pub fn new(config: ContradictionConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    pub fn with_clock(config: ContradictionConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &ContradictionConfig {
        &self.config
    }

    /// Every conflicting pair in `evidence`, at most one conflict per pair.
    ///
    /// Pairs are visited in (observed_at, seq, id) order so output order is stable.
    pub fn detect(&self, evidence: &[Evidence]) -> Vec<EvidenceConflict> {
        let ordered = ordered(evidence);
        let mut conflicts = Vec::new();
        for i in 0..ordered.len() {
            for j in (i + 1)..ordered.len() {
                if let Some(c) = self.check(ordered[i], ordered[j]) {
                    conflicts.push(c);
                }
            }
        }
        debug!(
            evidence = ordered.len(),
            conflicts = conflicts.len(),
            "contradiction scan complete"
        );
        conflicts
    }

    /// Conflicts between `incoming` and each of `existing`.
    pub fn detect_against(&self, incoming: &Evidence, existing: &[Evidence]) -> Vec<EvidenceConflict> {
        ordered(existing)
            .into_iter()
            .filter(|e| e.id != incoming.id)
            .filter_map(|e| self.check(e, incoming))
            .collect()
    }

    fn check(&self, a: &Evidence, b: &Evidence) -> Option<EvidenceConflict> {
        let finding = detection::detect_pair(a, b, &self.config)?;
        Some(self.build(a, b, finding))
    }

    fn build(&self, a: &Evidence, b: &Evidence, finding: PairFinding) -> EvidenceConflict {
        let mut evidence_ids = vec![a.id.clone(), b.id.clone()];
        evidence_ids.sort();
        EvidenceConflict {
            id: format!("conflict-{}", Uuid::new_v4()),
            evidence_ids,
            conflict_type: finding.conflict_type,
            quantity: finding.quantity,
            description: finding.description,
            severity: Score::new(finding.severity),
            band: finding.band,
            divergence: finding.divergence,
            detected_at: self.clock.now(),
            resolved: false,
            resolution: None,
        }
    }
}

impl Default for ContradictionDetector {
    fn default() -> Self {
        Self::new(ContradictionConfig::default())
    }
}

fn ordered(evidence: &[Evidence]) -> Vec<&Evidence> {
    let mut out: Vec<&Evidence> = evidence.iter().collect();
    out.sort_by(|a, b| {
        a.observed_at
            .cmp(&b.observed_at)
            .then(a.seq.cmp(&b.seq))
            .then(a.id.cmp(&b.id))
    });
    out.dedup_by(|a, b| a.id == b.id);
    out
}

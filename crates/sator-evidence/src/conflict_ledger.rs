//! ConflictLedger: conflicts are recorded once per evidence pair and only ever resolved.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use sator_core::errors::ConflictError;
use sator_core::models::{
    ConflictResolution, ConflictSnapshot, ConflictStatus, Evidence, EvidenceConflict, TrustLevel,
};

/// Filter for conflict listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictFilter {
    pub status: Option<ConflictStatus>,
    /// Only conflicts involving this evidence id.
    pub evidence_id: Option<String>,
    /// Only conflicts detected at or before this instant.
    pub detected_before: Option<DateTime<Utc>>,
}

impl ConflictFilter {
    pub fn open() -> Self {
        Self {
            status: Some(ConflictStatus::Open),
            ..Self::default()
        }
    }

    pub fn resolved() -> Self {
        Self {
            status: Some(ConflictStatus::Resolved),
            ..Self::default()
        }
    }

    fn matches(&self, conflict: &EvidenceConflict) -> bool {
        self.status.map_or(true, |s| conflict.status() == s)
            && self
                .evidence_id
                .as_deref()
                .map_or(true, |id| conflict.involves(id))
            && self
                .detected_before
                .map_or(true, |t| conflict.detected_at <= t)
    }
}

/// Thread-safe conflict record.
#[derive(Debug, Default)]
pub struct ConflictLedger {
    conflicts: DashMap<String, EvidenceConflict>,
    /// Sorted evidence-id key → conflict id, for duplicate suppression.
    by_evidence: DashMap<String, String>,
}

impl ConflictLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly detected conflict. Returns `false` if the same evidence set
    /// already has a conflict on record.
    pub fn record(&self, mut conflict: EvidenceConflict) -> bool {
        conflict.evidence_ids.sort();
        conflict.evidence_ids.dedup();
        let key = conflict.evidence_ids.join("|");
        match self.by_evidence.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(conflict.id.clone());
                info!(
                    conflict_id = %conflict.id,
                    band = %conflict.band,
                    severity = %conflict.severity,
                    "conflict recorded"
                );
                self.conflicts.insert(conflict.id.clone(), conflict);
                true
            }
        }
    }

    /// Whether a conflict already exists for exactly these evidence ids.
    pub fn contains_pair(&self, a: &str, b: &str) -> bool {
        let key = if a <= b {
            format!("{a}|{b}")
        } else {
            format!("{b}|{a}")
        };
        self.by_evidence.contains_key(&key)
    }

    /// Mark a conflict resolved. The only mutation the ledger permits.
    pub fn resolve(
        &self,
        conflict_id: &str,
        resolution: ConflictResolution,
    ) -> Result<EvidenceConflict, ConflictError> {
        let mut entry =
            self.conflicts
                .get_mut(conflict_id)
                .ok_or_else(|| ConflictError::NotFound {
                    conflict_id: conflict_id.to_string(),
                })?;
        if entry.resolved {
            return Err(ConflictError::AlreadyResolved {
                conflict_id: conflict_id.to_string(),
            });
        }
        if resolution.summary.trim().is_empty() {
            return Err(ConflictError::Unresolvable {
                conflict_id: conflict_id.to_string(),
                reason: "resolution summary must not be empty".to_string(),
            });
        }
        debug!(conflict_id, resolved_by = %resolution.resolved_by, "conflict resolved");
        entry.resolved = true;
        entry.resolution = Some(resolution);
        Ok(entry.clone())
    }

    pub fn get(&self, conflict_id: &str) -> Option<EvidenceConflict> {
        self.conflicts.get(conflict_id).map(|c| c.clone())
    }

    /// Conflicts matching `filter`, ordered by detection time then id.
    pub fn list(&self, filter: &ConflictFilter) -> Vec<EvidenceConflict> {
        let mut out: Vec<EvidenceConflict> = self
            .conflicts
            .iter()
            .filter(|c| filter.matches(c.value()))
            .map(|c| c.value().clone())
            .collect();
        out.sort_by(|a, b| a.detected_at.cmp(&b.detected_at).then(a.id.cmp(&b.id)));
        out
    }

    pub fn all(&self) -> Vec<EvidenceConflict> {
        self.list(&ConflictFilter::default())
    }

    pub fn unresolved(&self) -> Vec<EvidenceConflict> {
        self.list(&ConflictFilter::open())
    }

    /// Conflicts touching any of `evidence_ids`.
    pub fn touching<'a>(&self, evidence_ids: impl IntoIterator<Item = &'a String>) -> Vec<EvidenceConflict> {
        let ids: BTreeSet<&String> = evidence_ids.into_iter().collect();
        self.all()
            .into_iter()
            .filter(|c| c.evidence_ids.iter().any(|id| ids.contains(id)))
            .collect()
    }

    /// Unresolved conflicts touching any of `evidence_ids`.
    pub fn unresolved_touching<'a>(
        &self,
        evidence_ids: impl IntoIterator<Item = &'a String>,
    ) -> Vec<EvidenceConflict> {
        self.touching(evidence_ids)
            .into_iter()
            .filter(|c| !c.resolved)
            .collect()
    }

    /// Deep copies for sealing, each tagged open or resolved as of now.
    pub fn snapshot_touching<'a>(
        &self,
        evidence_ids: impl IntoIterator<Item = &'a String>,
    ) -> Vec<ConflictSnapshot> {
        self.touching(evidence_ids)
            .iter()
            .map(ConflictSnapshot::from)
            .collect()
    }

    /// Trust level as seen by readers: `conflicting` while an unresolved conflict involves it.
    pub fn effective_trust_level(&self, evidence: &Evidence) -> TrustLevel {
        let conflicting = self
            .conflicts
            .iter()
            .any(|c| !c.resolved && c.involves(&evidence.id));
        if conflicting {
            TrustLevel::Conflicting
        } else {
            evidence.trust_level
        }
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

//! Breakdown cache keyed by a blake3 fingerprint of the scoring inputs.
//!
//! Scoring is pure over its inputs and the key covers each input's full
//! canonical form, so a fingerprint hit is always valid.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;

use sator_core::hashing;
use sator_core::models::{Evidence, EvidenceConflict, TrustBreakdown};

pub struct ScoreCache {
    cache: Cache<String, TrustBreakdown>,
}

impl ScoreCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(Duration::from_secs(900))
            .build();
        Self { cache }
    }

    pub fn get(&self, key: &str) -> Option<TrustBreakdown> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: String, breakdown: TrustBreakdown) {
        self.cache.insert(key, breakdown);
    }

    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Order-independent fingerprint of a scoring request.
///
/// Every evidence record and conflict is hashed in its canonical form, so two
/// requests reusing ids with different readings, sources or conflict members
/// never share a key. `None` when a record cannot be serialized; the caller
/// scores without caching.
pub fn fingerprint(
    evidence: &[Evidence],
    conflicts: &[EvidenceConflict],
    as_of: DateTime<Utc>,
) -> Option<String> {
    let mut ev: Vec<&Evidence> = evidence.iter().collect();
    ev.sort_by(|a, b| a.id.cmp(&b.id).then(a.seq.cmp(&b.seq)));
    let mut cf: Vec<&EvidenceConflict> = conflicts.iter().collect();
    cf.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = blake3::Hasher::new();
    for e in ev {
        hasher.update(&hashing::canonical_bytes(e).ok()?);
        hasher.update(b"\x1e");
    }
    hasher.update(b"\x1d");
    for c in cf {
        hasher.update(&hashing::canonical_bytes(c).ok()?);
        hasher.update(b"\x1e");
    }
    hasher.update(b"\x1d");
    hasher.update(&as_of.timestamp_micros().to_le_bytes());
    Some(hasher.finalize().to_hex().to_string())
}

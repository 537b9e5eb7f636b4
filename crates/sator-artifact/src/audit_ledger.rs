//! AuditLedger: append-only, hash-chained log of engine events.
//!
//! Entry `n` hashes its own fields together with the hash of entry `n - 1`;
//! the first entry links to the empty genesis hash. The timeline read API is
//! a projection of this ledger.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use sator_core::clock::{system_clock, Clock};
use sator_core::constants::GENESIS_PREVIOUS_HASH;
use sator_core::errors::ChainError;
use sator_core::hashing;
use sator_core::models::{AuditEntry, AuditEventKind, TimeWindow, TimelineEntry};
use sator_core::Score;

const SUMMARY_KEY: &str = "summary";

/// An event to append.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub kind: AuditEventKind,
    pub subject_id: String,
    pub summary: String,
    pub fields: Map<String, Value>,
    pub trust_score: Option<Score>,
    pub contradiction: bool,
}

impl AuditRecord {
    pub fn new(
        kind: AuditEventKind,
        subject_id: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            summary: summary.into(),
            fields: Map::new(),
            trust_score: None,
            contradiction: false,
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_trust(mut self, score: Score) -> Self {
        self.trust_score = Some(score);
        self
    }

    pub fn with_contradiction(mut self, contradiction: bool) -> Self {
        self.contradiction = contradiction;
        self
    }
}

/// Hashed view of an entry: every field except `hash`.
#[derive(Serialize)]
struct EntryBody<'a> {
    seq: u64,
    kind: AuditEventKind,
    subject_id: &'a str,
    detail: &'a Value,
    trust_score: Option<Score>,
    contradiction: bool,
    timestamp: DateTime<Utc>,
}

impl<'a> From<&'a AuditEntry> for EntryBody<'a> {
    fn from(entry: &'a AuditEntry) -> Self {
        Self {
            seq: entry.seq,
            kind: entry.kind,
            subject_id: &entry.subject_id,
            detail: &entry.detail,
            trust_score: entry.trust_score,
            contradiction: entry.contradiction,
            timestamp: entry.timestamp,
        }
    }
}

/// Recompute an entry's hash from its fields and `previous_hash`.
pub fn entry_hash(entry: &AuditEntry) -> Result<String, ChainError> {
    hashing::hash_linked(&EntryBody::from(entry), Some(entry.previous_hash.as_str()))
        .map_err(|e| ChainError::encoding(entry_ref(entry.seq), &e))
}

fn entry_ref(seq: u64) -> String {
    format!("audit#{seq}")
}

pub struct AuditLedger {
    clock: Arc<dyn Clock>,
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append an event, linking it to the current head.
    pub fn append(&self, record: AuditRecord) -> Result<AuditEntry, ChainError> {
        let AuditRecord {
            kind,
            subject_id,
            summary,
            mut fields,
            trust_score,
            contradiction,
        } = record;
        fields.insert(SUMMARY_KEY.to_string(), Value::String(summary));

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let previous_hash = entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

        let mut entry = AuditEntry {
            seq: entries.len() as u64,
            kind,
            subject_id,
            detail: Value::Object(fields),
            trust_score,
            contradiction,
            timestamp: self.clock.now(),
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry_hash(&entry)?;
        trace!(seq = entry.seq, kind = ?entry.kind, subject_id = %entry.subject_id, "audit entry appended");
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Walk the ledger from genesis. Returns the number of entries checked.
    pub fn verify(&self) -> Result<usize, ChainError> {
        let entries = self.entries();
        verify_entries(&entries)?;
        Ok(entries.len())
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn entries_in(&self, window: &TimeWindow) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| window.contains(e.timestamp))
            .cloned()
            .collect()
    }

    pub fn for_subject(&self, subject_id: &str) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// Timeline rows for entries inside `window`, in ledger order.
    pub fn timeline(&self, window: &TimeWindow) -> Vec<TimelineEntry> {
        self.entries_in(window).iter().map(to_timeline).collect()
    }

    pub fn head_hash(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Check links and hashes of a ledger export.
pub fn verify_entries(entries: &[AuditEntry]) -> Result<(), ChainError> {
    let mut expected_previous: &str = GENESIS_PREVIOUS_HASH;
    for entry in entries {
        if entry.previous_hash != expected_previous {
            return Err(ChainError::BrokenLink {
                artifact_id: entry_ref(entry.seq),
                expected_previous: expected_previous.to_string(),
                actual_previous: entry.previous_hash.clone(),
            });
        }
        let recomputed = entry_hash(entry)?;
        if recomputed != entry.hash {
            warn!(seq = entry.seq, "audit entry hash mismatch");
            return Err(ChainError::TamperDetected {
                artifact_id: entry_ref(entry.seq),
                stored: entry.hash.clone(),
                recomputed,
            });
        }
        expected_previous = entry.hash.as_str();
    }
    Ok(())
}

fn to_timeline(entry: &AuditEntry) -> TimelineEntry {
    let summary = entry
        .detail
        .get(SUMMARY_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", entry.kind));
    TimelineEntry {
        at: entry.timestamp,
        kind: entry.kind,
        subject_id: entry.subject_id.clone(),
        summary,
        trust_score: entry.trust_score,
        contradiction: entry.contradiction,
    }
}

//! EvidenceStore: write-once records in a `DashMap`, one mutex for sequencing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use sator_core::clock::{system_clock, Clock};
use sator_core::config::EvidenceConfig;
use sator_core::errors::EvidenceError;
use sator_core::models::evidence::normalize_source;
use sator_core::models::{Evidence, EvidenceSnapshot, IngestionEvent, NewEvidence, TimeWindow};
use sator_core::traits::IngestionListener;
use sator_core::{Score, SourceRegistry};

use crate::validation;

#[derive(Debug)]
struct Sequencer {
    next_seq: u64,
    last_ingested_at: Option<DateTime<Utc>>,
}

/// Append-only evidence store.
pub struct EvidenceStore {
    records: DashMap<String, Evidence>,
    sequencer: Mutex<Sequencer>,
    /// Highest sequence number whose record is visible. Every lower one is visible too.
    watermark: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn IngestionListener>>>,
    events: broadcast::Sender<IngestionEvent>,
    registry: SourceRegistry,
    config: EvidenceConfig,
    clock: Arc<dyn Clock>,
}

impl EvidenceStore {
    pub fn new(config: EvidenceConfig, registry: SourceRegistry, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Self {
            records: DashMap::new(),
            sequencer: Mutex::new(Sequencer {
                next_seq: 1,
                last_ingested_at: None,
            }),
            watermark: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
            events,
            registry,
            config,
            clock,
        }
    }

    /// Register a push-model consumer of ingestion events.
    pub fn register_listener(&self, listener: Arc<dyn IngestionListener>) {
        let mut guard = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        guard.push(listener);
    }

    /// Subscribe to ingestion events from async code.
    pub fn subscribe(&self) -> broadcast::Receiver<IngestionEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Validate and append a record. Returns the assigned id.
    #[instrument(skip(self, new), fields(source = %new.source))]
    pub fn ingest(&self, new: NewEvidence) -> Result<String, EvidenceError> {
        let now = self.clock.now();
        validation::validate(&new, now, self.config.max_clock_skew_secs).map_err(|e| {
            warn!(error = %e, "evidence rejected");
            e
        })?;

        let id = new
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let (trust_score, trust_reason) = match new.trust_score {
            Some(explicit) => (Score::new(explicit), new.trust_reason.clone()),
            None => {
                let reliability = self.registry.reliability(&new.source);
                let reason = new.trust_reason.clone().or_else(|| {
                    Some(format!(
                        "source reliability {:.2} ({})",
                        reliability,
                        normalize_source(&new.source)
                    ))
                });
                (Score::new(reliability), reason)
            }
        };
        let trust_level = self.registry.level_for(trust_score);

        let evidence = {
            let mut seq = self.sequencer.lock().unwrap_or_else(|e| e.into_inner());
            if self.records.contains_key(&id) {
                return Err(EvidenceError::DuplicateEvidence { evidence_id: id });
            }
            let ingested_at = match seq.last_ingested_at {
                Some(last) if now <= last => last + Duration::microseconds(1),
                _ => now,
            };
            let evidence = Evidence {
                id: id.clone(),
                evidence_type: new.evidence_type,
                source: new.source,
                value: new.value,
                observed_at: new.observed_at,
                ingested_at,
                seq: seq.next_seq,
                trust_level,
                trust_score,
                trust_reason,
                tags: new.tags,
            };
            self.records.insert(id.clone(), evidence.clone());
            self.watermark.store(seq.next_seq, Ordering::Release);
            seq.next_seq += 1;
            seq.last_ingested_at = Some(ingested_at);
            evidence
        };

        let event = IngestionEvent {
            evidence_id: evidence.id.clone(),
            seq: evidence.seq,
            source: evidence.source.clone(),
            quantity: evidence.reading().map(|r| r.quantity),
            observed_at: evidence.observed_at,
            ingested_at: evidence.ingested_at,
        };
        // No subscribers is not an error.
        let _ = self.events.send(event.clone());
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in &listeners {
            listener.on_ingested(&event, &evidence);
        }

        debug!(
            evidence_id = %evidence.id,
            seq = evidence.seq,
            trust_score = %evidence.trust_score,
            "evidence ingested"
        );
        Ok(id)
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &str) -> Option<Evidence> {
        let watermark = self.watermark();
        self.records
            .get(id)
            .filter(|r| r.seq <= watermark)
            .map(|r| r.clone())
    }

    /// Records observed within `window`, optionally restricted to `sources`,
    /// ordered by `observed_at` then ingestion sequence.
    pub fn query_by_window(&self, window: &TimeWindow, sources: Option<&[String]>) -> Vec<Evidence> {
        self.snapshot_filtered(|e| window.contains(e.observed_at) && source_matches(e, sources))
            .evidence
    }

    /// Consistent point-in-time copy of the whole store.
    pub fn snapshot(&self) -> EvidenceSnapshot {
        self.snapshot_filtered(|_| true)
    }

    /// Consistent point-in-time copy of one window.
    pub fn snapshot_window(&self, window: &TimeWindow, sources: Option<&[String]>) -> EvidenceSnapshot {
        self.snapshot_filtered(|e| window.contains(e.observed_at) && source_matches(e, sources))
    }

    /// Records referenced by id, in the store's ordering. Unknown ids are skipped.
    pub fn get_many<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<Evidence> {
        let mut found: Vec<Evidence> = ids.into_iter().filter_map(|id| self.get(id)).collect();
        found.sort_by(|a, b| a.observed_at.cmp(&b.observed_at).then(a.seq.cmp(&b.seq)));
        found
    }

    pub fn watermark(&self) -> u64 {
        self.watermark.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.watermark() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.watermark() == 0
    }

    fn snapshot_filtered(&self, keep: impl Fn(&Evidence) -> bool) -> EvidenceSnapshot {
        let watermark = self.watermark();
        let mut evidence: Vec<Evidence> = self
            .records
            .iter()
            .filter(|r| r.seq <= watermark && keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        evidence.sort_by(|a, b| a.observed_at.cmp(&b.observed_at).then(a.seq.cmp(&b.seq)));
        EvidenceSnapshot {
            watermark,
            taken_at: self.clock.now(),
            evidence,
        }
    }
}

impl Default for EvidenceStore {
    fn default() -> Self {
        Self::new(EvidenceConfig::default(), SourceRegistry::default(), system_clock())
    }
}

fn source_matches(evidence: &Evidence, sources: Option<&[String]>) -> bool {
    match sources {
        None => true,
        Some(list) => {
            let normalized = evidence.normalized_source();
            list.iter().any(|s| normalize_source(s) == normalized)
        }
    }
}

//! Incremental contradiction detection driven by ingestion events.

use std::sync::{Arc, RwLock};

use chrono::Duration;
use tracing::{info, instrument, warn};

use sator_core::clock::Clock;
use sator_core::constants::SYSTEM_AUTO_RESOLVER;
use sator_core::errors::ConflictError;
use sator_core::models::{
    ConflictResolution, Evidence, EvidenceConflict, IngestionEvent, SeverityBand, TimeWindow,
};
use sator_core::traits::{IResolutionStrategy, IngestionListener};
use sator_evidence::{ConflictLedger, EvidenceStore};

use crate::detector::ContradictionDetector;
use crate::strategies::{strategy_for, Resolution, WeightedAverage};

/// Notified when the monitor records or resolves a conflict.
pub trait ConflictListener: Send + Sync {
    fn on_detected(&self, conflict: &EvidenceConflict);
    fn on_resolved(&self, conflict: &EvidenceConflict);
}

/// Detects conflicts for each newly ingested record and keeps the ledger current.
pub struct ContradictionMonitor {
    detector: ContradictionDetector,
    store: Arc<EvidenceStore>,
    ledger: Arc<ConflictLedger>,
    clock: Arc<dyn Clock>,
    listeners: RwLock<Vec<Arc<dyn ConflictListener>>>,
}

impl ContradictionMonitor {
    pub fn new(
        detector: ContradictionDetector,
        store: Arc<EvidenceStore>,
        ledger: Arc<ConflictLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            detector,
            store,
            ledger,
            clock,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn register_listener(&self, listener: Arc<dyn ConflictListener>) {
        let mut guard = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        guard.push(listener);
    }

    pub fn detector(&self) -> &ContradictionDetector {
        &self.detector
    }

    pub fn ledger(&self) -> &Arc<ConflictLedger> {
        &self.ledger
    }

    /// Compare `evidence` against stored records inside its pairing window and record
    /// the new conflicts. Returns the conflicts recorded by this call.
    #[instrument(skip(self, evidence), fields(evidence_id = %evidence.id))]
    pub fn check(&self, evidence: &Evidence) -> Vec<EvidenceConflict> {
        let reach = Duration::seconds(self.detector.config().pairing_window_secs);
        let window = TimeWindow::new(
            evidence.observed_at - reach,
            evidence.observed_at + reach + Duration::milliseconds(1),
        );
        let neighbours = self.store.query_by_window(&window, None);
        let found = self.detector.detect_against(evidence, &neighbours);
        self.record_all(found)
    }

    /// Full pairwise scan over `evidence`, recording anything not already on file.
    pub fn scan(&self, evidence: &[Evidence]) -> Vec<EvidenceConflict> {
        let found = self.detector.detect(evidence);
        self.record_all(found)
    }

    /// Resolve with one of the built-in strategies.
    pub fn resolve(
        &self,
        conflict_id: &str,
        resolution: &Resolution,
        resolved_by: &str,
    ) -> Result<EvidenceConflict, ConflictError> {
        let strategy = strategy_for(resolution);
        self.resolve_with(conflict_id, strategy.as_ref(), resolved_by)
    }

    /// Resolve with any strategy. The conflict stays open if the strategy fails.
    #[instrument(skip(self, strategy), fields(strategy = ?strategy.kind()))]
    pub fn resolve_with(
        &self,
        conflict_id: &str,
        strategy: &dyn IResolutionStrategy,
        resolved_by: &str,
    ) -> Result<EvidenceConflict, ConflictError> {
        let conflict = self
            .ledger
            .get(conflict_id)
            .ok_or_else(|| ConflictError::NotFound {
                conflict_id: conflict_id.to_string(),
            })?;
        if conflict.resolved {
            return Err(ConflictError::AlreadyResolved {
                conflict_id: conflict_id.to_string(),
            });
        }
        let evidence = self.store.get_many(&conflict.evidence_ids);
        let proposal = strategy.resolve(&conflict, &evidence)?;
        let resolution = ConflictResolution {
            strategy: strategy.kind(),
            summary: proposal.summary,
            resolved_value: proposal.resolved_value,
            flagged_evidence_id: proposal.flagged_evidence_id,
            resolved_by: resolved_by.to_string(),
            resolved_at: self.clock.now(),
        };
        let resolved = self.ledger.resolve(conflict_id, resolution)?;
        info!(conflict_id, resolved_by, "conflict resolved");
        self.notify(|l| l.on_resolved(&resolved));
        Ok(resolved)
    }

    fn record_all(&self, found: Vec<EvidenceConflict>) -> Vec<EvidenceConflict> {
        let mut recorded = Vec::new();
        for conflict in found {
            if !self.ledger.record(conflict.clone()) {
                continue;
            }
            self.notify(|l| l.on_detected(&conflict));
            let auto = self.detector.config().auto_resolve_low && conflict.band == SeverityBand::Low;
            if !auto {
                recorded.push(conflict);
                continue;
            }
            match self.resolve_with(&conflict.id, &WeightedAverage, SYSTEM_AUTO_RESOLVER) {
                Ok(resolved) => recorded.push(resolved),
                Err(err) => {
                    warn!(conflict_id = %conflict.id, error = %err, "auto-resolution failed; conflict left open");
                    recorded.push(conflict);
                }
            }
        }
        recorded
    }

    fn notify(&self, f: impl Fn(&dyn ConflictListener)) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }
}

impl IngestionListener for ContradictionMonitor {
    fn on_ingested(&self, _event: &IngestionEvent, evidence: &Evidence) {
        self.check(evidence);
    }
}

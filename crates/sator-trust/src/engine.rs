use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::debug;

use sator_core::config::TrustConfig;
use sator_core::models::{Evidence, EvidenceConflict, EvidenceSnapshot, TimeWindow, TrustBreakdown};
use sator_core::traits::ITrustScorer;

use crate::cache::{self, ScoreCache};
use crate::formula;

/// Trust scorer implementing the weighted five-factor composite.
pub struct TrustScorer {
    config: TrustConfig,
    cache: Option<ScoreCache>,
}

impl TrustScorer {
    /// Create a scorer with the default weighting and no cache.
    pub fn new() -> Self {
        Self::with_config(TrustConfig::default())
    }

    pub fn with_config(config: TrustConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Memoize breakdowns for repeated queries over unchanged inputs.
    pub fn with_cache(mut self, max_entries: u64) -> Self {
        self.cache = Some(ScoreCache::new(max_entries));
        self
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ScoreCache> {
        self.cache.as_ref()
    }

    /// Full breakdown for an evidence set.
    pub fn calculate_breakdown(
        &self,
        evidence: &[Evidence],
        conflicts: &[EvidenceConflict],
        as_of: DateTime<Utc>,
    ) -> TrustBreakdown {
        let Some(cache) = &self.cache else {
            return formula::compute_breakdown(evidence, conflicts, as_of, &self.config);
        };
        let Some(key) = cache::fingerprint(evidence, conflicts, as_of) else {
            return formula::compute_breakdown(evidence, conflicts, as_of, &self.config);
        };
        if let Some(hit) = cache.get(&key) {
            return hit;
        }
        let breakdown = formula::compute_breakdown(evidence, conflicts, as_of, &self.config);
        cache.insert(key, breakdown.clone());
        breakdown
    }

    /// Score one window of a snapshot. Freshness is measured at the window end,
    /// or at snapshot time for windows that extend past it.
    pub fn score_window(
        &self,
        snapshot: &EvidenceSnapshot,
        window: &TimeWindow,
        conflicts: &[EvidenceConflict],
    ) -> TrustBreakdown {
        let evidence = snapshot.in_window(window);
        let as_of = window.end.min(snapshot.taken_at);
        let breakdown = self.calculate_breakdown(&evidence, conflicts, as_of);
        debug!(
            window = %window,
            watermark = snapshot.watermark,
            composite = %breakdown.composite,
            "window scored"
        );
        breakdown
    }

    /// Score disjoint windows of one snapshot in parallel.
    pub fn score_windows(
        &self,
        snapshot: &EvidenceSnapshot,
        windows: &[TimeWindow],
        conflicts: &[EvidenceConflict],
    ) -> Vec<TrustBreakdown> {
        windows
            .par_iter()
            .map(|w| self.score_window(snapshot, w, conflicts))
            .collect()
    }
}

impl Default for TrustScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ITrustScorer for TrustScorer {
    fn score(
        &self,
        evidence: &[Evidence],
        conflicts: &[EvidenceConflict],
        as_of: DateTime<Utc>,
    ) -> TrustBreakdown {
        self.calculate_breakdown(evidence, conflicts, as_of)
    }
}

use chrono::{DateTime, Utc};

use crate::models::{Evidence, EvidenceConflict, TrustBreakdown};

/// Pure composite trust scoring over a point-in-time evidence set.
pub trait ITrustScorer: Send + Sync {
    /// Identical inputs must produce identical breakdowns.
    fn score(
        &self,
        evidence: &[Evidence],
        conflicts: &[EvidenceConflict],
        as_of: DateTime<Utc>,
    ) -> TrustBreakdown;
}

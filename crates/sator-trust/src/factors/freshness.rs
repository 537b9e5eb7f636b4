//! Data freshness: half-life decay of each source's most recent observation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use sator_core::models::{Evidence, EvidenceType};

#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessSummary {
    /// Mean freshness over distinct sources. Empty → 0.
    pub value: f64,
    /// Normalized names of sources below the stale threshold.
    pub stale_sources: Vec<String>,
    /// Whether any stale source is an external feed.
    pub external_stale: bool,
    /// Whether any stale source is not an external feed.
    pub internal_stale: bool,
}

/// `max(floor, 2^(-age / half_life))`. Observations at or after `as_of` are fully fresh.
pub fn decay(observed_at: DateTime<Utc>, as_of: DateTime<Utc>, half_life_secs: u64, floor: f64) -> f64 {
    let age = (as_of - observed_at).num_milliseconds().max(0) as f64 / 1000.0;
    let half_life = half_life_secs.max(1) as f64;
    0.5f64.powf(age / half_life).clamp(floor, 1.0)
}

pub fn calculate(
    evidence: &[Evidence],
    as_of: DateTime<Utc>,
    half_life_secs: u64,
    floor: f64,
    stale_threshold: f64,
) -> FreshnessSummary {
    // Latest observation per normalized source, with the type of that observation.
    let mut latest: BTreeMap<String, (DateTime<Utc>, EvidenceType)> = BTreeMap::new();
    for e in evidence {
        let key = e.normalized_source();
        match latest.get(&key) {
            Some((at, _)) if *at >= e.observed_at => {}
            _ => {
                latest.insert(key, (e.observed_at, e.evidence_type));
            }
        }
    }
    if latest.is_empty() {
        return FreshnessSummary {
            value: 0.0,
            stale_sources: Vec::new(),
            external_stale: false,
            internal_stale: false,
        };
    }

    let mut total = 0.0;
    let mut stale_sources = Vec::new();
    let mut external_stale = false;
    let mut internal_stale = false;
    for (source, (observed_at, kind)) in &latest {
        let f = decay(*observed_at, as_of, half_life_secs, floor);
        total += f;
        if f < stale_threshold {
            stale_sources.push(source.clone());
            if *kind == EvidenceType::External {
                external_stale = true;
            } else {
                internal_stale = true;
            }
        }
    }
    FreshnessSummary {
        value: (total / latest.len() as f64).clamp(0.0, 1.0),
        stale_sources,
        external_stale,
        internal_stale,
    }
}

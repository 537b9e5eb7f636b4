//! Per-pair detection rules.
//!
//! A pair is only compared when both items carry a reading of the same quantity
//! in the same unit, come from different sources and were observed within the
//! pairing window of each other.

pub mod categorical;
pub mod numeric;

use chrono::Duration;

use sator_core::config::ContradictionConfig;
use sator_core::models::{ConflictType, Evidence, ReadingValue, SeverityBand};

/// What a rule found for one pair, before the detector assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PairFinding {
    pub conflict_type: ConflictType,
    pub quantity: String,
    pub description: String,
    pub divergence: f64,
    pub severity: f64,
    pub band: SeverityBand,
}

/// Run the rule matching the pair's reading kind.
pub fn detect_pair(a: &Evidence, b: &Evidence, config: &ContradictionConfig) -> Option<PairFinding> {
    if a.id == b.id || a.normalized_source() == b.normalized_source() {
        return None;
    }
    let gap = (a.observed_at - b.observed_at).abs();
    if gap > Duration::seconds(config.pairing_window_secs) {
        return None;
    }
    let ra = a.reading()?;
    let rb = b.reading()?;
    if ra.quantity != rb.quantity || ra.unit != rb.unit {
        return None;
    }
    match (&ra.value, &rb.value) {
        (ReadingValue::Numeric(va), ReadingValue::Numeric(vb)) => {
            numeric::detect(a, *va, b, *vb, &ra.quantity, ra.unit.as_deref(), config)
        }
        (ReadingValue::Categorical(sa), ReadingValue::Categorical(sb)) => {
            categorical::detect(a, sa, b, sb, &ra.quantity)
        }
        _ => None,
    }
}

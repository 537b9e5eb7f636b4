//! Numeric divergence between two readings of one quantity.

use sator_core::config::ContradictionConfig;
use sator_core::models::{ConflictType, Evidence};

use super::PairFinding;
use crate::divergence;

pub fn detect(
    a: &Evidence,
    va: f64,
    b: &Evidence,
    vb: f64,
    quantity: &str,
    unit: Option<&str>,
    config: &ContradictionConfig,
) -> Option<PairFinding> {
    let d = divergence::divergence(va, vb);
    let band = divergence::band(d, config)?;
    let unit = unit.map(|u| format!(" {u}")).unwrap_or_default();
    Some(PairFinding {
        conflict_type: ConflictType::ValueDivergence,
        quantity: quantity.to_string(),
        description: format!(
            "{quantity}: {} reports {va}{unit}, {} reports {vb}{unit} ({:.1}% divergence, {band})",
            a.source,
            b.source,
            d * 100.0
        ),
        divergence: d,
        severity: divergence::severity(d, config),
        band,
    })
}

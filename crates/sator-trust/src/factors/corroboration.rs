//! Corroboration: fraction of readings that agree with their quantity's consensus.
//!
//! Numeric readings are grouped by (quantity, unit); the consensus is the
//! reliability-weighted mean and a reading agrees when its relative deviation from it
//! is within tolerance. Categorical readings agree when they match the
//! reliability-weighted majority value. Only groups with two or more readings count.

use std::collections::BTreeMap;

use sator_core::models::{Evidence, ReadingValue};

#[derive(Debug, Clone, PartialEq)]
pub struct CorroborationSummary {
    /// Agreeing fraction, or the uncorroborated value when no group has two readings.
    pub value: f64,
    pub corroborated_groups: usize,
    pub agreeing: usize,
    pub compared: usize,
}

#[derive(Default)]
struct Group {
    numeric: Vec<(f64, f64)>,
    categorical: Vec<(String, f64)>,
}

pub fn calculate(evidence: &[Evidence], tolerance: f64, uncorroborated_value: f64) -> CorroborationSummary {
    let mut groups: BTreeMap<(String, Option<String>), Group> = BTreeMap::new();
    for e in evidence {
        let Some(reading) = e.reading() else { continue };
        let weight = e.trust_score.value();
        let group = groups.entry((reading.quantity, reading.unit)).or_default();
        match reading.value {
            ReadingValue::Numeric(v) => group.numeric.push((v, weight)),
            ReadingValue::Categorical(s) => group.categorical.push((s, weight)),
        }
    }

    let mut agreeing = 0usize;
    let mut compared = 0usize;
    let mut corroborated_groups = 0usize;
    for group in groups.values() {
        if group.numeric.len() >= 2 {
            corroborated_groups += 1;
            compared += group.numeric.len();
            let consensus = weighted_mean(&group.numeric);
            agreeing += group
                .numeric
                .iter()
                .filter(|(v, _)| relative_deviation(*v, consensus) <= tolerance)
                .count();
        }
        if group.categorical.len() >= 2 {
            corroborated_groups += 1;
            compared += group.categorical.len();
            let majority = weighted_majority(&group.categorical);
            agreeing += group
                .categorical
                .iter()
                .filter(|(s, _)| Some(s.as_str()) == majority.as_deref())
                .count();
        }
    }

    let value = if compared == 0 {
        uncorroborated_value
    } else {
        agreeing as f64 / compared as f64
    };
    CorroborationSummary {
        value: value.clamp(0.0, 1.0),
        corroborated_groups,
        agreeing,
        compared,
    }
}

/// Reliability-weighted mean; plain mean when every weight is zero.
pub fn weighted_mean(values: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = values.iter().map(|(_, w)| w).sum();
    if total_weight <= f64::EPSILON {
        return values.iter().map(|(v, _)| v).sum::<f64>() / values.len().max(1) as f64;
    }
    values.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight
}

/// |v − reference| relative to |reference|; absolute when the reference is ~0.
pub fn relative_deviation(value: f64, reference: f64) -> f64 {
    let diff = (value - reference).abs();
    if reference.abs() <= f64::EPSILON {
        diff
    } else {
        diff / reference.abs()
    }
}

fn weighted_majority(values: &[(String, f64)]) -> Option<String> {
    let mut tally: BTreeMap<&str, f64> = BTreeMap::new();
    for (s, w) in values {
        *tally.entry(s.as_str()).or_insert(0.0) += w;
    }
    // BTreeMap order makes ties resolve to the lexicographically smallest value.
    let mut best: Option<(&str, f64)> = None;
    for (s, w) in tally {
        match best {
            Some((_, bw)) if bw >= w => {}
            _ => best = Some((s, w)),
        }
    }
    best.map(|(s, _)| s.to_string())
}

//! State mismatch between two categorical readings (e.g. valve open vs closed).

use sator_core::models::{ConflictType, Evidence, SeverityBand};

use super::PairFinding;

pub fn detect(a: &Evidence, sa: &str, b: &Evidence, sb: &str, quantity: &str) -> Option<PairFinding> {
    if sa == sb {
        return None;
    }
    Some(PairFinding {
        conflict_type: ConflictType::StateMismatch,
        quantity: quantity.to_string(),
        description: format!(
            "{quantity}: {} reports '{sa}', {} reports '{sb}'",
            a.source, b.source
        ),
        divergence: 1.0,
        severity: 1.0,
        band: SeverityBand::High,
    })
}

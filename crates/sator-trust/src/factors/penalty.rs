use sator_core::models::EvidenceConflict;

/// Sum of severities, accumulated in conflict-id order.
pub fn severity_sum(conflicts: &[&EvidenceConflict]) -> f64 {
    let mut ordered: Vec<&&EvidenceConflict> = conflicts.iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));
    ordered.iter().map(|c| c.severity.value()).sum()
}

/// Non-positive penalty: `-min(cap, per_severity · Σ severity)`.
pub fn calculate(severity_sum: f64, per_severity: f64, cap: f64) -> f64 {
    let magnitude = (per_severity * severity_sum).min(cap).max(0.0);
    if magnitude == 0.0 {
        0.0
    } else {
        -magnitude
    }
}

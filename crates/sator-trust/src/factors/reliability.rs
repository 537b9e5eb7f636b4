use sator_core::models::Evidence;

/// Mean per-evidence reliability weight. Empty → 0.
pub fn calculate(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    let sum: f64 = evidence.iter().map(|e| e.trust_score.value()).sum();
    (sum / evidence.len() as f64).clamp(0.0, 1.0)
}

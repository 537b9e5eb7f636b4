//! Structured log events for key engine operations.

pub fn evidence_rejected(source: &str, code: &str, reason: &str) {
    tracing::warn!(
        event = "evidence_rejected",
        source = %source,
        code = %code,
        reason = %reason,
        "evidence rejected"
    );
}

pub fn conflict_detected(conflict_id: &str, evidence_ids: &[String], band: &str) {
    tracing::warn!(
        event = "conflict_detected",
        conflict_id = %conflict_id,
        evidence_ids = ?evidence_ids,
        band = %band,
        "conflict detected"
    );
}

pub fn decision_timed_out(decision_id: &str, timebox_secs: u64) {
    tracing::info!(
        event = "decision_timed_out",
        decision_id = %decision_id,
        timebox_secs,
        "decision deferred on timeout"
    );
}

pub fn tamper_detected(artifact_id: &str, stored: &str, recomputed: &str) {
    tracing::error!(
        event = "tamper_detected",
        artifact_id = %artifact_id,
        stored = %stored,
        recomputed = %recomputed,
        "tamper detected"
    );
}

pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

//! Span definitions per operation: ingestion, scoring, detection, decision, sealing, anchoring.

/// Create an ingestion span.
#[macro_export]
macro_rules! ingest_span {
    ($source:expr) => {
        tracing::info_span!("sator.ingest", source = %$source)
    };
}

/// Create a trust scoring span.
#[macro_export]
macro_rules! scoring_span {
    ($window:expr, $evidence_count:expr) => {
        tracing::info_span!("sator.scoring", window = %$window, evidence_count = $evidence_count)
    };
}

/// Create a contradiction detection span.
#[macro_export]
macro_rules! detection_span {
    ($evidence_id:expr) => {
        tracing::info_span!("sator.detection", evidence_id = %$evidence_id)
    };
}

/// Create a decision lifecycle span.
#[macro_export]
macro_rules! decision_span {
    ($decision_id:expr, $operation:expr) => {
        tracing::info_span!("sator.decision", decision_id = %$decision_id, operation = %$operation)
    };
}

/// Create an artifact sealing span.
#[macro_export]
macro_rules! seal_span {
    ($decision_id:expr) => {
        tracing::info_span!("sator.seal", decision_id = %$decision_id)
    };
}

/// Create an anchoring span.
#[macro_export]
macro_rules! anchor_span {
    ($artifact_id:expr) => {
        tracing::info_span!("sator.anchor", artifact_id = %$artifact_id)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const INGEST: &str = "sator.ingest";
    pub const SCORING: &str = "sator.scoring";
    pub const DETECTION: &str = "sator.detection";
    pub const DECISION: &str = "sator.decision";
    pub const SEAL: &str = "sator.seal";
    pub const ANCHOR: &str = "sator.anchor";
}

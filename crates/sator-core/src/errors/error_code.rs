//! Stable error codes recorded in audit-ledger rejection entries.

pub const INVALID_EVIDENCE: &str = "INVALID_EVIDENCE";
pub const DUPLICATE_EVIDENCE: &str = "DUPLICATE_EVIDENCE";
pub const EVIDENCE_NOT_FOUND: &str = "EVIDENCE_NOT_FOUND";
pub const CONFLICT_NOT_FOUND: &str = "CONFLICT_NOT_FOUND";
pub const CONFLICT_ALREADY_RESOLVED: &str = "CONFLICT_ALREADY_RESOLVED";
pub const CONFLICT_UNRESOLVABLE: &str = "CONFLICT_UNRESOLVABLE";
pub const DECISION_NOT_FOUND: &str = "DECISION_NOT_FOUND";
pub const UNKNOWN_OPTION: &str = "UNKNOWN_OPTION";
pub const DECISION_CLOSED: &str = "DECISION_CLOSED";
pub const NO_PENDING_PROMPT: &str = "NO_PENDING_PROMPT";
pub const INVALID_PROMPT: &str = "INVALID_PROMPT";
pub const ACTION_CAP_EXCEEDED: &str = "ACTION_CAP_EXCEEDED";
pub const WINDOW_ALREADY_LIVE: &str = "WINDOW_ALREADY_LIVE";
pub const INVALID_MODE_TRANSITION: &str = "INVALID_MODE_TRANSITION";
pub const DECISION_NOT_RESOLVED: &str = "DECISION_NOT_RESOLVED";
pub const TIMEBOX_OUT_OF_RANGE: &str = "TIMEBOX_OUT_OF_RANGE";
pub const CHAIN_CONFLICT: &str = "CHAIN_CONFLICT";
pub const TAMPER_DETECTED: &str = "TAMPER_DETECTED";
pub const ARTIFACT_NOT_FOUND: &str = "ARTIFACT_NOT_FOUND";
pub const BROKEN_LINK: &str = "BROKEN_LINK";
pub const ALREADY_SEALED: &str = "ALREADY_SEALED";
pub const EMPTY_PACKET: &str = "EMPTY_PACKET";
pub const ANCHOR_NOT_FOUND: &str = "ANCHOR_NOT_FOUND";
pub const ANCHOR_SUBMISSION_FAILED: &str = "ANCHOR_SUBMISSION_FAILED";
pub const ANCHOR_TIMEOUT: &str = "ANCHOR_TIMEOUT";
pub const ANCHOR_ALREADY_APPROVED: &str = "ANCHOR_ALREADY_APPROVED";
pub const ANCHOR_INVALID_STATE: &str = "ANCHOR_INVALID_STATE";
pub const ANCHOR_UNKNOWN_TX: &str = "ANCHOR_UNKNOWN_TX";
pub const INCIDENT_NOT_FOUND: &str = "INCIDENT_NOT_FOUND";
pub const INVALID_INCIDENT_TRANSITION: &str = "INVALID_INCIDENT_TRANSITION";
pub const INCIDENT_CLOSED: &str = "INCIDENT_CLOSED";
pub const INCIDENT_ALREADY_LINKED: &str = "INCIDENT_ALREADY_LINKED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";

/// Maps an error to its stable code.
pub trait SatorErrorCode {
    fn error_code(&self) -> &'static str;
}

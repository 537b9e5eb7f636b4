//! Ingestion-time payload validation. Rejected evidence is never stored.

use chrono::{DateTime, Duration, Utc};

use sator_core::constants::UNASSIGNED_EVIDENCE_ID;
use sator_core::errors::EvidenceError;
use sator_core::models::{NewEvidence, Reading};

/// Check a submission against the structural rules.
pub fn validate(
    new: &NewEvidence,
    now: DateTime<Utc>,
    max_clock_skew_secs: i64,
) -> Result<(), EvidenceError> {
    let id = new.id.as_deref().unwrap_or(UNASSIGNED_EVIDENCE_ID);

    if let Some(explicit) = &new.id {
        if explicit.trim().is_empty() {
            return Err(EvidenceError::invalid(id, "id must not be blank"));
        }
    }
    if new.source.trim().is_empty() {
        return Err(EvidenceError::invalid(id, "source must not be empty"));
    }

    let payload = match new.value.as_object() {
        Some(obj) if !obj.is_empty() => obj,
        _ => {
            return Err(EvidenceError::invalid(
                id,
                "payload must be a non-empty object",
            ))
        }
    };

    // A payload that declares a reading must declare a usable one, whatever its type.
    let declares_reading = payload.contains_key("reading") || payload.contains_key("quantity");
    if declares_reading || new.evidence_type.requires_reading() {
        if Reading::from_payload(&new.value).is_none() {
            return Err(EvidenceError::invalid(
                id,
                "reading payload requires a non-empty `quantity` and a numeric or string `reading`",
            ));
        }
    }

    if new.observed_at > now + Duration::seconds(max_clock_skew_secs) {
        return Err(EvidenceError::invalid(
            id,
            format!(
                "observed_at {} is in the future (now {})",
                new.observed_at.to_rfc3339(),
                now.to_rfc3339()
            ),
        ));
    }

    if let Some(score) = new.trust_score {
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(EvidenceError::invalid(
                id,
                format!("trust_score {score} is outside [0, 1]"),
            ));
        }
    }

    if new.tags.keys().any(|k| k.trim().is_empty()) {
        return Err(EvidenceError::invalid(id, "tag keys must not be empty"));
    }

    Ok(())
}

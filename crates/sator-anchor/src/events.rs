use sator_core::models::{AnchorRecord, AnchorStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorEvent {
    /// The notary accepted the hash and returned a transaction reference.
    Submitted(AnchorRecord),
    /// A submission attempt failed or timed out; the record stays `pending`.
    SubmissionFailed { record: AnchorRecord, error: String },
    StatusChanged { from: AnchorStatus, record: AnchorRecord },
}

impl AnchorEvent {
    pub fn record(&self) -> &AnchorRecord {
        match self {
            Self::Submitted(record)
            | Self::SubmissionFailed { record, .. }
            | Self::StatusChanged { record, .. } => record,
        }
    }
}

/// Called outside any gateway lock, possibly from a runtime worker thread.
pub trait AnchorListener: Send + Sync {
    fn on_anchor_event(&self, event: &AnchorEvent);
}

use crate::models::{Evidence, IngestionEvent};

/// Push-model consumer of evidence ingestion.
///
/// Called synchronously after the record is visible in the store, outside any store lock.
pub trait IngestionListener: Send + Sync {
    fn on_ingested(&self, event: &IngestionEvent, evidence: &Evidence);
}

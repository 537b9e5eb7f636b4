//! # sator-evidence
//!
//! Append-only evidence store. Ingestion validates payloads, assigns a monotonic
//! sequence number and ingestion time at a single serialization point, and pushes an
//! `IngestionEvent` to registered listeners and broadcast subscribers.
//! Also holds the conflict ledger: conflicts are only ever added or resolved, never deleted.

pub mod conflict_ledger;
pub mod store;
pub mod validation;

pub use conflict_ledger::{ConflictFilter, ConflictLedger};
pub use store::EvidenceStore;

//! # sator-artifact
//!
//! Seals resolved decisions into immutable, hash-linked trust receipts and
//! aggregates them into legal posture packets. Also hosts the hash-chained
//! audit ledger the engine's timeline is read from.

pub mod audit_ledger;
pub mod chain;
pub mod legal_posture;

pub use audit_ledger::{AuditLedger, AuditRecord};
pub use chain::{recompute_hash, verify_artifact, ArtifactChain, SealRequest};

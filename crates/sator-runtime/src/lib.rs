//! # sator-runtime
//!
//! [`SatorEngine`] owns one instance of every subsystem and exposes the
//! operator-facing API: evidence submission, trust reads, contradiction
//! handling, incidents, decisions, sealing, anchoring, the audit timeline and
//! point-in-time replay.

pub mod audit;
pub mod engine;
pub mod incidents;
pub mod options;
mod replay;
pub mod views;

pub use audit::AuditTrail;
pub use engine::SatorEngine;
pub use incidents::{IncidentEvent, IncidentListener, IncidentManager};
pub use options::EngineOptions;
pub use views::{DecisionAsOf, DecisionView, ReplayState};

//! # sator-core
//!
//! Foundation crate for the SATOR-Ops trust and decision core.
//! Defines the shared models, the clamped `Score` type, errors, config, constants,
//! the clock abstraction and canonical hashing. Every other crate in the workspace depends on this.

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod models;
pub mod registry;
pub mod score;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SatorConfig;
pub use errors::{SatorError, SatorErrorCode, SatorResult};
pub use models::{
    ActionType, Artifact, ArtifactType, Decision, DecisionMode, DecisionState, Evidence,
    EvidenceConflict, EvidenceType, TimeWindow, TrustBreakdown, TrustLevel,
};
pub use registry::SourceRegistry;
pub use score::Score;

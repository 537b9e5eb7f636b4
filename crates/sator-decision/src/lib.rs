//! # sator-decision
//!
//! Drives each decision through `open → awaiting_response → resolved → closed`.
//!
//! All transitions for one decision are serialized behind that decision's mutex,
//! so a countdown firing and an operator submission racing each other resolve
//! to exactly one outcome: the loser sees `DecisionClosed`.
//!
//! Countdowns are tokio tasks, aborted on any terminal transition. Without a
//! runtime the machine falls back to checking expiry against the clock whenever
//! a decision is touched, or when [`DecisionMachine::sweep_expired`] is called.

pub mod events;
pub mod machine;
pub mod modes;
pub mod policy;
pub mod prompt;
mod timer;

pub use events::{DecisionEvent, DecisionListener};
pub use machine::{DecisionMachine, DecisionResponse, OpenDecision};
pub use policy::{allowed_actions, recommend, ConflictPosture};

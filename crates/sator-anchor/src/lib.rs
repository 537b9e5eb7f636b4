//! # sator-anchor
//!
//! Optional external notarization of artifact hashes.
//!
//! Submission is fire-and-forget: [`AnchorGateway::anchor`] registers a
//! `pending` record and hands the notary call to a tokio task. Failures and
//! timeouts are logged, recorded as degradations and left `pending` for the
//! caller to retry. Status is read by polling.

pub mod events;
pub mod gateway;
pub mod notary;

pub use events::{AnchorEvent, AnchorListener};
pub use gateway::AnchorGateway;
pub use notary::LocalNotary;

//! # sator-contradiction
//!
//! Compares evidence describing the same measured quantity and records
//! disagreements as conflicts.
//!
//! - [`ContradictionDetector`]: pure pairwise detection over an evidence set,
//!   banding numeric divergence into low/medium/high severity.
//! - [`strategies`]: pluggable resolution (weighted average, prefer higher
//!   reliability, manual override), each producing an audit summary.
//! - [`ContradictionMonitor`]: push-model consumer of ingestion events that
//!   detects incrementally against the new record's pairing window, records into the
//!   conflict ledger and auto-resolves low-band conflicts.

pub mod detection;
pub mod detector;
pub mod divergence;
pub mod monitor;
pub mod strategies;

pub use detector::ContradictionDetector;
pub use monitor::{ConflictListener, ContradictionMonitor};
pub use strategies::{strategy_for, Resolution};

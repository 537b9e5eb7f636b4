//! # sator-observability
//!
//! Tracing setup, span macros, structured log events, degradation tracking
//! with alerting, and lock-free engine counters.

pub mod degradation;
pub mod metrics;
pub mod tracing_setup;

pub use degradation::{evaluate_alerts, AlertLevel, DegradationAlert, DegradationTracker};
pub use metrics::{Counter, CounterSnapshot, EngineCounters};
pub use tracing_setup::{init_tracing, init_tracing_with_config, init_tracing_with_filter};

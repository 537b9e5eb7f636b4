//! # sator-trust
//!
//! Composite trust scoring over a point-in-time evidence set.
//!
//! ```text
//! composite = clamp(
//!     w_c · corroboration
//!   + w_r · mean reliability
//!   + w_f · freshness
//!   − min(max_penalty, k · Σ unresolved severity)
//!   − unknown_residual,
//!   0, 1)
//! ```
//!
//! Scoring is pure and deterministic: inputs are put into canonical order before any
//! floating-point accumulation, so the same evidence set yields the same breakdown.

pub mod cache;
pub mod engine;
pub mod factors;
pub mod formula;
pub mod reason_codes;

pub use cache::ScoreCache;
pub use engine::TrustScorer;
pub use formula::compute_breakdown;

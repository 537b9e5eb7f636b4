//! Individual trust factors. Each returns its raw measurement; weighting happens in `formula`.

pub mod corroboration;
pub mod freshness;
pub mod penalty;
pub mod reliability;

pub use corroboration::CorroborationSummary;
pub use freshness::FreshnessSummary;

pub mod anchor_client;
pub mod ingestion;
pub mod resolution;
pub mod scorer;

pub use anchor_client::{AnchorReceipt, AnchorSubmission, IAnchorClient, RemoteAnchorState};
pub use ingestion::IngestionListener;
pub use resolution::{IResolutionStrategy, ResolutionProposal};
pub use scorer::ITrustScorer;

pub mod anchor;
pub mod artifact;
pub mod audit;
pub mod conflict;
pub mod decision;
pub mod degradation_event;
pub mod evidence;
pub mod incident;
pub mod trust;

pub use anchor::{AnchorRecord, AnchorStatus};
pub use artifact::{
    Artifact, ArtifactContent, ArtifactType, ConflictSnapshot, DecisionTimelineEntry,
    LegalPosturePacket, ReceiptContent,
};
pub use audit::{AuditEntry, AuditEventKind, TimelineEntry};
pub use conflict::{
    ConflictResolution, ConflictStatus, ConflictType, EvidenceConflict, ResolutionStrategyKind,
    SeverityBand,
};
pub use decision::{
    ActionType, Decision, DecisionMode, DecisionPrompt, DecisionState, DecisionTransition,
    PromptKind, PromptOption, PromptRequest, Recommendation, UncertaintyLevel,
};
pub use degradation_event::DegradationEvent;
pub use evidence::{
    Evidence, EvidenceSnapshot, EvidenceType, IngestionEvent, NewEvidence, Reading, ReadingValue,
    TimeWindow, TrustLevel,
};
pub use incident::{Incident, IncidentSeverity, IncidentState, IncidentTransition};
pub use trust::{FactorKind, Impact, ReasonCode, TrustBreakdown, TrustFactor};

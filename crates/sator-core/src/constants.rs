/// SATOR core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard cap on the number of actions offered by a decision.
pub const MAX_ALLOWED_ACTIONS: usize = 3;

/// Largest configurable timebox: one year.
pub const MAX_TIMEBOX_SECS: u64 = 31_536_000;

/// Operator id recorded when a prompt countdown expires.
pub const SYSTEM_TIMEOUT_OPERATOR: &str = "system:timeout";

/// Resolver id recorded when a conflict is resolved automatically.
pub const SYSTEM_AUTO_RESOLVER: &str = "system:auto";

/// Actor id for transitions the engine performs on its own.
pub const SYSTEM_ACTOR: &str = "system";

/// Previous-hash value used when hashing the first entry of a chain.
pub const GENESIS_PREVIOUS_HASH: &str = "";

/// Maximum number of options a multi-choice prompt may declare.
pub const MAX_PROMPT_OPTIONS: usize = 5;

/// Lineage used for legal posture packets.
pub const LEGAL_POSTURE_LINEAGE: &str = "legal-posture";

/// Placeholder id used in ingestion errors before an id is assigned.
pub const UNASSIGNED_EVIDENCE_ID: &str = "<unassigned>";

//! Default values for every configuration key.

// Evidence
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: i64 = 300;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

// Trust weighting
pub const DEFAULT_CORROBORATION_WEIGHT: f64 = 0.20;
pub const DEFAULT_RELIABILITY_WEIGHT: f64 = 0.40;
pub const DEFAULT_FRESHNESS_WEIGHT: f64 = 0.40;
pub const DEFAULT_UNKNOWN_RESIDUAL: f64 = 0.03;
pub const DEFAULT_PENALTY_PER_SEVERITY: f64 = 0.10;
pub const DEFAULT_MAX_PENALTY: f64 = 0.30;
pub const DEFAULT_CORROBORATION_TOLERANCE: f64 = 0.035;
pub const DEFAULT_UNCORROBORATED_VALUE: f64 = 0.80;
pub const DEFAULT_FRESHNESS_HALF_LIFE_SECS: u64 = 1800;
pub const DEFAULT_FRESHNESS_FLOOR: f64 = 0.10;
pub const DEFAULT_STALE_THRESHOLD: f64 = 0.50;
pub const DEFAULT_RELIABILITY: f64 = 0.75;
pub const DEFAULT_HIGH_TRUST_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MEDIUM_TRUST_THRESHOLD: f64 = 0.70;
pub const DEFAULT_TRUST_CACHE_CAPACITY: u64 = 1024;

/// Known source reliabilities, keyed by normalized source name.
pub const DEFAULT_SOURCE_RELIABILITY: &[(&str, f64)] = &[
    ("primary_sensor_array", 0.98),
    ("backup_telemetry", 0.95),
    ("operator_manual", 0.90),
    ("external_feed_alpha", 0.87),
    ("flow_sensor_a", 0.87),
    ("external_feed_beta", 0.72),
    ("flow_sensor_b", 0.72),
    ("legacy_system_link", 0.65),
    ("remote_station_c", 0.0),
];

// Contradiction detection
pub const DEFAULT_LOW_THRESHOLD: f64 = 0.02;
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.05;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.10;
pub const DEFAULT_PAIRING_WINDOW_SECS: i64 = 60;
pub const DEFAULT_AUTO_RESOLVE_LOW: bool = true;

// Decisions
pub const DEFAULT_TIMEBOX_SECS: u64 = 300;
pub const DEFAULT_MAX_TIMEBOX_SECS: u64 = 86_400;
pub const DEFAULT_PROMPT_SEVERITY_THRESHOLD: f64 = 0.5;

// Anchoring
pub const DEFAULT_ANCHOR_ISSUER: &str = "sator-ops";
pub const DEFAULT_ANCHOR_SUBMIT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_ANCHOR_REQUIRE_APPROVAL: bool = false;

// Observability
pub const DEFAULT_LOG_FILTER: &str = "sator=info";
pub const DEFAULT_LOG_JSON: bool = true;

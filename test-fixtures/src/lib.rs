//! Test fixture loader for SATOR scenario datasets.
//!
//! Provides typed deserialization of the scenario JSON files and helpers
//! for loading them in tests across crates.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;

/// Root directory of the test-fixtures folder.
fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find test-fixtures.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// List all JSON files in a fixture subdirectory, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

// ===== Typed fixture structures =====

/// One evidence submission, timed relative to the scenario's base time.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceFixture {
    pub id: String,
    #[serde(rename = "type")]
    pub evidence_type: String,
    pub source: String,
    pub quantity: Option<String>,
    pub reading: Option<serde_json::Value>,
    pub unit: Option<String>,
    /// Seconds relative to `base_time`; negative is earlier.
    pub offset_secs: i64,
    pub trust_score: Option<f64>,
}

/// Expected trust outcome bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct TrustExpectation {
    pub baseline_min: f64,
    pub baseline_max: f64,
    pub after_min: f64,
    pub after_max: f64,
    pub conflict_count: usize,
    pub conflict_band: String,
    pub baseline_codes: Vec<String>,
    pub after_codes: Vec<String>,
}

/// A two-phase trust scenario: baseline evidence, then incoming evidence.
#[derive(Debug, Clone, Deserialize)]
pub struct TrustScenario {
    pub name: String,
    pub description: String,
    pub base_time: String,
    pub baseline: Vec<EvidenceFixture>,
    pub incoming: Vec<EvidenceFixture>,
    pub expected: TrustExpectation,
}

/// A prompt-timeout scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutScenario {
    pub name: String,
    pub base_time: String,
    pub expires_in_sec: u64,
    pub late_submit_at_sec: i64,
    pub prompt_kind: String,
    pub options: Vec<OptionFixture>,
    pub late_option: String,
    pub expected_operator: String,
    pub expected_outcome: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionFixture {
    pub id: String,
    pub label: String,
    pub action: String,
}

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Kind of observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Sensor,
    Log,
    OperatorNote,
    Alarm,
    External,
}

impl EvidenceType {
    /// Whether the payload must carry a measured quantity and reading.
    pub fn requires_reading(self) -> bool {
        matches!(self, Self::Sensor)
    }
}

/// Trust bucket of a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    High,
    Medium,
    Low,
    /// Participates in at least one unresolved conflict.
    Conflicting,
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Conflicting => "conflicting",
        };
        f.write_str(s)
    }
}

/// An immutable observation held by the evidence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub source: String,
    /// Structured payload. Measured readings use `quantity`, `reading` and `unit` keys.
    pub value: serde_json::Value,
    pub observed_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    /// Store-assigned ingestion sequence number.
    pub seq: u64,
    pub trust_level: TrustLevel,
    pub trust_score: Score,
    pub trust_reason: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Evidence {
    /// Parsed measurement view of the payload, if it carries one.
    pub fn reading(&self) -> Option<Reading> {
        Reading::from_payload(&self.value)
    }

    /// Source name normalized for registry lookups.
    pub fn normalized_source(&self) -> String {
        normalize_source(&self.source)
    }
}

/// Lower-case the source name and fold spaces and hyphens to underscores.
pub fn normalize_source(source: &str) -> String {
    source
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Evidence as submitted, before the store assigns sequence and ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvidence {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub source: String,
    pub value: serde_json::Value,
    pub observed_at: DateTime<Utc>,
    /// Explicit reliability weight; the source registry supplies one when absent.
    #[serde(default)]
    pub trust_score: Option<f64>,
    #[serde(default)]
    pub trust_reason: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl NewEvidence {
    /// A sensor reading payload.
    pub fn sensor(
        source: impl Into<String>,
        quantity: &str,
        reading: f64,
        unit: &str,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            evidence_type: EvidenceType::Sensor,
            source: source.into(),
            value: serde_json::json!({ "quantity": quantity, "reading": reading, "unit": unit }),
            observed_at,
            trust_score: None,
            trust_reason: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_trust_score(mut self, score: f64) -> Self {
        self.trust_score = Some(score);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A measured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Numeric(f64),
    Categorical(String),
}

/// Measurement extracted from an evidence payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub quantity: String,
    pub value: ReadingValue,
    pub unit: Option<String>,
}

impl Reading {
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        let obj = payload.as_object()?;
        let quantity = obj.get("quantity")?.as_str()?.trim();
        if quantity.is_empty() {
            return None;
        }
        let value = match obj.get("reading")? {
            serde_json::Value::Number(n) => ReadingValue::Numeric(n.as_f64()?),
            serde_json::Value::String(s) => ReadingValue::Categorical(s.trim().to_lowercase()),
            serde_json::Value::Bool(b) => ReadingValue::Categorical(b.to_string()),
            _ => return None,
        };
        let unit = obj
            .get("unit")
            .and_then(|u| u.as_str())
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Some(Self {
            quantity: quantity.to_lowercase(),
            value,
            unit,
        })
    }

    pub fn numeric(&self) -> Option<f64> {
        match self.value {
            ReadingValue::Numeric(v) => Some(v),
            ReadingValue::Categorical(_) => None,
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Bounds are reordered if given backwards.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// The window of `length` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, length: chrono::Duration) -> Self {
        Self::new(end - length, end)
    }

    /// Covers every representable instant.
    pub fn unbounded() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Point-in-time copy of the store, tagged with the highest sequence number it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSnapshot {
    pub watermark: u64,
    pub taken_at: DateTime<Utc>,
    /// Ordered by `observed_at`, then `seq`.
    pub evidence: Vec<Evidence>,
}

impl EvidenceSnapshot {
    pub fn in_window(&self, window: &TimeWindow) -> Vec<Evidence> {
        self.evidence
            .iter()
            .filter(|e| window.contains(e.observed_at))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Evidence> {
        self.evidence.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }
}

/// Emitted by the store after each successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionEvent {
    pub evidence_id: String,
    pub seq: u64,
    pub source: String,
    pub quantity: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::Score;

/// Direction of a factor's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

impl Impact {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Corroboration,
    Reliability,
    ContradictionPenalty,
    Freshness,
    UnknownFactors,
}

impl FactorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Corroboration => "Evidence Corroboration",
            Self::Reliability => "Source Reliability Avg",
            Self::ContradictionPenalty => "Contradiction Penalty",
            Self::Freshness => "Data Freshness",
            Self::UnknownFactors => "Unknown Factors",
        }
    }
}

/// One term of the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustFactor {
    pub kind: FactorKind,
    pub label: String,
    /// Measured quantity before weighting (fraction, mean or severity sum).
    pub raw: f64,
    pub weight: f64,
    /// Signed contribution to the composite.
    pub value: f64,
    pub impact: Impact,
}

impl TrustFactor {
    pub fn new(kind: FactorKind, raw: f64, weight: f64, value: f64) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            raw,
            weight,
            value,
            impact: Impact::of(value),
        }
    }
}

/// Stable explanation codes attached to a trust breakdown. Declaration order is code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReasonCode {
    #[serde(rename = "TR_0x00E")]
    NoEvidence,
    #[serde(rename = "TR_0x04C")]
    ExternalFeedStale,
    #[serde(rename = "TR_0x05D")]
    StaleSourceData,
    #[serde(rename = "TR_0x08B")]
    MinorDivergence,
    #[serde(rename = "TR_0x09C")]
    MajorDivergence,
    #[serde(rename = "TR_0x12A")]
    HighCorroboration,
    #[serde(rename = "TR_0x13B")]
    WeakCorroboration,
    #[serde(rename = "TR_0x15S")]
    SingleSourceOnly,
    #[serde(rename = "TR_0x20R")]
    LowSourceReliability,
    #[serde(rename = "TR_0x21R")]
    HighSourceReliability,
    #[serde(rename = "TR_0x30U")]
    UnmodeledUncertainty,
}

impl ReasonCode {
    pub const ALL: [ReasonCode; 11] = [
        Self::NoEvidence,
        Self::ExternalFeedStale,
        Self::StaleSourceData,
        Self::MinorDivergence,
        Self::MajorDivergence,
        Self::HighCorroboration,
        Self::WeakCorroboration,
        Self::SingleSourceOnly,
        Self::LowSourceReliability,
        Self::HighSourceReliability,
        Self::UnmodeledUncertainty,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::NoEvidence => "TR_0x00E",
            Self::ExternalFeedStale => "TR_0x04C",
            Self::StaleSourceData => "TR_0x05D",
            Self::MinorDivergence => "TR_0x08B",
            Self::MajorDivergence => "TR_0x09C",
            Self::HighCorroboration => "TR_0x12A",
            Self::WeakCorroboration => "TR_0x13B",
            Self::SingleSourceOnly => "TR_0x15S",
            Self::LowSourceReliability => "TR_0x20R",
            Self::HighSourceReliability => "TR_0x21R",
            Self::UnmodeledUncertainty => "TR_0x30U",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::NoEvidence => "No evidence in window",
            Self::ExternalFeedStale => "External feed staleness",
            Self::StaleSourceData => "Stale source data",
            Self::MinorDivergence => "Minor sensor divergence",
            Self::MajorDivergence => "Major sensor divergence",
            Self::HighCorroboration => "High sensor corroboration",
            Self::WeakCorroboration => "Weak sensor corroboration",
            Self::SingleSourceOnly => "Uncorroborated single-source readings",
            Self::LowSourceReliability => "Low source reliability",
            Self::HighSourceReliability => "High source reliability",
            Self::UnmodeledUncertainty => "Unmodeled uncertainty reserved",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

/// Composite trust score with its factor decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustBreakdown {
    pub composite: Score,
    pub factors: Vec<TrustFactor>,
    /// Sorted and deduplicated.
    pub reason_codes: Vec<ReasonCode>,
    pub evidence_count: usize,
    pub unresolved_conflicts: usize,
    pub as_of: DateTime<Utc>,
}

impl TrustBreakdown {
    pub fn factor(&self, kind: FactorKind) -> Option<&TrustFactor> {
        self.factors.iter().find(|f| f.kind == kind)
    }

    pub fn has_code(&self, code: ReasonCode) -> bool {
        self.reason_codes.contains(&code)
    }
}

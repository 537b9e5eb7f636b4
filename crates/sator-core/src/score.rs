use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::models::TrustLevel;

/// A score clamped to [0.0, 1.0].
/// Used for trust scores, uncertainty scores and conflict severities.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    /// Scores at or above this are `high` trust.
    pub const HIGH: f64 = 0.85;
    /// Scores at or above this are `medium` trust.
    pub const MEDIUM: f64 = 0.70;

    pub const ZERO: Score = Score(0.0);
    pub const ONE: Score = Score(1.0);

    /// Create a new Score, clamping to [0.0, 1.0]. NaN collapses to 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Complement, `1 - score`.
    pub fn inverse(self) -> Self {
        Self::new(1.0 - self.0)
    }

    /// Trust level bucket using the default thresholds.
    pub fn level(self) -> TrustLevel {
        self.level_with(Self::HIGH, Self::MEDIUM)
    }

    /// Trust level bucket using explicit thresholds.
    pub fn level_with(self, high: f64, medium: f64) -> TrustLevel {
        if self.0 >= high {
            TrustLevel::High
        } else if self.0 >= medium {
            TrustLevel::Medium
        } else {
            TrustLevel::Low
        }
    }

    /// Scaled to an integer percentage, as recorded on anchor submissions.
    pub fn as_percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for Score {
    fn default() -> Self {
        Self(0.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(s: Score) -> Self {
        s.0
    }
}

impl Add for Score {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.0 + rhs.0)
    }
}

impl Sub for Score {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.0 - rhs.0)
    }
}

impl Mul<f64> for Score {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.0 * rhs)
    }
}

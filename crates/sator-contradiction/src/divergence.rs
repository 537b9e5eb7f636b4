//! Normalized divergence and severity banding.

use sator_core::config::ContradictionConfig;
use sator_core::models::SeverityBand;

/// `|a − b| / max(|a|, |b|)`; zero when both readings are zero.
pub fn divergence(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale <= f64::EPSILON {
        return 0.0;
    }
    ((a - b).abs() / scale).min(1.0)
}

/// Band for a divergence, or `None` when it is at or below the low threshold.
pub fn band(divergence: f64, config: &ContradictionConfig) -> Option<SeverityBand> {
    if divergence > config.high_threshold {
        Some(SeverityBand::High)
    } else if divergence > config.medium_threshold {
        Some(SeverityBand::Medium)
    } else if divergence > config.low_threshold {
        Some(SeverityBand::Low)
    } else {
        None
    }
}

/// `min(1, divergence / high_threshold)`.
pub fn severity(divergence: f64, config: &ContradictionConfig) -> f64 {
    if config.high_threshold <= 0.0 {
        return 1.0;
    }
    (divergence / config.high_threshold).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_sensors_land_in_medium_band() {
        let config = ContradictionConfig::default();
        let d = divergence(234.0, 248.0);
        assert!((d - 0.056_451_6).abs() < 1e-6);
        assert_eq!(band(d, &config), Some(SeverityBand::Medium));
        assert!((severity(d, &config) - 0.564_516).abs() < 1e-5);
    }

    #[test]
    fn zero_readings_do_not_diverge() {
        assert_eq!(divergence(0.0, 0.0), 0.0);
        assert_eq!(band(0.0, &ContradictionConfig::default()), None);
    }

    #[test]
    fn opposite_signs_cap_at_one() {
        assert_eq!(divergence(-5.0, 5.0), 1.0);
    }

    #[test]
    fn thresholds_are_exclusive() {
        let config = ContradictionConfig::default();
        assert_eq!(band(0.02, &config), None);
        assert_eq!(band(0.05, &config), Some(SeverityBand::Low));
        assert_eq!(band(0.10, &config), Some(SeverityBand::Medium));
        assert_eq!(band(0.100_001, &config), Some(SeverityBand::High));
    }
}

//! Detector configuration.
//!
//! Immutable per detector instance. Loadable from TOML/JSON with per-field
//! defaults, validated before a detector is built.

use serde::{Deserialize, Serialize};

use crate::DetectError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Standard deviations above the baseline mean for the adaptive threshold.
    #[serde(default = "default_k")]
    pub k: f64,

    /// Envelope release time constant.
    #[serde(default = "default_decay_tau_ms")]
    pub decay_tau_ms: f64,

    /// Minimum `value - baseline_mean` for a sample to count as a peak.
    #[serde(default = "default_min_peak_prominence")]
    pub min_peak_prominence: f64,

    /// Suppression window after a fire. Zero disables suppression.
    #[serde(default = "default_refractory_window_ms")]
    pub refractory_window_ms: f64,

    /// Number of recent samples in the adaptive baseline.
    #[serde(default = "default_baseline_window")]
    pub baseline_window: usize,

    /// Minimum confidence for a peak to fire, in `[0, 1]`.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// When set, replaces the adaptive baseline entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_threshold: Option<f64>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_k() -> f64 {
    2.5
}

fn default_decay_tau_ms() -> f64 {
    150.0
}

fn default_min_peak_prominence() -> f64 {
    0.1
}

fn default_refractory_window_ms() -> f64 {
    120.0
}

fn default_baseline_window() -> usize {
    64
}

fn default_confidence_floor() -> f64 {
    0.2
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            decay_tau_ms: default_decay_tau_ms(),
            min_peak_prominence: default_min_peak_prominence(),
            refractory_window_ms: default_refractory_window_ms(),
            baseline_window: default_baseline_window(),
            confidence_floor: default_confidence_floor(),
            fixed_threshold: None,
        }
    }
}

impl DetectorConfig {
    /// A fixed-threshold config with no prominence, refractory or confidence gating.
    pub fn fixed(threshold: f64) -> Self {
        Self {
            k: 0.0,
            min_peak_prominence: 0.0,
            refractory_window_ms: 0.0,
            confidence_floor: 0.0,
            fixed_threshold: Some(threshold),
            ..Self::default()
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_threshold.is_some()
    }

    /// Reject values outside the documented ranges.
    pub fn validate(&self) -> Result<(), DetectError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> DetectError {
            DetectError::InvalidConfig {
                field,
                reason: reason.into(),
            }
        }

        if !self.k.is_finite() || self.k < 0.0 {
            return Err(invalid("k", format!("must be finite and >= 0, got {}", self.k)));
        }
        if !self.decay_tau_ms.is_finite() || self.decay_tau_ms <= 0.0 {
            return Err(invalid(
                "decay_tau_ms",
                format!("must be finite and > 0, got {}", self.decay_tau_ms),
            ));
        }
        if !self.min_peak_prominence.is_finite() {
            return Err(invalid("min_peak_prominence", "must be finite"));
        }
        if !self.refractory_window_ms.is_finite() || self.refractory_window_ms < 0.0 {
            return Err(invalid(
                "refractory_window_ms",
                format!("must be finite and >= 0, got {}", self.refractory_window_ms),
            ));
        }
        if self.baseline_window == 0 {
            return Err(invalid("baseline_window", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(invalid(
                "confidence_floor",
                format!("must be within [0, 1], got {}", self.confidence_floor),
            ));
        }
        if let Some(t) = self.fixed_threshold {
            if !t.is_finite() {
                return Err(invalid("fixed_threshold", "must be finite when set"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        DetectorConfig::default().validate().unwrap();
        DetectorConfig::fixed(0.5).validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let cases: Vec<(&str, DetectorConfig)> = vec![
            ("k", DetectorConfig { k: -1.0, ..Default::default() }),
            ("decay_tau_ms", DetectorConfig { decay_tau_ms: 0.0, ..Default::default() }),
            ("min_peak_prominence", DetectorConfig { min_peak_prominence: f64::NAN, ..Default::default() }),
            ("refractory_window_ms", DetectorConfig { refractory_window_ms: -5.0, ..Default::default() }),
            ("baseline_window", DetectorConfig { baseline_window: 0, ..Default::default() }),
            ("confidence_floor", DetectorConfig { confidence_floor: 1.5, ..Default::default() }),
            ("fixed_threshold", DetectorConfig { fixed_threshold: Some(f64::INFINITY), ..Default::default() }),
        ];
        for (expected, cfg) in cases {
            match cfg.validate() {
                Err(DetectError::InvalidConfig { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: DetectorConfig = toml::from_str("k = 3.0\nfixed_threshold = 0.75\n").unwrap();
        assert_eq!(cfg.k, 3.0);
        assert_eq!(cfg.fixed_threshold, Some(0.75));
        assert_eq!(cfg.baseline_window, 64);
        assert_eq!(cfg.confidence_floor, 0.2);
    }
}

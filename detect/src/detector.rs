//! The DetectB peak detector.

use uuid::Uuid;

use crate::state::DetectorState;
use crate::{
    Classification, DetectError, DetectorConfig, DetectorMode, DetectorStateView, SignalEvent,
    SIGNAL_SCHEMA,
};

/// Frame interval used when the caller passes a non-positive `dt_ms`.
pub const DEFAULT_DT_MS: f64 = 16.67;

/// Adaptive or fixed-threshold peak detector with a decaying envelope and
/// refractory suppression. Not thread-safe; one logical caller at a time.
#[derive(Clone, Debug)]
pub struct DetectB {
    config: DetectorConfig,
    state: DetectorState,
}

impl DetectB {
    /// Build a detector, failing fast on a misconfiguration.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate()?;
        let state = DetectorState::with_capacity(config.baseline_window);
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Process one sample at the default frame interval.
    pub fn process_frame(&mut self, value: f64, timestamp_ms: f64) -> Result<SignalEvent, DetectError> {
        self.process(value, timestamp_ms, DEFAULT_DT_MS)
    }

    /// Process one sample.
    ///
    /// `dt_ms <= 0` (or non-finite) falls back to [`DEFAULT_DT_MS`]. A
    /// non-finite `value` or `timestamp_ms` is rejected and leaves the state
    /// untouched.
    pub fn process(
        &mut self,
        value: f64,
        timestamp_ms: f64,
        dt_ms: f64,
    ) -> Result<SignalEvent, DetectError> {
        if !value.is_finite() || !timestamp_ms.is_finite() {
            return Err(DetectError::NonFiniteSample {
                value,
                timestamp_ms,
            });
        }
        let dt_ms = if dt_ms.is_finite() && dt_ms > 0.0 {
            dt_ms
        } else {
            DEFAULT_DT_MS
        };
        let cfg = &self.config;
        let state = &mut self.state;

        state.sample_count += 1;

        let (baseline_mean, baseline_std) = match cfg.fixed_threshold {
            Some(threshold) => (threshold, 0.0),
            None => {
                state.push_baseline(value, cfg.baseline_window);
                state.baseline_stats()
            }
        };

        state.envelope = value.max(state.envelope * (-dt_ms / cfg.decay_tau_ms).exp());

        let peak_threshold = cfg
            .fixed_threshold
            .unwrap_or(baseline_mean + cfg.k * baseline_std);
        let prominence = value - baseline_mean;
        let normalized_value = if baseline_std > 0.0 {
            prominence / baseline_std
        } else {
            prominence
        };

        let confidence = if peak_threshold <= 0.0 {
            if value > 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            // NaN only when the baseline itself overflowed.
            let ratio = (value - peak_threshold) / peak_threshold;
            if ratio.is_nan() {
                0.0
            } else {
                ratio.clamp(0.0, 1.0)
            }
        };

        let in_refractory = match state.last_fire_ms {
            Some(last) => {
                cfg.refractory_window_ms > 0.0 && (timestamp_ms - last) < cfg.refractory_window_ms
            }
            None => false,
        };

        let peak_detected = value >= peak_threshold && prominence >= cfg.min_peak_prominence;
        let fires = peak_detected && confidence >= cfg.confidence_floor && !in_refractory;

        if fires {
            state.last_fire_ms = Some(timestamp_ms);
            state.fire_count += 1;
            tracing::trace!(
                timestamp_ms,
                value,
                peak_threshold,
                confidence,
                fire_count = state.fire_count,
                "detector fired"
            );
        }

        let classification = if fires {
            Classification::B
        } else if peak_detected {
            Classification::A
        } else {
            Classification::C
        };

        Ok(SignalEvent {
            schema: SIGNAL_SCHEMA.to_string(),
            id: Uuid::new_v4(),
            timestamp_ms,
            raw_value: value,
            normalized_value,
            baseline_mean,
            baseline_std,
            peak_threshold,
            envelope: state.envelope,
            prominence,
            peak_detected,
            detect_b: fires,
            in_refractory,
            confidence,
            classification,
            sample_count: state.sample_count,
            fire_count: state.fire_count,
        })
    }

    /// Return to the initial state. Required between unrelated streams.
    pub fn reset(&mut self) {
        tracing::debug!(
            samples = self.state.sample_count,
            fires = self.state.fire_count,
            "detector reset"
        );
        self.state.clear();
    }

    /// READY, or REFRACTORY until `last_fire_ms + refractory_window_ms`.
    pub fn mode_at(&self, timestamp_ms: f64) -> DetectorMode {
        match self.state.last_fire_ms {
            Some(last) if self.config.refractory_window_ms > 0.0 => {
                let until_ms = last + self.config.refractory_window_ms;
                if timestamp_ms < until_ms {
                    DetectorMode::Refractory { until_ms }
                } else {
                    DetectorMode::Ready
                }
            }
            _ => DetectorMode::Ready,
        }
    }

    pub fn state(&self) -> DetectorStateView {
        DetectorStateView {
            baseline_len: self.state.baseline.len(),
            last_fire_ms: self.state.last_fire_ms,
            envelope: self.state.envelope,
            sample_count: self.state.sample_count,
            fire_count: self.state.fire_count,
        }
    }
}

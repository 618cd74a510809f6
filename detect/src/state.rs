//! Mutable detector state.

use std::collections::VecDeque;

use serde::Serialize;

/// Cross-sample mode of the detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DetectorMode {
    Ready,
    Refractory { until_ms: f64 },
}

/// State owned by exactly one detector.
#[derive(Clone, Debug, Default)]
pub(crate) struct DetectorState {
    pub baseline: VecDeque<f64>,
    pub last_fire_ms: Option<f64>,
    pub envelope: f64,
    pub sample_count: u64,
    pub fire_count: u64,
}

impl DetectorState {
    pub fn with_capacity(window: usize) -> Self {
        Self {
            baseline: VecDeque::with_capacity(window),
            ..Self::default()
        }
    }

    /// Push into the bounded FIFO, evicting the oldest beyond `window`.
    pub fn push_baseline(&mut self, value: f64, window: usize) {
        self.baseline.push_back(value);
        while self.baseline.len() > window {
            self.baseline.pop_front();
        }
    }

    /// Mean and population standard deviation of the FIFO.
    ///
    /// With fewer than two samples the std is 1.0 so downstream division
    /// and thresholds stay defined.
    pub fn baseline_stats(&self) -> (f64, f64) {
        let n = self.baseline.len();
        if n == 0 {
            return (0.0, 1.0);
        }
        let mean = self.baseline.iter().sum::<f64>() / n as f64;
        if n < 2 {
            return (mean, 1.0);
        }
        let variance = self
            .baseline
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        (mean, variance.sqrt())
    }

    pub fn clear(&mut self) {
        self.baseline.clear();
        self.last_fire_ms = None;
        self.envelope = 0.0;
        self.sample_count = 0;
        self.fire_count = 0;
    }
}

/// Read-only view of a detector's state, for audits.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectorStateView {
    pub baseline_len: usize,
    pub last_fire_ms: Option<f64>,
    pub envelope: f64,
    pub sample_count: u64,
    pub fire_count: u64,
}

//! The `signal_event/1.0` record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SIGNAL_SCHEMA: &str = "signal_event/1.0";

/// Per-sample classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Peak present but suppressed (confidence floor or refractory).
    A,
    /// Fire.
    B,
    /// No peak.
    C,
}

/// Immutable record of one processed sample, every intermediate included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub schema: String,
    pub id: Uuid,
    pub timestamp_ms: f64,
    pub raw_value: f64,
    pub normalized_value: f64,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    pub peak_threshold: f64,
    pub envelope: f64,
    pub prominence: f64,
    pub peak_detected: bool,
    #[serde(rename = "detect_B")]
    pub detect_b: bool,
    pub in_refractory: bool,
    pub confidence: f64,
    pub classification: Classification,
    pub sample_count: u64,
    pub fire_count: u64,
}

impl SignalEvent {
    pub fn fired(&self) -> bool {
        self.detect_b
    }

    /// Field names of the serialized record.
    pub const FIELDS: [&'static str; 17] = [
        "schema",
        "id",
        "timestamp_ms",
        "raw_value",
        "normalized_value",
        "baseline_mean",
        "baseline_std",
        "peak_threshold",
        "envelope",
        "prominence",
        "peak_detected",
        "detect_B",
        "in_refractory",
        "confidence",
        "classification",
        "sample_count",
        "fire_count",
    ];
}

//! DetectB: classify a scalar series into fire / no-fire events.
//!
//! Each sample is classified as:
//! - **B**: fire
//! - **A**: a structural peak, suppressed by confidence or refractory
//! - **C**: no peak
//!
//! Between samples the detector is either READY or REFRACTORY (until
//! `last_fire_ms + refractory_window_ms`). A detector instance owns its state
//! exclusively; concurrent streams need separate instances, and unrelated
//! streams sharing one instance must call [`DetectB::reset`] in between.

pub mod adapter;
pub mod config;
pub mod detector;
pub mod error;
pub mod signal;
pub mod state;

pub use adapter::{AdaptedSignal, DomainRecord, RoundRecord, SignalAdapter};
pub use config::DetectorConfig;
pub use detector::{DetectB, DEFAULT_DT_MS};
pub use error::DetectError;
pub use signal::{Classification, SignalEvent, SIGNAL_SCHEMA};
pub use state::{DetectorMode, DetectorStateView};

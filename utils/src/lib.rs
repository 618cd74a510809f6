//! Shared utilities for the event spine workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid detector config: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("non-finite sample: value={value}, timestamp_ms={timestamp_ms}")]
    NonFiniteSample { value: f64, timestamp_ms: f64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid event: {0}")]
    InvalidEvent(#[from] spine_types::TypesError),

    #[error("malformed spine line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("append of '{event_type}' denied: {reason}")]
    Denied { event_type: String, reason: String },
}

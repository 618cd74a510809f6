//! Error type for parsing and constructing the shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid hash length: expected 64 hex characters, got {0}")]
    InvalidHashLength(usize),

    #[error("invalid hex in hash: {0}")]
    InvalidHex(String),

    #[error("expected a JSON object for {field}")]
    NotAnObject { field: &'static str },
}

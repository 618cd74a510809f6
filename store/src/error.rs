use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("invalid node {id}: attrs must be a JSON object")]
    InvalidAttrs { id: String },

    #[error("snapshot digest mismatch: recorded {recorded}, recomputed {recomputed}")]
    SnapshotMismatch { recorded: String, recomputed: String },
}

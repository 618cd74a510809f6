//! Object store with a canonical, order-independent projection.
//!
//! Any sequence of upserts that converges to the same `{id -> node}` mapping
//! projects to byte-identical output and the same `store_sha`, regardless of
//! call order. Reproducibility checks compare runs through this digest.

pub mod error;
pub mod node;
pub mod object;
pub mod snapshot;

pub use error::StoreError;
pub use node::NodeStore;
pub use object::ObjectStore;
pub use snapshot::StoreSnapshot;

//! Node storage trait.

use crate::StoreError;
use spine_types::{Hash256, Node};

/// Keyed node storage with a canonical projection.
pub trait NodeStore {
    /// Insert or overwrite the node with the same `id`. Last write wins.
    fn upsert(&mut self, node: Node) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<&Node, StoreError>;
    fn remove(&mut self, id: &str) -> Result<Node, StoreError>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn exists(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    /// All nodes ordered by `id`.
    fn project(&self) -> Vec<Node>;

    /// SHA-256 of the canonical JSON of [`project`](Self::project).
    fn store_sha(&self) -> Hash256;
}

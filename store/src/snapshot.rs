//! Serializable store snapshots.
//!
//! A snapshot carries its own digest so a reader can confirm the nodes it
//! loaded are the nodes that were projected.

use serde::{Deserialize, Serialize};
use spine_types::{Hash256, Node};

use crate::{NodeStore, ObjectStore, StoreError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub nodes: Vec<Node>,
    pub store_sha: Hash256,
}

impl StoreSnapshot {
    /// Rebuild the store and check the recomputed digest against the recorded one.
    pub fn restore(self) -> Result<ObjectStore, StoreError> {
        let recorded = self.store_sha;
        let store = ObjectStore::from_nodes(self.nodes)?;
        let recomputed = store.store_sha();
        if recomputed != recorded {
            return Err(StoreError::SnapshotMismatch {
                recorded: recorded.to_hex(),
                recomputed: recomputed.to_hex(),
            });
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_restores_same_digest() {
        let store = ObjectStore::from_nodes([
            Node::new("run", "r1", json!({"status": "done"})).unwrap(),
            Node::new("run", "r2", json!({"status": "running"})).unwrap(),
        ])
        .unwrap();
        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let snap: StoreSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap.restore().unwrap().store_sha(), store.store_sha());
    }

    #[test]
    fn edited_snapshot_is_rejected() {
        let store = ObjectStore::from_nodes([Node::new("run", "r1", json!({"status": "done"})).unwrap()]).unwrap();
        let mut snap = store.snapshot();
        snap.nodes[0].attrs = json!({"status": "failed"});
        assert!(matches!(snap.restore(), Err(StoreError::SnapshotMismatch { .. })));
    }
}

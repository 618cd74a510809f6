//! In-memory object store.

use std::collections::BTreeMap;

use serde_json::Value;
use spine_crypto::{canonical_json, sha256};
use spine_types::{Hash256, Node};

use crate::{NodeStore, StoreError, StoreSnapshot};

/// Nodes keyed by `id`. The `BTreeMap` keeps projection order fixed by key.
#[derive(Clone, Debug, Default)]
pub struct ObjectStore {
    nodes: BTreeMap<String, Node>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store by upserting `nodes` in order.
    pub fn from_nodes<I>(nodes: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut store = Self::new();
        for node in nodes {
            store.upsert(node)?;
        }
        Ok(store)
    }

    /// The projection as one canonical JSON array.
    pub fn canonical_projection(&self) -> String {
        let list: Vec<Value> = self.nodes.values().map(node_value).collect();
        canonical_json(&Value::Array(list))
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            nodes: self.project(),
            store_sha: self.store_sha(),
        }
    }

    /// Nodes of one type, ordered by `id`.
    pub fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.kind == kind)
    }
}

fn node_value(node: &Node) -> Value {
    serde_json::json!({
        "type": node.kind,
        "id": node.id,
        "attrs": node.attrs,
    })
}

impl NodeStore for ObjectStore {
    fn upsert(&mut self, node: Node) -> Result<(), StoreError> {
        if !node.attrs.is_object() {
            return Err(StoreError::InvalidAttrs { id: node.id });
        }
        tracing::debug!(id = %node.id, kind = %node.kind, "node upserted");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<&Node, StoreError> {
        self.nodes
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn remove(&mut self, id: &str) -> Result<Node, StoreError> {
        self.nodes
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn project(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    fn store_sha(&self) -> Hash256 {
        sha256(self.canonical_projection().as_bytes())
    }
}

//! Typed nodes held by the object store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TypesError;

/// A typed node. `id` is unique within a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub attrs: Value,
}

impl Node {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, attrs: Value) -> Result<Self, TypesError> {
        if !attrs.is_object() {
            return Err(TypesError::NotAnObject { field: "attrs" });
        }
        Ok(Self {
            kind: kind.into(),
            id: id.into(),
            attrs,
        })
    }
}

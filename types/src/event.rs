//! Spine events.
//!
//! One event is one line of the spine: `{"ts", "type", "data", "chain_hash"}`.
//! The chain hash covers everything except itself, so the hashed portion is
//! exposed separately as [`EventBody`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Hash256, Timestamp, TypesError};

/// The hashed portion of an event: everything except `chain_hash`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventBody {
    pub ts: Timestamp,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl EventBody {
    /// Build a body, rejecting payloads that are not JSON objects.
    pub fn new(ts: Timestamp, kind: impl Into<String>, data: Value) -> Result<Self, TypesError> {
        if !data.is_object() {
            return Err(TypesError::NotAnObject { field: "data" });
        }
        Ok(Self {
            ts,
            kind: kind.into(),
            data,
        })
    }

    /// The body as a JSON value with exactly the keys `ts`, `type`, `data`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("data".into(), self.data.clone());
        map.insert("ts".into(), serde_json::json!(self.ts.as_secs_f64()));
        map.insert("type".into(), Value::String(self.kind.clone()));
        Value::Object(map)
    }

    pub fn seal(self, chain_hash: Hash256) -> Event {
        Event {
            ts: self.ts,
            kind: self.kind,
            data: self.data,
            chain_hash,
        }
    }
}

/// A sealed spine event. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: Timestamp,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub chain_hash: Hash256,
}

impl Event {
    pub fn body(&self) -> EventBody {
        EventBody {
            ts: self.ts,
            kind: self.kind.clone(),
            data: self.data.clone(),
        }
    }

    /// Same as `self.body().to_value()` without the intermediate clone of the body.
    pub fn body_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("data".into(), self.data.clone());
        map.insert("ts".into(), serde_json::json!(self.ts.as_secs_f64()));
        map.insert("type".into(), Value::String(self.kind.clone()));
        Value::Object(map)
    }
}

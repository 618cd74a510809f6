//! Nullable append policy that denies a fixed set of event types.

use serde_json::Value;
use spine_types::{AppendPolicy, PolicyDecision};
use std::collections::HashSet;

/// Denies any event whose type is in the configured set.
#[derive(Default)]
pub struct DenyTypes {
    denied: HashSet<String>,
}

impl DenyTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denied: types.into_iter().map(Into::into).collect(),
        }
    }
}

impl AppendPolicy for DenyTypes {
    fn check(&self, event_type: &str, _payload: &Value) -> PolicyDecision {
        if self.denied.contains(event_type) {
            PolicyDecision::deny(format!("event type '{event_type}' is not permitted"))
        } else {
            PolicyDecision::Allowed
        }
    }
}

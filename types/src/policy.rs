//! Tagged capability decision.
//!
//! Guards in front of the spine answer with a value instead of raising, so
//! the contract reads the same from any caller.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum PolicyDecision {
    Allowed,
    Denied(String),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allowed)
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        PolicyDecision::Denied(reason.into())
    }
}

/// Guard consulted before an event is appended.
pub trait AppendPolicy {
    fn check(&self, event_type: &str, payload: &serde_json::Value) -> PolicyDecision;
}

/// Permits every append.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl AppendPolicy for AllowAll {
    fn check(&self, _event_type: &str, _payload: &serde_json::Value) -> PolicyDecision {
        PolicyDecision::Allowed
    }
}

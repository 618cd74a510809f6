//! HashChain: the folding function behind the spine and manifest digests.
//!
//! `link_i = SHA256(hex(link_{i-1}) || canonical(body_i))`, starting from
//! [`GENESIS`]. The previous link enters as its 64-character lowercase hex
//! text, not as raw bytes.

use serde_json::Value;
use spine_types::{Event, Hash256};

use crate::{canonical_json, sha256, sha256_multi};

/// The link that precedes the first event: 64 hex zeros.
pub const GENESIS: Hash256 = Hash256::ZERO;

/// Compute the next chain link for `body` (an event without its `chain_hash`).
pub fn chain_hash(prev: &Hash256, body: &Value) -> Hash256 {
    let prev_hex = prev.to_hex();
    let canonical = canonical_json(body);
    sha256_multi(&[prev_hex.as_bytes(), canonical.as_bytes()])
}

/// Fold a sequence of event bodies from genesis. Empty input yields [`GENESIS`].
pub fn fold_bodies<'a, I>(bodies: I) -> Hash256
where
    I: IntoIterator<Item = &'a Value>,
{
    bodies
        .into_iter()
        .fold(GENESIS, |prev, body| chain_hash(&prev, body))
}

/// Fold sealed events from genesis, ignoring the `chain_hash` each one carries.
pub fn fold_chain(events: &[Event]) -> Hash256 {
    events
        .iter()
        .fold(GENESIS, |prev, event| chain_hash(&prev, &event.body_value()))
}

/// Flat digest of an event list: SHA-256 of the canonical JSON array of the
/// full events, `chain_hash` included. Needs nothing but the events.
pub fn events_digest(events: &[Event]) -> Hash256 {
    let list: Vec<Value> = events
        .iter()
        .map(|event| {
            let mut value = event.body_value();
            if let Value::Object(map) = &mut value {
                map.insert("chain_hash".into(), Value::String(event.chain_hash.to_hex()));
            }
            value
        })
        .collect();
    sha256(canonical_json(&Value::Array(list)).as_bytes())
}

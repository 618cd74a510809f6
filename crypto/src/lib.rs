//! Hashing primitives for the event spine.
//!
//! - **SHA-256** for every digest (chain links, file hashes, store digests)
//! - **Canonical JSON**: sorted keys, compact separators
//! - **HashChain**: `H(prev_hex || canonical(body))` folded from an all-zero genesis

pub mod canonical;
pub mod chain;
pub mod hash;

pub use canonical::{canonical_json, canonicalize, to_canonical_json};
pub use chain::{chain_hash, events_digest, fold_bodies, fold_chain, GENESIS};
pub use hash::{sha256, sha256_multi, Sha256Writer};

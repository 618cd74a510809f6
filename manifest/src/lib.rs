//! Run manifests for bundle-level tamper detection.
//!
//! A manifest binds two things: a specific event set (`root_hash`, the
//! HashChain fold over the supplied events, plus the flat `events_digest`)
//! and the bytes of every file in a run directory. The `root_hash` is a
//! bundle summary; it is not required to equal the live spine's head.

pub mod builder;
pub mod error;
pub mod manifest;
pub mod tree;
pub mod verifier;

pub use builder::ManifestBuilder;
pub use error::ManifestError;
pub use manifest::{Manifest, MANIFEST_FILE, MANIFEST_TMP_FILE};
pub use tree::hash_tree;
pub use verifier::{ManifestFailure, ManifestVerdict, ManifestVerifier};

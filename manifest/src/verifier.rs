//! Read-only manifest verification.

use std::fmt;
use std::io;
use std::path::Path;

use spine_crypto::{events_digest, fold_chain};
use spine_types::Event;

use crate::tree::hash_file;
use crate::{Manifest, ManifestError};

/// One reason a run or bundle does not match its manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManifestFailure {
    MissingFile(String),
    HashMismatch(String),
    EventCountMismatch { manifest: u64, bundle: u64 },
    RootHashMismatch,
    EventsDigestMismatch,
}

impl fmt::Display for ManifestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestFailure::MissingFile(path) => write!(f, "missing file: {path}"),
            ManifestFailure::HashMismatch(path) => write!(f, "hash mismatch: {path}"),
            ManifestFailure::EventCountMismatch { manifest, bundle } => {
                write!(f, "event count mismatch: manifest {manifest}, bundle {bundle}")
            }
            ManifestFailure::RootHashMismatch => f.write_str("root hash mismatch"),
            ManifestFailure::EventsDigestMismatch => f.write_str("events digest mismatch"),
        }
    }
}

/// Every failure found, in deterministic order. Empty means verified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestVerdict {
    pub failures: Vec<ManifestFailure>,
}

impl ManifestVerdict {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// `"OK"`, or the first failure.
    pub fn message(&self) -> String {
        match self.failures.first() {
            None => "OK".to_string(),
            Some(failure) => failure.to_string(),
        }
    }

    pub fn into_parts(self) -> (bool, String) {
        (self.is_ok(), self.message())
    }
}

pub struct ManifestVerifier;

impl ManifestVerifier {
    /// Check every file recorded in `run_dir/manifest.json`.
    ///
    /// Entries are checked in lexicographic path order and all of them are
    /// checked; the verdict's message is the first failure. An unreadable or
    /// unsafe manifest is an error rather than a verdict.
    pub fn verify(run_dir: &Path) -> Result<ManifestVerdict, ManifestError> {
        let manifest = Manifest::load(run_dir)?;
        let mut verdict = ManifestVerdict::default();

        for (relpath, expected) in &manifest.files {
            let path = run_dir.join(relpath);
            let is_file = match path.symlink_metadata() {
                Ok(meta) => meta.is_file(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(ManifestError::io(&path, e)),
            };
            if !is_file {
                verdict.failures.push(ManifestFailure::MissingFile(relpath.clone()));
                continue;
            }
            if hash_file(&path)? != *expected {
                verdict.failures.push(ManifestFailure::HashMismatch(relpath.clone()));
            }
        }

        if verdict.is_ok() {
            tracing::info!(run_dir = %run_dir.display(), run_id = %manifest.run_id, files = manifest.files.len(), "manifest verified");
        } else {
            tracing::warn!(
                run_dir = %run_dir.display(),
                run_id = %manifest.run_id,
                failures = verdict.failures.len(),
                first = %verdict.message(),
                "manifest verification failed"
            );
        }
        Ok(verdict)
    }

    /// Check a published event list against a manifest without touching disk.
    ///
    /// Recomputes the event count, the chain fold (`root_hash`) and, when the
    /// manifest carries one, the flat `events_digest`.
    pub fn verify_bundle(events: &[Event], manifest: &Manifest) -> ManifestVerdict {
        let mut verdict = ManifestVerdict::default();
        let count = events.len() as u64;
        if count != manifest.event_count {
            verdict.failures.push(ManifestFailure::EventCountMismatch {
                manifest: manifest.event_count,
                bundle: count,
            });
        }
        if fold_chain(events) != manifest.root_hash {
            verdict.failures.push(ManifestFailure::RootHashMismatch);
        }
        if let Some(expected) = manifest.events_digest {
            if events_digest(events) != expected {
                verdict.failures.push(ManifestFailure::EventsDigestMismatch);
            }
        }
        verdict
    }
}

//! Manifest construction.

use std::fs;
use std::path::Path;

use spine_crypto::{events_digest, fold_chain};
use spine_types::{Clock, Event, SystemClock};

use crate::{hash_tree, Manifest, ManifestError};

/// Builds manifests for sealed runs. The clock stamps `created_at`.
pub struct ManifestBuilder<C: Clock = SystemClock> {
    clock: C,
}

impl ManifestBuilder<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for ManifestBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ManifestBuilder<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Digest `events` and hash every file under `run_dir`. Writes nothing.
    pub fn build(
        &self,
        run_id: &str,
        run_dir: &Path,
        events: &[Event],
    ) -> Result<Manifest, ManifestError> {
        let files = hash_tree(run_dir)?;
        Ok(Manifest {
            run_id: run_id.to_string(),
            created_at: self.clock.now(),
            event_count: events.len() as u64,
            root_hash: fold_chain(events),
            events_digest: Some(events_digest(events)),
            files,
        })
    }

    /// Build the manifest and write it to `run_dir/manifest.json`.
    ///
    /// Creates `run_dir` if it does not exist yet.
    pub fn seal(
        &self,
        run_id: &str,
        run_dir: &Path,
        events: &[Event],
    ) -> Result<Manifest, ManifestError> {
        fs::create_dir_all(run_dir).map_err(|e| ManifestError::io(run_dir, e))?;
        let manifest = self.build(run_id, run_dir, events)?;
        manifest.write(run_dir)?;
        tracing::info!(
            run_id,
            run_dir = %run_dir.display(),
            events = manifest.event_count,
            files = manifest.files.len(),
            root_hash = %manifest.root_hash,
            "run sealed"
        );
        Ok(manifest)
    }
}

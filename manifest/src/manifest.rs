//! The manifest document and its on-disk form.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use spine_types::{Hash256, Timestamp};

use crate::ManifestError;

/// File name of the manifest inside a run directory. Excluded from `files`.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Staging name used while writing the manifest. Never part of a run's files.
pub const MANIFEST_TMP_FILE: &str = ".manifest.json.tmp";

/// Sealed description of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: String,
    pub created_at: Timestamp,
    /// Number of events folded into `root_hash`.
    #[serde(rename = "spine_events")]
    pub event_count: u64,
    /// HashChain fold of the supplied events, from genesis.
    pub root_hash: Hash256,
    /// SHA-256 of the canonical JSON list of the full events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_digest: Option<Hash256>,
    /// Relative path (`/`-separated) to SHA-256 of the file's bytes.
    pub files: BTreeMap<String, Hash256>,
}

impl Manifest {
    /// Load `manifest.json` from `run_dir`, rejecting entries that leave the directory.
    pub fn load(run_dir: &Path) -> Result<Self, ManifestError> {
        let path = run_dir.join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|e| ManifestError::io(&path, e))?;
        let manifest: Manifest = serde_json::from_slice(&bytes)?;
        for relpath in manifest.files.keys() {
            if !is_contained(relpath) {
                return Err(ManifestError::UnsafePath(relpath.clone()));
            }
        }
        Ok(manifest)
    }

    /// Write this manifest as pretty JSON to `run_dir/manifest.json`.
    ///
    /// Goes through a sibling temp file and a rename so readers never see a
    /// half-written manifest.
    pub fn write(&self, run_dir: &Path) -> Result<(), ManifestError> {
        let path = run_dir.join(MANIFEST_FILE);
        let tmp = run_dir.join(MANIFEST_TMP_FILE);
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        fs::write(&tmp, &bytes).map_err(|e| ManifestError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| ManifestError::io(&path, e))?;
        Ok(())
    }
}

fn is_contained(relpath: &str) -> bool {
    !relpath.is_empty()
        && Path::new(relpath)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

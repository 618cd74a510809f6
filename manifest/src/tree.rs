//! Content hashes for every regular file under a run directory.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use spine_crypto::Sha256Writer;
use spine_types::Hash256;

use crate::{ManifestError, MANIFEST_FILE, MANIFEST_TMP_FILE};

/// Hash every regular file under `run_dir`, keyed by `/`-separated relative path.
///
/// Symlinks and other non-regular entries are skipped. The top-level
/// `manifest.json` and its staging file are excluded.
pub fn hash_tree(run_dir: &Path) -> Result<BTreeMap<String, Hash256>, ManifestError> {
    if !run_dir.is_dir() {
        return Err(ManifestError::MissingRunDir(run_dir.to_path_buf()));
    }
    let mut files = BTreeMap::new();
    walk(run_dir, "", &mut files)?;
    files.remove(MANIFEST_FILE);
    files.remove(MANIFEST_TMP_FILE);
    Ok(files)
}

fn walk(
    dir: &Path,
    prefix: &str,
    files: &mut BTreeMap<String, Hash256>,
) -> Result<(), ManifestError> {
    let entries = fs::read_dir(dir).map_err(|e| ManifestError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ManifestError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ManifestError::io(&path, e))?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| ManifestError::NonUtf8Path(path.clone()))?;
        let relpath = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        if file_type.is_dir() {
            walk(&path, &relpath, files)?;
        } else if file_type.is_file() {
            files.insert(relpath, hash_file(&path)?);
        }
    }
    Ok(())
}

/// SHA-256 of a file's raw bytes, streamed.
pub fn hash_file(path: &Path) -> Result<Hash256, ManifestError> {
    let mut file = File::open(path).map_err(|e| ManifestError::io(path, e))?;
    let mut hasher = Sha256Writer::new();
    io::copy(&mut file, &mut hasher).map_err(|e| ManifestError::io(path, e))?;
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_crypto::sha256;

    #[test]
    fn nested_files_use_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("logs/deep")).unwrap();
        fs::write(dir.path().join("top.txt"), b"top").unwrap();
        fs::write(dir.path().join("logs/deep/x.bin"), [0u8, 1, 2]).unwrap();

        let files = hash_tree(dir.path()).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["logs/deep/x.bin", "top.txt"]);
        assert_eq!(files["top.txt"], sha256(b"top"));
    }

    #[test]
    fn only_top_level_manifest_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), b"{}").unwrap();
        fs::write(dir.path().join("sub").join(MANIFEST_FILE), b"{}").unwrap();

        let files = hash_tree(dir.path()).unwrap();
        assert!(!files.contains_key(MANIFEST_FILE));
        assert!(files.contains_key("sub/manifest.json"));
    }

    #[test]
    fn leftover_staging_file_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_TMP_FILE), b"{\"run_id\":").unwrap();
        fs::write(dir.path().join("out.csv"), b"a\n").unwrap();

        let files = hash_tree(dir.path()).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["out.csv"]);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            hash_tree(&dir.path().join("nope")),
            Err(ManifestError::MissingRunDir(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), b"r").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();
        let files = hash_tree(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains_key("real.txt"));
    }
}

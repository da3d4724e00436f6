use crate::error::MirrorError;
use std::collections::BTreeSet;
use std::path::Path;

/// Names of the entries already present in `dir`, creating it when missing.
///
/// Every entry counts, whatever its kind or suffix, so files placed by hand are never
/// downloaded over.
pub fn scan_local_inventory(dir: &Path) -> Result<BTreeSet<String>, MirrorError> {
    std::fs::create_dir_all(dir).map_err(|e| MirrorError::DirectoryCreation {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let entries = std::fs::read_dir(dir).map_err(|e| MirrorError::DirectoryRead {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| MirrorError::DirectoryRead {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(name) => {
                tracing::warn!(dir = %dir.display(), name = ?name, "Ignoring non UTF-8 entry");
            }
        }
    }
    Ok(names)
}

/// Remote names that are not present locally, by exact name.
pub fn pending_files(remote: &BTreeSet<String>, local: &BTreeSet<String>) -> BTreeSet<String> {
    remote.difference(local).cloned().collect()
}

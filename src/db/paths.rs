//! Conversion between stored (base-relative) and absolute paths.

use std::path::{Path, PathBuf};

use super::Database;

impl Database {
    /// Form in which `path` is written to the ledger
    pub(crate) async fn to_stored_path(&self, path: &Path) -> String {
        to_stored(&self.base_dir, &resolve_on_disk(path).await)
    }

    /// Absolute form of a path read from the ledger
    pub(crate) fn to_absolute_path(&self, stored: &str) -> PathBuf {
        resolve_stored(&self.base_dir, stored)
    }
}

/// Path relative to `base` when `resolved` lies underneath it, otherwise
/// `resolved` verbatim.
///
/// Both paths must already be symlink-free. The comparison is a
/// component-wise prefix check, never a string prefix check.
pub(crate) fn to_stored(base: &Path, resolved: &Path) -> String {
    match resolved.strip_prefix(base) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => resolved.to_string_lossy().into_owned(),
    }
}

/// Inverse of [`to_stored`]
pub(crate) fn resolve_stored(base: &Path, stored: &str) -> PathBuf {
    let path = Path::new(stored);
    if path.is_absolute() {
        path.to_path_buf()
    } else if stored.is_empty() {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Canonicalize `path`, tolerating a final component that does not exist yet
pub(crate) async fn resolve_on_disk(path: &Path) -> PathBuf {
    if let Ok(canonical) = tokio::fs::canonicalize(path).await {
        return canonical;
    }

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match tokio::fs::canonicalize(parent).await {
            Ok(parent) => parent.join(name),
            Err(_) => absolute,
        },
        _ => absolute,
    }
}

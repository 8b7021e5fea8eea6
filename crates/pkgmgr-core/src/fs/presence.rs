//! Presence checks and directory creation.

use std::path::{Path, PathBuf};

use crate::error::{PackageError, Result};

/// Whether `root/canonical_name` exists.
pub fn exists(root: &Path, canonical_name: &str) -> bool {
    root.join(canonical_name).exists()
}

/// Create `path` (and parents) if missing and return its absolute form.
pub async fn ensure_dir(path: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| PackageError::io(path, e))?;
    tokio::fs::canonicalize(path)
        .await
        .map_err(|e| PackageError::io(path, e))
}

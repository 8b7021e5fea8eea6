//! Guarded recursive deletion of package directories.
//!
//! Only directories whose final path segment starts with the managed skill
//! prefix may be removed. The check looks at the resolved directory name,
//! never at the reference the caller typed.

use std::path::Path;

use crate::error::{PackageError, Result};

#[derive(Debug, Clone)]
pub struct SafeRemover {
    prefix: String,
}

impl SafeRemover {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Whether `path` names a directory this remover may delete.
    pub fn is_removable(&self, path: &Path) -> bool {
        if self.prefix.is_empty() {
            return false;
        }
        // `file_name` skips a trailing `/` or `.`, so `root/` and `root/.`
        // would report the root's own name. Inspect the literal last segment.
        let raw = path.to_string_lossy();
        let last = raw
            .rsplit(|c| c == '/' || c == std::path::MAIN_SEPARATOR)
            .next()
            .unwrap_or_default();
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == last && name.starts_with(&self.prefix))
    }

    /// Recursively delete `path`.
    ///
    /// Fails with [`PackageError::UnsafeDelete`] before touching the
    /// filesystem when the final segment lacks the managed prefix.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        if !self.is_removable(path) {
            return Err(PackageError::UnsafeDelete {
                path: path.to_path_buf(),
            });
        }
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| PackageError::io(path, e))
    }
}

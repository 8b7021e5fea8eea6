//! Listing of package directories under a target root.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PackageError, Result};
use crate::git::head_commit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub name: String,
    pub path: PathBuf,
    /// Carries the managed skill prefix and may be deleted by reclones
    pub managed: bool,
    pub commit: Option<String>,
}

/// Directories under `root`, sorted by name. A missing root lists nothing.
pub fn list_installed(root: &Path, skill_prefix: &str) -> Result<Vec<InstalledPackage>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut packages = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| PackageError::io(root, e))? {
        let entry = entry.map_err(|e| PackageError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        packages.push(InstalledPackage {
            managed: !skill_prefix.is_empty() && name.starts_with(skill_prefix),
            commit: head_commit(&path),
            name,
            path,
        });
    }
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(packages)
}

//! Error taxonomy for package operations.
//!
//! Resolution is total and has no variant here.

use std::path::PathBuf;

/// Failure of a single install, update or remove step.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// Directory creation or removal failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remover refused to touch a directory that is not a managed package.
    #[error("Refusing to delete non-standard directory {}", .path.display())]
    UnsafeDelete { path: PathBuf },

    /// The reference resolved to a name that is not a single directory
    /// below the target root (empty, `.`, `..`).
    #[error("Reference '{reference}' does not resolve to a package directory (got '{name}')")]
    InvalidName { reference: String, name: String },

    /// Clone or pull failed, including timeouts.
    #[error("Failed to fetch {location}: {reason}")]
    Fetch { location: String, reason: String },

    /// The dependency installer exited unsuccessfully or timed out.
    #[error("Dependency installation failed in {}: {reason}", .path.display())]
    DependencyInstall { path: PathBuf, reason: String },
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;

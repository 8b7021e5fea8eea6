//! pkgmgr Core Library
//!
//! Resolves loosely specified skill references into fetch locations and
//! canonical directory names, and keeps a cloned, dependency-installed copy
//! of each package under a target root.

pub mod config;
pub mod dependencies;
pub mod error;
pub mod fs;
pub mod git;
pub mod inventory;
pub mod orchestration;
pub mod progress;
pub mod resolve;
pub mod runner;

pub use error::{PackageError, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConfigStore, DependencySettings, FetchSettings, InstallSettings, PkgmgrConfig,
        ResolverSettings, UpdateStrategy,
    };

    // Errors
    pub use crate::error::{PackageError, Result};

    // Resolution
    pub use crate::resolve::{ResolvedPackage, Resolver, resolve};

    // Orchestration
    pub use crate::orchestration::{InstallAction, LoadOutcome, PackageManager};

    // Collaborators
    pub use crate::progress::{ProgressReporter, TracingReporter};
    pub use crate::runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner, RunError};
}

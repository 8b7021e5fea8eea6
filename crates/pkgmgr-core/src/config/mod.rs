//! Configuration management
//!
//! A single `pkgmgr.toml` controls how references resolve, how packages are
//! fetched and refreshed, and which dependency installer runs afterwards.

pub mod schema;
pub mod store;

pub use schema::{
    DependencySettings, FetchSettings, InstallSettings, PkgmgrConfig, ResolverSettings,
    UpdateStrategy,
};
pub use store::ConfigStore;

//! Configuration schema for pkgmgr.toml

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Root configuration structure for pkgmgr.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgmgrConfig {
    #[serde(default)]
    pub resolver: ResolverSettings,

    #[serde(default)]
    pub fetch: FetchSettings,

    #[serde(default)]
    pub dependencies: DependencySettings,

    #[serde(default)]
    pub install: InstallSettings,
}

impl PkgmgrConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse pkgmgr.toml")
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }
}

/// Defaults used when expanding shorthand references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Host assumed for `org/repo` shorthand
    #[serde(default = "default_host")]
    pub default_host: String,

    /// Organization assumed for bare skill names
    #[serde(default = "default_org")]
    pub default_org: String,

    /// Reserved prefix of managed skill packages
    #[serde(default = "default_skill_prefix")]
    pub skill_prefix: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            default_org: default_org(),
            skill_prefix: default_skill_prefix(),
        }
    }
}

fn default_host() -> String {
    "github.com".to_string()
}

fn default_org() -> String {
    "everlifeai".to_string()
}

fn default_skill_prefix() -> String {
    "eskill-".to_string()
}

/// How an existing package is refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// `git pull --rebase` in place. Keeps local history.
    #[default]
    Rebase,
    /// Delete the directory and clone again. Guarantees a clean tree.
    Reclone,
}

impl UpdateStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rebase => "rebase",
            Self::Reclone => "reclone",
        }
    }
}

impl std::str::FromStr for UpdateStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rebase" => Ok(Self::Rebase),
            "reclone" => Ok(Self::Reclone),
            other => anyhow::bail!("Unknown update strategy: {} (expected rebase or reclone)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default)]
    pub update_strategy: UpdateStrategy,

    /// Skip TLS certificate verification for git transports.
    ///
    /// Lets self-hosted servers with private certificates work without
    /// prior trust setup. Off unless explicitly enabled.
    #[serde(default)]
    pub allow_insecure_transport: bool,

    #[serde(default = "default_fetch_timeout")]
    pub clone_timeout_secs: u64,

    #[serde(default = "default_fetch_timeout")]
    pub update_timeout_secs: u64,
}

impl FetchSettings {
    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            update_strategy: UpdateStrategy::default(),
            allow_insecure_transport: false,
            clone_timeout_secs: default_fetch_timeout(),
            update_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    300
}

/// Dependency installer invoked after every clone or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySettings {
    #[serde(default = "default_installer_program")]
    pub program: String,

    #[serde(default = "default_installer_args")]
    pub args: Vec<String>,

    #[serde(default = "default_installer_timeout")]
    pub timeout_secs: u64,
}

impl DependencySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            program: default_installer_program(),
            args: default_installer_args(),
            timeout_secs: default_installer_timeout(),
        }
    }
}

fn default_installer_program() -> String {
    if cfg!(windows) {
        "npm.cmd".to_string()
    } else {
        "npm".to_string()
    }
}

fn default_installer_args() -> Vec<String> {
    vec!["install".to_string()]
}

fn default_installer_timeout() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSettings {
    /// Root used by the CLI when `--root` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_root: Option<PathBuf>,

    /// Path fragments identifying read-only bundled archives.
    ///
    /// Packages below such roots were installed at build time and are never
    /// touched at runtime.
    #[serde(default = "default_bundled_markers")]
    pub bundled_markers: Vec<String>,
}

impl InstallSettings {
    pub fn is_bundled(&self, root: &std::path::Path) -> bool {
        let root = root.to_string_lossy().replace('\\', "/");
        self.bundled_markers
            .iter()
            .any(|marker| root.contains(marker.as_str()))
    }

    /// Root to install into when the caller does not name one.
    pub fn effective_target_root(&self) -> anyhow::Result<PathBuf> {
        if let Some(root) = &self.target_root {
            return Ok(root.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("pkgmgr").join("skills"))
    }
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            target_root: None,
            bundled_markers: default_bundled_markers(),
        }
    }
}

fn default_bundled_markers() -> Vec<String> {
    vec!["/app.asar/".to_string()]
}

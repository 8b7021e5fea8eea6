//! Config store for loading and saving pkgmgr.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::PkgmgrConfig;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at the platform config directory (`~/.config/pkgmgr/pkgmgr.toml` on Linux).
    pub fn default_location() -> anyhow::Result<Self> {
        let global_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("pkgmgr");
        Ok(Self::from_path(global_dir.join("pkgmgr.toml")))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<PkgmgrConfig> {
        if !self.config_path.exists() {
            return Ok(PkgmgrConfig::new());
        }
        let content = std::fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;
        PkgmgrConfig::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", self.config_path.display()))
    }

    pub fn save(&self, config: &PkgmgrConfig) -> anyhow::Result<()> {
        let content = config.to_toml_string()?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}

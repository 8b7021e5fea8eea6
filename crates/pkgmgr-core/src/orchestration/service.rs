//! The package manager: `load`, `refresh`, `install_latest` and `update`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::{InstallSettings, PkgmgrConfig, UpdateStrategy};
use crate::dependencies::DependencyInstaller;
use crate::error::{PackageError, Result};
use crate::fs::{SafeRemover, ensure_dir, exists};
use crate::git::{GitFetcher, head_commit};
use crate::progress::{ProgressReporter, TracingReporter};
use crate::resolve::{ResolvedPackage, Resolver};
use crate::runner::{CommandRunner, ProcessRunner};

use super::lock::NameLocks;
use super::plan::{Mode, Plan, Step, plan};

/// What a call did to the package directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    /// Target root lies inside a read-only bundled archive; nothing was touched.
    Bundled,
    AlreadyPresent,
    Cloned,
    Updated,
    Recloned,
}

impl InstallAction {
    fn from_plan(plan: &Plan) -> Self {
        let steps = plan.steps();
        if matches!(plan, Plan::ShortCircuit) {
            Self::AlreadyPresent
        } else if steps.contains(&Step::Remove) {
            Self::Recloned
        } else if steps.contains(&Step::Pull) {
            Self::Updated
        } else {
            Self::Cloned
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    /// Absolute path of the package directory
    pub path: PathBuf,
    pub action: InstallAction,
    /// Checked-out commit, when the directory is a git repository
    pub commit: Option<String>,
}

/// Keeps cloned, dependency-installed packages under a target root.
///
/// Calls for the same canonical name are serialized within one manager.
#[derive(Debug)]
pub struct PackageManager<R = ProcessRunner> {
    resolver: Resolver,
    fetcher: GitFetcher<R>,
    installer: DependencyInstaller<R>,
    remover: SafeRemover,
    install: InstallSettings,
    strategy: UpdateStrategy,
    reporter: Arc<dyn ProgressReporter>,
    locks: NameLocks,
}

impl PackageManager<ProcessRunner> {
    /// Manager that spawns real `git` and installer processes and reports
    /// progress through `tracing`.
    pub fn from_config(config: &PkgmgrConfig) -> Self {
        Self::with_runner(config, ProcessRunner, Arc::new(TracingReporter))
    }
}

impl<R: CommandRunner> PackageManager<R> {
    pub fn with_runner(
        config: &PkgmgrConfig,
        runner: R,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let runner = Arc::new(runner);
        Self {
            resolver: Resolver::new(config.resolver.clone()),
            fetcher: GitFetcher::new(runner.clone(), reporter.clone(), config.fetch.clone()),
            installer: DependencyInstaller::new(
                runner,
                reporter.clone(),
                config.dependencies.clone(),
            ),
            remover: SafeRemover::new(config.resolver.skill_prefix.clone()),
            install: config.install.clone(),
            strategy: config.fetch.update_strategy,
            reporter,
            locks: NameLocks::new(),
        }
    }

    pub fn resolve(&self, reference: &str) -> ResolvedPackage {
        self.resolver.resolve(reference)
    }

    pub fn update_strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// Ensure the package is present under `root`, cloning and installing
    /// dependencies only when it is absent.
    pub async fn load(&self, reference: &str, root: &Path) -> Result<LoadOutcome> {
        self.ensure(Mode::Load, reference, root).await
    }

    /// Bring the package up to date using the configured [`UpdateStrategy`],
    /// cloning it if absent. Dependencies are always reinstalled.
    pub async fn refresh(&self, reference: &str, root: &Path) -> Result<LoadOutcome> {
        self.ensure(Mode::Refresh, reference, root).await
    }

    /// Delete any existing copy and clone the latest version.
    pub async fn install_latest(&self, reference: &str, root: &Path) -> Result<LoadOutcome> {
        self.ensure(Mode::InstallLatest, reference, root).await
    }

    /// Rebase an already installed package and reinstall its dependencies.
    pub async fn update(&self, local_path: &Path) -> Result<()> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _guard = self.locks.acquire(&name).await;

        self.fetcher.pull(local_path).await?;
        self.installer.install(local_path).await
    }

    async fn ensure(&self, mode: Mode, reference: &str, root: &Path) -> Result<LoadOutcome> {
        let package = self.resolver.resolve(reference);
        if !package.has_directory_name() {
            return Err(PackageError::InvalidName {
                reference: reference.to_string(),
                name: package.canonical_name,
            });
        }
        let name = package.canonical_name.as_str();

        self.reporter.report(&match mode {
            Mode::Load => format!("Ensuring {} loaded...", name),
            Mode::Refresh | Mode::InstallLatest => format!("Installing {}...", name),
        });

        if self.install.is_bundled(root) {
            return Ok(LoadOutcome {
                path: root.join(name),
                action: InstallAction::Bundled,
                commit: None,
            });
        }

        let _guard = self.locks.acquire(name).await;

        let root = ensure_dir(root).await?;
        let path = root.join(name);
        let plan = plan(mode, exists(&root, name), self.strategy);
        tracing::debug!(package = name, ?plan, "planned install");

        if plan == Plan::ShortCircuit {
            self.reporter.report(&format!(
                "Package exists in location '{}'...",
                path.display()
            ));
        }

        for step in plan.steps() {
            match step {
                Step::Remove => {
                    self.reporter
                        .report(&format!("Deleting package from '{}'...", path.display()));
                    self.remover.remove(&path).await?;
                }
                Step::Clone => {
                    self.fetcher
                        .clone_into(&package.fetch_location, &root, name)
                        .await?;
                }
                Step::Pull => self.fetcher.pull(&path).await?,
                Step::InstallDependencies => self.installer.install(&path).await?,
            }
        }

        Ok(LoadOutcome {
            commit: head_commit(&path),
            action: InstallAction::from_plan(&plan),
            path,
        })
    }
}

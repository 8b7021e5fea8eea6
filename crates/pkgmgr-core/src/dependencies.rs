//! Dependency installation for fetched packages.

use std::path::Path;
use std::sync::Arc;

use crate::config::DependencySettings;
use crate::error::{PackageError, Result};
use crate::progress::ProgressReporter;
use crate::runner::{CommandRunner, CommandSpec};

/// Runs the configured installer (`npm install` by default) inside a package.
#[derive(Debug)]
pub struct DependencyInstaller<R> {
    runner: Arc<R>,
    reporter: Arc<dyn ProgressReporter>,
    settings: DependencySettings,
}

impl<R: CommandRunner> DependencyInstaller<R> {
    pub fn new(
        runner: Arc<R>,
        reporter: Arc<dyn ProgressReporter>,
        settings: DependencySettings,
    ) -> Self {
        Self {
            runner,
            reporter,
            settings,
        }
    }

    pub async fn install(&self, local_path: &Path) -> Result<()> {
        self.reporter.report(&format!(
            "Installing dependencies in {}...",
            local_path.display()
        ));

        let spec = CommandSpec::new(&self.settings.program, self.settings.timeout())
            .args(self.settings.args.iter().cloned())
            .current_dir(local_path);

        let reason = match self.runner.run(&spec).await {
            Ok(output) if output.success => return Ok(()),
            Ok(output) => format!("{} failed with {}", spec.display(), output.failure_reason()),
            Err(err) => format!("{}: {}", spec.display(), err),
        };
        Err(PackageError::DependencyInstall {
            path: local_path.to_path_buf(),
            reason,
        })
    }
}

//! Git fetcher for cloning and updating skill packages.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::FetchSettings;
use crate::error::{PackageError, Result};
use crate::fs::ensure_dir;
use crate::progress::ProgressReporter;
use crate::runner::{CommandRunner, CommandSpec};

/// Killing `git` on timeout leaves helpers such as `index-pack` running
/// briefly; they can still be writing into the destination.
const CLEANUP_ATTEMPTS: u32 = 3;
const CLEANUP_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Clones and updates package repositories through a [`CommandRunner`].
#[derive(Debug)]
pub struct GitFetcher<R> {
    runner: Arc<R>,
    reporter: Arc<dyn ProgressReporter>,
    settings: FetchSettings,
}

impl<R: CommandRunner> GitFetcher<R> {
    pub fn new(
        runner: Arc<R>,
        reporter: Arc<dyn ProgressReporter>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            runner,
            reporter,
            settings,
        }
    }

    /// Clone `fetch_location` into `parent/canonical_name`.
    ///
    /// On failure the partially created directory is removed (best effort)
    /// before the error is returned.
    pub async fn clone_into(
        &self,
        fetch_location: &str,
        parent: &Path,
        canonical_name: &str,
    ) -> Result<PathBuf> {
        let parent = ensure_dir(parent).await?;
        let destination = parent.join(canonical_name);
        let preexisting = destination.exists();

        self.reporter.report(&format!("Cloning {}...", fetch_location));

        let spec = CommandSpec::new("git", self.settings.clone_timeout())
            .args(self.transport_args())
            .args(["clone", "--", fetch_location])
            .arg(destination.to_string_lossy())
            .current_dir(&parent);

        if let Err(reason) = self.run_git(&spec).await {
            // Never clean up a directory this call did not create.
            if !preexisting {
                self.cleanup_failed_clone(&destination).await;
            }
            return Err(PackageError::Fetch {
                location: fetch_location.to_string(),
                reason,
            });
        }

        Ok(destination)
    }

    /// Rebase an existing clone onto its upstream.
    ///
    /// Conflicts are not resolved; they surface as [`PackageError::Fetch`].
    pub async fn pull(&self, local_path: &Path) -> Result<()> {
        self.reporter
            .report(&format!("Updating {}...", local_path.display()));

        let spec = CommandSpec::new("git", self.settings.update_timeout())
            .args(self.transport_args())
            .args(["pull", "--rebase"])
            .current_dir(local_path);

        self.run_git(&spec)
            .await
            .map_err(|reason| PackageError::Fetch {
                location: local_path.display().to_string(),
                reason,
            })
    }

    fn transport_args(&self) -> Vec<&'static str> {
        if self.settings.allow_insecure_transport {
            vec!["-c", "http.sslVerify=false"]
        } else {
            Vec::new()
        }
    }

    async fn run_git(&self, spec: &CommandSpec) -> std::result::Result<(), String> {
        match self.runner.run(spec).await {
            Ok(output) if output.success => Ok(()),
            Ok(output) => Err(output.failure_reason()),
            Err(err) => Err(err.to_string()),
        }
    }

    async fn cleanup_failed_clone(&self, destination: &Path) {
        if !destination.exists() {
            return;
        }
        if let Err(err) =
            remove_with_retry(destination, CLEANUP_ATTEMPTS, CLEANUP_RETRY_DELAY).await
        {
            tracing::warn!(
                path = %destination.display(),
                error = %err,
                "Failed to clean up after failed clone"
            );
        }
    }
}

/// `remove_dir_all`, retried while something else keeps writing into the tree.
/// A path that is already gone counts as removed.
pub(crate) async fn remove_with_retry(
    path: &Path,
    attempts: u32,
    delay: Duration,
) -> std::io::Result<()> {
    let mut attempt = 1;
    loop {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    attempt,
                    "Retrying removal of failed clone"
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

//! Integration tests for PackageManager using a recording command runner.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pkgmgr_core::PackageError;
use pkgmgr_core::config::{PkgmgrConfig, UpdateStrategy};
use pkgmgr_core::orchestration::{InstallAction, PackageManager};
use pkgmgr_core::progress::RecordingReporter;
use pkgmgr_core::runner::{CommandOutput, CommandRunner, CommandSpec, RunError};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloneBehavior {
    Succeed,
    /// Leave a half-written directory behind, then fail
    FailPartial,
    TimeOut,
}

#[derive(Debug, Clone)]
struct FakeRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    clone: CloneBehavior,
    pull_succeeds: bool,
    install_succeeds: bool,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            clone: CloneBehavior::Succeed,
            pull_succeeds: true,
            install_succeeds: true,
        }
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        self.calls.lock().unwrap().push(spec.clone());
        tokio::task::yield_now().await;

        if spec.program != "git" {
            return Ok(if self.install_succeeds {
                CommandOutput::succeeded()
            } else {
                CommandOutput::failed(1, "npm ERR! missing script")
            });
        }

        if spec.args.iter().any(|a| a == "clone") {
            let destination = PathBuf::from(spec.args.last().unwrap());
            return match self.clone {
                CloneBehavior::Succeed => {
                    std::fs::create_dir_all(&destination).unwrap();
                    std::fs::write(destination.join("package.json"), "{}").unwrap();
                    Ok(CommandOutput::succeeded())
                }
                CloneBehavior::FailPartial => {
                    std::fs::create_dir_all(destination.join(".git")).unwrap();
                    Ok(CommandOutput::failed(128, "fatal: early EOF"))
                }
                CloneBehavior::TimeOut => Err(RunError::TimedOut(spec.timeout)),
            };
        }

        Ok(if self.pull_succeeds {
            CommandOutput::succeeded()
        } else {
            CommandOutput::failed(1, "CONFLICT (content): Merge conflict in index.js")
        })
    }
}

struct Harness {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    reporter: Arc<RecordingReporter>,
    manager: PackageManager<FakeRunner>,
}

impl Harness {
    fn new(runner: FakeRunner) -> Self {
        Self::with_config(runner, PkgmgrConfig::default())
    }

    fn with_config(runner: FakeRunner, config: PkgmgrConfig) -> Self {
        let calls = runner.calls.clone();
        let reporter = Arc::new(RecordingReporter::new());
        let manager = PackageManager::with_runner(&config, runner, reporter.clone());
        Self {
            calls,
            reporter,
            manager,
        }
    }

    fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.display().contains(needle))
            .count()
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap()
}

#[tokio::test]
async fn load_absent_package_clones_and_installs_once() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("1").join("2").join("3");
    let h = Harness::new(FakeRunner::new());

    let outcome = h.manager.load("my-skill", &root).await.unwrap();

    assert_eq!(outcome.action, InstallAction::Cloned);
    assert_eq!(outcome.path, canonical(&root).join("eskill-my-skill"));
    assert!(outcome.path.join("package.json").exists());
    assert_eq!(h.count("git clone"), 1);
    assert_eq!(h.count("npm"), 1);

    let calls = h.calls();
    assert!(
        calls[0]
            .args
            .contains(&"https://github.com/everlifeai/eskill-my-skill.git".to_string())
    );
    assert_eq!(calls[1].cwd.as_deref(), Some(outcome.path.as_path()));
}

#[tokio::test]
async fn load_present_package_touches_nothing() {
    let temp = TempDir::new().unwrap();
    let existing = temp.path().join("elife-utils");
    std::fs::create_dir_all(&existing).unwrap();
    std::fs::write(existing.join("local-change.txt"), "keep").unwrap();
    let h = Harness::new(FakeRunner::new());

    let outcome = h
        .manager
        .load("everlifeai/elife-utils", temp.path())
        .await
        .unwrap();

    assert_eq!(outcome.action, InstallAction::AlreadyPresent);
    assert_eq!(outcome.path, canonical(&existing));
    assert!(h.calls().is_empty());
    assert!(existing.join("local-change.txt").exists());
}

#[tokio::test]
async fn second_load_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let h = Harness::new(FakeRunner::new());

    let first = h.manager.load("eskill-echo", temp.path()).await.unwrap();
    let second = h.manager.load("eskill-echo", temp.path()).await.unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(second.action, InstallAction::AlreadyPresent);
    assert_eq!(h.calls().len(), 2);
}

#[tokio::test]
async fn concurrent_loads_of_same_package_clone_once() {
    let temp = TempDir::new().unwrap();
    let h = Harness::new(FakeRunner::new());

    let (a, b) = tokio::join!(
        h.manager.load("echo", temp.path()),
        h.manager.load("eskill-echo", temp.path()),
    );

    let mut actions = vec![a.unwrap().action, b.unwrap().action];
    actions.sort_by_key(|a| format!("{:?}", a));
    assert_eq!(
        actions,
        vec![InstallAction::AlreadyPresent, InstallAction::Cloned]
    );
    assert_eq!(h.count("git clone"), 1);
    assert_eq!(h.count("npm"), 1);
}

#[tokio::test]
async fn refresh_with_rebase_pulls_in_place() {
    let temp = TempDir::new().unwrap();
    let existing = temp.path().join("eskill-echo");
    std::fs::create_dir_all(&existing).unwrap();
    let h = Harness::new(FakeRunner::new());

    let outcome = h.manager.refresh("echo", temp.path()).await.unwrap();

    assert_eq!(outcome.action, InstallAction::Updated);
    let calls = h.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].display(), "git pull --rebase");
    assert_eq!(calls[0].cwd.as_deref(), Some(outcome.path.as_path()));
    assert_eq!(calls[1].display(), "npm install");
}

#[tokio::test]
async fn refresh_with_reclone_replaces_directory() {
    let temp = TempDir::new().unwrap();
    let existing = temp.path().join("eskill-echo");
    std::fs::create_dir_all(&existing).unwrap();
    std::fs::write(existing.join("stale.txt"), "old").unwrap();

    let mut config = PkgmgrConfig::default();
    config.fetch.update_strategy = UpdateStrategy::Reclone;
    let h = Harness::with_config(FakeRunner::new(), config);

    let outcome = h.manager.refresh("echo", temp.path()).await.unwrap();

    assert_eq!(outcome.action, InstallAction::Recloned);
    assert!(!existing.join("stale.txt").exists());
    assert!(existing.join("package.json").exists());
    assert_eq!(h.count("git clone"), 1);
    assert_eq!(h.count("git pull"), 0);
    assert_eq!(h.count("npm install"), 1);
}

#[tokio::test]
async fn refresh_absent_package_clones() {
    let temp = TempDir::new().unwrap();
    let h = Harness::new(FakeRunner::new());

    let outcome = h.manager.refresh("echo", temp.path()).await.unwrap();

    assert_eq!(outcome.action, InstallAction::Cloned);
    assert_eq!(h.count("git clone"), 1);
    assert_eq!(h.count("npm install"), 1);
}

#[tokio::test]
async fn install_latest_refuses_to_delete_unmanaged_directory() {
    let temp = TempDir::new().unwrap();
    let existing = temp.path().join("tools.acme");
    std::fs::create_dir_all(&existing).unwrap();
    std::fs::write(existing.join("precious.txt"), "do not delete").unwrap();
    let h = Harness::new(FakeRunner::new());

    let err = h
        .manager
        .install_latest("acme/tools", temp.path())
        .await
        .unwrap_err();

    assert!(matches!(err, PackageError::UnsafeDelete { .. }));
    assert!(existing.join("precious.txt").exists());
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn failed_clone_leaves_no_residual_directory() {
    let temp = TempDir::new().unwrap();
    let runner = FakeRunner {
        clone: CloneBehavior::FailPartial,
        ..FakeRunner::new()
    };
    let h = Harness::new(runner);

    let err = h.manager.load("echo", temp.path()).await.unwrap_err();

    match err {
        PackageError::Fetch { location, reason } => {
            assert_eq!(location, "https://github.com/everlifeai/eskill-echo.git");
            assert!(reason.contains("early EOF"), "{}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!temp.path().join("eskill-echo").exists());
    assert_eq!(h.count("npm"), 0);
}

#[tokio::test]
async fn clone_timeout_is_fetch_error() {
    let temp = TempDir::new().unwrap();
    let runner = FakeRunner {
        clone: CloneBehavior::TimeOut,
        ..FakeRunner::new()
    };
    let h = Harness::new(runner);

    let err = h.manager.load("echo", temp.path()).await.unwrap_err();

    match err {
        PackageError::Fetch { reason, .. } => assert!(reason.contains("timed out"), "{}", reason),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.calls()[0].timeout, Duration::from_secs(300));
}

#[tokio::test]
async fn dependency_failure_surfaces_after_clone() {
    let temp = TempDir::new().unwrap();
    let runner = FakeRunner {
        install_succeeds: false,
        ..FakeRunner::new()
    };
    let h = Harness::new(runner);

    let err = h.manager.load("echo", temp.path()).await.unwrap_err();

    assert!(matches!(err, PackageError::DependencyInstall { .. }));
    assert_eq!(h.count("git clone"), 1);
}

#[tokio::test]
async fn bundled_archive_root_is_never_mutated() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("resources").join("app.asar").join("skills");
    let h = Harness::new(FakeRunner::new());

    for outcome in [
        h.manager.load("echo", &root).await.unwrap(),
        h.manager.refresh("echo", &root).await.unwrap(),
        h.manager.install_latest("echo", &root).await.unwrap(),
    ] {
        assert_eq!(outcome.action, InstallAction::Bundled);
        assert_eq!(outcome.path, root.join("eskill-echo"));
    }
    assert!(h.calls().is_empty());
    assert!(!root.exists());
}

#[tokio::test]
async fn insecure_transport_is_opt_in() {
    let temp = TempDir::new().unwrap();
    let strict = Harness::new(FakeRunner::new());
    strict.manager.load("echo", temp.path()).await.unwrap();
    assert!(!strict.calls()[0].args.iter().any(|a| a.contains("sslVerify")));

    let other = TempDir::new().unwrap();
    let mut config = PkgmgrConfig::default();
    config.fetch.allow_insecure_transport = true;
    let permissive = Harness::with_config(FakeRunner::new(), config);
    permissive.manager.load("echo", other.path()).await.unwrap();
    let args = &permissive.calls()[0].args;
    assert_eq!(&args[..2], &["-c".to_string(), "http.sslVerify=false".to_string()]);
}

#[tokio::test]
async fn update_pulls_then_installs() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("eskill-echo");
    std::fs::create_dir_all(&path).unwrap();
    let h = Harness::new(FakeRunner::new());

    h.manager.update(&path).await.unwrap();

    let calls = h.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].display(), "git pull --rebase");
    assert_eq!(calls[1].display(), "npm install");
    assert!(calls.iter().all(|c| c.cwd.as_deref() == Some(path.as_path())));
}

#[tokio::test]
async fn update_stops_at_pull_conflict() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("eskill-echo");
    std::fs::create_dir_all(&path).unwrap();
    let runner = FakeRunner {
        pull_succeeds: false,
        ..FakeRunner::new()
    };
    let h = Harness::new(runner);

    let err = h.manager.update(&path).await.unwrap_err();

    match err {
        PackageError::Fetch { reason, .. } => assert!(reason.contains("CONFLICT"), "{}", reason),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.count("npm"), 0);
}

#[tokio::test]
async fn progress_is_reported_before_each_step() {
    let temp = TempDir::new().unwrap();
    let h = Harness::new(FakeRunner::new());

    h.manager.load("echo", temp.path()).await.unwrap();

    let messages = h.reporter.messages();
    assert_eq!(messages.len(), 3, "{:?}", messages);
    assert_eq!(messages[0], "Ensuring eskill-echo loaded...");
    assert_eq!(
        messages[1],
        "Cloning https://github.com/everlifeai/eskill-echo.git..."
    );
    assert!(messages[2].starts_with("Installing dependencies in "));
}

#[tokio::test]
async fn empty_canonical_name_never_touches_the_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("eskill-cache");
    let sibling = root.join("eskill-other");
    std::fs::create_dir_all(&sibling).unwrap();
    std::fs::write(sibling.join("keep.txt"), "keep").unwrap();
    let h = Harness::new(FakeRunner::new());

    for reference in ["everlifeai/", "https://github.com/everlifeai/"] {
        for result in [
            h.manager.load(reference, &root).await,
            h.manager.refresh(reference, &root).await,
            h.manager.install_latest(reference, &root).await,
        ] {
            match result {
                Err(PackageError::InvalidName { name, .. }) => assert_eq!(name, ""),
                other => panic!("unexpected result for {}: {:?}", reference, other),
            }
        }
    }

    assert!(sibling.join("keep.txt").exists());
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn parent_directory_name_never_escapes_the_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("skills");
    std::fs::create_dir_all(&root).unwrap();
    let h = Harness::new(FakeRunner::new());

    let err = h.manager.refresh("https://..", &root).await.unwrap_err();

    assert!(matches!(err, PackageError::InvalidName { .. }));
    assert!(h.calls().is_empty());
}

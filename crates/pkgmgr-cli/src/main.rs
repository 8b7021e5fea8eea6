//! pkgmgr - Skill Package Loader
//!
//! Usage:
//!   pkgmgr resolve <ref>         # Show fetch URL and directory name
//!   pkgmgr load <ref>            # Clone if missing
//!   pkgmgr refresh <ref>         # Update an installed package
//!   pkgmgr install-latest <ref>  # Delete and clone again
//!   pkgmgr update <path>         # Rebase an installed directory
//!   pkgmgr list                  # Show installed packages

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pkgmgr_core::config::{ConfigStore, PkgmgrConfig, UpdateStrategy};
use pkgmgr_core::inventory::list_installed;
use pkgmgr_core::orchestration::{LoadOutcome, PackageManager};

#[derive(Parser)]
#[command(name = "pkgmgr")]
#[command(about = "Skill package loader", long_about = None)]
struct Cli {
    /// Path to pkgmgr.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip TLS certificate verification for git transports
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a reference without touching the filesystem
    Resolve {
        /// Full URL, org/repo, skill name or eskill- name
        reference: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Ensure a package is installed, cloning it only if missing
    Load {
        reference: String,

        /// Target root directory
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Update a package, cloning it if missing
    Refresh {
        reference: String,

        #[arg(long)]
        root: Option<PathBuf>,

        /// Override the configured update strategy
        #[arg(long)]
        strategy: Option<UpdateStrategy>,
    },

    /// Delete any existing copy and clone the latest version
    InstallLatest {
        reference: String,

        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Rebase an installed package directory and reinstall dependencies
    Update {
        /// Path to the package directory
        path: PathBuf,
    },

    /// List package directories under the target root
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        root: Option<PathBuf>,

        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pkgmgr=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let store = match cli.config {
        Some(path) => ConfigStore::from_path(path),
        None => ConfigStore::default_location()?,
    };
    let mut config = store.load()?;
    tracing::debug!(config = %store.config_path().display(), "loaded configuration");
    if cli.insecure {
        config.fetch.allow_insecure_transport = true;
    }

    run_cli(cli.command, config, &store).await
}

async fn run_cli(command: Commands, mut config: PkgmgrConfig, store: &ConfigStore) -> Result<()> {
    match command {
        Commands::Resolve { reference, format } => {
            let manager = PackageManager::from_config(&config);
            let resolved = manager.resolve(&reference);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
                OutputFormat::Table => {
                    println!("Fetch: {}", resolved.fetch_location);
                    println!("Name:  {}", resolved.canonical_name);
                }
            }
        }
        Commands::Load { reference, root } => {
            let root = target_root(&config, root)?;
            let manager = PackageManager::from_config(&config);
            let outcome = manager.load(&reference, &root).await?;
            print_outcome(&outcome);
        }
        Commands::Refresh {
            reference,
            root,
            strategy,
        } => {
            let root = target_root(&config, root)?;
            if let Some(strategy) = strategy {
                config.fetch.update_strategy = strategy;
            }
            let manager = PackageManager::from_config(&config);
            let outcome = manager.refresh(&reference, &root).await?;
            print_outcome(&outcome);
        }
        Commands::InstallLatest { reference, root } => {
            let root = target_root(&config, root)?;
            let manager = PackageManager::from_config(&config);
            let outcome = manager.install_latest(&reference, &root).await?;
            print_outcome(&outcome);
        }
        Commands::Update { path } => {
            let manager = PackageManager::from_config(&config);
            manager.update(&path).await?;
            println!("✓ Updated {}", path.display());
        }
        Commands::List { root, format } => {
            let root = target_root(&config, root)?;
            let packages = list_installed(&root, &config.resolver.skill_prefix)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&packages)?),
                OutputFormat::Table => print_list(&root, &packages),
            }
        }
        Commands::Config => {
            println!("# {}", store.config_path().display());
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

fn target_root(config: &PkgmgrConfig, root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => config.install.effective_target_root(),
    }
}

fn print_outcome(outcome: &LoadOutcome) {
    let commit = outcome
        .commit
        .as_deref()
        .map(|sha| format!(" @ {}", &sha[..sha.len().min(12)]))
        .unwrap_or_default();
    println!(
        "✓ {:?}: {}{}",
        outcome.action,
        outcome.path.display(),
        commit
    );
}

fn print_list(root: &Path, packages: &[pkgmgr_core::inventory::InstalledPackage]) {
    if packages.is_empty() {
        println!("No packages installed in {}", root.display());
        return;
    }
    println!("{:<40} {:<8} COMMIT", "NAME", "MANAGED");
    for package in packages {
        let commit = package
            .commit
            .as_deref()
            .map(|sha| &sha[..sha.len().min(12)])
            .unwrap_or("-");
        let managed = if package.managed { "yes" } else { "no" };
        println!("{:<40} {:<8} {}", package.name, managed, commit);
    }
}

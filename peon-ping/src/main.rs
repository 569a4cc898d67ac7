//! peon-ping installer: registers the sound hook with Claude Code.
#![forbid(unsafe_code)]

mod assets;
mod commands;
mod hook;
mod platform;
mod shell;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{InstallOptions, RestoreChoice, Session, UninstallOptions};
use peon_common::{InstallerConfig, LogConfig, init_logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "peon-ping",
    version,
    about = "Install the peon-ping notification sounds for Claude Code"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Install into this home directory instead of the current user's
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install or update the hook, sound packs and shell helpers
    Install {
        /// Copy assets from a local peon-ping checkout instead of downloading
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,

        /// Show what would change without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Skip platform and tool checks
        #[arg(long)]
        skip_checks: bool,

        /// Do not add the shell alias or completion
        #[arg(long)]
        no_shell: bool,
    },

    /// Remove the hook and installed files
    Uninstall {
        /// Restore notify.sh from its backup without asking
        #[arg(long, conflicts_with = "keep_notify")]
        restore_notify: bool,

        /// Keep the notify.sh backup without asking
        #[arg(long)]
        keep_notify: bool,

        /// Show what would change without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show whether the hook is registered and current
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = InstallerConfig::from_env()?;

    let mut log_config = LogConfig::from_installer(&config).with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    init_logging(&log_config)?;

    let session = Session::resolve(config, cli.home, platform::detect())?;

    match cli.command {
        Commands::Install {
            source,
            dry_run,
            skip_checks,
            no_shell,
        } => {
            let opts = InstallOptions {
                source,
                dry_run,
                skip_checks,
                no_shell,
            };
            commands::install(&session, &opts, &assets::HttpFetcher::new())
        }
        Commands::Uninstall {
            restore_notify,
            keep_notify,
            dry_run,
        } => {
            let restore = if restore_notify {
                RestoreChoice::Restore
            } else if keep_notify {
                RestoreChoice::Keep
            } else {
                RestoreChoice::Ask
            };
            commands::uninstall(&session, &UninstallOptions { restore, dry_run })
        }
        Commands::Status { json } => commands::status(&session, json),
    }
}

//! Command implementations for the `peon-ping` CLI.

pub mod helpers;
mod install;
mod status;
mod uninstall;

pub use install::{InstallOptions, install};
pub use status::status;
pub use uninstall::{RestoreChoice, UninstallOptions, uninstall};

use anyhow::Result;
use peon_common::{CommandMatchers, HookAction, InstallLayout, InstallerConfig, Platform};
use std::path::PathBuf;
use tracing::debug;

/// Everything a command needs to know about where and how to run.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: InstallerConfig,
    pub layout: InstallLayout,
    pub platform: Platform,
}

impl Session {
    /// `home` from the command line wins over `PEON_HOME` and the real home.
    pub fn resolve(config: InstallerConfig, home: Option<PathBuf>, platform: Platform) -> Result<Self> {
        let home = home
            .or_else(|| config.resolve_home())
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        debug!("Using home {:?} on {}", home, platform);
        Ok(Self {
            config,
            layout: InstallLayout::new(home),
            platform,
        })
    }

    /// The hook action this installation registers.
    pub fn canonical_action(&self) -> HookAction {
        self.layout
            .canonical_action(self.platform, self.config.hook_timeout)
    }

    /// Matchers for entries that installing supersedes.
    pub fn legacy_matchers(&self) -> CommandMatchers {
        CommandMatchers::legacy(self.config.match_mode)
    }

    /// Matchers for entries uninstalling removes.
    pub fn own_matchers(&self) -> CommandMatchers {
        CommandMatchers::own(self.config.match_mode)
    }
}

//! Installer configuration and on-disk layout.
//!
//! [`InstallerConfig`] is resolved once from `PEON_*` environment variables,
//! then CLI flags override individual fields. [`InstallLayout`] derives every
//! path the installer touches from a single home directory.

pub mod env;

pub use env::{EnvError, EnvParser, expand_path};

use crate::hooks::{DEFAULT_HOOK_TIMEOUT_SECS, HookAction, MatchMode};
use crate::types::Platform;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upstream location of hook scripts, packs and the skill file.
pub const DEFAULT_REPO_BASE: &str = "https://raw.githubusercontent.com/tonyyont/peon-ping/main";

/// Sound packs shipped with the hook.
pub const PACKS: [&str; 8] = [
    "peon",
    "peon_fr",
    "peon_pl",
    "peasant",
    "peasant_fr",
    "ra2_soviet_engineer",
    "sc_battlecruiser",
    "sc_kerrigan",
];

/// Files copied or downloaded into the install directory on every run.
pub const CORE_FILES: [&str; 7] = [
    "peon.sh",
    "peon.py",
    "completions.bash",
    "VERSION",
    "uninstall.sh",
    "uninstall.py",
    "install.py",
];

/// Name of the slash-command skill installed next to the hook.
pub const SKILL_NAME: &str = "peon-ping-toggle";

const MAX_HOOK_TIMEOUT_SECS: u32 = 600;

/// One or more environment variables could not be parsed.
#[derive(Debug, Error)]
#[error("invalid environment configuration:\n  {}", format_errors(.errors))]
pub struct ConfigError {
    pub errors: Vec<EnvError>,
}

fn format_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}

/// Settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallerConfig {
    /// Home directory override; `None` means the user's real home.
    pub home: Option<PathBuf>,
    pub repo_base: String,
    pub hook_timeout: u32,
    pub match_mode: MatchMode,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            home: None,
            repo_base: DEFAULT_REPO_BASE.to_string(),
            hook_timeout: DEFAULT_HOOK_TIMEOUT_SECS,
            match_mode: MatchMode::default(),
            log_level: "warn".to_string(),
            log_json: false,
        }
    }
}

impl InstallerConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_parser(EnvParser::new())
    }

    /// Resolve through an already configured parser.
    pub fn from_parser(mut parser: EnvParser) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            home: parser.get_optional_path("HOME"),
            repo_base: parser
                .get_string("REPO_BASE", &defaults.repo_base)
                .trim_end_matches('/')
                .to_string(),
            hook_timeout: parser.get_u32_range(
                "HOOK_TIMEOUT",
                defaults.hook_timeout,
                1,
                MAX_HOOK_TIMEOUT_SECS,
            ),
            match_mode: parser.get_parsed(
                "MATCH_MODE",
                defaults.match_mode,
                "match mode (substring/filename)",
            ),
            log_level: parser.get_log_level("LOG_LEVEL", &defaults.log_level),
            log_json: parser.get_bool("LOG_JSON", defaults.log_json),
        };

        if parser.has_errors() {
            return Err(ConfigError {
                errors: parser.take_errors(),
            });
        }
        Ok(config)
    }

    /// Home directory to install into: the override, else the user's home.
    pub fn resolve_home(&self) -> Option<PathBuf> {
        self.home.clone().or_else(dirs::home_dir)
    }
}

/// Every path the installer reads or writes, derived from one home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    home: PathBuf,
}

impl InstallLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/.claude`
    pub fn claude_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.claude_dir().join("settings.json")
    }

    /// `~/.claude/hooks`
    pub fn hooks_dir(&self) -> PathBuf {
        self.claude_dir().join("hooks")
    }

    /// `~/.claude/hooks/peon-ping`
    pub fn install_dir(&self) -> PathBuf {
        self.hooks_dir().join("peon-ping")
    }

    pub fn packs_dir(&self) -> PathBuf {
        self.install_dir().join("packs")
    }

    pub fn pack_dir(&self, pack: &str) -> PathBuf {
        self.packs_dir().join(pack)
    }

    pub fn sounds_dir(&self, pack: &str) -> PathBuf {
        self.pack_dir(pack).join("sounds")
    }

    pub fn skill_dir(&self) -> PathBuf {
        self.claude_dir().join("skills").join(SKILL_NAME)
    }

    pub fn notify_script(&self) -> PathBuf {
        self.hooks_dir().join("notify.sh")
    }

    pub fn notify_backup(&self) -> PathBuf {
        self.hooks_dir().join("notify.sh.backup")
    }

    pub fn state_file(&self) -> PathBuf {
        self.install_dir().join(".state.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.install_dir().join("config.json")
    }

    pub fn hook_script(&self) -> PathBuf {
        self.install_dir().join("peon.sh")
    }

    pub fn hook_python(&self) -> PathBuf {
        self.install_dir().join("peon.py")
    }

    /// An earlier install left a hook script behind.
    pub fn is_update(&self) -> bool {
        self.hook_script().is_file() || self.hook_python().is_file()
    }

    /// Command string registered in settings for this platform.
    pub fn hook_command(&self, platform: Platform) -> String {
        match platform {
            Platform::Windows => format!("python {}", self.hook_python().display()),
            _ => self.hook_script().display().to_string(),
        }
    }

    /// Canonical action for this platform with the given timeout.
    pub fn canonical_action(&self, platform: Platform, timeout: u32) -> HookAction {
        HookAction::command(self.hook_command(platform), timeout)
    }

    /// Action that runs the pre-existing `notify.sh` hook.
    pub fn notify_action(&self, timeout: u32) -> HookAction {
        HookAction::command(self.notify_script().display().to_string(), timeout)
    }
}

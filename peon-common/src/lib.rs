//! Shared library for the peon-ping installer.
//!
//! Loads Claude Code's `settings.json`, reconciles the peon-ping hook
//! bindings in it and writes it back atomically.

pub mod config;
pub mod errors;
pub mod hooks;
pub mod logging;
pub mod settings;
pub mod types;

pub use config::{
    CORE_FILES, ConfigError, DEFAULT_REPO_BASE, EnvError, EnvParser, InstallLayout,
    InstallerConfig, PACKS, SKILL_NAME,
};
pub use errors::SettingsError;
pub use hooks::{
    CommandMatchers, DEFAULT_HOOK_TIMEOUT_SECS, EventName, EventReport, HookAction, HookBinding,
    HookReport, HookStatus, LEGACY_COMMAND_MATCHERS, MANAGED_EVENTS, MatchMode,
    OWN_COMMAND_MATCHERS, inspect, reconcile, register_missing, remove_bindings,
};
pub use logging::{LogConfig, LogTarget, init_logging};
pub use settings::{
    SettingsDocument, WriteOutcome, atomic_write, create_backup, load, matches_disk, write,
    write_if_changed,
};
pub use types::{IdempotentResult, Platform};

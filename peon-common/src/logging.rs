//! Tracing subscriber setup shared by the peon binaries.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::InstallerConfig;

/// Output target for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

/// How logging should be initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    pub target: LogTarget,
}

impl LogConfig {
    /// Level and format taken from a resolved installer configuration
    /// (`PEON_LOG_LEVEL`, `PEON_LOG_JSON`).
    pub fn from_installer(config: &InstallerConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            json: config.log_json,
            target: LogTarget::Stdout,
        }
    }

    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn with_stderr(mut self) -> Self {
        self.target = LogTarget::Stderr;
        self
    }

    /// Filter directives: `RUST_LOG` wins when set, else the configured level.
    fn filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .with_context(|| format!("invalid log level '{}'", self.level)),
        }
    }
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.json, config.target) {
        (true, LogTarget::Stderr) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (true, LogTarget::Stdout) => registry.with(fmt::layer().json()).try_init(),
        (false, LogTarget::Stderr) => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        (false, LogTarget::Stdout) => registry.with(fmt::layer().with_target(false)).try_init(),
    };

    result.context("failed to initialise logging")
}

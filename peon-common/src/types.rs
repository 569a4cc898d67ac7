//! Common types used across peon-ping components.

use serde::{Deserialize, Serialize};

/// Outcome of an operation that may already be in the desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum IdempotentResult {
    /// The filesystem was modified.
    Changed,
    /// Everything was already in place.
    Unchanged,
    /// Dry run: describes the change that would have been made.
    WouldChange(String),
    /// The operation does not apply here (with reason).
    NotApplicable(String),
}

impl std::fmt::Display for IdempotentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdempotentResult::Changed => write!(f, "changed"),
            IdempotentResult::Unchanged => write!(f, "unchanged"),
            IdempotentResult::WouldChange(what) => write!(f, "would change: {}", what),
            IdempotentResult::NotApplicable(why) => write!(f, "not applicable: {}", why),
        }
    }
}

/// Operating system family the installer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mac,
    /// Linux under Windows Subsystem for Linux.
    Wsl,
    Windows,
    Linux,
    Unknown,
}

impl Platform {
    /// Platforms that can play sounds through the hook script.
    pub fn is_supported(&self) -> bool {
        matches!(self, Platform::Mac | Platform::Wsl | Platform::Windows)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Mac => "mac",
            Platform::Wsl => "wsl",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

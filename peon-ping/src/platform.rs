//! Platform detection and install prerequisites.

use peon_common::{InstallLayout, Platform};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// A prerequisite the installer refuses to continue without.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrerequisiteError {
    #[error("peon-ping requires macOS, WSL, or Windows (detected {0})")]
    UnsupportedPlatform(Platform),

    #[error("{tool} is required ({hint})")]
    MissingTool {
        tool: &'static str,
        hint: &'static str,
    },

    #[error("{} not found. Is Claude Code installed?", .0.display())]
    ClaudeDirMissing(PathBuf),
}

/// Detect the platform the installer is running on.
pub fn detect() -> Platform {
    if cfg!(target_os = "windows") {
        Platform::Windows
    } else if cfg!(target_os = "macos") {
        Platform::Mac
    } else if cfg!(target_os = "linux") {
        let version = std::fs::read_to_string("/proc/version").unwrap_or_default();
        classify_linux(&version)
    } else {
        Platform::Unknown
    }
}

/// WSL kernels identify themselves in `/proc/version`.
fn classify_linux(proc_version: &str) -> Platform {
    if proc_version.to_lowercase().contains("microsoft") {
        Platform::Wsl
    } else {
        Platform::Linux
    }
}

/// External tools the hook script needs to play sounds, with a hint for
/// where each one normally comes from.
pub fn required_tools(platform: Platform) -> &'static [(&'static str, &'static str)] {
    match platform {
        Platform::Mac => &[("afplay", "should be built into macOS")],
        Platform::Wsl => &[
            ("powershell.exe", "should be available in WSL"),
            ("wslpath", "should be built into WSL"),
        ],
        Platform::Windows => &[("powershell", "should be built into Windows")],
        Platform::Linux | Platform::Unknown => &[],
    }
}

/// Check that installing on `platform` can work.
///
/// `has_tool` reports whether an executable is on the search path.
pub fn check_prerequisites(
    platform: Platform,
    layout: &InstallLayout,
    has_tool: impl Fn(&str) -> bool,
) -> Result<(), PrerequisiteError> {
    if !platform.is_supported() {
        return Err(PrerequisiteError::UnsupportedPlatform(platform));
    }

    for &(tool, hint) in required_tools(platform) {
        if !has_tool(tool) {
            return Err(PrerequisiteError::MissingTool { tool, hint });
        }
        debug!("Found required tool {}", tool);
    }

    let claude_dir = layout.claude_dir();
    if !claude_dir.is_dir() {
        return Err(PrerequisiteError::ClaudeDirMissing(claude_dir));
    }
    Ok(())
}

/// Search-path lookup backed by `which`.
pub fn on_path(tool: &str) -> bool {
    which::which(tool).is_ok()
}

//! Error types for settings handling.
//!
//! | Variant     | Raised by            | Effect                               |
//! |-------------|----------------------|--------------------------------------|
//! | `Malformed` | loader, reconciler   | Fatal, nothing is written            |
//! | `Read`      | loader               | Fatal, nothing is written            |
//! | `Write`     | writer               | Fatal, previous file left in place   |
//!
//! A missing settings file is not an error: the loader returns an empty
//! document instead.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading, reconciling or writing a settings document.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed settings{}: {reason}", display_location(.path, .pointer))]
    Malformed {
        path: Option<PathBuf>,
        /// JSON pointer of the offending value, when known.
        pointer: Option<String>,
        reason: String,
    },

    /// The settings file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing or persisting the document failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SettingsError {
    /// Shape violation at `pointer` inside an in-memory document.
    pub fn shape(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        SettingsError::Malformed {
            path: None,
            pointer: Some(pointer.into()),
            reason: reason.into(),
        }
    }

    /// Attach the file the document came from, if not already set.
    pub fn at_path(self, file: &Path) -> Self {
        match self {
            SettingsError::Malformed {
                path: None,
                pointer,
                reason,
            } => SettingsError::Malformed {
                path: Some(file.to_path_buf()),
                pointer,
                reason,
            },
            other => other,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SettingsError::Malformed { .. })
    }
}

fn display_location(path: &Option<PathBuf>, pointer: &Option<String>) -> String {
    match (path, pointer) {
        (Some(p), Some(ptr)) => format!(" in {} at {}", p.display(), ptr),
        (Some(p), None) => format!(" in {}", p.display()),
        (None, Some(ptr)) => format!(" at {}", ptr),
        (None, None) => String::new(),
    }
}

/// Escape a key for use as a JSON pointer segment (RFC 6901).
pub fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

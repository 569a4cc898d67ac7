//! Claude Code settings document: loading, rendering and atomic persistence.
//!
//! The loader and writer are the two I/O ends of the install pipeline.
//! [`crate::hooks::reconcile`] sits between them and never touches the disk.

use crate::errors::SettingsError;
use serde_json::{Map, Value};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// A parsed settings file.
///
/// Keys keep the order they had on disk, so unrelated configuration
/// round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDocument {
    root: Map<String, Value>,
}

impl SettingsDocument {
    /// An empty `{}` document, used when no settings file exists yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a document from JSON text.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let value: Value = serde_json::from_str(content).map_err(|e| SettingsError::Malformed {
            path: None,
            pointer: None,
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Wrap an in-memory value. The top level must be an object.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(SettingsError::Malformed {
                path: None,
                pointer: None,
                reason: format!("expected a JSON object at the top level, found {}", kind_of(&other)),
            }),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The `hooks` object, if present.
    pub fn hooks(&self) -> Result<Option<&Map<String, Value>>, SettingsError> {
        match self.root.get("hooks") {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(SettingsError::shape(
                "/hooks",
                format!("expected an object, found {}", kind_of(other)),
            )),
        }
    }

    /// The `hooks` object, created empty if absent.
    pub fn hooks_mut(&mut self) -> Result<&mut Map<String, Value>, SettingsError> {
        let hooks = self
            .root
            .entry("hooks")
            .or_insert_with(|| Value::Object(Map::new()));
        let found = kind_of(hooks);
        hooks.as_object_mut().ok_or_else(|| {
            SettingsError::shape("/hooks", format!("expected an object, found {}", found))
        })
    }

    /// Deterministic text form: two-space indentation, document key order,
    /// exactly one trailing newline.
    pub fn render(&self) -> String {
        let mut out = match serde_json::to_string_pretty(&self.root) {
            Ok(s) => s,
            // Serializing a Map<String, Value> cannot fail.
            Err(_) => String::from("{}"),
        };
        out.push('\n');
        out
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Load the settings document at `path`.
///
/// A missing file yields an empty document (first install). Content that is
/// not a JSON object yields [`SettingsError::Malformed`]; the caller must
/// not overwrite such a file.
pub fn load(path: &Path) -> Result<SettingsDocument, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No settings at {:?}, starting from an empty document", path);
            return Ok(SettingsDocument::empty());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let doc = SettingsDocument::parse(&content).map_err(|e| e.at_path(path))?;
    debug!("Loaded settings from {:?} ({} top-level keys)", path, doc.root.len());
    Ok(doc)
}

/// Persist `doc` to `path` atomically.
///
/// A symlinked settings file is written through: the rename lands on the
/// link's target and the link itself stays in place.
pub fn write(doc: &SettingsDocument, path: &Path) -> Result<(), SettingsError> {
    let target = resolve_target(path);
    if target != path {
        debug!("Writing {:?} through link to {:?}", path, target);
    }
    atomic_write(&target, doc.render().as_bytes()).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Final destination for a write to `path`, following symlinks.
fn resolve_target(path: &Path) -> PathBuf {
    if let Ok(real) = fs::canonicalize(path) {
        return real;
    }
    // Dangling link: create the file it points at.
    match fs::read_link(path) {
        Ok(link) => match path.parent() {
            Some(parent) => parent.join(link),
            None => link,
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Outcome of [`write_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Whether `path` already holds exactly the rendered form of `doc`.
pub fn matches_disk(doc: &SettingsDocument, path: &Path) -> bool {
    fs::read(path).is_ok_and(|existing| existing == doc.render().as_bytes())
}

/// Write `doc` only when its rendered bytes differ from what is on disk.
pub fn write_if_changed(doc: &SettingsDocument, path: &Path) -> Result<WriteOutcome, SettingsError> {
    if matches_disk(doc, path) {
        debug!("Settings at {:?} already up to date", path);
        return Ok(WriteOutcome::Unchanged);
    }
    write(doc, path)?;
    Ok(WriteOutcome::Written)
}

/// Removes the temporary file unless the rename went through.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Writes content to a file atomically using a temporary file in the same
/// directory followed by a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));
    let mut guard = TempFileGuard {
        path: temp_path.clone(),
        armed: true,
    };

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    // Keep the mode of the file being replaced.
    if let Ok(existing) = fs::metadata(path) {
        fs::set_permissions(&temp_path, existing.permissions())?;
    }

    fs::rename(&temp_path, path)?;
    guard.armed = false;
    debug!("Wrote {} bytes to {:?}", content.len(), path);
    Ok(())
}

/// Creates a timestamped backup next to `path` and returns its location.
///
/// An earlier backup with identical content is reused instead of adding
/// another copy. A name already taken within the same second gets a unique
/// suffix rather than being overwritten.
pub fn create_backup(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let current = fs::read(path)?;
    if let Some(existing) = find_identical_backup(dir, file_name, &current) {
        debug!("Backup {:?} already holds this content", existing);
        return Ok(existing);
    }

    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let mut backup_path = dir.join(format!("{}.bak.{}", file_name, stamp));
    if backup_path.exists() {
        let suffix = Uuid::new_v4().simple().to_string();
        backup_path = dir.join(format!("{}.bak.{}_{}", file_name, stamp, &suffix[..8]));
    }

    fs::copy(path, &backup_path)?;

    debug!("Created backup: {:?}", backup_path);
    Ok(backup_path)
}

fn find_identical_backup(dir: &Path, file_name: &str, content: &[u8]) -> Option<PathBuf> {
    let prefix = format!("{}.bak.", file_name);
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| e.path())
        .find(|p| fs::read(p).is_ok_and(|bytes| bytes == content))
}

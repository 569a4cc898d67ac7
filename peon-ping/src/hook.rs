//! Hook registration in Claude Code's `settings.json`.
//!
//! Each operation runs load, transform and write exactly once against an
//! explicit settings path, so tests can point it at a temporary directory.

use anyhow::{Context, Result};
use peon_common::{
    CommandMatchers, EventName, HookAction, HookReport, IdempotentResult, MANAGED_EVENTS,
    MatchMode, WriteOutcome, create_backup, inspect, load, matches_disk, reconcile,
    register_missing, remove_bindings, write, write_if_changed,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of a settings update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChange {
    pub result: IdempotentResult,
    /// Copy of the previous settings file, when one was made.
    pub backup: Option<PathBuf>,
}

impl SettingsChange {
    fn without_backup(result: IdempotentResult) -> Self {
        Self {
            result,
            backup: None,
        }
    }
}

fn event_list(events: &[EventName]) -> String {
    events
        .iter()
        .map(EventName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Register `action` on every managed event, superseding older entries.
///
/// The file is rewritten only when its content would change, after a
/// timestamped backup of the previous version.
pub fn install_hook_at_path(
    settings_path: &Path,
    action: &HookAction,
    legacy: &CommandMatchers,
    dry_run: bool,
) -> Result<SettingsChange> {
    // Never create ~/.claude on the user's behalf.
    let claude_dir = settings_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Could not determine .claude directory"))?;
    if !claude_dir.is_dir() {
        return Ok(SettingsChange::without_backup(IdempotentResult::NotApplicable(
            format!("{} does not exist", claude_dir.display()),
        )));
    }

    let doc = load(settings_path)?;
    let reconciled =
        reconcile(doc, &MANAGED_EVENTS, action, legacy).map_err(|e| e.at_path(settings_path))?;

    if matches_disk(&reconciled, settings_path) {
        debug!("Hook already registered in {:?}", settings_path);
        return Ok(SettingsChange::without_backup(IdempotentResult::Unchanged));
    }

    if dry_run {
        return Ok(SettingsChange::without_backup(IdempotentResult::WouldChange(
            format!(
                "Would register {} for {} in {}",
                action.command,
                event_list(&MANAGED_EVENTS),
                settings_path.display()
            ),
        )));
    }

    let backup = if settings_path.exists() {
        let backup = create_backup(settings_path)
            .with_context(|| format!("Failed to back up {}", settings_path.display()))?;
        info!("Backed up settings to {:?}", backup);
        Some(backup)
    } else {
        None
    };

    write(&reconciled, settings_path)?;
    info!("Registered hook in {:?}", settings_path);
    Ok(SettingsChange {
        result: IdempotentResult::Changed,
        backup,
    })
}

/// Remove every binding running peon-ping's own scripts from every event.
///
/// Returns the names of the events that had bindings removed.
pub fn uninstall_hook_at_path(
    settings_path: &Path,
    own: &CommandMatchers,
    dry_run: bool,
) -> Result<(IdempotentResult, Vec<String>)> {
    if !settings_path.is_file() {
        return Ok((
            IdempotentResult::NotApplicable(format!("{} not found", settings_path.display())),
            Vec::new(),
        ));
    }

    let doc = load(settings_path)?;
    let (cleaned, events) = remove_bindings(doc, own).map_err(|e| e.at_path(settings_path))?;
    if events.is_empty() {
        return Ok((IdempotentResult::Unchanged, events));
    }
    if dry_run {
        return Ok((
            IdempotentResult::WouldChange(format!("Would remove hooks for {}", events.join(", "))),
            events,
        ));
    }

    let result = match write_if_changed(&cleaned, settings_path)? {
        WriteOutcome::Written => IdempotentResult::Changed,
        WriteOutcome::Unchanged => IdempotentResult::Unchanged,
    };
    info!("Removed hooks for {} from {:?}", events.join(", "), settings_path);
    Ok((result, events))
}

/// Register `notify_action` on each managed event that has no `notify.sh`
/// binding. Returns the events that gained one.
pub fn restore_notify_hooks_at_path(
    settings_path: &Path,
    notify_action: &HookAction,
    mode: MatchMode,
    dry_run: bool,
) -> Result<(IdempotentResult, Vec<EventName>)> {
    let doc = load(settings_path)?;
    let notify = CommandMatchers::new(["notify.sh"], mode);
    let (restored, added) = register_missing(doc, &MANAGED_EVENTS, notify_action, &notify)
        .map_err(|e| e.at_path(settings_path))?;

    if added.is_empty() {
        return Ok((IdempotentResult::Unchanged, added));
    }
    if dry_run {
        return Ok((
            IdempotentResult::WouldChange(format!(
                "Would restore notify.sh hooks for {}",
                event_list(&added)
            )),
            added,
        ));
    }

    write(&restored, settings_path)?;
    info!("Restored notify.sh hooks for {}", event_list(&added));
    Ok((IdempotentResult::Changed, added))
}

/// Describe the current registration without modifying anything.
pub fn check_hook_at_path(
    settings_path: &Path,
    action: &HookAction,
    legacy: &CommandMatchers,
) -> Result<HookReport> {
    let doc = load(settings_path)?;
    Ok(inspect(&doc, &MANAGED_EVENTS, action, legacy).map_err(|e| e.at_path(settings_path))?)
}

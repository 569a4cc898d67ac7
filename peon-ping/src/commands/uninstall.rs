//! `peon-ping uninstall`: remove the hook and everything install created.

use super::Session;
use crate::hook;
use crate::ui::{self, StatusIndicator};
use anyhow::{Context, Result};
use dialoguer::Confirm;
use peon_common::IdempotentResult;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// What to do with a `notify.sh.backup` left by install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreChoice {
    /// Prompt when attended, otherwise keep the backup untouched.
    #[default]
    Ask,
    Restore,
    Keep,
}

/// Flags for [`uninstall`].
#[derive(Debug, Clone, Default)]
pub struct UninstallOptions {
    pub restore: RestoreChoice,
    pub dry_run: bool,
}

pub fn uninstall(session: &Session, opts: &UninstallOptions) -> Result<()> {
    let layout = &session.layout;
    println!("{}", ui::header("peon-ping uninstaller"));
    println!();
    if opts.dry_run {
        ui::line(StatusIndicator::Warning, "DRY RUN - no changes will be made");
        println!();
    }

    let settings_path = layout.settings_path();
    if settings_path.is_file() {
        println!("Removing peon hooks from settings.json...");
    }
    let (result, events) =
        hook::uninstall_hook_at_path(&settings_path, &session.own_matchers(), opts.dry_run)?;
    match result {
        IdempotentResult::Changed => ui::line(
            StatusIndicator::Success,
            format!("Removed hooks for: {}", events.join(", ")),
        ),
        IdempotentResult::WouldChange(what) => ui::line(StatusIndicator::Info, what),
        IdempotentResult::Unchanged => {
            ui::line(StatusIndicator::Info, "No peon hooks found in settings.json")
        }
        IdempotentResult::NotApplicable(why) => debug!("Skipping settings: {}", why),
    }

    if layout.notify_backup().is_file() {
        println!();
        if should_restore(opts.restore)? {
            restore_notify(session, opts.dry_run)?;
        } else {
            ui::line(
                StatusIndicator::Info,
                format!("Kept {}", layout.notify_backup().display()),
            );
        }
    }

    remove_dir(&layout.skill_dir(), "skill: peon-ping-toggle", opts.dry_run)?;
    let install_dir = layout.install_dir();
    if install_dir.is_dir() {
        println!();
        println!("Removing {}...", install_dir.display());
        remove_dir(&install_dir, "install directory", opts.dry_run)?;
    }

    println!();
    println!("{}", ui::header("Uninstall complete"));
    println!("Me go now.");
    info!("Uninstall finished");
    Ok(())
}

/// Resolve [`RestoreChoice::Ask`]: prompt (default yes) when a user is at
/// the terminal, otherwise keep the backup.
fn should_restore(choice: RestoreChoice) -> Result<bool> {
    match choice {
        RestoreChoice::Restore => Ok(true),
        RestoreChoice::Keep => Ok(false),
        RestoreChoice::Ask if console::user_attended() => Confirm::new()
            .with_prompt("Restore original notify.sh from backup?")
            .default(true)
            .interact()
            .context("Failed to read answer"),
        RestoreChoice::Ask => {
            debug!("No terminal attached; keeping notify.sh backup");
            Ok(false)
        }
    }
}

fn restore_notify(session: &Session, dry_run: bool) -> Result<()> {
    let layout = &session.layout;
    let action = layout.notify_action(session.config.hook_timeout);
    let (result, added) = hook::restore_notify_hooks_at_path(
        &layout.settings_path(),
        &action,
        session.config.match_mode,
        dry_run,
    )?;
    match result {
        IdempotentResult::Changed => {
            let names: Vec<&str> = added.iter().map(|e| e.as_str()).collect();
            ui::line(
                StatusIndicator::Success,
                format!("Restored notify.sh hooks for: {}", names.join(", ")),
            );
        }
        IdempotentResult::WouldChange(what) => ui::line(StatusIndicator::Info, what),
        _ => debug!("notify.sh hooks already present"),
    }

    let backup = layout.notify_backup();
    let notify = layout.notify_script();
    if dry_run {
        ui::line(
            StatusIndicator::Info,
            format!("Would restore {} from backup", notify.display()),
        );
        return Ok(());
    }
    fs::copy(&backup, &notify)
        .with_context(|| format!("Failed to restore {}", notify.display()))?;
    fs::remove_file(&backup).with_context(|| format!("Failed to remove {}", backup.display()))?;
    ui::line(StatusIndicator::Success, "notify.sh restored");
    Ok(())
}

fn remove_dir(dir: &Path, label: &str, dry_run: bool) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    if dry_run {
        ui::line(StatusIndicator::Info, format!("Would remove {}", label));
        return Ok(());
    }
    fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    ui::line(StatusIndicator::Success, format!("Removed {}", label));
    Ok(())
}

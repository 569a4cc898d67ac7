//! `peon-ping install`: fetch assets and register the hook.

use super::Session;
use super::helpers::{indent_lines, plural};
use crate::assets::{self, AssetSource, Fetch};
use crate::hook;
use crate::platform;
use crate::shell;
use crate::ui::{self, StatusIndicator};
use anyhow::{Context, Result};
use peon_common::{HookStatus, IdempotentResult, MANAGED_EVENTS, Platform, atomic_write};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Flags for [`install`].
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Local checkout to copy assets from.
    pub source: Option<PathBuf>,
    pub dry_run: bool,
    pub skip_checks: bool,
    pub no_shell: bool,
}

pub fn install(session: &Session, opts: &InstallOptions, fetcher: &dyn Fetch) -> Result<()> {
    let layout = &session.layout;
    println!("{}", ui::header("peon-ping installer"));
    println!();

    let updating = layout.is_update();
    if updating {
        ui::line(StatusIndicator::Info, "Existing install found. Updating...");
    }

    if opts.skip_checks {
        debug!("Skipping prerequisite checks");
    } else {
        platform::check_prerequisites(session.platform, layout, platform::on_path)?;
    }

    let settings_path = layout.settings_path();
    let action = session.canonical_action();
    let legacy = session.legacy_matchers();

    // Refuse to touch anything if settings.json cannot be reconciled.
    let report = hook::check_hook_at_path(&settings_path, &action, &legacy)?;
    debug!("Hook status before install: {}", report.status);

    let source = AssetSource::resolve(opts.source.as_deref(), &session.config.repo_base)?;

    if opts.dry_run {
        return dry_run(session, &source, updating, report.status);
    }

    println!("Installing from {}", ui::highlight(&source.describe()));
    let mut assets = assets::install_assets(layout, &source, fetcher, updating)?;
    assets::make_hook_executable(layout, session.platform)?;
    assets::install_skill(layout, &source, fetcher, &mut assets)?;
    debug!(
        "Core files {:?}, default config installed: {}",
        assets.core_files, assets.config_installed
    );
    if assets.skill_installed {
        ui::line(StatusIndicator::Success, "Installed /peon-ping-toggle skill");
    }
    if !assets.warnings.is_empty() {
        ui::line(
            StatusIndicator::Warning,
            format!("{} while fetching assets:", plural(assets.warnings.len(), "warning")),
        );
        println!("{}", indent_lines(&assets.warnings.join("\n"), "    "));
    }

    if !opts.no_shell {
        install_shell_integration(session)?;
    }

    println!();
    for (pack, count) in assets::pack_sound_counts(layout) {
        if count == 0 {
            ui::line(StatusIndicator::Warning, format!("[{}] No sound files found!", pack));
        } else {
            println!("[{}] {} installed.", pack, plural(count, "sound file"));
        }
    }

    if !updating {
        backup_notify_script(session)?;
    }

    println!();
    println!("Updating Claude Code hooks in settings.json...");
    let change = hook::install_hook_at_path(&settings_path, &action, &legacy, false)?;
    if let Some(backup) = &change.backup {
        ui::line(
            StatusIndicator::Info,
            format!("Previous settings saved to {}", backup.display()),
        );
    }
    match &change.result {
        IdempotentResult::Changed => ui::line(
            StatusIndicator::Success,
            format!("Hooks registered for: {}", managed_event_names()),
        ),
        IdempotentResult::Unchanged => ui::line(
            StatusIndicator::Success,
            format!("Hooks already registered for: {}", managed_event_names()),
        ),
        other => ui::line(StatusIndicator::Warning, other.to_string()),
    }

    if !updating {
        let state = layout.state_file();
        atomic_write(&state, b"{}")
            .with_context(|| format!("Failed to initialise {}", state.display()))?;
        debug!("Initialised {:?}", state);
    }

    print_summary(session, updating);
    info!("Install finished ({})", change.result);
    Ok(())
}

fn managed_event_names() -> String {
    MANAGED_EVENTS
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn dry_run(
    session: &Session,
    source: &AssetSource,
    updating: bool,
    status: HookStatus,
) -> Result<()> {
    let layout = &session.layout;
    ui::line(StatusIndicator::Warning, "DRY RUN - no changes will be made");
    println!();
    ui::line(
        StatusIndicator::Info,
        format!(
            "Would install assets from {} into {}",
            source.describe(),
            layout.install_dir().display()
        ),
    );
    if updating {
        ui::line(StatusIndicator::Info, "Would preserve config.json and state");
    } else if layout.notify_script().is_file() && !layout.notify_backup().exists() {
        ui::line(
            StatusIndicator::Info,
            format!("Would back up {}", layout.notify_script().display()),
        );
    }

    let change = hook::install_hook_at_path(
        &layout.settings_path(),
        &session.canonical_action(),
        &session.legacy_matchers(),
        true,
    )?;
    ui::line(
        StatusIndicator::Info,
        format!("Hook status: {} ({})", status, change.result),
    );
    Ok(())
}

fn install_shell_integration(session: &Session) -> Result<()> {
    let layout = &session.layout;
    if session.platform == Platform::Windows {
        let cmd = shell::write_windows_cmd(layout)?;
        ui::line(
            StatusIndicator::Success,
            format!("Created peon.cmd at {}", cmd.display()),
        );
        println!(
            "  Add {} to your PATH to use 'peon' from any terminal.",
            layout.install_dir().display()
        );
        return Ok(());
    }

    for update in shell::integrate_rc_files(layout.home())? {
        let name = update
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if update.alias_added {
            ui::line(StatusIndicator::Success, format!("Added peon alias to {}", name));
        }
        if update.completion_added {
            ui::line(StatusIndicator::Success, format!("Added tab completion to {}", name));
        }
    }
    Ok(())
}

/// Keep the first `notify.sh` found so uninstall can restore it. An
/// existing backup is never overwritten.
fn backup_notify_script(session: &Session) -> Result<()> {
    let notify = session.layout.notify_script();
    let backup = session.layout.notify_backup();
    if !notify.is_file() {
        return Ok(());
    }
    if backup.exists() {
        debug!("Keeping existing {:?}", backup);
        return Ok(());
    }
    fs::copy(&notify, &backup)
        .with_context(|| format!("Failed to back up {}", notify.display()))?;
    println!();
    ui::line(StatusIndicator::Success, "Backed up notify.sh -> notify.sh.backup");
    Ok(())
}

fn print_summary(session: &Session, updating: bool) {
    let layout = &session.layout;
    println!();
    if updating {
        println!("{}", ui::header("Update complete!"));
        println!();
        println!("Updated: core files, manifests");
        println!("Preserved: config.json, state");
    } else {
        println!("{}", ui::header("Installation complete!"));
        println!();
        println!("Config: {}", layout.config_file().display());
        println!("  - Adjust volume, toggle categories, switch packs");
        println!();
        println!("Uninstall: peon-ping uninstall");
    }
    println!();
    println!("Quick controls:");
    println!("  /peon-ping-toggle  {}", ui::muted("-- toggle sounds in Claude Code"));
    println!("  peon --toggle      {}", ui::muted("-- toggle sounds from any terminal"));
    println!("  peon --status      {}", ui::muted("-- check if sounds are paused"));
    println!();
    println!("Ready to work!");
}

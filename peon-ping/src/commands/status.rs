//! `peon-ping status`: report how the hook is installed.

use super::Session;
use crate::assets;
use crate::hook;
use crate::ui::{self, StatusIndicator};
use anyhow::Result;
use peon_common::{HookReport, HookStatus, Platform};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct PackStatus {
    name: &'static str,
    sounds: usize,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    platform: Platform,
    settings_path: PathBuf,
    install_dir: PathBuf,
    scripts_installed: bool,
    skill_installed: bool,
    notify_backup: bool,
    hooks: HookReport,
    packs: Vec<PackStatus>,
}

pub fn status(session: &Session, json: bool) -> Result<()> {
    let layout = &session.layout;
    let hooks = hook::check_hook_at_path(
        &layout.settings_path(),
        &session.canonical_action(),
        &session.legacy_matchers(),
    )?;
    let output = StatusOutput {
        platform: session.platform,
        settings_path: layout.settings_path(),
        install_dir: layout.install_dir(),
        scripts_installed: layout.is_update(),
        skill_installed: layout.skill_dir().join("SKILL.md").is_file(),
        notify_backup: layout.notify_backup().is_file(),
        hooks,
        packs: assets::pack_sound_counts(layout)
            .into_iter()
            .map(|(name, sounds)| PackStatus { name, sounds })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let indicator = match output.hooks.status {
        HookStatus::Installed => StatusIndicator::Success,
        HookStatus::NeedsUpdate => StatusIndicator::Warning,
        HookStatus::NotInstalled => StatusIndicator::Error,
    };
    ui::line(
        indicator,
        format!("peon-ping hook {}", output.hooks.status),
    );
    println!("  Platform: {}", output.platform);
    println!("  Settings: {}", output.settings_path.display());
    println!(
        "  Scripts:  {}",
        if output.scripts_installed {
            output.install_dir.display().to_string()
        } else {
            ui::muted("not installed")
        }
    );
    println!();

    for event in &output.hooks.events {
        let marker = if event.is_current() {
            StatusIndicator::Success
        } else {
            StatusIndicator::Warning
        };
        let mut detail = Vec::new();
        if event.canonical == 0 {
            detail.push("missing".to_string());
        } else if !event.canonical_last {
            detail.push("not last".to_string());
        }
        if event.canonical > 1 {
            detail.push(format!("{} copies", event.canonical));
        }
        if event.stale > 0 {
            detail.push(format!("{} stale", event.stale));
        }
        if event.other > 0 {
            detail.push(format!("{} other", event.other));
        }
        let detail = if detail.is_empty() {
            String::new()
        } else {
            format!(" {}", ui::muted(&format!("({})", detail.join(", "))))
        };
        println!("  {} {}{}", marker.display(), ui::highlight(event.event.as_str()), detail);
    }

    if output.scripts_installed {
        println!();
        for pack in &output.packs {
            println!("  [{}] {} sound files", pack.name, pack.sounds);
        }
    }
    Ok(())
}

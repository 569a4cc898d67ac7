//! Shell integration: the `peon` alias and tab completion.

use anyhow::{Context, Result};
use peon_common::InstallLayout;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ALIAS_LINE: &str = r#"alias peon="bash ~/.claude/hooks/peon-ping/peon.sh""#;
pub const COMPLETION_LINE: &str = "[ -f ~/.claude/hooks/peon-ping/completions.bash ] && source ~/.claude/hooks/peon-ping/completions.bash";

const ALIAS_MARKER: &str = "alias peon=";
const COMPLETION_MARKER: &str = "peon-ping/completions.bash";
const ALIAS_COMMENT: &str = "# peon-ping quick controls";
const RC_FILES: [&str; 2] = [".zshrc", ".bashrc"];

/// Lines appended to one rc file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcUpdate {
    pub file: PathBuf,
    pub alias_added: bool,
    pub completion_added: bool,
}

/// Add the alias and completion to every existing rc file that lacks them.
/// Rc files that do not exist are never created.
pub fn integrate_rc_files(home: &Path) -> Result<Vec<RcUpdate>> {
    let mut updates = Vec::new();
    for name in RC_FILES {
        let path = home.join(name);
        if !path.is_file() {
            continue;
        }
        let update = integrate_rc_file(&path)?;
        if update.alias_added || update.completion_added {
            updates.push(update);
        }
    }
    Ok(updates)
}

fn integrate_rc_file(path: &Path) -> Result<RcUpdate> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut addition = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        addition.push('\n');
    }
    let alias_added = !content.contains(ALIAS_MARKER);
    if alias_added {
        addition.push('\n');
        addition.push_str(ALIAS_COMMENT);
        addition.push('\n');
        addition.push_str(ALIAS_LINE);
        addition.push('\n');
    }
    let completion_added = !content.contains(COMPLETION_MARKER);
    if completion_added {
        addition.push_str(COMPLETION_LINE);
        addition.push('\n');
    }

    if alias_added || completion_added {
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        file.write_all(addition.as_bytes())
            .with_context(|| format!("appending to {}", path.display()))?;
        debug!(
            "Updated {:?} (alias: {}, completion: {})",
            path, alias_added, completion_added
        );
    }

    Ok(RcUpdate {
        file: path.to_path_buf(),
        alias_added,
        completion_added,
    })
}

/// Write `peon.cmd` into the install directory so Windows terminals can run
/// `peon` once that directory is on PATH.
pub fn write_windows_cmd(layout: &InstallLayout) -> Result<PathBuf> {
    let cmd_path = layout.install_dir().join("peon.cmd");
    let content = format!("@python \"{}\" %*\n", layout.hook_python().display());
    fs::write(&cmd_path, content).with_context(|| format!("writing {}", cmd_path.display()))?;
    Ok(cmd_path)
}

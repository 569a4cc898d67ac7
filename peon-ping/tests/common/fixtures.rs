use peon_common::InstallLayout;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const PEON_ENV: [&str; 6] = [
    "PEON_HOME",
    "PEON_REPO_BASE",
    "PEON_HOOK_TIMEOUT",
    "PEON_MATCH_MODE",
    "PEON_LOG_LEVEL",
    "PEON_LOG_JSON",
];

/// A throwaway home directory with `~/.claude` in place.
pub struct TestHome {
    pub dir: TempDir,
    pub layout: InstallLayout,
}

impl TestHome {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating test home with ~/.claude");
        let home = Self::without_claude_dir();
        fs::create_dir_all(home.layout.claude_dir()).expect("Failed to create .claude");
        home
    }

    pub fn without_claude_dir() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let layout = InstallLayout::new(dir.path());
        Self { dir, layout }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.layout.settings_path()
    }

    pub fn write_settings(&self, content: &str) {
        fs::write(self.settings_path(), content).expect("Failed to write settings.json");
    }

    pub fn read_settings(&self) -> String {
        fs::read_to_string(self.settings_path()).expect("Failed to read settings.json")
    }

    pub fn settings_json(&self) -> Value {
        serde_json::from_str(&self.read_settings()).expect("settings.json is not valid JSON")
    }

    /// Install a pre-existing `notify.sh` hook.
    pub fn write_notify_script(&self, content: &str) {
        fs::create_dir_all(self.layout.hooks_dir()).expect("Failed to create hooks dir");
        fs::write(self.layout.notify_script(), content).expect("Failed to write notify.sh");
    }

    /// Command string the installer registers on this (non-Windows) host.
    pub fn hook_command(&self) -> String {
        self.layout.hook_script().display().to_string()
    }

    /// Number of `settings.json.bak.*` files next to the settings file.
    pub fn settings_backups(&self) -> usize {
        fs::read_dir(self.layout.claude_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with("settings.json.bak."))
                    .count()
            })
            .unwrap_or(0)
    }
}

/// A minimal local peon-ping checkout to install from.
pub struct Checkout {
    pub dir: TempDir,
}

impl Checkout {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating peon-ping checkout");
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path();

        for (name, content) in [
            ("peon.sh", "#!/bin/bash\necho peon\n"),
            ("peon.py", "print('peon')\n"),
            ("completions.bash", "complete -W '--toggle --status' peon\n"),
            ("VERSION", "1.0.10\n"),
            ("config.json", "{\n  \"active_pack\": \"peon\",\n  \"volume\": 0.5\n}\n"),
        ] {
            fs::write(root.join(name), content).expect("Failed to write checkout file");
        }

        let pack = root.join("packs").join("peon");
        fs::create_dir_all(pack.join("sounds")).expect("Failed to create pack dir");
        fs::write(
            pack.join("manifest.json"),
            r#"{"name": "peon", "categories": {"greeting": {"sounds": [{"file": "ready.wav"}]}}}"#,
        )
        .expect("Failed to write manifest");
        fs::write(pack.join("sounds").join("ready.wav"), b"RIFF").expect("Failed to write sound");
        fs::write(pack.join("sounds").join("work.ogg"), b"OggS").expect("Failed to write sound");

        let skill = root.join("skills").join("peon-ping-toggle");
        fs::create_dir_all(&skill).expect("Failed to create skill dir");
        fs::write(skill.join("SKILL.md"), "# peon-ping-toggle\n").expect("Failed to write skill");

        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Run the installer binary against `home` with a clean `PEON_*` environment.
pub fn run_peon(home: &TestHome, args: &[&str]) -> Output {
    run_peon_with_env(home, args, &[])
}

pub fn run_peon_with_env(home: &TestHome, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_peon-ping"));
    command.arg("--home").arg(home.path()).args(args);
    for var in PEON_ENV {
        command.env_remove(var);
    }
    command
        .env_remove("RUST_LOG")
        .env_remove("CLICOLOR_FORCE")
        .env("NO_COLOR", "1")
        .envs(env.iter().copied())
        .stdin(Stdio::null());
    command.output().expect("Failed to run peon-ping")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

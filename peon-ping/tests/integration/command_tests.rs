use std::process::Command;

use crate::common::{
    Checkout, TestHome, assert_contains, init_test_logging, run_peon, run_peon_with_env,
    stderr_of, stdout_of,
};

#[test]
fn test_help_includes_description() {
    init_test_logging();
    crate::test_log!("TEST START: test_help_includes_description");

    let output = Command::new(env!("CARGO_BIN_EXE_peon-ping"))
        .arg("--help")
        .output()
        .expect("Failed to run peon-ping --help");

    assert!(output.status.success(), "peon-ping --help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "notification sounds for Claude Code");
    assert_contains(&stdout, "install");
    assert_contains(&stdout, "uninstall");
    assert_contains(&stdout, "status");
    crate::test_log!("TEST PASS: test_help_includes_description");
}

#[test]
fn test_unknown_subcommand_fails() {
    init_test_logging();

    let home = TestHome::new();
    let output = run_peon(&home, &["reinstall"]);
    assert!(!output.status.success());
}

#[test]
fn test_status_human_output() {
    init_test_logging();

    let home = TestHome::new();
    let output = run_peon(&home, &["status"]);

    assert!(output.status.success(), "status failed: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert_contains(&stdout, "peon-ping hook not installed");
    assert_contains(&stdout, "SessionStart");
    assert_contains(&stdout, "(missing)");
}

#[test]
fn test_invalid_environment_is_reported() {
    init_test_logging();
    crate::test_log!("TEST START: test_invalid_environment_is_reported");

    let home = TestHome::new();
    let output = run_peon_with_env(
        &home,
        &["status"],
        &[("PEON_HOOK_TIMEOUT", "0"), ("PEON_MATCH_MODE", "regex")],
    );

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert_contains(&stderr, "PEON_HOOK_TIMEOUT");
    assert_contains(&stderr, "PEON_MATCH_MODE");
    crate::test_log!("TEST PASS: test_invalid_environment_is_reported");
}

#[test]
fn test_hook_timeout_from_environment() {
    init_test_logging();

    let home = TestHome::new();
    let checkout = Checkout::new();
    let source = checkout.path().to_string_lossy().into_owned();

    let output = run_peon_with_env(
        &home,
        &["install", "--source", &source, "--skip-checks", "--no-shell"],
        &[("PEON_HOOK_TIMEOUT", "30")],
    );

    assert!(output.status.success(), "install failed: {}", stderr_of(&output));
    let settings = home.settings_json();
    assert_eq!(settings["hooks"]["Stop"][0]["hooks"][0]["timeout"], 30);
}

#[test]
fn test_shell_integration_updates_existing_rc_file() {
    init_test_logging();

    let home = TestHome::new();
    let checkout = Checkout::new();
    let source = checkout.path().to_string_lossy().into_owned();
    let bashrc = home.path().join(".bashrc");
    std::fs::write(&bashrc, "export PATH=$HOME/bin:$PATH\n").unwrap();

    let output = run_peon(&home, &["install", "--source", &source, "--skip-checks"]);
    assert!(output.status.success(), "install failed: {}", stderr_of(&output));

    let content = std::fs::read_to_string(&bashrc).unwrap();
    assert_contains(&content, "# peon-ping quick controls");
    assert_contains(&content, "alias peon=\"bash ~/.claude/hooks/peon-ping/peon.sh\"");
    assert_contains(&content, "peon-ping/completions.bash");
    assert!(!home.path().join(".zshrc").exists());
    assert_contains(&stdout_of(&output), "Added peon alias to .bashrc");
}

#[test]
fn test_missing_source_checkout_fails() {
    init_test_logging();

    let home = TestHome::new();
    let empty = tempfile::TempDir::new().unwrap();
    let source = empty.path().to_string_lossy().into_owned();

    let output = run_peon(&home, &["install", "--source", &source, "--skip-checks"]);

    assert!(!output.status.success());
    assert_contains(&stderr_of(&output), "does not contain peon.sh");
}

use serde_json::{Value, json};
use std::fs;

use crate::common::{
    Checkout, TestHome, assert_contains, assert_path_exists, assert_path_missing,
    init_test_logging, run_peon, stderr_of, stdout_of,
};

fn install(home: &TestHome, checkout: &Checkout) -> std::process::Output {
    let source = checkout.path().to_string_lossy().into_owned();
    run_peon(
        home,
        &["install", "--source", &source, "--skip-checks", "--no-shell"],
    )
}

fn canonical(home: &TestHome) -> Value {
    json!([{
        "matcher": "",
        "hooks": [{"type": "command", "command": home.hook_command(), "timeout": 10}]
    }])
}

#[test]
fn test_fresh_install_registers_four_events() {
    init_test_logging();
    crate::test_log!("TEST START: test_fresh_install_registers_four_events");

    let home = TestHome::new();
    let checkout = Checkout::new();
    let output = install(&home, &checkout);
    assert!(output.status.success(), "install failed: {}", stderr_of(&output));

    let settings = home.settings_json();
    let hooks = settings["hooks"].as_object().expect("hooks object");
    assert_eq!(
        hooks.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["SessionStart", "UserPromptSubmit", "Stop", "Notification"]
    );
    for bindings in hooks.values() {
        assert_eq!(bindings, &canonical(&home));
    }
    assert_eq!(settings.as_object().unwrap().len(), 1);
    assert!(home.read_settings().ends_with("}\n"));

    assert_eq!(fs::read_to_string(home.layout.state_file()).unwrap(), "{}");
    assert_path_exists(&home.layout.hook_script());
    assert_path_exists(&home.layout.config_file());
    assert_path_exists(&home.layout.skill_dir().join("SKILL.md"));
    assert_eq!(home.settings_backups(), 0);

    let stdout = stdout_of(&output);
    assert_contains(
        &stdout,
        "Hooks registered for: SessionStart, UserPromptSubmit, Stop, Notification",
    );
    assert_contains(&stdout, "[peon] 2 sound files installed.");
    assert_contains(&stdout, "Installation complete!");

    crate::test_log!("TEST PASS: test_fresh_install_registers_four_events");
}

#[test]
fn test_reinstall_is_byte_identical_and_preserves_config() {
    init_test_logging();
    crate::test_log!("TEST START: test_reinstall_is_byte_identical_and_preserves_config");

    let home = TestHome::new();
    let checkout = Checkout::new();
    home.write_settings("{\n  \"model\": \"opus\",\n  \"env\": {\"A\": \"1\"}\n}\n");

    assert!(install(&home, &checkout).status.success());
    let first = fs::read(home.settings_path()).unwrap();
    assert_eq!(home.settings_backups(), 1);

    fs::write(home.layout.config_file(), "{\"volume\": 0.1}\n").unwrap();
    fs::write(home.layout.state_file(), "{\"paused\": true}").unwrap();

    let output = install(&home, &checkout);
    assert!(output.status.success(), "reinstall failed: {}", stderr_of(&output));
    assert_eq!(fs::read(home.settings_path()).unwrap(), first);
    assert_eq!(home.settings_backups(), 1);
    assert_eq!(
        fs::read_to_string(home.layout.config_file()).unwrap(),
        "{\"volume\": 0.1}\n"
    );
    assert_eq!(
        fs::read_to_string(home.layout.state_file()).unwrap(),
        "{\"paused\": true}"
    );

    let stdout = stdout_of(&output);
    assert_contains(&stdout, "Existing install found. Updating...");
    assert_contains(&stdout, "Hooks already registered");
    assert_contains(&stdout, "Update complete!");

    let settings = home.settings_json();
    let keys: Vec<&str> = settings
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["model", "env", "hooks"]);

    crate::test_log!("TEST PASS: test_reinstall_is_byte_identical_and_preserves_config");
}

#[test]
fn test_malformed_settings_left_untouched() {
    init_test_logging();
    crate::test_log!("TEST START: test_malformed_settings_left_untouched");

    let home = TestHome::new();
    let checkout = Checkout::new();
    home.write_settings("{ \"hooks\": { \"Stop\": [ }");

    let output = install(&home, &checkout);

    assert!(!output.status.success(), "install should fail on malformed settings");
    assert_contains(&stderr_of(&output), "malformed settings");
    assert_eq!(home.read_settings(), "{ \"hooks\": { \"Stop\": [ }");
    assert_eq!(home.settings_backups(), 0);
    assert_path_missing(&home.layout.install_dir());

    crate::test_log!("TEST PASS: test_malformed_settings_left_untouched");
}

#[test]
fn test_wrong_shape_reports_location() {
    init_test_logging();

    let home = TestHome::new();
    let checkout = Checkout::new();
    home.write_settings("{\"hooks\": {\"Notification\": \"notify.sh\"}}\n");

    let output = install(&home, &checkout);

    assert!(!output.status.success());
    assert_contains(&stderr_of(&output), "/hooks/Notification");
    assert_eq!(
        home.read_settings(),
        "{\"hooks\": {\"Notification\": \"notify.sh\"}}\n"
    );
}

#[test]
fn test_install_supersedes_notify_and_keeps_unrelated_hooks() {
    init_test_logging();
    crate::test_log!("TEST START: test_install_supersedes_notify_and_keeps_unrelated_hooks");

    let home = TestHome::new();
    let checkout = Checkout::new();
    home.write_notify_script("#!/bin/bash\necho notify\n");
    let notify = home.layout.notify_script().display().to_string();
    let settings = json!({
        "hooks": {
            "PreToolUse": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "guard"}]}],
            "Stop": [
                {"matcher": "", "hooks": [{"type": "command", "command": notify, "timeout": 10}]}
            ],
            "Notification": [
                {"matcher": "", "hooks": [{"type": "command", "command": "say hi"}]}
            ]
        }
    });
    home.write_settings(&serde_json::to_string_pretty(&settings).unwrap());

    let output = install(&home, &checkout);
    assert!(output.status.success(), "install failed: {}", stderr_of(&output));

    let after = home.settings_json();
    assert_eq!(after["hooks"]["Stop"], canonical(&home));
    assert_eq!(after["hooks"]["PreToolUse"], settings["hooks"]["PreToolUse"]);
    let notification = after["hooks"]["Notification"].as_array().unwrap();
    assert_eq!(notification.len(), 2);
    assert_eq!(notification[0]["hooks"][0]["command"], "say hi");
    assert_eq!(Value::Array(vec![notification[1].clone()]), canonical(&home));

    assert_eq!(
        fs::read_to_string(home.layout.notify_backup()).unwrap(),
        "#!/bin/bash\necho notify\n"
    );
    assert_contains(&stdout_of(&output), "Backed up notify.sh -> notify.sh.backup");

    crate::test_log!("TEST PASS: test_install_supersedes_notify_and_keeps_unrelated_hooks");
}

#[test]
fn test_dry_run_changes_nothing() {
    init_test_logging();

    let home = TestHome::new();
    let checkout = Checkout::new();
    let source = checkout.path().to_string_lossy().into_owned();

    let output = run_peon(
        &home,
        &["install", "--source", &source, "--skip-checks", "--dry-run"],
    );

    assert!(output.status.success(), "dry run failed: {}", stderr_of(&output));
    assert_contains(&stdout_of(&output), "DRY RUN");
    assert_contains(&stdout_of(&output), "would change");
    assert_path_missing(&home.settings_path());
    assert_path_missing(&home.layout.install_dir());
}

#[test]
fn test_uninstall_restores_notify() {
    init_test_logging();
    crate::test_log!("TEST START: test_uninstall_restores_notify");

    let home = TestHome::new();
    let checkout = Checkout::new();
    home.write_notify_script("#!/bin/bash\necho original\n");
    assert!(install(&home, &checkout).status.success());
    fs::write(home.layout.notify_script(), "edited\n").unwrap();

    let output = run_peon(&home, &["uninstall", "--restore-notify"]);
    assert!(output.status.success(), "uninstall failed: {}", stderr_of(&output));

    let settings = home.settings_json();
    let hooks = settings["hooks"].as_object().unwrap();
    assert_eq!(hooks.len(), 4);
    let notify = home.layout.notify_script().display().to_string();
    for bindings in hooks.values() {
        let bindings = bindings.as_array().unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0]["hooks"][0]["command"], notify.as_str());
    }

    assert_eq!(
        fs::read_to_string(home.layout.notify_script()).unwrap(),
        "#!/bin/bash\necho original\n"
    );
    assert_path_missing(&home.layout.notify_backup());
    assert_path_missing(&home.layout.install_dir());
    assert_path_missing(&home.layout.skill_dir());

    let stdout = stdout_of(&output);
    assert_contains(
        &stdout,
        "Removed hooks for: SessionStart, UserPromptSubmit, Stop, Notification",
    );
    assert_contains(&stdout, "notify.sh restored");
    assert_contains(&stdout, "Me go now.");

    crate::test_log!("TEST PASS: test_uninstall_restores_notify");
}

#[test]
fn test_uninstall_without_terminal_keeps_backup() {
    init_test_logging();

    let home = TestHome::new();
    let checkout = Checkout::new();
    home.write_notify_script("#!/bin/bash\n");
    assert!(install(&home, &checkout).status.success());

    let output = run_peon(&home, &["uninstall"]);
    assert!(output.status.success(), "uninstall failed: {}", stderr_of(&output));

    let settings = home.settings_json();
    assert_eq!(settings["hooks"], json!({}));
    assert_path_exists(&home.layout.notify_backup());
    assert_path_missing(&home.layout.install_dir());
}

#[test]
fn test_uninstall_twice_is_harmless() {
    init_test_logging();

    let home = TestHome::new();
    let checkout = Checkout::new();
    assert!(install(&home, &checkout).status.success());
    assert!(run_peon(&home, &["uninstall", "--keep-notify"]).status.success());
    let after_first = home.read_settings();

    let output = run_peon(&home, &["uninstall", "--keep-notify"]);
    assert!(output.status.success());
    assert_contains(&stdout_of(&output), "No peon hooks found in settings.json");
    assert_eq!(home.read_settings(), after_first);
}

#[test]
fn test_status_json_follows_install() {
    init_test_logging();
    crate::test_log!("TEST START: test_status_json_follows_install");

    let home = TestHome::new();
    let checkout = Checkout::new();

    let before = run_peon(&home, &["status", "--json"]);
    assert!(before.status.success());
    let report: Value = serde_json::from_slice(&before.stdout).expect("status JSON");
    assert_eq!(report["hooks"]["status"], "not_installed");
    assert_eq!(report["scripts_installed"], false);

    assert!(install(&home, &checkout).status.success());

    let after = run_peon(&home, &["status", "--json"]);
    let report: Value = serde_json::from_slice(&after.stdout).expect("status JSON");
    assert_eq!(report["hooks"]["status"], "installed");
    assert_eq!(report["scripts_installed"], true);
    assert_eq!(report["skill_installed"], true);
    let events = report["hooks"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e["canonical"] == 1 && e["stale"] == 0));
    assert_eq!(report["packs"][0]["name"], "peon");
    assert_eq!(report["packs"][0]["sounds"], 2);

    crate::test_log!("TEST PASS: test_status_json_follows_install");
}

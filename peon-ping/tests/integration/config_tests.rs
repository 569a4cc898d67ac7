use peon_common::{InstallLayout, InstallerConfig, MatchMode, Platform};

use crate::common::init_test_logging;

#[test]
fn test_default_config() {
    init_test_logging();
    crate::test_log!("TEST START: test_default_config");

    let config = InstallerConfig::default();
    assert_eq!(config.hook_timeout, 10);
    assert_eq!(config.match_mode, MatchMode::Substring);
    assert_eq!(
        config.repo_base,
        "https://raw.githubusercontent.com/tonyyont/peon-ping/main"
    );

    crate::test_log!("TEST PASS: test_default_config");
}

#[test]
fn test_layout_hook_command_matches_install_dir() {
    init_test_logging();

    let layout = InstallLayout::new("/home/grunt");
    let command = layout.hook_command(Platform::Mac);
    assert!(command.starts_with(&layout.install_dir().display().to_string()));
    assert!(command.ends_with("peon.sh"));
}

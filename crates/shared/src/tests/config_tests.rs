use super::*;
use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("issue_logger.toml");
    fs::write(&path, "").expect("empty settings");

    let settings = load_settings_with(Some(&path), no_env).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.brightness, 100);
    assert_eq!(settings.id_policy, IdPolicy::Sequential);
    assert_eq!(settings.live_log_path, PathBuf::from("IssueLog.csv"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_settings_with(Some(&dir.path().join("nope.toml")), no_env)
        .expect_err("should fail");
    assert!(matches!(err, SettingsError::Read { .. }));
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("issue_logger.toml");
    fs::write(
        &path,
        r#"
        live_log_path = "logs/live.csv"
        brightness = 250
        id_policy = "legacy_row_number"
        poll_interval_ms = 25
        "#,
    )
    .expect("write settings");

    let settings = load_settings_with(Some(&path), no_env).expect("settings");
    assert_eq!(settings.live_log_path, PathBuf::from("logs/live.csv"));
    assert_eq!(settings.direct_log_path, PathBuf::from("DirectIssueLog.csv"));
    assert_eq!(settings.brightness, 100, "brightness is clamped");
    assert_eq!(settings.id_policy, IdPolicy::LegacyRowNumber);
    assert_eq!(settings.poll_interval_ms, 25);
}

#[test]
fn env_overrides_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("issue_logger.toml");
    fs::write(&path, "direct_log_path = \"file.csv\"\nbrightness = 40\n").expect("write");

    let env = env_from(&[
        ("ISSUE_LOGGER__DIRECT_LOG_PATH", "env.csv"),
        ("ISSUE_LOGGER__BRIGHTNESS", "75"),
        ("ISSUE_LOGGER__ID_POLICY", "legacy"),
        ("ISSUE_LOGGER__CATALOG_PATH", "layout.toml"),
        ("ISSUE_LOGGER__LOG_FILTER", "debug"),
    ]);
    let settings = load_settings_with(Some(&path), env).expect("settings");
    assert_eq!(settings.direct_log_path, PathBuf::from("env.csv"));
    assert_eq!(settings.brightness, 75);
    assert_eq!(settings.id_policy, IdPolicy::LegacyRowNumber);
    assert_eq!(settings.catalog_path, Some(PathBuf::from("layout.toml")));
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn invalid_env_values_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("issue_logger.toml");
    fs::write(&path, "").expect("write");

    let err = load_settings_with(
        Some(&path),
        env_from(&[("ISSUE_LOGGER__BRIGHTNESS", "bright")]),
    )
    .expect_err("should fail");
    assert!(
        matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "ISSUE_LOGGER__BRIGHTNESS")
    );

    let err = load_settings_with(
        Some(&path),
        env_from(&[("ISSUE_LOGGER__ID_POLICY", "random")]),
    )
    .expect_err("should fail");
    assert!(matches!(err, SettingsError::InvalidValue { .. }));
}

#[test]
fn unknown_keys_fail_to_parse() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("issue_logger.toml");
    fs::write(&path, "log_path = \"typo.csv\"\n").expect("write");

    let err = load_settings_with(Some(&path), no_env).expect_err("should fail");
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn example_settings_file_parses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("issue_logger.toml");
    fs::write(
        &path,
        include_str!("../../../../config/issue_logger.example.toml"),
    )
    .expect("write");

    let settings = load_settings_with(Some(&path), no_env).expect("settings");
    assert_eq!(settings, Settings::default());
}

#[test]
fn settings_resolve_catalog() {
    let settings = Settings::default();
    assert_eq!(settings.catalog().expect("builtin"), Catalog::builtin());

    let dir = tempfile::tempdir().expect("tempdir");
    let settings = Settings {
        catalog_path: Some(dir.path().join("missing.toml")),
        ..Settings::default()
    };
    assert!(settings.catalog().is_err());
}

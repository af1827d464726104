// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::time::Duration;

use tempfile::TempDir;

use strategist::analysis::{is_supported_attachment, HttpBackend, OrchestratorConfig};
use strategist::config::Settings;
use strategist::error::StrategistError;

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.api.base_url, "http://localhost:8001/api");
    assert_eq!(settings.request_timeout(), Duration::from_secs(600));
    assert_eq!(settings.attachments.allowed_extensions.len(), 9);
}

#[test]
fn test_base_url_env_priority() {
    // Use a custom env var name to avoid test pollution
    let mut settings = Settings::default();
    settings.api.base_url_env = "STRATEGIST_TEST_BASE_URL_12345".to_string();
    settings.api.base_url = "http://from-file/api".to_string();

    std::env::remove_var("STRATEGIST_TEST_BASE_URL_12345");
    assert_eq!(settings.api_base_url(), "http://from-file/api");

    std::env::set_var("STRATEGIST_TEST_BASE_URL_12345", "http://from-env/api");
    assert_eq!(settings.api_base_url(), "http://from-env/api");
    assert_eq!(HttpBackend::from_settings(&settings).base_url(), "http://from-env/api");

    std::env::remove_var("STRATEGIST_TEST_BASE_URL_12345");
}

#[test]
fn test_settings_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "api": {"base_url": "https://strategy.example.com/api", "request_timeout_secs": 90},
            "attachments": {"allowed_extensions": ["pdf", "md"]}
        }"#,
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.api.base_url, "https://strategy.example.com/api");
    assert_eq!(settings.api.base_url_env, "STRATEGIST_API_URL");
    assert_eq!(
        OrchestratorConfig::from(&settings).buffered_timeout,
        Duration::from_secs(90)
    );

    let allowed = &settings.attachments.allowed_extensions;
    assert!(is_supported_attachment("deck.PDF", allowed));
    assert!(!is_supported_attachment("sheet.xlsx", allowed));
}

#[test]
fn test_invalid_settings_report_config_error() {
    let mut settings = Settings::default();
    settings.api.base_url_env = "STRATEGIST_TEST_BASE_URL_UNSET".to_string();
    settings.api.base_url = "ftp://nope".to_string();

    match settings.validate() {
        Err(StrategistError::Config(message)) => assert!(message.contains("ftp://nope")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, r#"{"api": {"request_timeout_secs": "soon"}}"#).unwrap();

    assert!(matches!(
        Settings::load_from(&path),
        Err(StrategistError::Json(_))
    ));
}

#[test]
fn test_set_value_persists_and_keeps_unknown_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, r#"{"api": {"api_key": "k"}, "ui": {"theme": "dark"}}"#).unwrap();

    let mut settings = Settings::load_from(&path).unwrap();
    settings.set_value("api.request_timeout_secs", "45").unwrap();
    settings.save_to(&path).unwrap();

    let reloaded = Settings::load_from(&path).unwrap();
    assert_eq!(reloaded.get_value("api.request_timeout_secs").unwrap(), "45");
    assert_eq!(OrchestratorConfig::from(&reloaded).buffered_timeout, Duration::from_secs(45));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["api"]["api_key"], "k");
    assert_eq!(raw["ui"]["theme"], "dark");
}

#[test]
fn test_override_url_is_validated() {
    let mut settings = Settings::default();
    settings.api.base_url_env = "STRATEGIST_TEST_BASE_URL_UNSET".to_string();

    assert!(settings.validate().is_ok());
    assert!(matches!(
        settings.validate_for("localhost:9000"),
        Err(StrategistError::Config(_))
    ));
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for Strategist
//!
//! Handles loading and saving settings from ~/.strategist/settings.json

use serde::{Deserialize, Serialize};

use crate::analysis::brief::DEFAULT_ALLOWED_EXTENSIONS;
use crate::analysis::http::DEFAULT_API_URL;

mod io;
mod keys;
mod merge;
mod validation;

/// Main settings structure, stored in ~/.strategist/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Analysis service connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Attachment pre-check
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

/// Analysis service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the service, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable that overrides `base_url`
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,

    /// Budget of a buffered analysis, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            base_url_env: default_base_url_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Attachment configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentConfig {
    /// Extensions accepted by the service, without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_base_url_env() -> String {
    "STRATEGIST_API_URL".to_string()
}

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "http://localhost:8001/api");
        assert_eq!(settings.api.base_url_env, "STRATEGIST_API_URL");
        assert_eq!(settings.api.request_timeout_secs, 600);
        assert!(settings.attachments.allowed_extensions.contains(&"pdf".to_string()));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"api": {"base_url": "http://analysis:9000/api"}}"#).unwrap();
        assert_eq!(settings.api.base_url, "http://analysis:9000/api");
        assert_eq!(settings.api.request_timeout_secs, 600);
        assert_eq!(settings.attachments, AttachmentConfig::default());
    }

    #[test]
    fn test_settings_load_from_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_load_from_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "not json{").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_settings_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.api.request_timeout_secs = 120;
        settings.attachments.allowed_extensions = vec!["pdf".to_string()];
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.api.request_timeout_secs, 120);
        assert_eq!(loaded.request_timeout(), Duration::from_secs(120));
        assert_eq!(loaded.attachments.allowed_extensions, vec!["pdf".to_string()]);
    }

    #[test]
    fn test_settings_save_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        Settings::default().save_to(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"api": {"base_url": "http://old/api", "api_key": "k"}, "ui": {"theme": "dark"}}"#,
        )
        .unwrap();

        let mut settings = Settings::load_from(&path).unwrap();
        settings.api.base_url = "http://new/api".to_string();
        settings.save_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["api"]["base_url"], "http://new/api");
        assert_eq!(value["api"]["api_key"], "k");
        assert_eq!(value["ui"]["theme"], "dark");
    }

    #[test]
    fn test_save_overwrites_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "this is not json{{{").unwrap();

        Settings::default().save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_default_path() {
        assert!(Settings::default_path().ends_with("settings.json"));
    }
}

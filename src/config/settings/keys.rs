// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{Result, StrategistError};

use super::Settings;

/// Keys accepted by `settings get` / `settings set`
const SETTING_KEYS: &[&str] = &[
    "api.base_url",
    "api.base_url_env",
    "api.request_timeout_secs",
    "attachments.allowed_extensions",
];

fn unknown_key(key: &str) -> StrategistError {
    StrategistError::Config(format!(
        "Unknown setting: {} (known: {})",
        key,
        SETTING_KEYS.join(", ")
    ))
}

impl Settings {
    /// Read one setting as display text.
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "api.base_url" => self.api.base_url.clone(),
            "api.base_url_env" => self.api.base_url_env.clone(),
            "api.request_timeout_secs" => self.api.request_timeout_secs.to_string(),
            "attachments.allowed_extensions" => self.attachments.allowed_extensions.join(","),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Update one setting from text. The result is validated before it is
    /// returned, so a rejected value leaves `self` untouched.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "api.base_url" => updated.api.base_url = value.trim().to_string(),
            "api.base_url_env" => updated.api.base_url_env = value.trim().to_string(),
            "api.request_timeout_secs" => {
                updated.api.request_timeout_secs = value.trim().parse().map_err(|_| {
                    StrategistError::Config(format!("Invalid timeout value: {}", value))
                })?;
            }
            "attachments.allowed_extensions" => {
                updated.attachments.allowed_extensions = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                    .collect();
            }
            _ => return Err(unknown_key(key)),
        }

        updated.validate_for(&updated.api.base_url)?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_keys() {
        let settings = Settings::default();
        assert_eq!(
            settings.get_value("api.base_url").unwrap(),
            "http://localhost:8001/api"
        );
        assert_eq!(settings.get_value("api.request_timeout_secs").unwrap(), "600");
        assert!(settings
            .get_value("attachments.allowed_extensions")
            .unwrap()
            .contains("pdf"));
    }

    #[test]
    fn test_unknown_key() {
        let mut settings = Settings::default();
        assert!(settings.get_value("model").is_err());
        let err = settings.set_value("model", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown setting: model"));
    }

    #[test]
    fn test_set_values() {
        let mut settings = Settings::default();
        settings.set_value("api.base_url", " https://analysis.example/api ").unwrap();
        settings.set_value("api.request_timeout_secs", "90").unwrap();
        settings
            .set_value("attachments.allowed_extensions", ".PDF, md")
            .unwrap();

        assert_eq!(settings.api.base_url, "https://analysis.example/api");
        assert_eq!(settings.api.request_timeout_secs, 90);
        assert_eq!(settings.attachments.allowed_extensions, vec!["pdf", "md"]);
    }

    #[test]
    fn test_rejected_value_leaves_settings_unchanged() {
        let mut settings = Settings::default();

        assert!(settings.set_value("api.request_timeout_secs", "soon").is_err());
        assert!(settings.set_value("api.request_timeout_secs", "0").is_err());
        assert!(settings.set_value("api.base_url", "ftp://host").is_err());
        assert!(settings.set_value("attachments.allowed_extensions", "pdf,,md").is_err());

        assert_eq!(settings, Settings::default());
    }
}

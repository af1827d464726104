// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::time::Duration;

use crate::error::{Result, StrategistError};

use super::Settings;

impl Settings {
    /// Get the service base URL, checking the env var first.
    pub fn api_base_url(&self) -> String {
        // Priority: env var > config file.
        std::env::var(&self.api.base_url_env)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.api.base_url.clone())
    }

    /// Budget of a buffered analysis.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Check values that would only fail later at request time.
    pub fn validate(&self) -> Result<()> {
        self.validate_for(&self.api_base_url())
    }

    /// Like `validate`, for a base URL that overrides the configured one.
    pub fn validate_for(&self, url: &str) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StrategistError::Config(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(StrategistError::Config(
                "api.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if let Some(bad) = self
            .attachments
            .allowed_extensions
            .iter()
            .find(|ext| ext.trim_start_matches('.').trim().is_empty())
        {
            return Err(StrategistError::Config(format!(
                "attachments.allowed_extensions contains an empty entry '{}'",
                bad
            )));
        }

        Ok(())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Strategist
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for Strategist operations
#[derive(Error, Debug)]
pub enum StrategistError {
    /// API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Request rejected before any network activity
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned a non-success status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Buffered request exceeded its wall-clock budget
    #[error("Request timed out after {0}. Please try again.")]
    Timeout(String),

    /// Streaming error
    #[error("Streaming error: {0}")]
    StreamError(String),

    /// Attachment upload or summarization failed
    #[error("File analysis failed: {0}")]
    Upload(String),
}

impl ApiError {
    /// Timeout error worded in whole minutes where possible
    pub fn timeout(limit: std::time::Duration) -> Self {
        let secs = limit.as_secs();
        let text = match secs {
            60 => "1 minute".to_string(),
            s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
            1 => "1 second".to_string(),
            s if s > 0 => format!("{} seconds", s),
            _ => format!("{} ms", limit.as_millis()),
        };
        ApiError::Timeout(text)
    }
}

impl StrategistError {
    /// Text stored on a failed session, without the `API error:` wrapper.
    pub fn session_message(&self) -> String {
        match self {
            StrategistError::Api(api) => api.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for Strategist operations
pub type Result<T> = std::result::Result<T, StrategistError>;

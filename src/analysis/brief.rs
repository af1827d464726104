// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Analysis request (the "brief") and attachments

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrategistError};

/// Heading placed between the caller's notes and the uploaded file summary.
pub const FILE_SUMMARY_HEADING: &str = "## Attached file analysis";

/// Extensions the analysis service can extract text from.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "doc", "xlsx", "xls", "txt", "md", "csv", "json",
];

/// Input for one strategy analysis run.
///
/// Field names match the service's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Request {
    /// Product or service name (required)
    pub product_name: String,

    /// Short description of the product
    #[serde(default)]
    pub product_description: String,

    /// Target market / audience context
    #[serde(default)]
    pub target_market: String,

    /// Current situation and problems
    #[serde(default)]
    pub current_situation: String,

    /// Goals of the campaign
    #[serde(default)]
    pub objectives: String,

    /// Competitive context
    #[serde(default)]
    pub competitors: String,

    /// Free-form notes; file summaries are appended here
    #[serde(default)]
    pub additional_info: String,
}

impl Request {
    /// Create a request with only the required name set
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.product_description = description.into();
        self
    }

    pub fn with_target_market(mut self, target_market: impl Into<String>) -> Self {
        self.target_market = target_market.into();
        self
    }

    pub fn with_current_situation(mut self, situation: impl Into<String>) -> Self {
        self.current_situation = situation.into();
        self
    }

    pub fn with_objectives(mut self, objectives: impl Into<String>) -> Self {
        self.objectives = objectives.into();
        self
    }

    pub fn with_competitors(mut self, competitors: impl Into<String>) -> Self {
        self.competitors = competitors.into();
        self
    }

    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = info.into();
        self
    }

    /// Reject requests the service would refuse, before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.product_name.trim().is_empty() {
            return Err(StrategistError::Validation(
                "product_name is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Derive a copy whose notes end with the uploaded file summary.
    pub fn with_file_summary(&self, summary: &str) -> Request {
        let mut derived = self.clone();
        derived.additional_info = format!(
            "{}\n\n{}\n{}",
            self.additional_info, FILE_SUMMARY_HEADING, summary
        );
        derived
    }

    /// Brief fields as multipart text parts, in wire order.
    pub(crate) fn form_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("product_name", self.product_name.as_str()),
            ("product_description", self.product_description.as_str()),
            ("target_market", self.target_market.as_str()),
            ("current_situation", self.current_situation.as_str()),
            ("objectives", self.objectives.as_str()),
            ("competitors", self.competitors.as_str()),
            ("additional_info", self.additional_info.as_str()),
        ]
    }
}

/// A supporting document uploaded ahead of the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Read an attachment from disk, keeping only the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                StrategistError::Validation(format!("not a file path: {}", path.display()))
            })?;
        Ok(Self { filename, data })
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// Check a file name against an extension allow-list (case-insensitive).
pub fn is_supported_attachment<S: AsRef<str>>(filename: &str, allowed: &[S]) -> bool {
    let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    allowed
        .iter()
        .any(|a| a.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
}

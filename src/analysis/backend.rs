// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transport seam between the orchestrator and the analysis service

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::analysis::brief::{Attachment, Request};
use crate::analysis::event::ProtocolEvent;
use crate::error::Result;

/// Lazy, single-pass stream of decoded protocol events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ProtocolEvent>> + Send>>;

/// Per-file metadata returned by the summarize endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub file_type: String,
    pub char_count: u64,
}

/// Response of the upload + summarize call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    #[serde(default)]
    pub files: Vec<FileInfo>,
    pub summary: String,
}

/// Operations the orchestrator needs from the analysis service
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Backend name for logs (e.g., "http", "mock")
    fn name(&self) -> &str;

    /// Run the whole analysis and return the bundled result.
    ///
    /// With attachments the service extracts and summarizes them itself.
    async fn analyze(&self, request: &Request, attachments: &[Attachment]) -> Result<Value>;

    /// Run the whole analysis as a stream of progress events
    async fn analyze_stream(&self, request: &Request) -> Result<EventStream>;

    /// Upload attachments and get back a text summary of their contents
    async fn analyze_files(&self, attachments: &[Attachment]) -> Result<FileAnalysis>;
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock analysis backend for testing
//!
//! Provides a scripted implementation of the AnalysisBackend trait that can
//! be used in unit tests without a running analysis service. Stream bodies
//! go through the real line decoder, so chunking behaves as it would on
//! the wire.

use async_trait::async_trait;
use futures::stream;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::analysis::backend::{AnalysisBackend, EventStream, FileAnalysis, FileInfo};
use crate::analysis::brief::{Attachment, Request};
use crate::analysis::decoder::decode_stream;
use crate::analysis::event::ProtocolEvent;
use crate::error::{ApiError, Result, StrategistError};

/// A scripted analysis backend
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Stream body, already split into chunks
    stream_chunks: Vec<Vec<u8>>,
    /// Status and body returned instead of opening the stream
    stream_open_error: Option<(u16, String)>,
    /// Transport error raised after the last chunk
    stream_read_error: Option<String>,
    /// Keep the stream pending after the last chunk
    hold_open: bool,
    /// Buffered response
    bundle: Option<Value>,
    analyze_error: Option<String>,
    analyze_delay: Option<Duration>,
    file_summary: Option<String>,
    upload_error: Option<String>,
    upload_delay: Option<Duration>,

    stream_requests: Vec<Request>,
    analyze_requests: Vec<(Request, Vec<String>)>,
    uploads: Vec<Vec<String>>,
}

impl MockBackend {
    /// Create a backend whose stream is empty and whose calls succeed
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Mock backend state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Stream these events, one `data:` line each, separated by blank lines
    pub fn with_stream_events(self, events: &[ProtocolEvent]) -> Self {
        let chunks = events
            .iter()
            .map(|event| {
                let json = serde_json::to_string(event).unwrap_or_default();
                format!("data: {}\n\n", json).into_bytes()
            })
            .collect();
        self.lock().stream_chunks = chunks;
        self
    }

    /// Stream a raw body split into fixed-size chunks
    pub fn with_stream_body(self, body: &str, chunk_size: usize) -> Self {
        let chunks = body
            .as_bytes()
            .chunks(chunk_size.max(1))
            .map(<[u8]>::to_vec)
            .collect();
        self.lock().stream_chunks = chunks;
        self
    }

    /// Fail to open the stream with a server status
    pub fn with_stream_open_error(self, status: u16, body: impl Into<String>) -> Self {
        self.lock().stream_open_error = Some((status, body.into()));
        self
    }

    /// Fail mid-stream once every chunk has been delivered
    pub fn with_stream_read_error(self, message: impl Into<String>) -> Self {
        self.lock().stream_read_error = Some(message.into());
        self
    }

    /// Never end the stream after the scripted chunks
    pub fn hold_stream_open(self) -> Self {
        self.lock().hold_open = true;
        self
    }

    /// Buffered response body
    pub fn with_bundle(self, bundle: Value) -> Self {
        self.lock().bundle = Some(bundle);
        self
    }

    /// Buffered call fails with a network error
    pub fn with_analyze_error(self, message: impl Into<String>) -> Self {
        self.lock().analyze_error = Some(message.into());
        self
    }

    /// Buffered call takes this long
    pub fn with_analyze_delay(self, delay: Duration) -> Self {
        self.lock().analyze_delay = Some(delay);
        self
    }

    /// Summary returned by the upload call
    pub fn with_file_summary(self, summary: impl Into<String>) -> Self {
        self.lock().file_summary = Some(summary.into());
        self
    }

    /// Upload call fails
    pub fn with_upload_error(self, message: impl Into<String>) -> Self {
        self.lock().upload_error = Some(message.into());
        self
    }

    /// Upload call takes this long
    pub fn with_upload_delay(self, delay: Duration) -> Self {
        self.lock().upload_delay = Some(delay);
        self
    }

    /// Requests passed to `analyze_stream`, in call order
    pub fn stream_requests(&self) -> Vec<Request> {
        self.lock().stream_requests.clone()
    }

    /// Requests and attachment names passed to `analyze`
    pub fn analyze_requests(&self) -> Vec<(Request, Vec<String>)> {
        self.lock().analyze_requests.clone()
    }

    /// Attachment names of each upload call
    pub fn uploads(&self) -> Vec<Vec<String>> {
        self.lock().uploads.clone()
    }

    /// Total calls of any kind
    pub fn call_count(&self) -> usize {
        let state = self.lock();
        state.stream_requests.len() + state.analyze_requests.len() + state.uploads.len()
    }
}

fn names(attachments: &[Attachment]) -> Vec<String> {
    attachments.iter().map(|a| a.filename.clone()).collect()
}

#[async_trait]
impl AnalysisBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, request: &Request, attachments: &[Attachment]) -> Result<Value> {
        let (delay, outcome) = {
            let mut state = self.lock();
            state
                .analyze_requests
                .push((request.clone(), names(attachments)));
            let outcome = match &state.analyze_error {
                Some(message) => Err(message.clone()),
                None => Ok(state.bundle.clone().unwrap_or_else(|| serde_json::json!({}))),
            };
            (state.analyze_delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        outcome.map_err(|message| StrategistError::Api(ApiError::Network(message)))
    }

    async fn analyze_stream(&self, request: &Request) -> Result<EventStream> {
        let mut state = self.lock();
        state.stream_requests.push(request.clone());

        if let Some((status, message)) = &state.stream_open_error {
            return Err(StrategistError::Api(ApiError::ServerError {
                status: *status,
                message: message.clone(),
            }));
        }

        let mut chunks: Vec<std::result::Result<Vec<u8>, String>> =
            state.stream_chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = &state.stream_read_error {
            chunks.push(Err(message.clone()));
        }

        let source = stream::iter(chunks);
        let events: EventStream = if state.hold_open {
            Box::pin(decode_stream(futures::StreamExt::chain(
                source,
                stream::pending(),
            )))
        } else {
            Box::pin(decode_stream(source))
        };
        Ok(events)
    }

    async fn analyze_files(&self, attachments: &[Attachment]) -> Result<FileAnalysis> {
        let (delay, outcome) = {
            let mut state = self.lock();
            state.uploads.push(names(attachments));
            let outcome = match &state.upload_error {
                Some(message) => Err(message.clone()),
                None => Ok(state
                    .file_summary
                    .clone()
                    .unwrap_or_else(|| "mock file summary".to_string())),
            };
            (state.upload_delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let summary =
            outcome.map_err(|message| StrategistError::Api(ApiError::Upload(message)))?;
        Ok(FileAnalysis {
            files: attachments
                .iter()
                .map(|a| FileInfo {
                    filename: a.filename.clone(),
                    file_type: "text".to_string(),
                    char_count: a.data.len() as u64,
                })
                .collect(),
            summary,
        })
    }
}

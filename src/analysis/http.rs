// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP client for the strategy analysis service
//!
//! Implements `AnalysisBackend` on top of reqwest, plus the single-stage
//! endpoints the service exposes for running one step in isolation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;

use crate::analysis::backend::{AnalysisBackend, EventStream, FileAnalysis};
use crate::analysis::brief::{Attachment, Request};
use crate::analysis::decoder::decode_stream;
use crate::config::Settings;
use crate::error::{ApiError, Result, StrategistError};

/// Default service location when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8001/api";

/// Multipart field name used for every uploaded file
const FILES_FIELD: &str = "files";

/// Request body for single-stage endpoints that accept earlier results.
///
/// Missing inputs are computed by the service before running the stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageRequest {
    #[serde(flatten)]
    pub brief: Request,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub who: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub big_idea: Option<Value>,
}

impl From<Request> for StageRequest {
    fn from(brief: Request) -> Self {
        Self {
            brief,
            who: None,
            what: None,
            big_idea: None,
        }
    }
}

/// reqwest-backed analysis service client
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the default local service
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Create with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from settings (env override included)
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_base_url(settings.api_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        tracing::debug!(target: "strategist.http", path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| StrategistError::Api(ApiError::Network(e.to_string())))?;
        read_json(response).await
    }

    /// Barrier analysis only
    pub async fn barriers(&self, request: &Request) -> Result<Value> {
        self.post_json("/barriers", request).await
    }

    /// Audience (WHO) analysis only
    pub async fn who(&self, request: &Request) -> Result<Value> {
        self.post_json("/who", request).await
    }

    /// Market (WHAT) analysis only
    pub async fn what(&self, request: &Request) -> Result<Value> {
        self.post_json("/what", request).await
    }

    /// Big idea generation, reusing WHO/WHAT results when supplied
    pub async fn big_idea(&self, request: &StageRequest) -> Result<Value> {
        self.post_json("/bigidea", request).await
    }

    /// Copy generation, reusing earlier results when supplied
    pub async fn copy(&self, request: &StageRequest) -> Result<Value> {
        self.post_json("/copy", request).await
    }

    /// Ad planning, reusing earlier results when supplied
    pub async fn ad_planning(&self, request: &StageRequest) -> Result<Value> {
        self.post_json("/ad-planning", request).await
    }

    /// Model providers the service can use
    pub async fn providers(&self) -> Result<Value> {
        tracing::debug!(target: "strategist.http", path = "/providers", "GET");
        let response = self
            .client
            .get(self.url("/providers"))
            .send()
            .await
            .map_err(|e| StrategistError::Api(ApiError::Network(e.to_string())))?;
        read_json(response).await
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn analyze(&self, request: &Request, attachments: &[Attachment]) -> Result<Value> {
        if attachments.is_empty() {
            return self.post_json("/analyze", request).await;
        }

        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value.to_string());
        }
        form = attach_files(form, attachments)?;

        tracing::debug!(
            target: "strategist.http",
            path = "/analyze/with-files",
            files = attachments.len(),
            "POST multipart"
        );
        let response = self
            .client
            .post(self.url("/analyze/with-files"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StrategistError::Api(ApiError::Network(e.to_string())))?;
        read_json(response).await
    }

    async fn analyze_stream(&self, request: &Request) -> Result<EventStream> {
        tracing::debug!(target: "strategist.http", path = "/analyze/stream", "POST");
        let response = self
            .client
            .post(self.url("/analyze/stream"))
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| StrategistError::Api(ApiError::Network(e.to_string())))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }

    async fn analyze_files(&self, attachments: &[Attachment]) -> Result<FileAnalysis> {
        let form = attach_files(Form::new(), attachments)?;

        tracing::debug!(
            target: "strategist.http",
            path = "/files/analyze",
            files = attachments.len(),
            "POST multipart"
        );
        let response = self
            .client
            .post(self.url("/files/analyze"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StrategistError::Api(ApiError::Upload(e.to_string())))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StrategistError::Api(ApiError::Upload(format!(
                "status {}: {}",
                status, body
            ))));
        }

        response
            .json::<FileAnalysis>()
            .await
            .map_err(|e| StrategistError::Api(ApiError::Upload(e.to_string())))
    }
}

fn attach_files(mut form: Form, attachments: &[Attachment]) -> Result<Form> {
    for attachment in attachments {
        let part = Part::bytes(attachment.data.clone())
            .file_name(attachment.filename.clone())
            .mime_str(&attachment.mime_type())?;
        form = form.part(FILES_FIELD, part);
    }
    Ok(form)
}

async fn read_json(response: Response) -> Result<Value> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| StrategistError::Api(ApiError::InvalidResponse(e.to_string())))
}

/// Construct a standardized server error from a failed response.
async fn status_error(response: Response) -> StrategistError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StrategistError::Api(ApiError::ServerError {
        status,
        message: body,
    })
}

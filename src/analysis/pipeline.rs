// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Attachment pre-processing ahead of the streaming run
//!
//! With attachments, the files are summarized by the service first and the
//! summary is appended to the request notes. The stream only starts once
//! that succeeds.

use crate::analysis::backend::AnalysisBackend;
use crate::analysis::brief::{Attachment, Request};
use crate::analysis::driver::{run_streaming, Outcome, SessionHandle};
use crate::analysis::reducer::Session;

/// Upload and summarize attachments (if any), then stream the analysis.
pub async fn run_with_attachments(
    backend: &dyn AnalysisBackend,
    request: &Request,
    attachments: Vec<Attachment>,
    handle: &SessionHandle,
) -> Outcome {
    if attachments.is_empty() {
        return run_streaming(backend, request, handle).await;
    }

    let count = attachments.len();
    tracing::info!(target: "strategist.pipeline", files = count, "summarizing attachments");
    handle.update(|session| session.begin_upload(count));

    let upload = tokio::select! {
        biased;
        _ = handle.cancelled() => return Outcome::Cancelled,
        upload = backend.analyze_files(&attachments) => upload,
    };
    drop(attachments);

    let analysis = match upload {
        Ok(analysis) => analysis,
        Err(e) => return handle.fail(&e),
    };
    tracing::debug!(
        target: "strategist.pipeline",
        files = analysis.files.len(),
        summary_chars = analysis.summary.chars().count(),
        "attachments summarized"
    );

    let derived = request.with_file_summary(&analysis.summary);
    handle.update(Session::begin_analysis);
    run_streaming(backend, &derived, handle).await
}

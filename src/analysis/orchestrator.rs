// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session orchestrator
//!
//! Owns the single active session of one analysis job. Each `start` spawns
//! a job task that writes into the session through a `SessionHandle`; the
//! view layer reads snapshots or subscribes to changes, and never writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analysis::backend::AnalysisBackend;
use crate::analysis::brief::{Attachment, Request};
use crate::analysis::driver::{run_buffered, Outcome, SessionHandle, DEFAULT_BUFFERED_TIMEOUT};
use crate::analysis::pipeline::run_with_attachments;
use crate::analysis::reducer::Session;
use crate::config::Settings;
use crate::error::Result;

/// Tunables for an orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wall-clock budget of a buffered run
    pub buffered_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            buffered_timeout: DEFAULT_BUFFERED_TIMEOUT,
        }
    }
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            buffered_timeout: settings.request_timeout(),
        }
    }
}

struct ActiveJob {
    cancel: CancellationToken,
    task: JoinHandle<Outcome>,
}

/// Drives one analysis job at a time and exposes its session
pub struct Orchestrator {
    backend: Arc<dyn AnalysisBackend>,
    config: OrchestratorConfig,
    state: Arc<watch::Sender<Session>>,
    active: Option<ActiveJob>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self::with_config(backend, OrchestratorConfig::default())
    }

    pub fn with_config(backend: Arc<dyn AnalysisBackend>, config: OrchestratorConfig) -> Self {
        let (state, _) = watch::channel(Session::idle());
        Self {
            backend,
            config,
            state: Arc::new(state),
            active: None,
        }
    }

    /// Start a streaming run, replacing any previous session.
    ///
    /// Attachments are summarized first when present. An empty product name
    /// is rejected before anything changes.
    pub fn start(&mut self, request: Request, attachments: Vec<Attachment>) -> Result<()> {
        let handle = self.begin(&request, &attachments)?;
        let cancel = handle.cancel_token();
        let backend = Arc::clone(&self.backend);

        let task = tokio::spawn(async move {
            let outcome =
                run_with_attachments(backend.as_ref(), &request, attachments, &handle).await;
            tracing::debug!(target: "strategist.orchestrator", ?outcome, "streaming run finished");
            outcome
        });
        self.track(cancel, task);
        Ok(())
    }

    /// Start a single buffered run, replacing any previous session.
    ///
    /// No progress events are produced; the session jumps to `complete` or
    /// `error` when the response (or the timeout) arrives.
    pub fn start_buffered(&mut self, request: Request, attachments: Vec<Attachment>) -> Result<()> {
        let handle = self.begin(&request, &attachments)?;
        let cancel = handle.cancel_token();
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.buffered_timeout;

        let task = tokio::spawn(async move {
            let outcome =
                run_buffered(backend.as_ref(), &request, &attachments, timeout, &handle).await;
            tracing::debug!(target: "strategist.orchestrator", ?outcome, "buffered run finished");
            outcome
        });
        self.track(cancel, task);
        Ok(())
    }

    /// Stop the active run. No error is recorded.
    pub fn cancel(&mut self) {
        let Some(job) = self.active.take() else {
            return;
        };
        job.cancel.cancel();
        if job.task.is_finished() {
            return;
        }
        self.state.send_if_modified(|session| {
            let next = session.clone().cancelled();
            if next == *session {
                return false;
            }
            *session = next;
            true
        });
        tracing::info!(target: "strategist.orchestrator", "analysis cancelled");
    }

    /// Drop the session and return to idle, cancelling any active run.
    pub fn reset(&mut self) {
        if let Some(job) = self.active.take() {
            job.cancel.cancel();
        }
        self.state.send_replace(Session::idle());
    }

    /// Current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Whether a run task is still going
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|job| !job.task.is_finished())
    }

    /// Wait for the active run to end and return the final session.
    pub async fn wait(&mut self) -> Session {
        if let Some(job) = self.active.take() {
            if let Err(e) = job.task.await {
                tracing::warn!(target: "strategist.orchestrator", error = %e, "run task failed");
            }
        }
        self.snapshot()
    }

    fn begin(&mut self, request: &Request, attachments: &[Attachment]) -> Result<SessionHandle> {
        request.validate()?;

        if let Some(job) = self.active.take() {
            tracing::debug!(target: "strategist.orchestrator", "replacing active run");
            job.cancel.cancel();
        }

        let names = attachments.iter().map(|a| a.filename.clone()).collect();
        let session = Session::for_request(request.clone(), names);
        let session_id = session.id;
        self.state.send_replace(session);

        tracing::info!(
            target: "strategist.orchestrator",
            %session_id,
            backend = self.backend.name(),
            product = %request.product_name,
            files = attachments.len(),
            "starting analysis"
        );

        Ok(SessionHandle::new(
            Arc::clone(&self.state),
            session_id,
            CancellationToken::new(),
        ))
    }

    fn track(&mut self, cancel: CancellationToken, task: JoinHandle<Outcome>) {
        self.active = Some(ActiveJob { cancel, task });
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(job) = self.active.take() {
            job.cancel.cancel();
        }
    }
}

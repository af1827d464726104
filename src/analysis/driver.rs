// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transport drivers
//!
//! Two ways of running a job against an `AnalysisBackend`:
//! - buffered: one request, one bundled response, bounded by a timeout
//! - streaming: one request whose body is reduced event by event
//!
//! Both write through a `SessionHandle`, which refuses writes once its run
//! has been cancelled or replaced by a newer one.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::analysis::backend::AnalysisBackend;
use crate::analysis::brief::{Attachment, Request};
use crate::analysis::event::{StageEvent, StrategyBundle};
use crate::analysis::reducer::{reduce, Session};
use crate::error::{ApiError, StrategistError};

/// Wall-clock budget for the buffered transport
pub const DEFAULT_BUFFERED_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// How a driver run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Terminal `complete` event applied
    Completed,
    /// Terminal error applied
    Failed,
    /// Stopped by a cancel signal; nothing recorded
    Cancelled,
    /// Body ended without a terminal event
    StreamEnded,
}

/// Write access to one run's session
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<Session>>,
    session_id: Uuid,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn new(state: Arc<watch::Sender<Session>>, session_id: Uuid, cancel: CancellationToken) -> Self {
        Self {
            state,
            session_id,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that stops this run
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves once the run is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Replace the session with `f(session)`.
    ///
    /// Skipped when the run was cancelled or the orchestrator moved on to
    /// another session. Returns whether subscribers were notified.
    pub fn update(&self, f: impl FnOnce(Session) -> Session) -> bool {
        let session_id = self.session_id;
        let cancel = &self.cancel;
        self.state.send_if_modified(|session| {
            if session.id != session_id || cancel.is_cancelled() {
                return false;
            }
            let next = f(session.clone());
            if next == *session {
                return false;
            }
            *session = next;
            true
        })
    }

    /// Reduce one event into the session
    pub fn apply(&self, event: &StageEvent) -> bool {
        self.update(|session| reduce(session, event))
    }

    /// Record a fatal error and report the outcome
    pub fn fail(&self, error: &StrategistError) -> Outcome {
        if self.is_cancelled() {
            return Outcome::Cancelled;
        }
        tracing::warn!(target: "strategist.stream", error = %error, "analysis failed");
        self.apply(&StageEvent::Failed(error.session_message()));
        Outcome::Failed
    }
}

/// Run the job as one buffered request.
///
/// The timeout covers the whole exchange; when it fires the request future
/// is dropped, which aborts the transfer.
pub async fn run_buffered(
    backend: &dyn AnalysisBackend,
    request: &Request,
    attachments: &[Attachment],
    timeout: Duration,
    handle: &SessionHandle,
) -> Outcome {
    handle.update(Session::begin_analysis);

    let call = tokio::time::timeout(timeout, backend.analyze(request, attachments));
    let result = tokio::select! {
        biased;
        _ = handle.cancelled() => return Outcome::Cancelled,
        result = call => result,
    };

    let bundle = match result {
        Err(_elapsed) => return handle.fail(&ApiError::timeout(timeout).into()),
        Ok(Err(e)) => return handle.fail(&e),
        Ok(Ok(bundle)) => bundle,
    };

    match StrategyBundle::from_value(bundle) {
        Some(bundle) => {
            handle.apply(&StageEvent::Complete(Box::new(bundle)));
            Outcome::Completed
        }
        None => handle.fail(
            &ApiError::InvalidResponse("expected a JSON object with stage results".to_string())
                .into(),
        ),
    }
}

/// Run the job as a stream of progress events.
pub async fn run_streaming(
    backend: &dyn AnalysisBackend,
    request: &Request,
    handle: &SessionHandle,
) -> Outcome {
    let opened = tokio::select! {
        biased;
        _ = handle.cancelled() => return Outcome::Cancelled,
        opened = backend.analyze_stream(request) => opened,
    };
    let mut events = match opened {
        Ok(events) => events,
        Err(e) => return handle.fail(&e),
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = handle.cancelled() => return Outcome::Cancelled,
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                tracing::debug!(
                    target: "strategist.stream",
                    step = %event.step,
                    status = ?event.status,
                    server_message = event.message.as_deref().unwrap_or(""),
                    "event"
                );
                handle.apply(&StageEvent::from(event));
                if handle.is_cancelled() {
                    return Outcome::Cancelled;
                }
                let session = handle.snapshot();
                if session.is_terminal() {
                    return match session.error {
                        Some(_) => Outcome::Failed,
                        None => Outcome::Completed,
                    };
                }
            }
            Some(Err(e)) => return handle.fail(&e),
            None => {
                tracing::info!(target: "strategist.stream", "stream ended without a terminal event");
                handle.update(Session::stream_ended);
                return Outcome::StreamEnded;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::event::ProtocolEvent;
    use crate::analysis::mock_backend::MockBackend;
    use crate::analysis::reducer::Stage;
    use serde_json::json;

    fn handle_for(session: Session) -> (SessionHandle, watch::Receiver<Session>) {
        let id = session.id;
        let (tx, rx) = watch::channel(session);
        (
            SessionHandle::new(Arc::new(tx), id, CancellationToken::new()),
            rx,
        )
    }

    fn request() -> Request {
        Request::new("X")
    }

    #[test]
    fn test_handle_ignores_other_sessions() {
        let (tx, rx) = watch::channel(Session::idle());
        let stale = SessionHandle::new(Arc::new(tx), Uuid::new_v4(), CancellationToken::new());
        assert!(!stale.apply(&StageEvent::Failed("late".to_string())));
        assert_eq!(rx.borrow().stage, Stage::Idle);
    }

    #[test]
    fn test_handle_ignores_writes_after_cancel() {
        let (handle, rx) = handle_for(Session::idle());
        handle.cancel.cancel();
        assert!(!handle.apply(&StageEvent::Running(Stage::Barriers)));
        assert_eq!(rx.borrow().stage, Stage::Idle);
    }

    #[test]
    fn test_handle_skips_no_op_notifications() {
        let (handle, _rx) = handle_for(Session::idle());
        assert!(!handle.apply(&StageEvent::Ignored));
        assert!(handle.apply(&StageEvent::Running(Stage::Barriers)));
    }

    #[tokio::test]
    async fn test_streaming_happy_path() {
        let backend = MockBackend::new().with_stream_events(&[
            ProtocolEvent::running("barriers"),
            ProtocolEvent::complete("barriers", json!({"barriers": []})),
            ProtocolEvent::finished(json!({"barriers": {"barriers": [1]}})),
        ]);
        let (handle, rx) = handle_for(Session::idle());

        let outcome = run_streaming(&backend, &request(), &handle).await;

        assert_eq!(outcome, Outcome::Completed);
        let session = rx.borrow().clone();
        assert_eq!(session.stage, Stage::Complete);
        assert!(!session.is_loading);
        assert_eq!(session.results.barriers, Some(json!({"barriers": [1]})));
        assert_eq!(backend.stream_requests(), vec![request()]);
    }

    #[tokio::test]
    async fn test_streaming_error_event() {
        let backend = MockBackend::new().with_stream_events(&[
            ProtocolEvent::failed("who_what", "boom"),
            ProtocolEvent::finished(json!({"barriers": {}})),
        ]);
        let (handle, rx) = handle_for(Session::idle());

        assert_eq!(run_streaming(&backend, &request(), &handle).await, Outcome::Failed);
        assert_eq!(rx.borrow().stage, Stage::Error);
        assert_eq!(rx.borrow().error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_streaming_open_failure_is_fatal() {
        let backend = MockBackend::new().with_stream_open_error(503, "unavailable");
        let (handle, rx) = handle_for(Session::idle());

        assert_eq!(run_streaming(&backend, &request(), &handle).await, Outcome::Failed);
        let error = rx.borrow().error.clone().unwrap();
        assert!(error.contains("503"));
    }

    #[tokio::test]
    async fn test_streaming_read_failure_is_fatal() {
        let backend = MockBackend::new()
            .with_stream_events(&[ProtocolEvent::running("barriers")])
            .with_stream_read_error("connection reset");
        let (handle, rx) = handle_for(Session::idle());

        assert_eq!(run_streaming(&backend, &request(), &handle).await, Outcome::Failed);
        assert!(rx.borrow().error.as_deref().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_streaming_end_without_terminal_event() {
        let backend = MockBackend::new().with_stream_events(&[ProtocolEvent::running("copy")]);
        let (handle, rx) = handle_for(Session::idle());

        assert_eq!(run_streaming(&backend, &request(), &handle).await, Outcome::StreamEnded);
        let session = rx.borrow().clone();
        assert_eq!(session.stage, Stage::Copy);
        assert!(!session.is_loading);
        assert!(session.error.is_none());
    }

    #[tokio::test]
    async fn test_streaming_cancel_is_not_an_error() {
        let backend = MockBackend::new()
            .with_stream_events(&[ProtocolEvent::running("barriers")])
            .hold_stream_open();
        let (handle, rx) = handle_for(Session::idle());

        let task_handle = handle.clone();
        let task = tokio::spawn(async move { run_streaming(&backend, &request(), &task_handle).await });

        let mut watcher = rx.clone();
        watcher.wait_for(|s| s.stage == Stage::Barriers).await.unwrap();
        handle.cancel.cancel();

        assert_eq!(task.await.unwrap(), Outcome::Cancelled);
        assert!(rx.borrow().error.is_none());
    }

    #[tokio::test]
    async fn test_buffered_success_synthesizes_complete() {
        let backend = MockBackend::new().with_bundle(json!({
            "barriers": {"barriers": []},
            "copywriting": {"variations": []}
        }));
        let (handle, rx) = handle_for(Session::idle());

        let outcome = run_buffered(&backend, &request(), &[], DEFAULT_BUFFERED_TIMEOUT, &handle).await;

        assert_eq!(outcome, Outcome::Completed);
        let session = rx.borrow().clone();
        assert_eq!(session.stage, Stage::Complete);
        assert_eq!(session.results.copy, Some(json!({"variations": []})));
        assert_eq!(session.events_applied, 1);
    }

    #[tokio::test]
    async fn test_buffered_timeout_has_distinct_message() {
        let backend = MockBackend::new()
            .with_bundle(json!({}))
            .with_analyze_delay(Duration::from_secs(30));
        let (handle, rx) = handle_for(Session::idle());

        let outcome =
            run_buffered(&backend, &request(), &[], Duration::from_millis(20), &handle).await;

        assert_eq!(outcome, Outcome::Failed);
        let error = rx.borrow().error.clone().unwrap();
        assert!(error.starts_with("Request timed out"));
    }

    #[tokio::test]
    async fn test_buffered_transport_error() {
        let backend = MockBackend::new().with_analyze_error("connection refused");
        let (handle, rx) = handle_for(Session::idle());

        let outcome = run_buffered(&backend, &request(), &[], DEFAULT_BUFFERED_TIMEOUT, &handle).await;

        assert_eq!(outcome, Outcome::Failed);
        let error = rx.borrow().error.clone().unwrap();
        assert!(error.contains("connection refused"));
        assert!(!error.contains("timed out"));
    }

    #[tokio::test]
    async fn test_buffered_non_object_response() {
        let backend = MockBackend::new().with_bundle(json!("nope"));
        let (handle, rx) = handle_for(Session::idle());

        let outcome = run_buffered(&backend, &request(), &[], DEFAULT_BUFFERED_TIMEOUT, &handle).await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(rx.borrow().stage, Stage::Error);
    }
}

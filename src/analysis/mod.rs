// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Strategy analysis module
//!
//! Runs a multi-stage analysis job against the remote service and keeps a
//! progressively updated session of its results.

pub mod backend;
pub mod brief;
pub mod decoder;
pub mod driver;
pub mod event;
pub mod http;
pub mod mock_backend;
pub mod orchestrator;
pub mod pipeline;
pub mod reducer;
pub mod schema;

pub use backend::{AnalysisBackend, EventStream, FileAnalysis, FileInfo};
pub use brief::{is_supported_attachment, Attachment, Request};
pub use decoder::{decode_stream, LineDecoder};
pub use driver::{Outcome, SessionHandle};
pub use event::{ProtocolEvent, ResultSlot, StageEvent, StepStatus, StrategyBundle};
pub use http::HttpBackend;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use reducer::{reduce, ResultSlots, Session, Stage};

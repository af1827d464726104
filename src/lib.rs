// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Strategist - client for multi-stage strategy analysis.
//!
//! This crate exposes the runtime used by the `strategist` CLI
//! (`src/main.rs`) and by anything else that wants to drive an analysis
//! and watch its results fill in.
//!
//! Architecture highlights:
//! - `analysis`: event decoding, the stage reducer, transport drivers, the
//!   attachment pipeline and the session orchestrator
//! - `config`: JSON settings with environment overrides
//! - `view`: pure presentation helpers over a session
//! - `cli`: clap argument definitions

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod view;

pub use error::{Result, StrategistError};

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI module for Strategist
//!
//! Handles command-line argument parsing and command dispatch.

pub mod args;

pub use args::*;

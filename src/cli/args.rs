// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for Strategist.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analysis::brief::Request;

/// Strategist - strategy analysis from your terminal
#[derive(Parser, Debug)]
#[command(name = "strategist")]
#[command(version, about = "Run multi-stage strategy analyses against a Strategy Brain service")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service base URL (overrides settings and environment)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full analysis, showing progress as stages finish
    Analyze(AnalyzeArgs),

    /// Summarize files without running an analysis
    Files(FilesArgs),

    /// Run one stage on its own
    Stage(StageArgs),

    /// List model providers the service can use
    Providers,

    /// Show, read or change settings
    #[command(alias = "config")]
    Settings(SettingsArgs),
}

/// Strategy brief fields shared by analysis commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BriefArgs {
    /// Product or service name (required)
    #[arg(short = 'n', long)]
    pub product_name: String,

    /// Product description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Target market
    #[arg(short, long, default_value = "")]
    pub target: String,

    /// Current situation and challenges
    #[arg(short, long, default_value = "")]
    pub situation: String,

    /// Objectives to achieve
    #[arg(short, long, default_value = "")]
    pub objectives: String,

    /// Competitor information
    #[arg(short, long, default_value = "")]
    pub competitors: String,

    /// Anything else worth knowing
    #[arg(long, default_value = "")]
    pub notes: String,
}

impl BriefArgs {
    pub fn to_request(&self) -> Request {
        Request::new(self.product_name.clone())
            .with_description(self.description.clone())
            .with_target_market(self.target.clone())
            .with_current_situation(self.situation.clone())
            .with_objectives(self.objectives.clone())
            .with_competitors(self.competitors.clone())
            .with_additional_info(self.notes.clone())
    }
}

/// Arguments for the analyze subcommand
#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub brief: BriefArgs,

    /// File to analyze alongside the brief (repeatable)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Wait for one bundled response instead of streaming progress
    #[arg(long)]
    pub buffered: bool,
}

/// Arguments for the files subcommand
#[derive(clap::Args, Debug)]
pub struct FilesArgs {
    /// Files to summarize
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Single-stage endpoints
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageName {
    Barriers,
    Who,
    What,
    Bigidea,
    Copy,
    AdPlanning,
}

/// Arguments for the stage subcommand
#[derive(clap::Args, Debug)]
pub struct StageArgs {
    /// Stage to run
    #[arg(value_enum)]
    pub stage: StageName,

    #[command(flatten)]
    pub brief: BriefArgs,

    /// JSON file with earlier results (`who`, `what`, `big_idea`) to reuse
    #[arg(long)]
    pub from: Option<PathBuf>,
}

/// Arguments for the settings subcommand
#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: Option<SettingsCommands>,
}

/// Settings subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum SettingsCommands {
    /// Show current settings (default)
    Show,

    /// Print the settings file path
    Path,

    /// Get a setting value
    Get {
        /// Setting key (e.g., "api.base_url")
        key: String,
    },

    /// Set a setting value and save it
    Set {
        /// Setting key (e.g., "api.request_timeout_secs")
        key: String,

        /// Value to set; lists are comma separated
        value: String,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colored progress and a text summary
    #[default]
    Text,

    /// Final session as JSON
    Json,
}

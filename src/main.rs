// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Strategist - strategy analysis from your terminal
//!
//! Entry point for the Strategist CLI application.

use clap::Parser;

use strategist::analysis::HttpBackend;
use strategist::cli::{Cli, Commands};
use strategist::config::Settings;
use strategist::error::Result;

#[path = "main/commands.rs"]
mod commands;
#[path = "main/render.rs"]
mod render;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr so JSON output stays clean.
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on analysis diagnostics without knowing target names.
    // `RUST_LOG` still takes precedence.
    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { "trace" } else { "debug" };
        for target in [
            "strategist.stream",
            "strategist.pipeline",
            "strategist.orchestrator",
            "strategist.http",
        ] {
            if let Ok(parsed) = format!("{}={}", target, level).parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load settings
    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load_from(&settings_path)?;

    let command = match cli.command {
        Commands::Settings(args) => {
            return commands::run_settings(args, settings, &settings_path);
        }
        command => command,
    };

    // `--api-url` beats the env var and the file; validate what is used.
    let base_url = cli.api_url.unwrap_or_else(|| settings.api_base_url());
    settings.validate_for(&base_url)?;
    let backend = HttpBackend::with_base_url(base_url);
    tracing::debug!(base_url = backend.base_url(), "using analysis service");

    let format = cli.format;
    match command {
        Commands::Analyze(args) => commands::run_analyze(args, backend, &settings, format).await,
        Commands::Files(args) => commands::run_files(args, &backend, &settings, format).await,
        Commands::Stage(args) => commands::run_stage(args, &backend).await,
        Commands::Providers => commands::run_providers(&backend).await,
        Commands::Settings(_) => Ok(()),
    }
}

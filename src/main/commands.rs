// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use strategist::analysis::http::StageRequest;
use strategist::analysis::{
    is_supported_attachment, AnalysisBackend, Attachment, HttpBackend, Orchestrator,
    OrchestratorConfig,
};
use strategist::cli::{
    AnalyzeArgs, FilesArgs, OutputFormat, SettingsArgs, SettingsCommands, StageArgs, StageName,
};
use strategist::config::Settings;
use strategist::error::{Result, StrategistError};

use crate::render::{self, Progress};

/// How often the progress loop checks whether the job task is still alive
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub(super) async fn run_analyze(
    args: AnalyzeArgs,
    backend: HttpBackend,
    settings: &Settings,
    format: OutputFormat,
) -> Result<()> {
    let request = args.brief.to_request();
    request.validate()?;
    let attachments = load_attachments(&args.files, settings)?;

    let mut orchestrator =
        Orchestrator::with_config(Arc::new(backend), OrchestratorConfig::from(settings));
    if args.buffered {
        orchestrator.start_buffered(request, attachments)?;
    } else {
        orchestrator.start(request, attachments)?;
    }

    let mut progress = Progress::new(format);
    let mut updates = orchestrator.subscribe();
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let session = updates.borrow_and_update().clone();
        progress.update(&session)?;
        if session.is_terminal() || !orchestrator.is_active() {
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = poll.tick() => {}
            _ = &mut ctrl_c => {
                orchestrator.cancel();
                break;
            }
        }
    }

    let session = orchestrator.wait().await;
    progress.finish(&session)?;
    if session.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

pub(super) async fn run_files(
    args: FilesArgs,
    backend: &HttpBackend,
    settings: &Settings,
    format: OutputFormat,
) -> Result<()> {
    let attachments = load_attachments(&args.paths, settings)?;
    let analysis = backend.analyze_files(&attachments).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => render::print_file_analysis(&analysis)?,
    }
    Ok(())
}

pub(super) async fn run_stage(args: StageArgs, backend: &HttpBackend) -> Result<()> {
    let request = args.brief.to_request();
    request.validate()?;

    let result = match args.stage {
        StageName::Barriers => backend.barriers(&request).await?,
        StageName::Who => backend.who(&request).await?,
        StageName::What => backend.what(&request).await?,
        StageName::Bigidea | StageName::Copy | StageName::AdPlanning => {
            let mut stage_request = StageRequest::from(request);
            if let Some(path) = &args.from {
                reuse_results(&mut stage_request, path)?;
            }
            match args.stage {
                StageName::Bigidea => backend.big_idea(&stage_request).await?,
                StageName::Copy => backend.copy(&stage_request).await?,
                _ => backend.ad_planning(&stage_request).await?,
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub(super) async fn run_providers(backend: &HttpBackend) -> Result<()> {
    let providers = backend.providers().await?;
    println!("{}", serde_json::to_string_pretty(&providers)?);
    Ok(())
}

pub(super) fn run_settings(args: SettingsArgs, mut settings: Settings, path: &Path) -> Result<()> {
    match args.command.unwrap_or(SettingsCommands::Show) {
        SettingsCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsCommands::Path => {
            println!("{}", path.display());
        }
        SettingsCommands::Get { key } => {
            println!("{}", settings.get_value(&key)?);
        }
        SettingsCommands::Set { key, value } => {
            settings.set_value(&key, &value)?;
            settings.save_to(path)?;
            tracing::info!(%key, path = %path.display(), "setting saved");
            println!("Setting '{}' updated.", key);
        }
    }
    Ok(())
}

/// Read attachments from disk after the allow-list pre-check.
fn load_attachments(paths: &[PathBuf], settings: &Settings) -> Result<Vec<Attachment>> {
    let allowed = &settings.attachments.allowed_extensions;
    paths
        .iter()
        .map(|path| {
            let name = path.to_string_lossy();
            if !is_supported_attachment(&name, allowed) {
                return Err(StrategistError::Validation(format!(
                    "unsupported file type: {} (allowed: {})",
                    name,
                    allowed.join(", ")
                )));
            }
            Attachment::from_path(path)
        })
        .collect()
}

/// Fill WHO/WHAT/BIG IDEA inputs from a saved run.
///
/// Accepts either a bundle-shaped object or the JSON session printed by
/// `analyze --format json`.
fn reuse_results(stage_request: &mut StageRequest, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let root = value.get("results").unwrap_or(&value);

    let pick = |key: &str| root.get(key).filter(|v| !v.is_null()).cloned();
    stage_request.who = pick("who");
    stage_request.what = pick("what");
    stage_request.big_idea = pick("big_idea");
    Ok(())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Write};

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};

use strategist::analysis::{FileAnalysis, ResultSlot, Session, Stage};
use strategist::cli::OutputFormat;
use strategist::error::Result;
use strategist::view::{self, StepState};

/// Prints session changes as they arrive
pub(super) struct Progress {
    format: OutputFormat,
    last_message: String,
    last_stage: Stage,
    reported: Vec<ResultSlot>,
}

impl Progress {
    pub(super) fn new(format: OutputFormat) -> Self {
        Self {
            format,
            last_message: String::new(),
            last_stage: Stage::Idle,
            reported: Vec::new(),
        }
    }

    /// Print what changed since the previous call.
    pub(super) fn update(&mut self, session: &Session) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        let mut stdout = io::stdout();

        if session.stage != self.last_stage && view::PIPELINE.contains(&session.stage) {
            self.last_stage = session.stage;
            stdout.execute(SetForegroundColor(Color::DarkGrey))?;
            println!("{}", tracker(session.stage));
            stdout.execute(ResetColor)?;
        }

        if !session.status_message.is_empty()
            && session.status_message != self.last_message
            && !session.is_terminal()
        {
            self.last_message = session.status_message.clone();
            stdout.execute(SetForegroundColor(Color::Cyan))?;
            print!("{}", progress_prefix(session));
            stdout.execute(ResetColor)?;
            println!(" {}", session.status_message);
        }

        for slot in ResultSlot::ALL {
            if session.results.get(slot).is_some() && !self.reported.contains(&slot) {
                self.reported.push(slot);
                stdout.execute(SetForegroundColor(Color::Green))?;
                print!("  ✓");
                stdout.execute(ResetColor)?;
                println!(" {}", slot_label(slot));
            }
        }

        stdout.flush()?;
        Ok(())
    }

    /// Print the final session.
    pub(super) fn finish(&mut self, session: &Session) -> Result<()> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(session)?);
            return Ok(());
        }
        self.update(session)?;

        let mut stdout = io::stdout();
        println!();
        match (&session.error, session.stage) {
            (Some(error), _) => {
                stdout.execute(SetForegroundColor(Color::Red))?;
                println!("Error: {}", error);
                stdout.execute(ResetColor)?;
            }
            (None, Stage::Complete) => {
                stdout.execute(SetForegroundColor(Color::Green))?;
                println!("{}", session.status_message);
                stdout.execute(ResetColor)?;
            }
            (None, _) => {
                stdout.execute(SetForegroundColor(Color::Yellow))?;
                println!("{}", session.status_message);
                stdout.execute(ResetColor)?;
            }
        }

        for (label, value) in summary_lines(session) {
            stdout.execute(SetForegroundColor(Color::Cyan))?;
            print!("{:>14}", label);
            stdout.execute(ResetColor)?;
            println!("  {}", value);
        }
        stdout.flush()?;
        Ok(())
    }
}

pub(super) fn print_file_analysis(analysis: &FileAnalysis) -> Result<()> {
    let mut stdout = io::stdout();
    for file in &analysis.files {
        stdout.execute(SetForegroundColor(Color::Green))?;
        print!("  ✓");
        stdout.execute(ResetColor)?;
        println!(" {} ({}, {} chars)", file.filename, file.file_type, file.char_count);
    }
    println!();
    println!("{}", analysis.summary);
    Ok(())
}

fn progress_prefix(session: &Session) -> String {
    let percent = (view::progress(session) * 100.0).round() as u32;
    format!("[{:>3}%] {}", percent, view::stage_label(session.stage))
}

/// One-line step tracker, e.g. `✓ Barriers  ● WHO / WHAT  ○ BIG IDEA  ○ Copy`
fn tracker(current: Stage) -> String {
    view::PIPELINE
        .iter()
        .map(|step| {
            let mark = match view::step_state(current, *step) {
                StepState::Done => "✓",
                StepState::Active => "●",
                StepState::Pending => "○",
            };
            format!("{} {}", mark, view::stage_label(*step))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn slot_label(slot: ResultSlot) -> &'static str {
    match slot {
        ResultSlot::Barriers => "Barrier analysis",
        ResultSlot::Who => "Audience (WHO)",
        ResultSlot::What => "Market (WHAT)",
        ResultSlot::BigIdea => "Big idea",
        ResultSlot::Copy => "Copy variations",
        ResultSlot::AdPlanning => "Ad plans",
        ResultSlot::Alternate3d => "Alternate framework",
    }
}

fn summary_lines(session: &Session) -> Vec<(&'static str, String)> {
    let results = &session.results;
    let mut lines = Vec::new();
    if let Some(counts) = view::abc_counts(results) {
        lines.push((
            "Barriers",
            format!(
                "{} found (A {} / B {} / C {})",
                counts.total_barriers, counts.product, counts.communication, counts.culture
            ),
        ));
    }
    if let Some(idea) = view::big_idea(results) {
        lines.push(("Big idea", idea));
    }
    if let Some(headline) = view::recommended_headline(results) {
        lines.push(("Headline", headline));
    }
    if let Some(plan) = view::recommended_plan(results) {
        lines.push(("Ad plan", plan));
    }
    if let Some(concept) = view::alternate_concept(results) {
        lines.push(("3D concept", concept));
    }
    lines
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Presentation helpers
//!
//! Pure functions that derive display values from a session. Nothing here
//! writes to the session.

use crate::analysis::reducer::{ResultSlots, Session, Stage};
use crate::analysis::schema::{self, AdPlanResult, AlternateAnalysis, BarrierResult, BigIdea, CopyOutput};

/// Stages shown in the step tracker, in pipeline order
pub const PIPELINE: [Stage; 4] = [Stage::Barriers, Stage::WhoWhat, Stage::BigIdea, Stage::Copy];

/// State of one tracker step relative to the current stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Active,
    Done,
}

/// Human label of a stage
pub fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle => "Idle",
        Stage::Uploading => "Attachments",
        Stage::Barriers => "Barriers",
        Stage::WhoWhat => "WHO / WHAT",
        Stage::BigIdea => "BIG IDEA",
        Stage::Copy => "Copy",
        Stage::Complete => "Complete",
        Stage::Error => "Error",
    }
}

/// Tracker state of `step` while the session is at `current`
pub fn step_state(current: Stage, step: Stage) -> StepState {
    if current == Stage::Complete || (current > step && current != Stage::Error) {
        StepState::Done
    } else if current == step {
        StepState::Active
    } else {
        StepState::Pending
    }
}

/// Fraction of the pipeline finished, `0.0..=1.0`.
///
/// An errored session reports the slots it managed to fill.
pub fn progress(session: &Session) -> f64 {
    let steps = PIPELINE.len() as f64;
    match session.stage {
        Stage::Idle | Stage::Uploading => 0.0,
        Stage::Complete => 1.0,
        Stage::Error => {
            let done = PIPELINE
                .iter()
                .filter(|stage| stage_has_result(&session.results, **stage))
                .count();
            done as f64 / steps
        }
        stage => {
            let done = PIPELINE.iter().filter(|s| **s < stage).count();
            done as f64 / steps
        }
    }
}

fn stage_has_result(results: &ResultSlots, stage: Stage) -> bool {
    match stage {
        Stage::Barriers => results.barriers.is_some(),
        Stage::WhoWhat => results.who.is_some() || results.what.is_some(),
        Stage::BigIdea => results.big_idea.is_some(),
        Stage::Copy => results.copy.is_some(),
        _ => false,
    }
}

/// Barrier counts per ABC class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbcCounts {
    pub total_barriers: usize,
    pub product: usize,
    pub communication: usize,
    pub culture: usize,
}

pub fn abc_counts(results: &ResultSlots) -> Option<AbcCounts> {
    let barriers: BarrierResult = schema::parse(results.barriers.as_ref()?)?;
    Some(AbcCounts {
        total_barriers: barriers.barriers.barriers.len(),
        product: barriers.classification.a_items.len(),
        communication: barriers.classification.b_items.len(),
        culture: barriers.classification.c_items.len(),
    })
}

pub fn big_idea(results: &ResultSlots) -> Option<String> {
    let idea: BigIdea = schema::parse(results.big_idea.as_ref()?)?;
    non_empty(idea.idea)
}

/// Headline of the recommended copy variation
pub fn recommended_headline(results: &ResultSlots) -> Option<String> {
    let copy: CopyOutput = schema::parse(results.copy.as_ref()?)?;
    non_empty(copy.recommended_variation()?.headline.clone())
}

/// Name of the recommended ad plan
pub fn recommended_plan(results: &ResultSlots) -> Option<String> {
    let plans: AdPlanResult = schema::parse(results.ad_planning.as_ref()?)?;
    non_empty(plans.recommended()?.plan_name.clone())
}

/// Concept of the recommended alternate-framework idea
pub fn alternate_concept(results: &ResultSlots) -> Option<String> {
    let analysis: AlternateAnalysis = schema::parse(results.alternate_3d.as_ref()?)?;
    non_empty(analysis.recommended_idea()?.concept.clone())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

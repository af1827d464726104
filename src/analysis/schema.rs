// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Typed views of stage payloads
//!
//! Stage results are stored as opaque JSON. These structs read the fields
//! the presentation layer cares about; every field is defaulted so a partial
//! or newer payload still parses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse a stage payload into one of the views below.
///
/// Returns `None` when the payload is not an object of the expected shape.
pub fn parse<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(target: "strategist.schema", error = %e, "payload did not match view");
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierItem {
    pub id: i64,
    pub barrier: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierAnalysis {
    pub barriers: Vec<BarrierItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalRelation {
    pub from_id: i64,
    pub to_id: i64,
    pub relation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Causality {
    pub relations: Vec<CausalRelation>,
    pub key_barriers: Vec<i64>,
}

/// One barrier after ABC classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbcItem {
    pub barrier_id: i64,
    pub barrier: String,
    pub classification: String,
    pub solution_approach: String,
}

/// A: solvable by the product, B: by communication, C: by cultural change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbcClassification {
    pub a_items: Vec<AbcItem>,
    pub b_items: Vec<AbcItem>,
    pub c_items: Vec<AbcItem>,
}

/// Payload of the `barriers` step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierResult {
    pub barriers: BarrierAnalysis,
    pub causality: Causality,
    pub classification: AbcClassification,
    pub mermaid_diagram: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSegment {
    pub segment_name: String,
    pub description: String,
    pub priority: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerInsight {
    pub insight: String,
    pub tension: String,
    pub opportunity: String,
}

/// Payload of the `who` step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhoAnalysis {
    pub core_target: Value,
    pub segments: Vec<TargetSegment>,
    pub insights: Vec<ConsumerInsight>,
    pub unmet_needs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueProposition {
    pub functional_value: String,
    pub emotional_value: String,
    pub social_value: String,
    pub core_proposition: String,
}

/// Payload of the `what` step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatAnalysis {
    pub market_analysis: Value,
    pub brand_diagnosis: Value,
    pub value_proposition: ValueProposition,
    pub differentiation: Vec<String>,
}

/// Payload of the `bigidea` step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigIdea {
    pub idea: String,
    pub rationale: String,
    pub evaluation: Value,
    pub alternative_ideas: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyVariation {
    pub headline: String,
    pub subhead: String,
    pub body: String,
    pub angle: String,
    pub technique: String,
    pub why_it_works: String,
}

/// Payload of the `copy` step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyOutput {
    pub strategic_brief: Value,
    pub variations: Vec<CopyVariation>,
    /// Index into `variations`
    pub recommended: usize,
    pub recommendation_reason: String,
}

impl CopyOutput {
    /// The recommended variation, falling back to the first one
    pub fn recommended_variation(&self) -> Option<&CopyVariation> {
        self.variations
            .get(self.recommended)
            .or_else(|| self.variations.first())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OohCopy {
    #[serde(rename = "copy")]
    pub text: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdPlan {
    pub plan_name: String,
    pub method: String,
    pub core_message: String,
    pub mechanism: String,
    pub ooh_copies: Vec<OohCopy>,
    pub kpi_examples: Vec<String>,
}

/// Payload of the `ad_planning` step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdPlanResult {
    pub brand_concept: String,
    pub concept_story: String,
    pub plans: Vec<AdPlan>,
    /// Index into `plans`
    pub recommended_plan: usize,
    pub recommendation_reason: String,
}

impl AdPlanResult {
    pub fn recommended(&self) -> Option<&AdPlan> {
        self.plans
            .get(self.recommended_plan)
            .or_else(|| self.plans.first())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignIdea {
    pub concept: String,
    pub enables: String,
    pub why_not_average: String,
    pub world_after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignAnalysis {
    pub ideas: Vec<DesignIdea>,
    pub recommended_idea: usize,
    pub recommendation_reason: String,
}

/// Payload of the alternate-framework (`hosoda_3d`) step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternateAnalysis {
    pub doubt: Value,
    pub discover: Value,
    pub design: DesignAnalysis,
}

impl AlternateAnalysis {
    pub fn recommended_idea(&self) -> Option<&DesignIdea> {
        self.design
            .ideas
            .get(self.design.recommended_idea)
            .or_else(|| self.design.ideas.first())
    }
}

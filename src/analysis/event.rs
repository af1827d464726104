// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Streaming protocol events
//!
//! `ProtocolEvent` is the wire shape of one `data: <json>` line.
//! `StageEvent` is the same event classified by step, which is what the
//! reducer consumes. The mapping in [`StageEvent::from_protocol`] is the
//! complete list of steps this client understands; anything else is
//! `Ignored` so newer servers can add steps without breaking older clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::reducer::Stage;

/// Progress marker carried by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Complete,
    /// Status values added by newer servers
    #[serde(other)]
    Other,
}

/// One decoded event of the streaming protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEvent {
    /// Stage or sub-stage the event concerns
    #[serde(default)]
    pub step: String,

    #[serde(default)]
    pub status: Option<StepStatus>,

    /// Step-specific payload
    #[serde(default)]
    pub data: Option<Value>,

    /// Present on fatal events
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable progress text; logged only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProtocolEvent {
    pub fn running(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: Some(StepStatus::Running),
            data: None,
            error: None,
            message: None,
        }
    }

    pub fn complete(step: impl Into<String>, data: Value) -> Self {
        Self {
            step: step.into(),
            status: Some(StepStatus::Complete),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Terminal event carrying the full result bundle
    pub fn finished(bundle: Value) -> Self {
        Self {
            step: "complete".to_string(),
            status: None,
            data: Some(bundle),
            error: None,
            message: None,
        }
    }

    pub fn failed(step: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: None,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

/// Result slots a session can hold, one per distinct service output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSlot {
    /// `barriers`: barrier list, causality, ABC classification, diagram
    Barriers,
    /// `who`: core target, segments, insights, unmet needs
    Who,
    /// `what`: market analysis, brand diagnosis, value proposition
    What,
    /// `bigidea`: the concept, rationale, evaluation, alternatives
    BigIdea,
    /// `copy`: strategic brief and copy variations
    Copy,
    /// `ad_planning`: brand concept and ad plans
    AdPlanning,
    /// `hosoda_3d`: doubt / discover / design framework analysis
    Alternate3d,
}

impl ResultSlot {
    pub const ALL: [ResultSlot; 7] = [
        ResultSlot::Barriers,
        ResultSlot::Who,
        ResultSlot::What,
        ResultSlot::BigIdea,
        ResultSlot::Copy,
        ResultSlot::AdPlanning,
        ResultSlot::Alternate3d,
    ];

    /// Step name used by incremental `complete` events
    pub fn step(self) -> &'static str {
        match self {
            ResultSlot::Barriers => "barriers",
            ResultSlot::Who => "who",
            ResultSlot::What => "what",
            ResultSlot::BigIdea => "bigidea",
            ResultSlot::Copy => "copy",
            ResultSlot::AdPlanning => "ad_planning",
            ResultSlot::Alternate3d => "hosoda_3d",
        }
    }

    fn from_step(step: &str) -> Option<Self> {
        ResultSlot::ALL.into_iter().find(|slot| slot.step() == step)
    }
}

/// Terminal payload: every stage output at once.
///
/// Fields are the service's bundle keys; each is optional so a partial
/// bundle never wipes slots filled incrementally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosoda_3d: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barriers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_idea: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copywriting: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_planning: Option<Value>,
}

impl StrategyBundle {
    /// Parse a bundle; non-object payloads are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Bundle entry for a slot. JSON `null` counts as absent.
    pub fn slot(&self, slot: ResultSlot) -> Option<&Value> {
        let value = match slot {
            ResultSlot::Barriers => &self.barriers,
            ResultSlot::Who => &self.who,
            ResultSlot::What => &self.what,
            ResultSlot::BigIdea => &self.big_idea,
            ResultSlot::Copy => &self.copywriting,
            ResultSlot::AdPlanning => &self.ad_planning,
            ResultSlot::Alternate3d => &self.hosoda_3d,
        };
        value.as_ref().filter(|v| !v.is_null())
    }
}

/// A protocol event classified by step
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// A pipeline stage started
    Running(Stage),
    /// The alternate-framework analysis started; no stage change
    AlternateRunning,
    /// One stage output is ready
    Result(ResultSlot, Value),
    /// The job finished with its full bundle
    Complete(Box<StrategyBundle>),
    /// The job failed
    Failed(String),
    /// Step/status combination this client does not handle
    Ignored,
}

impl StageEvent {
    pub fn from_protocol(event: ProtocolEvent) -> Self {
        if let Some(error) = event.error.filter(|e| !e.is_empty()) {
            return StageEvent::Failed(error);
        }

        match (event.step.as_str(), event.status) {
            ("barriers", Some(StepStatus::Running)) => StageEvent::Running(Stage::Barriers),
            ("who_what", Some(StepStatus::Running)) => StageEvent::Running(Stage::WhoWhat),
            ("bigidea", Some(StepStatus::Running)) => StageEvent::Running(Stage::BigIdea),
            ("copy", Some(StepStatus::Running)) => StageEvent::Running(Stage::Copy),
            ("hosoda_3d", Some(StepStatus::Running)) => StageEvent::AlternateRunning,
            ("complete", _) => match event.data.and_then(StrategyBundle::from_value) {
                Some(bundle) => StageEvent::Complete(Box::new(bundle)),
                None => StageEvent::Ignored,
            },
            (step, Some(StepStatus::Complete)) => {
                match (ResultSlot::from_step(step), event.data) {
                    (Some(slot), Some(data)) if !data.is_null() => StageEvent::Result(slot, data),
                    _ => StageEvent::Ignored,
                }
            }
            _ => StageEvent::Ignored,
        }
    }
}

impl From<ProtocolEvent> for StageEvent {
    fn from(event: ProtocolEvent) -> Self {
        StageEvent::from_protocol(event)
    }
}

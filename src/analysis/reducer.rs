// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session state and the stage reducer
//!
//! `reduce` is the only code that applies protocol events to a session.
//! It is pure: the previous session goes in, the next one comes out.
//!
//! Stage order is `idle → uploading → barriers → who_what → bigidea → copy
//! → complete`, with `error` reachable from any non-terminal stage. A
//! `running` event for an earlier stage than the current one is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::brief::Request;
use crate::analysis::event::{ResultSlot, StageEvent, StrategyBundle};

pub const MSG_BARRIERS: &str = "Analyzing barriers...";
pub const MSG_WHO_WHAT: &str = "Analyzing audience and market...";
pub const MSG_BIG_IDEA: &str = "Generating big idea...";
pub const MSG_COPY: &str = "Generating copy and ad plans...";
pub const MSG_ALTERNATE: &str = "Running alternate-framework analysis...";
pub const MSG_STARTING: &str = "Starting analysis...";
pub const MSG_COMPLETE: &str = "Analysis complete";
pub const MSG_ERROR: &str = "An error occurred";
pub const MSG_CANCELLED: &str = "Analysis cancelled";
pub const MSG_STREAM_ENDED: &str = "Stream ended before analysis completed";

/// Phase of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    Barriers,
    WhoWhat,
    #[serde(rename = "bigidea")]
    BigIdea,
    Copy,
    Complete,
    Error,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }

    /// Whether a session in this stage has work in flight
    pub fn is_busy(self) -> bool {
        !matches!(self, Stage::Idle | Stage::Complete | Stage::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Uploading => "uploading",
            Stage::Barriers => "barriers",
            Stage::WhoWhat => "who_what",
            Stage::BigIdea => "bigidea",
            Stage::Copy => "copy",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }

    fn running_message(self) -> Option<&'static str> {
        match self {
            Stage::Barriers => Some(MSG_BARRIERS),
            Stage::WhoWhat => Some(MSG_WHO_WHAT),
            Stage::BigIdea => Some(MSG_BIG_IDEA),
            Stage::Copy => Some(MSG_COPY),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage outputs received so far
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSlots {
    pub barriers: Option<Value>,
    pub who: Option<Value>,
    pub what: Option<Value>,
    pub big_idea: Option<Value>,
    pub copy: Option<Value>,
    pub ad_planning: Option<Value>,
    pub alternate_3d: Option<Value>,
}

impl ResultSlots {
    pub fn get(&self, slot: ResultSlot) -> Option<&Value> {
        match slot {
            ResultSlot::Barriers => self.barriers.as_ref(),
            ResultSlot::Who => self.who.as_ref(),
            ResultSlot::What => self.what.as_ref(),
            ResultSlot::BigIdea => self.big_idea.as_ref(),
            ResultSlot::Copy => self.copy.as_ref(),
            ResultSlot::AdPlanning => self.ad_planning.as_ref(),
            ResultSlot::Alternate3d => self.alternate_3d.as_ref(),
        }
    }

    fn set(&mut self, slot: ResultSlot, value: Value) {
        let target = match slot {
            ResultSlot::Barriers => &mut self.barriers,
            ResultSlot::Who => &mut self.who,
            ResultSlot::What => &mut self.what,
            ResultSlot::BigIdea => &mut self.big_idea,
            ResultSlot::Copy => &mut self.copy,
            ResultSlot::AdPlanning => &mut self.ad_planning,
            ResultSlot::Alternate3d => &mut self.alternate_3d,
        };
        *target = Some(value);
    }

    /// Number of populated slots
    pub fn filled(&self) -> usize {
        ResultSlot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_some())
            .count()
    }
}

/// State of one analysis run, as seen by the view layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Distinguishes runs; a new start always gets a new id
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stage: Stage,
    pub is_loading: bool,
    pub status_message: String,
    pub results: ResultSlots,
    /// Last terminal bundle, verbatim
    pub bundle: Option<StrategyBundle>,
    pub error: Option<String>,
    pub request: Option<Request>,
    /// Names of files attached to this run
    pub attachments: Vec<String>,
    /// Protocol events that changed or were accepted by this session
    pub events_applied: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::idle()
    }
}

impl Session {
    /// Fresh session with nothing started
    pub fn idle() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            stage: Stage::Idle,
            is_loading: false,
            status_message: String::new(),
            results: ResultSlots::default(),
            bundle: None,
            error: None,
            request: None,
            attachments: Vec::new(),
            events_applied: 0,
        }
    }

    /// Fresh session for a submitted request
    pub fn for_request(request: Request, attachments: Vec<String>) -> Self {
        Self {
            request: Some(request),
            attachments,
            ..Self::idle()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Enter `uploading` while attachments are summarized.
    pub fn begin_upload(self, file_count: usize) -> Session {
        let message = format!("Analyzing {} attached file(s)...", file_count);
        self.advance_to(Stage::Uploading, message)
    }

    /// Enter `barriers` once the request is ready to stream.
    pub fn begin_analysis(self) -> Session {
        self.advance_to(Stage::Barriers, MSG_STARTING.to_string())
    }

    /// Stop a run deliberately. No error is recorded.
    ///
    /// A run that never received an event goes back to `idle`; otherwise
    /// the last stage is kept for display.
    pub fn cancelled(mut self) -> Session {
        if self.is_terminal() {
            return self;
        }
        if self.events_applied == 0 {
            self.stage = Stage::Idle;
        }
        self.is_loading = false;
        self.status_message = MSG_CANCELLED.to_string();
        self
    }

    /// The stream closed without `complete` or an error.
    pub fn stream_ended(mut self) -> Session {
        if self.is_terminal() {
            return self;
        }
        self.is_loading = false;
        self.status_message = MSG_STREAM_ENDED.to_string();
        self
    }

    fn advance_to(mut self, stage: Stage, message: String) -> Session {
        if self.is_terminal() || stage < self.stage {
            return self;
        }
        self.stage = stage;
        self.is_loading = stage.is_busy();
        self.status_message = message;
        self
    }
}

/// Apply one event to a session.
pub fn reduce(mut session: Session, event: &StageEvent) -> Session {
    if session.is_terminal() {
        return session;
    }

    match event {
        StageEvent::Running(stage) => {
            let Some(message) = stage.running_message() else {
                return session;
            };
            if *stage < session.stage {
                tracing::debug!(
                    target: "strategist.reducer",
                    current = %session.stage,
                    incoming = %stage,
                    "ignoring backward stage transition"
                );
                return session;
            }
            session = session.advance_to(*stage, message.to_string());
        }
        StageEvent::AlternateRunning => {
            session.status_message = MSG_ALTERNATE.to_string();
        }
        StageEvent::Result(slot, value) => {
            session.results.set(*slot, value.clone());
        }
        StageEvent::Complete(bundle) => {
            for slot in ResultSlot::ALL {
                if let Some(value) = bundle.slot(slot) {
                    session.results.set(slot, value.clone());
                }
            }
            session.bundle = Some((**bundle).clone());
            session.stage = Stage::Complete;
            session.is_loading = false;
            session.status_message = MSG_COMPLETE.to_string();
        }
        StageEvent::Failed(message) => {
            session.stage = Stage::Error;
            session.is_loading = false;
            session.error = Some(message.clone());
            session.status_message = MSG_ERROR.to_string();
        }
        StageEvent::Ignored => return session,
    }

    session.events_applied += 1;
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn running(stage: Stage) -> StageEvent {
        StageEvent::Running(stage)
    }

    fn complete(bundle: Value) -> StageEvent {
        StageEvent::Complete(Box::new(StrategyBundle::from_value(bundle).unwrap()))
    }

    #[test]
    fn test_running_sets_stage_and_message() {
        let session = reduce(Session::idle(), &running(Stage::Barriers));
        assert_eq!(session.stage, Stage::Barriers);
        assert!(session.is_loading);
        assert_eq!(session.status_message, MSG_BARRIERS);

        let session = reduce(session, &running(Stage::WhoWhat));
        assert_eq!(session.stage, Stage::WhoWhat);
        assert_eq!(session.status_message, MSG_WHO_WHAT);
    }

    #[test]
    fn test_backward_transition_ignored() {
        let session = reduce(Session::idle(), &running(Stage::BigIdea));
        let after = reduce(session.clone(), &running(Stage::Barriers));
        assert_eq!(after, session);
    }

    #[test]
    fn test_skipped_stage_does_not_block() {
        let session = reduce(Session::idle(), &running(Stage::Barriers));
        let session = reduce(session, &running(Stage::Copy));
        assert_eq!(session.stage, Stage::Copy);
    }

    #[test]
    fn test_running_non_pipeline_stage_ignored() {
        let session = reduce(Session::idle(), &running(Stage::Complete));
        assert_eq!(session.stage, Stage::Idle);
        assert_eq!(session.events_applied, 0);
    }

    #[test]
    fn test_alternate_running_keeps_stage() {
        let session = reduce(Session::idle(), &running(Stage::Barriers));
        let session = reduce(session, &StageEvent::AlternateRunning);
        assert_eq!(session.stage, Stage::Barriers);
        assert_eq!(session.status_message, MSG_ALTERNATE);
    }

    #[test]
    fn test_result_slots_fill() {
        let mut session = Session::idle();
        for slot in ResultSlot::ALL {
            session = reduce(session, &StageEvent::Result(slot, json!({"slot": slot.step()})));
        }
        assert_eq!(session.results.filled(), 7);
        assert_eq!(session.results.who, Some(json!({"slot": "who"})));
        assert_eq!(session.stage, Stage::Idle);
    }

    #[test]
    fn test_complete_overwrites_and_keeps_missing_slots() {
        let session = reduce(
            Session::idle(),
            &StageEvent::Result(ResultSlot::Barriers, json!({"v": 1})),
        );
        let session = reduce(session, &StageEvent::Result(ResultSlot::AdPlanning, json!({"v": 2})));
        let session = reduce(session, &complete(json!({"barriers": {"v": 9}, "who": {"w": 1}})));

        assert_eq!(session.stage, Stage::Complete);
        assert!(!session.is_loading);
        assert_eq!(session.status_message, MSG_COMPLETE);
        assert_eq!(session.results.barriers, Some(json!({"v": 9})));
        assert_eq!(session.results.who, Some(json!({"w": 1})));
        assert_eq!(session.results.ad_planning, Some(json!({"v": 2})));
        assert!(session.bundle.is_some());
    }

    #[test]
    fn test_complete_is_idempotent() {
        let event = complete(json!({"barriers": {"barriers": []}, "big_idea": {"idea": "x"}}));
        let once = reduce(reduce(Session::idle(), &running(Stage::Copy)), &event);
        let twice = reduce(once.clone(), &event);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_error_is_permanent() {
        let session = reduce(Session::idle(), &StageEvent::Failed("boom".to_string()));
        assert_eq!(session.stage, Stage::Error);
        assert_eq!(session.error.as_deref(), Some("boom"));
        assert_eq!(session.status_message, MSG_ERROR);
        assert!(!session.is_loading);

        let after = reduce(session.clone(), &complete(json!({"barriers": {}})));
        let after = reduce(after, &StageEvent::Result(ResultSlot::Who, json!({})));
        let after = reduce(after, &running(Stage::Copy));
        assert_eq!(after, session);
    }

    #[test]
    fn test_events_after_complete_ignored() {
        let session = reduce(Session::idle(), &complete(json!({})));
        let after = reduce(session.clone(), &StageEvent::Failed("late".to_string()));
        assert_eq!(after, session);
    }

    #[test]
    fn test_begin_upload_then_analysis() {
        let session = Session::idle().begin_upload(2);
        assert_eq!(session.stage, Stage::Uploading);
        assert!(session.is_loading);
        assert!(session.status_message.contains('2'));

        let session = session.begin_analysis();
        assert_eq!(session.stage, Stage::Barriers);
        assert_eq!(session.status_message, MSG_STARTING);

        let session = reduce(session, &running(Stage::Barriers));
        assert_eq!(session.stage, Stage::Barriers);
    }

    #[test]
    fn test_cancel_before_events_returns_to_idle() {
        let session = Session::idle().begin_upload(1).cancelled();
        assert_eq!(session.stage, Stage::Idle);
        assert!(!session.is_loading);
        assert!(session.error.is_none());
    }

    #[test]
    fn test_cancel_after_events_keeps_stage() {
        let session = reduce(Session::idle(), &running(Stage::WhoWhat)).cancelled();
        assert_eq!(session.stage, Stage::WhoWhat);
        assert!(!session.is_loading);
        assert!(session.error.is_none());
    }

    #[test]
    fn test_cancel_leaves_terminal_session() {
        let session = reduce(Session::idle(), &complete(json!({})));
        assert_eq!(session.clone().cancelled(), session);
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_value(Stage::WhoWhat).unwrap(), json!("who_what"));
        assert_eq!(serde_json::to_value(Stage::BigIdea).unwrap(), json!("bigidea"));
        assert_eq!(Stage::BigIdea.to_string(), "bigidea");
    }

    fn arb_event() -> impl Strategy<Value = StageEvent> {
        prop_oneof![
            prop::sample::select(vec![
                Stage::Barriers,
                Stage::WhoWhat,
                Stage::BigIdea,
                Stage::Copy,
            ])
            .prop_map(StageEvent::Running),
            Just(StageEvent::AlternateRunning),
            prop::sample::select(ResultSlot::ALL.to_vec())
                .prop_map(|slot| StageEvent::Result(slot, json!({"s": slot.step()}))),
            Just(StageEvent::Complete(Box::new(StrategyBundle::default()))),
            Just(StageEvent::Failed("boom".to_string())),
            Just(StageEvent::Ignored),
        ]
    }

    proptest! {
        #[test]
        fn prop_stage_never_regresses(events in prop::collection::vec(arb_event(), 0..40)) {
            let mut session = Session::idle();
            for event in &events {
                let next = reduce(session.clone(), event);
                prop_assert!(next.stage >= session.stage);
                if session.is_terminal() {
                    prop_assert_eq!(&next, &session);
                }
                prop_assert_eq!(next.is_loading, next.stage.is_busy());
                prop_assert!(next.results.filled() >= session.results.filled());
                session = next;
            }
        }
    }
}

//! Session state machine.
//!
//! The engine has no clock of its own. The caller drives it with
//! `tick(delta_secs)`; production wiring uses a periodic timer, tests call
//! it directly.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Running (next segment) | Completed
//! Running | Paused -> Cancelled
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new();
//! engine.start(SessionPlan::pomodoro(&config)?, 0)?;
//! // In a loop:
//! let events = engine.tick(1)?;
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::schedule::{Segment, SegmentKind, SessionMode, SessionPlan};
use crate::error::SessionError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

/// Countdown/pause/break/cancel/complete state machine for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEngine {
    plan: Option<SessionPlan>,
    status: SessionStatus,
    segment_index: usize,
    remaining_secs: u64,
    elapsed_focus_secs: u64,
    /// Set once the plan's last work segment has run out.
    final_work_elapsed: bool,
}

impl SessionEngine {
    pub fn new() -> Self {
        Self {
            plan: None,
            status: SessionStatus::Idle,
            segment_index: 0,
            remaining_secs: 0,
            elapsed_focus_secs: 0,
            final_work_elapsed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn mode(&self) -> Option<SessionMode> {
        self.plan.as_ref().map(|p| p.mode())
    }

    pub fn plan(&self) -> Option<&SessionPlan> {
        self.plan.as_ref()
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn current_segment(&self) -> Option<Segment> {
        self.segment_at(self.segment_index)
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_focus_secs(&self) -> u64 {
        self.elapsed_focus_secs
    }

    pub fn focused_minutes(&self) -> u64 {
        self.elapsed_focus_secs / 60
    }

    /// True while the current segment is a work segment.
    pub fn in_work_segment(&self) -> bool {
        self.current_segment()
            .map(|s| s.kind == SegmentKind::Work)
            .unwrap_or(false)
    }

    /// 0.0 .. 100.0 progress across the whole plan. Always 0 for the
    /// stopwatch.
    pub fn schedule_progress_pct(&self) -> f64 {
        let Some(plan) = self.plan.as_ref() else {
            return 0.0;
        };
        if self.status == SessionStatus::Completed {
            return 100.0;
        }
        let total = match plan.total_secs() {
            Some(total) if total > 0 => total as f64,
            _ => return 0.0,
        };
        let done = plan.cumulative_secs(self.segment_index) as f64;
        let in_segment = self
            .current_segment()
            .map(|s| s.duration_secs.saturating_sub(self.remaining_secs))
            .unwrap_or(0) as f64;
        ((done + in_segment) / total * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode(),
            status: self.status,
            segment_index: self.segment_index,
            segment_kind: self.current_segment().map(|s| s.kind),
            remaining_secs: self.remaining_secs,
            elapsed_focus_secs: self.elapsed_focus_secs,
            schedule_progress_pct: self.schedule_progress_pct(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(
        &mut self,
        plan: SessionPlan,
        starting_segment_index: usize,
    ) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Idle], "start")?;
        let len = plan.segments().len();
        if starting_segment_index >= len {
            return Err(SessionError::SegmentOutOfRange {
                index: starting_segment_index,
                len,
            });
        }

        let mut events = vec![Event::SessionStarted {
            mode: plan.mode(),
            segment_count: len,
            total_secs: plan.total_secs(),
        }];
        let open_ended = plan.is_open_ended();
        info!(mode = ?plan.mode(), segments = len, "session started");

        self.plan = Some(plan);
        self.status = SessionStatus::Running;
        self.elapsed_focus_secs = 0;
        self.final_work_elapsed = false;

        if open_ended {
            self.segment_index = starting_segment_index;
            self.remaining_secs = 0;
            if let Some(segment) = self.current_segment() {
                events.push(Event::SegmentChanged {
                    index: self.segment_index,
                    segment,
                });
            }
        } else {
            self.enter_segment(starting_segment_index, &mut events);
        }
        Ok(events)
    }

    /// Advance the countdown by `delta_secs`.
    ///
    /// Time left over when a segment runs out carries into the next one, so
    /// a single large delta can cross several segments.
    pub fn tick(&mut self, delta_secs: u64) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Running], "tick")?;
        let mut events = Vec::new();

        if self.is_open_ended() {
            self.elapsed_focus_secs = self.elapsed_focus_secs.saturating_add(delta_secs);
            events.push(self.tick_event());
            return Ok(events);
        }

        let mut budget = delta_secs;
        while let Some(segment) = self.current_segment() {
            let step = budget.min(self.remaining_secs);
            self.remaining_secs -= step;
            budget -= step;
            if segment.kind == SegmentKind::Work {
                self.elapsed_focus_secs += step;
            }

            if self.remaining_secs > 0 {
                events.push(self.tick_event());
                break;
            }

            self.mark_segment_done();
            self.enter_segment(self.segment_index + 1, &mut events);
            if self.status != SessionStatus::Running {
                break;
            }
            if budget == 0 {
                events.push(self.tick_event());
                break;
            }
        }
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Running], "pause")?;
        self.status = SessionStatus::Paused;
        Ok(vec![Event::SessionPaused {
            remaining_secs: self.remaining_secs,
        }])
    }

    pub fn resume(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Paused], "resume")?;
        self.status = SessionStatus::Running;
        Ok(vec![Event::SessionResumed {
            remaining_secs: self.remaining_secs,
        }])
    }

    /// Abandon the session. The event carries the minutes focused so far.
    pub fn cancel(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Running, SessionStatus::Paused], "cancel")?;
        self.status = SessionStatus::Cancelled;
        let focused_minutes = self.focused_minutes();
        info!(focused_minutes, "session cancelled");
        Ok(vec![Event::SessionCancelled { focused_minutes }])
    }

    /// Jump from the current break straight to the next segment.
    pub fn skip_break(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Running, SessionStatus::Paused], "skip_break")?;
        let segment = match self.current_segment() {
            Some(segment) if segment.kind.is_break() => segment,
            _ => {
                return Err(SessionError::InvalidTransition {
                    operation: "skip_break",
                    status: self.status,
                })
            }
        };

        let mut events = vec![Event::BreakSkipped {
            from_index: self.segment_index,
            kind: segment.kind,
        }];
        self.status = SessionStatus::Running;
        self.enter_segment(self.segment_index + 1, &mut events);
        Ok(events)
    }

    /// Explicit stop of the open-ended stopwatch segment.
    pub fn finish(&mut self) -> Result<Vec<Event>, SessionError> {
        self.require(&[SessionStatus::Running, SessionStatus::Paused], "finish")?;
        if !self.is_open_ended() {
            return Err(SessionError::InvalidTransition {
                operation: "finish",
                status: self.status,
            });
        }
        self.final_work_elapsed = true;
        let mut events = Vec::new();
        self.complete(&mut events);
        Ok(events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(
        &self,
        allowed: &[SessionStatus],
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                status: self.status,
            })
        }
    }

    fn is_open_ended(&self) -> bool {
        self.plan
            .as_ref()
            .map(|p| p.is_open_ended())
            .unwrap_or(false)
    }

    fn segment_at(&self, index: usize) -> Option<Segment> {
        self.plan
            .as_ref()
            .and_then(|p| p.segments().get(index).copied())
    }

    fn tick_event(&self) -> Event {
        Event::Tick {
            remaining_secs: self.remaining_secs,
            elapsed_focus_secs: self.elapsed_focus_secs,
        }
    }

    fn mark_segment_done(&mut self) {
        let last_work = self.plan.as_ref().and_then(|p| p.last_work_index());
        if last_work == Some(self.segment_index) {
            self.final_work_elapsed = true;
        }
    }

    /// Load segment `index`, skipping zero-length segments, or complete the
    /// session when the plan is exhausted.
    fn enter_segment(&mut self, mut index: usize, events: &mut Vec<Event>) {
        loop {
            match self.segment_at(index) {
                None => {
                    self.complete(events);
                    return;
                }
                Some(segment) if segment.duration_secs == 0 => {
                    debug!(index, "skipping zero-length segment");
                    self.segment_index = index;
                    self.mark_segment_done();
                    index += 1;
                }
                Some(segment) => {
                    debug!(index, kind = ?segment.kind, "segment started");
                    self.segment_index = index;
                    self.remaining_secs = segment.duration_secs;
                    events.push(Event::SegmentChanged { index, segment });
                    return;
                }
            }
        }
    }

    fn complete(&mut self, events: &mut Vec<Event>) {
        self.status = SessionStatus::Completed;
        self.remaining_secs = 0;
        let focused_minutes = self.focused_minutes();
        info!(focused_minutes, "session completed");
        events.push(Event::SessionCompleted {
            focused_minutes,
            task_should_be_marked_done: self.final_work_elapsed,
        });
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::schedule::TimerConfiguration;

    fn pomodoro() -> SessionPlan {
        SessionPlan::pomodoro(&TimerConfiguration::default()).unwrap()
    }

    fn running(plan: SessionPlan) -> SessionEngine {
        let mut engine = SessionEngine::new();
        engine.start(plan, 0).unwrap();
        engine
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = SessionEngine::new();
        assert_eq!(engine.status(), SessionStatus::Idle);

        let events = engine.start(pomodoro(), 0).unwrap();
        assert_eq!(engine.status(), SessionStatus::Running);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert!(matches!(events[0], Event::SessionStarted { segment_count: 8, .. }));
        assert!(matches!(events[1], Event::SegmentChanged { index: 0, .. }));

        engine.pause().unwrap();
        assert_eq!(engine.status(), SessionStatus::Paused);

        engine.resume().unwrap();
        assert_eq!(engine.status(), SessionStatus::Running);
    }

    #[test]
    fn start_twice_rejected() {
        let mut engine = running(pomodoro());
        assert_eq!(
            engine.start(pomodoro(), 0).unwrap_err(),
            SessionError::InvalidTransition {
                operation: "start",
                status: SessionStatus::Running
            }
        );
    }

    #[test]
    fn start_index_past_end_rejected() {
        let mut engine = SessionEngine::new();
        assert!(matches!(
            engine.start(pomodoro(), 8),
            Err(SessionError::SegmentOutOfRange { index: 8, len: 8 })
        ));
        assert_eq!(engine.status(), SessionStatus::Idle);
    }

    #[test]
    fn pause_while_idle_rejected() {
        let mut engine = SessionEngine::new();
        assert!(matches!(
            engine.pause(),
            Err(SessionError::InvalidTransition {
                operation: "pause",
                status: SessionStatus::Idle
            })
        ));
        assert!(engine.resume().is_err());
        assert!(engine.cancel().is_err());
    }

    #[test]
    fn tick_while_paused_rejected() {
        let mut engine = running(pomodoro());
        engine.pause().unwrap();
        assert!(engine.tick(1).is_err());
        assert!(engine.pause().is_err());
    }

    #[test]
    fn focus_accrues_only_during_work() {
        let mut engine = running(pomodoro());
        engine.tick(25 * 60).unwrap();
        assert_eq!(engine.current_segment().unwrap().kind, SegmentKind::ShortBreak);
        engine.tick(120).unwrap();
        assert_eq!(engine.elapsed_focus_secs(), 25 * 60);
    }

    #[test]
    fn segment_boundary_emits_change() {
        let mut engine = running(pomodoro());
        engine.tick(25 * 60 - 1).unwrap();
        let events = engine.tick(1).unwrap();
        assert_eq!(
            events[0],
            Event::SegmentChanged {
                index: 1,
                segment: Segment {
                    kind: SegmentKind::ShortBreak,
                    duration_secs: 300
                }
            }
        );
        assert_eq!(engine.remaining_secs(), 300);
    }

    #[test]
    fn large_delta_carries_over() {
        let mut engine = running(pomodoro());
        engine.tick(25 * 60 + 5 * 60 + 60).unwrap();
        assert_eq!(engine.segment_index(), 2);
        assert_eq!(engine.remaining_secs(), 24 * 60);
        assert_eq!(engine.elapsed_focus_secs(), 26 * 60);
    }

    #[test]
    fn cancel_mid_work_gives_partial_credit() {
        let mut engine = running(pomodoro());
        engine.tick(7 * 60).unwrap();
        let events = engine.cancel().unwrap();
        assert_eq!(events, vec![Event::SessionCancelled { focused_minutes: 7 }]);
        assert_eq!(engine.status(), SessionStatus::Cancelled);
        assert!(engine.tick(1).is_err());
    }

    #[test]
    fn full_cycle_completes() {
        let mut engine = running(pomodoro());
        let events = engine.tick(8100).unwrap();
        assert_eq!(
            events.last(),
            Some(&Event::SessionCompleted {
                focused_minutes: 100,
                task_should_be_marked_done: true
            })
        );
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert_eq!(engine.schedule_progress_pct(), 100.0);
    }

    #[test]
    fn skip_break_jumps_to_next_work() {
        let mut engine = running(pomodoro());
        assert!(engine.skip_break().is_err());

        engine.tick(25 * 60).unwrap();
        engine.pause().unwrap();
        let events = engine.skip_break().unwrap();
        assert!(matches!(events[0], Event::BreakSkipped { from_index: 1, .. }));
        assert_eq!(engine.segment_index(), 2);
        assert_eq!(engine.status(), SessionStatus::Running);
        assert_eq!(engine.elapsed_focus_secs(), 25 * 60);
    }

    #[test]
    fn skipping_final_long_break_completes() {
        let config = TimerConfiguration::new(1, 1, 10, 1).unwrap();
        let mut engine = running(SessionPlan::pomodoro(&config).unwrap());
        engine.tick(60).unwrap();
        let events = engine.skip_break().unwrap();
        assert_eq!(
            events.last(),
            Some(&Event::SessionCompleted {
                focused_minutes: 1,
                task_should_be_marked_done: true
            })
        );
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let plan = SessionPlan::from_segments(
            SessionMode::Custom,
            vec![
                Segment::work(0),
                Segment {
                    kind: SegmentKind::ShortBreak,
                    duration_secs: 0,
                },
                Segment::work(60),
            ],
        );
        let engine = running(plan);
        assert_eq!(engine.segment_index(), 2);
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn all_zero_plan_completes_immediately() {
        let plan = SessionPlan::from_segments(SessionMode::Custom, vec![Segment::work(0)]);
        let mut engine = SessionEngine::new();
        let events = engine.start(plan, 0).unwrap();
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert!(events.last().unwrap().is_terminal());
    }

    #[test]
    fn stopwatch_counts_up_until_finish() {
        let mut engine = running(SessionPlan::stopwatch());
        engine.tick(600).unwrap();
        engine.tick(30).unwrap();
        assert_eq!(engine.status(), SessionStatus::Running);
        assert_eq!(engine.elapsed_focus_secs(), 630);

        let events = engine.finish().unwrap();
        assert_eq!(
            events,
            vec![Event::SessionCompleted {
                focused_minutes: 10,
                task_should_be_marked_done: true
            }]
        );
    }

    #[test]
    fn stopwatch_saturates_on_huge_delta() {
        let mut engine = running(SessionPlan::stopwatch());
        engine.tick(u64::MAX).unwrap();
        engine.tick(1).unwrap();
        assert_eq!(engine.elapsed_focus_secs(), u64::MAX);
        assert_eq!(engine.focused_minutes(), u64::MAX / 60);
    }

    #[test]
    fn finish_rejected_for_timed_plans() {
        let mut engine = running(pomodoro());
        assert!(engine.finish().is_err());
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut engine = running(pomodoro());
        engine.tick(810).unwrap();
        match engine.snapshot() {
            Event::StateSnapshot {
                status,
                remaining_secs,
                schedule_progress_pct,
                ..
            } => {
                assert_eq!(status, SessionStatus::Running);
                assert_eq!(remaining_secs, 1500 - 810);
                assert!((schedule_progress_pct - 10.0).abs() < 1e-9);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}

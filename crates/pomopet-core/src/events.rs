use serde::{Deserialize, Serialize};

use crate::timer::{Segment, SegmentKind, SessionMode, SessionStatus};

/// Every state change of a focus session produces an Event.
///
/// The engine returns events from each command instead of invoking
/// callbacks; [`Event::dispatch`] adapts them to a [`SessionObserver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        mode: SessionMode,
        segment_count: usize,
        /// `None` for the open-ended stopwatch.
        total_secs: Option<u64>,
    },
    SegmentChanged {
        index: usize,
        segment: Segment,
    },
    Tick {
        remaining_secs: u64,
        elapsed_focus_secs: u64,
    },
    SessionPaused {
        remaining_secs: u64,
    },
    SessionResumed {
        remaining_secs: u64,
    },
    BreakSkipped {
        from_index: usize,
        kind: SegmentKind,
    },
    SessionCompleted {
        focused_minutes: u64,
        task_should_be_marked_done: bool,
    },
    /// Partial credit: minutes focused before the cancel.
    SessionCancelled {
        focused_minutes: u64,
    },
    StateSnapshot {
        mode: Option<SessionMode>,
        status: SessionStatus,
        segment_index: usize,
        segment_kind: Option<SegmentKind>,
        remaining_secs: u64,
        elapsed_focus_secs: u64,
        schedule_progress_pct: f64,
    },
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::SessionCancelled { .. }
        )
    }

    /// Forward this event to the matching observer callback.
    pub fn dispatch(&self, observer: &mut dyn SessionObserver) {
        match self {
            Event::SegmentChanged { index, segment } => observer.on_segment_change(segment, *index),
            Event::Tick { remaining_secs, .. } => observer.on_tick(*remaining_secs),
            Event::SessionCompleted {
                focused_minutes,
                task_should_be_marked_done,
            } => observer.on_complete(*focused_minutes, *task_should_be_marked_done),
            Event::SessionCancelled { focused_minutes } => observer.on_cancel(*focused_minutes),
            _ => {}
        }
    }
}

/// Callback view of the session events.
pub trait SessionObserver {
    fn on_segment_change(&mut self, _segment: &Segment, _index: usize) {}
    fn on_tick(&mut self, _remaining_secs: u64) {}
    fn on_complete(&mut self, _focused_minutes: u64, _task_should_be_marked_done: bool) {}
    fn on_cancel(&mut self, _partial_focused_minutes: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SessionObserver for Recorder {
        fn on_tick(&mut self, remaining_secs: u64) {
            self.calls.push(format!("tick:{remaining_secs}"));
        }
        fn on_cancel(&mut self, partial_focused_minutes: u64) {
            self.calls.push(format!("cancel:{partial_focused_minutes}"));
        }
    }

    #[test]
    fn dispatch_routes_to_callbacks() {
        let mut rec = Recorder::default();
        Event::Tick {
            remaining_secs: 42,
            elapsed_focus_secs: 18,
        }
        .dispatch(&mut rec);
        Event::SessionPaused { remaining_secs: 42 }.dispatch(&mut rec);
        Event::SessionCancelled { focused_minutes: 7 }.dispatch(&mut rec);
        assert_eq!(rec.calls, vec!["tick:42", "cancel:7"]);
    }

    #[test]
    fn serializes_with_snake_case_tag() {
        let json = serde_json::to_value(Event::SessionCompleted {
            focused_minutes: 100,
            task_should_be_marked_done: true,
        })
        .unwrap();
        assert_eq!(json["type"], "session_completed");
        assert_eq!(json["focused_minutes"], 100);
    }
}

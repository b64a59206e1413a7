//! Cycle planning.
//!
//! Turns a [`TimerConfiguration`] (plus the session mode) into the ordered
//! list of segments consumed by the session engine.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl SegmentKind {
    pub fn is_break(&self) -> bool {
        !matches!(self, SegmentKind::Work)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::Work => "Focus",
            SegmentKind::ShortBreak => "Short Break",
            SegmentKind::LongBreak => "Long Break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Planned length. `0` on the open-ended stopwatch segment.
    pub duration_secs: u64,
}

impl Segment {
    pub fn work(duration_secs: u64) -> Self {
        Self {
            kind: SegmentKind::Work,
            duration_secs,
        }
    }

    pub fn duration_min(&self) -> u64 {
        self.duration_secs / 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Pomodoro,
    Stopwatch,
    Custom,
}

/// Timer settings snapshot taken when a session starts.
///
/// Later edits to the live settings never reach a session that already
/// holds a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfiguration {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub rounds_per_cycle: u32,
}

impl TimerConfiguration {
    /// Build a configuration, rejecting any zero field.
    pub fn new(
        work_minutes: u32,
        short_break_minutes: u32,
        long_break_minutes: u32,
        rounds_per_cycle: u32,
    ) -> Result<Self, SessionError> {
        let config = Self {
            work_minutes,
            short_break_minutes,
            long_break_minutes,
            rounds_per_cycle,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        let fields = [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
            ("rounds_per_cycle", self.rounds_per_cycle),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(SessionError::InvalidConfiguration { field, value });
            }
        }
        Ok(())
    }
}

impl Default for TimerConfiguration {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            rounds_per_cycle: 4,
        }
    }
}

/// Materialize the work/break cycle.
///
/// Every round gets a work segment followed by a break; the last break is
/// long, every other one short.
pub fn plan_cycle(config: &TimerConfiguration) -> Result<Vec<Segment>, SessionError> {
    config.validate()?;

    let work = minutes_to_secs(config.work_minutes);
    let short = minutes_to_secs(config.short_break_minutes);
    let long = minutes_to_secs(config.long_break_minutes);
    let rounds = config.rounds_per_cycle as usize;

    let mut segments = Vec::with_capacity(rounds * 2);
    for round in 0..rounds {
        segments.push(Segment::work(work));
        let is_last = round + 1 == rounds;
        segments.push(if is_last {
            Segment {
                kind: SegmentKind::LongBreak,
                duration_secs: long,
            }
        } else {
            Segment {
                kind: SegmentKind::ShortBreak,
                duration_secs: short,
            }
        });
    }
    Ok(segments)
}

/// Closed-form cycle length in seconds, without materializing segments.
///
/// Always equals the sum over [`plan_cycle`].
pub fn cycle_total_secs(config: &TimerConfiguration) -> Result<u64, SessionError> {
    config.validate()?;

    let work = minutes_to_secs(config.work_minutes);
    let short = minutes_to_secs(config.short_break_minutes);
    let long = minutes_to_secs(config.long_break_minutes);
    let rounds = u64::from(config.rounds_per_cycle);

    Ok((work + short) * (rounds - 1) + work + long)
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

/// The segment plan a session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    mode: SessionMode,
    segments: Vec<Segment>,
}

impl SessionPlan {
    /// Full work/break cycle.
    pub fn pomodoro(config: &TimerConfiguration) -> Result<Self, SessionError> {
        Ok(Self {
            mode: SessionMode::Pomodoro,
            segments: plan_cycle(config)?,
        })
    }

    /// A single work segment of the given length.
    pub fn custom(minutes: u32) -> Result<Self, SessionError> {
        if minutes == 0 {
            return Err(SessionError::InvalidConfiguration {
                field: "custom_minutes",
                value: minutes,
            });
        }
        Ok(Self {
            mode: SessionMode::Custom,
            segments: vec![Segment::work(minutes_to_secs(minutes))],
        })
    }

    /// One open-ended work segment, ended only by an explicit stop.
    pub fn stopwatch() -> Self {
        Self {
            mode: SessionMode::Stopwatch,
            segments: vec![Segment::work(0)],
        }
    }

    /// Hand-built plan, e.g. one restored from storage. Zero-length
    /// segments are allowed and skipped by the engine.
    pub fn from_segments(mode: SessionMode, segments: Vec<Segment>) -> Self {
        Self { mode, segments }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_open_ended(&self) -> bool {
        self.mode == SessionMode::Stopwatch
    }

    /// Planned length; `None` for the stopwatch.
    pub fn total_secs(&self) -> Option<u64> {
        if self.is_open_ended() {
            return None;
        }
        Some(self.segments.iter().map(|s| s.duration_secs).sum())
    }

    pub fn work_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Work)
            .count()
    }

    /// Planned seconds before `index`.
    pub fn cumulative_secs(&self, index: usize) -> u64 {
        self.segments
            .iter()
            .take(index)
            .map(|s| s.duration_secs)
            .sum()
    }

    /// Index of the last work segment in the plan.
    pub fn last_work_index(&self) -> Option<usize> {
        self.segments
            .iter()
            .rposition(|s| s.kind == SegmentKind::Work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(segments: &[Segment]) -> Vec<SegmentKind> {
        segments.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn default_cycle_alternates_and_ends_long() {
        use SegmentKind::*;
        let segments = plan_cycle(&TimerConfiguration::default()).unwrap();
        assert_eq!(
            kinds(&segments),
            vec![Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, LongBreak]
        );
    }

    #[test]
    fn default_cycle_total_is_8100_secs() {
        let config = TimerConfiguration::default();
        assert_eq!(cycle_total_secs(&config).unwrap(), 8100);
        let sum: u64 = plan_cycle(&config)
            .unwrap()
            .iter()
            .map(|s| s.duration_secs)
            .sum();
        assert_eq!(sum, 8100);
    }

    #[test]
    fn single_round_is_work_then_long_break() {
        let config = TimerConfiguration::new(50, 10, 20, 1).unwrap();
        let segments = plan_cycle(&config).unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::work(3000),
                Segment {
                    kind: SegmentKind::LongBreak,
                    duration_secs: 1200
                }
            ]
        );
        assert_eq!(cycle_total_secs(&config).unwrap(), 4200);
    }

    #[test]
    fn zero_rounds_rejected() {
        let err = TimerConfiguration::new(25, 5, 15, 0).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidConfiguration {
                field: "rounds_per_cycle",
                value: 0
            }
        );
    }

    #[test]
    fn zero_duration_rejected_even_when_built_by_hand() {
        let config = TimerConfiguration {
            work_minutes: 25,
            short_break_minutes: 0,
            long_break_minutes: 15,
            rounds_per_cycle: 4,
        };
        assert!(plan_cycle(&config).is_err());
        assert!(cycle_total_secs(&config).is_err());
    }

    #[test]
    fn custom_plan_is_single_work_segment() {
        let plan = SessionPlan::custom(90).unwrap();
        assert_eq!(plan.segments(), &[Segment::work(5400)]);
        assert_eq!(plan.total_secs(), Some(5400));
        assert!(SessionPlan::custom(0).is_err());
    }

    #[test]
    fn stopwatch_has_no_planned_total() {
        let plan = SessionPlan::stopwatch();
        assert!(plan.is_open_ended());
        assert_eq!(plan.total_secs(), None);
        assert_eq!(plan.work_count(), 1);
    }

    #[test]
    fn last_work_index_points_before_long_break() {
        let plan = SessionPlan::pomodoro(&TimerConfiguration::default()).unwrap();
        assert_eq!(plan.last_work_index(), Some(6));
        assert_eq!(plan.cumulative_secs(2), 1800);
    }
}

//! Consecutive-day focus streak.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::pet::MIN_REWARD_MINUTES;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    #[serde(default)]
    pub last_date: Option<NaiveDate>,
}

impl StreakState {
    /// Count a qualifying focus day.
    ///
    /// Same day: unchanged. The day after `last_date`: extends the streak.
    /// Any gap: restarts at 1. Sessions below the reward threshold do not
    /// count.
    pub fn record(&self, focused_minutes: u64, today: NaiveDate) -> StreakState {
        if focused_minutes < MIN_REWARD_MINUTES {
            return self.clone();
        }
        let current = match self.last_date {
            Some(last) if last == today => return self.clone(),
            Some(last) if last.succ_opt() == Some(today) => self.current.saturating_add(1),
            _ => 1,
        };
        StreakState {
            current,
            longest: self.longest.max(current),
            last_date: Some(today),
        }
    }

    /// The streak as seen on `today`: zero once a full day was missed.
    pub fn current_as_of(&self, today: NaiveDate) -> u32 {
        match self.last_date {
            Some(last) if last == today || last.succ_opt() == Some(today) => self.current,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn consecutive_days_extend() {
        let s = StreakState::default()
            .record(25, day(1))
            .record(25, day(2))
            .record(25, day(3));
        assert_eq!(s.current, 3);
        assert_eq!(s.longest, 3);
    }

    #[test]
    fn same_day_does_not_double_count() {
        let s = StreakState::default().record(25, day(1)).record(50, day(1));
        assert_eq!(s.current, 1);
    }

    #[test]
    fn gap_resets_but_keeps_longest() {
        let s = StreakState::default()
            .record(25, day(1))
            .record(25, day(2))
            .record(25, day(5));
        assert_eq!(s.current, 1);
        assert_eq!(s.longest, 2);
    }

    #[test]
    fn short_session_ignored() {
        let s = StreakState::default().record(3, day(1));
        assert_eq!(s, StreakState::default());
    }

    #[test]
    fn lapsed_streak_reads_as_zero() {
        let s = StreakState::default().record(25, day(1));
        assert_eq!(s.current_as_of(day(2)), 1);
        assert_eq!(s.current_as_of(day(3)), 0);
    }
}

//! Pet experience and happiness.
//!
//! [`apply_reward`] is a pure transform: it takes the pet by reference and
//! returns the next state, never mutating in place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum focused minutes for a session to earn the daily reward.
pub const MIN_REWARD_MINUTES: u64 = 5;
/// Experience granted per reward event.
pub const REWARD_EXP: u32 = 5;
/// Happiness granted per reward event.
pub const REWARD_HAPPINESS: u8 = 10;
pub const MAX_HAPPINESS: u8 = 100;
const BASE_MAX_EXP: f64 = 100.0;
const LEVEL_GROWTH: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetState {
    pub level: u32,
    pub current_exp: u32,
    pub max_exp: u32,
    /// 0..=100
    pub happiness: u8,
    /// Calendar day of the last reward, as computed by the caller.
    #[serde(default)]
    pub last_daily_activity_date: Option<NaiveDate>,
}

impl Default for PetState {
    fn default() -> Self {
        Self {
            level: 1,
            current_exp: 0,
            max_exp: max_exp_for_level(1),
            happiness: 50,
            last_daily_activity_date: None,
        }
    }
}

impl PetState {
    /// True when a reward was already granted for `today`.
    pub fn rewarded_on(&self, today: NaiveDate) -> bool {
        self.last_daily_activity_date == Some(today)
    }

    /// 0.0 .. 1.0 progress toward the next level.
    pub fn exp_progress(&self) -> f64 {
        if self.max_exp == 0 {
            return 0.0;
        }
        (f64::from(self.current_exp) / f64::from(self.max_exp)).min(1.0)
    }
}

/// Experience needed to leave `level`: `floor(100 * 1.5^(level-1))`.
pub fn max_exp_for_level(level: u32) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    (BASE_MAX_EXP * LEVEL_GROWTH.powi(exponent)).floor() as u32
}

/// Apply the once-per-day focus reward.
///
/// Returns the input unchanged when fewer than [`MIN_REWARD_MINUTES`] were
/// focused or `today` was already rewarded. At most one level-up happens per
/// call, even if the carried-over experience still exceeds the new
/// threshold.
pub fn apply_reward(pet: &PetState, focused_minutes: u64, today: NaiveDate) -> PetState {
    if focused_minutes < MIN_REWARD_MINUTES || pet.rewarded_on(today) {
        return pet.clone();
    }

    let mut next = pet.clone();
    let mut exp = pet.current_exp.saturating_add(REWARD_EXP);
    if exp >= pet.max_exp {
        exp -= pet.max_exp;
        next.level = pet.level.saturating_add(1);
        next.max_exp = max_exp_for_level(next.level);
    }
    next.current_exp = exp;
    next.happiness = pet
        .happiness
        .saturating_add(REWARD_HAPPINESS)
        .min(MAX_HAPPINESS);
    next.last_daily_activity_date = Some(today);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn level_curve_is_exponential() {
        assert_eq!(max_exp_for_level(1), 100);
        assert_eq!(max_exp_for_level(2), 150);
        assert_eq!(max_exp_for_level(3), 225);
        assert_eq!(max_exp_for_level(4), 337);
        assert_eq!(max_exp_for_level(0), 100);
    }

    #[test]
    fn reward_crossing_threshold_levels_up() {
        let pet = PetState {
            level: 1,
            current_exp: 98,
            max_exp: 100,
            happiness: 95,
            last_daily_activity_date: None,
        };
        let next = apply_reward(&pet, 10, day(1));
        assert_eq!(next.level, 2);
        assert_eq!(next.current_exp, 3);
        assert_eq!(next.max_exp, 150);
        assert_eq!(next.happiness, 100);
        assert_eq!(next.last_daily_activity_date, Some(day(1)));
    }

    #[test]
    fn second_reward_same_day_is_identity() {
        let first = apply_reward(&PetState::default(), 25, day(2));
        assert_eq!(first.current_exp, 5);
        assert_eq!(first.happiness, 60);
        assert_eq!(apply_reward(&first, 25, day(2)), first);
    }

    #[test]
    fn short_sessions_earn_nothing() {
        let pet = PetState::default();
        assert_eq!(apply_reward(&pet, 4, day(3)), pet);
    }

    #[test]
    fn next_day_rewards_again() {
        let first = apply_reward(&PetState::default(), 5, day(3));
        let second = apply_reward(&first, 5, day(4));
        assert_eq!(second.current_exp, 10);
    }

    #[test]
    fn only_one_level_per_event() {
        let pet = PetState {
            level: 1,
            current_exp: 300,
            max_exp: 100,
            happiness: 0,
            last_daily_activity_date: None,
        };
        let next = apply_reward(&pet, 30, day(5));
        assert_eq!(next.level, 2);
        assert_eq!(next.current_exp, 205);
        assert_eq!(next.max_exp, 150);
    }
}

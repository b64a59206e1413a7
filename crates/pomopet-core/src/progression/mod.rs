//! Gamification rewards: pet experience/happiness and the daily streak.
//!
//! Both are pure functions of the previous state, the focused minutes and a
//! calendar-day key the caller computes, so nothing here depends on the
//! system timezone.

mod pet;
mod streak;

pub use pet::{
    apply_reward, max_exp_for_level, PetState, MAX_HAPPINESS, MIN_REWARD_MINUTES, REWARD_EXP,
    REWARD_HAPPINESS,
};
pub use streak::StreakState;

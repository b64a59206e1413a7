//! Custom-mode duration slider.
//!
//! Positions `1..=60` are one minute each; positions `61..=96` step by five
//! minutes, topping out at 240.

use crate::error::SessionError;

pub const SLIDER_MIN: u32 = 1;
pub const SLIDER_MAX: u32 = 96;
/// Last position on the one-minute scale.
const FINE_LIMIT: u32 = 60;
const COARSE_STEP: u32 = 5;

pub const MAX_CUSTOM_MINUTES: u32 = FINE_LIMIT + (SLIDER_MAX - FINE_LIMIT) * COARSE_STEP;

pub fn slider_to_minutes(position: u32) -> Result<u32, SessionError> {
    match position {
        SLIDER_MIN..=FINE_LIMIT => Ok(position),
        p if p <= SLIDER_MAX => Ok(FINE_LIMIT + (p - FINE_LIMIT) * COARSE_STEP),
        p => Err(SessionError::InvalidSliderPosition(p)),
    }
}

/// Inverse of [`slider_to_minutes`] for minute values it can produce.
pub fn minutes_to_slider(minutes: u32) -> Result<u32, SessionError> {
    match minutes {
        1..=FINE_LIMIT => Ok(minutes),
        m if m > FINE_LIMIT && m <= MAX_CUSTOM_MINUTES && (m - FINE_LIMIT) % COARSE_STEP == 0 => {
            Ok(FINE_LIMIT + (m - FINE_LIMIT) / COARSE_STEP)
        }
        m => Err(SessionError::UnrepresentableDuration(m)),
    }
}

/// Closest slider position for arbitrary minutes, e.g. a task estimate.
pub fn nearest_slider_position(minutes: u32) -> u32 {
    if minutes <= FINE_LIMIT {
        return minutes.max(SLIDER_MIN);
    }
    let coarse = (minutes - FINE_LIMIT + COARSE_STEP / 2) / COARSE_STEP;
    (FINE_LIMIT + coarse).min(SLIDER_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fine_range_is_identity() {
        assert_eq!(slider_to_minutes(1).unwrap(), 1);
        assert_eq!(slider_to_minutes(60).unwrap(), 60);
    }

    #[test]
    fn coarse_range_steps_by_five() {
        assert_eq!(slider_to_minutes(61).unwrap(), 65);
        assert_eq!(slider_to_minutes(72).unwrap(), 120);
        assert_eq!(slider_to_minutes(96).unwrap(), 240);
    }

    #[test]
    fn out_of_range_positions_rejected() {
        assert!(slider_to_minutes(0).is_err());
        assert!(slider_to_minutes(97).is_err());
    }

    #[test]
    fn unreachable_minutes_rejected() {
        assert_eq!(
            minutes_to_slider(62),
            Err(SessionError::UnrepresentableDuration(62))
        );
        assert!(minutes_to_slider(0).is_err());
        assert!(minutes_to_slider(245).is_err());
    }

    #[test]
    fn nearest_position_rounds_coarse_values() {
        assert_eq!(nearest_slider_position(0), 1);
        assert_eq!(nearest_slider_position(45), 45);
        assert_eq!(nearest_slider_position(62), 60);
        assert_eq!(nearest_slider_position(63), 61);
        assert_eq!(nearest_slider_position(500), 96);
    }
}

//! Volume convergence.
//!
//! The output level never jumps: every control tick moves it at most
//! [`RAMP_STEP`] toward the target, so changes to base volume, dynamic scale
//! or the auto-volume toggle are heard as fades.

use std::time::Duration;

/// Largest change per control tick.
pub const RAMP_STEP: f32 = 0.02;
/// Control tick period.
pub const RAMP_PERIOD: Duration = Duration::from_millis(30);
/// Gain of generated sources relative to streamed ones.
pub const GENERATED_CHANNEL_SCALE: f32 = 0.15;
/// Absorbs f32 drift so a target reachable in whole steps is hit exactly.
const SNAP_EPSILON: f32 = 1e-5;

/// Clamp to 0..=1, reading NaN and infinities as silence.
fn unit(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct VolumeRamp {
    current: f32,
    base_volume: f32,
    dynamic_scale: f32,
    auto_volume: bool,
}

impl VolumeRamp {
    pub fn new(base_volume: f32, auto_volume: bool) -> Self {
        Self {
            current: 0.0,
            base_volume: unit(base_volume),
            dynamic_scale: 1.0,
            auto_volume,
        }
    }

    /// `base * scale` (scale only when auto-volume is on), clamped to 0..=1.
    pub fn target(&self) -> f32 {
        let scale = if self.auto_volume {
            self.dynamic_scale
        } else {
            1.0
        };
        (self.base_volume * scale).clamp(0.0, 1.0)
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target()
    }

    /// Gain for the streamed channel.
    pub fn primary_gain(&self) -> f32 {
        self.current
    }

    /// Gain for generated sources; follows the same ramp.
    pub fn generated_gain(&self) -> f32 {
        self.current * GENERATED_CHANNEL_SCALE
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    pub fn dynamic_scale(&self) -> f32 {
        self.dynamic_scale
    }

    pub fn auto_volume(&self) -> bool {
        self.auto_volume
    }

    pub fn set_base_volume(&mut self, volume: f32) {
        self.base_volume = unit(volume);
    }

    /// Ignored (scale held at 1.0) while auto-volume is off.
    pub fn set_dynamic_scale(&mut self, scale: f32) {
        if self.auto_volume {
            self.dynamic_scale = unit(scale);
        }
    }

    pub fn set_auto_volume(&mut self, enabled: bool) {
        self.auto_volume = enabled;
        if !enabled {
            self.dynamic_scale = 1.0;
        }
    }

    /// Jump to `level` without ramping, e.g. silence before a fade-in.
    pub fn reset_to(&mut self, level: f32) {
        self.current = unit(level);
    }

    /// One control tick. Returns true when the level changed.
    pub fn tick(&mut self) -> bool {
        let target = self.target();
        let diff = target - self.current;
        if diff == 0.0 {
            return false;
        }
        if diff.abs() <= RAMP_STEP + SNAP_EPSILON {
            self.current = target;
        } else {
            self.current += RAMP_STEP.copysign(diff);
        }
        true
    }
}

impl Default for VolumeRamp {
    fn default() -> Self {
        Self::new(0.5, false)
    }
}

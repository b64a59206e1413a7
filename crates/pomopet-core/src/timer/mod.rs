mod duration;
mod engine;
mod schedule;

pub use duration::{
    minutes_to_slider, nearest_slider_position, slider_to_minutes, MAX_CUSTOM_MINUTES,
    SLIDER_MAX, SLIDER_MIN,
};
pub use engine::{SessionEngine, SessionStatus};
pub use schedule::{
    cycle_total_secs, plan_cycle, Segment, SegmentKind, SessionMode, SessionPlan,
    TimerConfiguration,
};

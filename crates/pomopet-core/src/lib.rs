//! # Pomopet Core Library
//!
//! The focus session engine behind the `pomopet` timer: a pausable,
//! multi-segment countdown, the pet rewards earned by finishing it, and an
//! ambient sound mixer that follows the session.
//!
//! ## Architecture
//!
//! - **Timer**: a clockless state machine; the caller invokes `tick(delta)`
//!   to advance it and receives the resulting [`Event`]s
//! - **Progression**: pure reward math for the pet and the daily streak
//! - **Audio**: procedural noise, a volume ramp and a single-voice engine
//!   over an injectable [`OutputDevice`]
//! - **Session**: the controller wiring all of the above to settings,
//!   haptics and persistence
//! - **Storage**: TOML settings and SQLite focus history
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: countdown/break state machine
//! - [`AudioEngine`]: ambient sound lifecycle
//! - [`FocusSession`]: session controller
//! - [`Database`]: history and progression persistence
//! - [`Settings`]: application settings

pub mod audio;
pub mod error;
pub mod events;
pub mod progression;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod timer;

pub use audio::{AudioEngine, MemoryDevice, OutputDevice, OutputSource, PlayOutcome};
pub use error::{AudioError, ConfigError, CoreError, DatabaseError, SessionError};
pub use events::{Event, SessionObserver};
pub use progression::{apply_reward, PetState, StreakState};
pub use runtime::{drive, DriverConfig};
pub use session::{
    FocusSession, HapticCue, Haptics, NoHaptics, Persistence, SessionOutcome, SessionRequest,
    Task,
};
pub use storage::{Database, FocusRecord, Settings, SoundMode};
pub use timer::{
    SessionEngine, SessionMode, SessionPlan, SessionStatus, Segment, SegmentKind,
    TimerConfiguration,
};

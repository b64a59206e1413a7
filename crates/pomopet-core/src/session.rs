//! Focus session controller.
//!
//! Wires one [`SessionEngine`] to the ambient [`AudioEngine`], the reward
//! math and the outside collaborators. The engine stays the only place
//! where session state changes; this layer reacts to the events it returns.
//!
//! ## Usage
//!
//! ```ignore
//! let audio = Arc::new(AudioEngine::new(MemoryDevice::new(DEFAULT_SAMPLE_RATE)));
//! let mut session = FocusSession::new(settings, audio, NoHaptics, Database::open()?);
//! session.start(SessionRequest::Pomodoro, None).await?;
//! // Once per second:
//! session.tick(1)?;
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::{AudioEngine, OutputDevice};
use crate::error::{CoreError, SessionError};
use crate::events::Event;
use crate::progression::{apply_reward, PetState, StreakState};
use crate::storage::{Database, FocusRecord, Settings, SoundMode};
use crate::timer::{SessionEngine, SessionMode, SessionPlan, SessionStatus};

/// Optional task a session is working on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Overrides the Custom-mode duration.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Overrides the rounds per cycle in Pomodoro mode.
    #[serde(default)]
    pub pomodoro_count: Option<u32>,
}

/// Which kind of session to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SessionRequest {
    Pomodoro,
    Custom { minutes: u32 },
    Stopwatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticCue {
    Start,
    Cancel,
    Complete,
}

/// Fire-and-forget vibration side channel. Failures are logged and dropped.
pub trait Haptics {
    fn pulse(&self, cue: HapticCue) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&self, _cue: HapticCue) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Where finished sessions and progression state go.
pub trait Persistence {
    fn record_focus(&self, record: &FocusRecord) -> Result<(), CoreError>;
    fn load_pet(&self) -> Result<PetState, CoreError>;
    fn save_pet(&self, pet: &PetState) -> Result<(), CoreError>;
    fn load_streak(&self) -> Result<StreakState, CoreError>;
    fn save_streak(&self, streak: &StreakState) -> Result<(), CoreError>;
    fn mark_task_done(&self, task_id: &str) -> Result<(), CoreError>;
}

impl Persistence for Database {
    fn record_focus(&self, record: &FocusRecord) -> Result<(), CoreError> {
        Database::record_focus(self, record)?;
        Ok(())
    }

    fn load_pet(&self) -> Result<PetState, CoreError> {
        Ok(Database::load_pet(self)?)
    }

    fn save_pet(&self, pet: &PetState) -> Result<(), CoreError> {
        Ok(Database::save_pet(self, pet)?)
    }

    fn load_streak(&self) -> Result<StreakState, CoreError> {
        Ok(Database::load_streak(self)?)
    }

    fn save_streak(&self, streak: &StreakState) -> Result<(), CoreError> {
        Ok(Database::save_streak(self, streak)?)
    }

    fn mark_task_done(&self, task_id: &str) -> Result<(), CoreError> {
        Ok(Database::mark_task_done(self, task_id)?)
    }
}

/// What happened when the last session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub mode: SessionMode,
    pub completed: bool,
    pub focused_minutes: u64,
    pub task_id: Option<String>,
    pub task_marked_done: bool,
    /// True when this session earned the day's reward.
    pub rewarded: bool,
    /// Progression after the session; `None` when it could not be loaded.
    pub pet: Option<PetState>,
    pub streak: Option<StreakState>,
}

type TodayFn = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct FocusSession<D: OutputDevice, H: Haptics, P: Persistence> {
    settings: Settings,
    engine: SessionEngine,
    audio: Arc<AudioEngine<D>>,
    haptics: H,
    persistence: P,
    task: Option<Task>,
    /// Sound policy frozen at start.
    sound_mode: Option<SoundMode>,
    outcome: Option<SessionOutcome>,
    today: TodayFn,
}

impl<D: OutputDevice, H: Haptics, P: Persistence> FocusSession<D, H, P> {
    pub fn new(settings: Settings, audio: Arc<AudioEngine<D>>, haptics: H, persistence: P) -> Self {
        for custom in &settings.custom_sounds {
            if !audio.register_custom_sound(&custom.id, &custom.url) {
                debug!(sound_id = %custom.id, "custom sound already registered");
            }
        }
        audio.set_base_volume(settings.sound.volume);
        audio.set_auto_volume(settings.sound.auto_volume);

        Self {
            settings,
            engine: SessionEngine::new(),
            audio,
            haptics,
            persistence,
            task: None,
            sound_mode: None,
            outcome: None,
            today: Box::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Replace the calendar-day source used for history and rewards.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn audio(&self) -> &Arc<AudioEngine<D>> {
        &self.audio
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    /// The plan `request` would run with the current settings.
    pub fn plan_for(
        &self,
        request: SessionRequest,
        task: Option<&Task>,
    ) -> Result<SessionPlan, SessionError> {
        match request {
            SessionRequest::Pomodoro => {
                let mut config = self.settings.timer_configuration()?;
                if let Some(count) = task.and_then(|t| t.pomodoro_count) {
                    config.rounds_per_cycle = count;
                }
                SessionPlan::pomodoro(&config)
            }
            SessionRequest::Custom { minutes } => {
                let minutes = task.and_then(|t| t.duration_minutes).unwrap_or(minutes);
                SessionPlan::custom(minutes)
            }
            SessionRequest::Stopwatch => Ok(SessionPlan::stopwatch()),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Live settings edits. A running session keeps the snapshot it
    /// started with.
    pub fn update_settings(&mut self, settings: Settings) {
        self.audio.set_base_volume(settings.sound.volume);
        self.audio.set_auto_volume(settings.sound.auto_volume);
        self.settings = settings;
    }

    /// Start a new session. A finished one is replaced.
    pub async fn start(
        &mut self,
        request: SessionRequest,
        task: Option<Task>,
    ) -> Result<Vec<Event>, CoreError> {
        if self.engine.status().is_terminal() {
            self.engine = SessionEngine::new();
        }
        let plan = self.plan_for(request, task.as_ref())?;
        let events = self.engine.start(plan, 0)?;

        self.task = task;
        self.outcome = None;
        self.sound_mode = self
            .settings
            .sound
            .enabled
            .then_some(self.settings.sound.mode);
        self.pulse(HapticCue::Start);

        if self.sound_mode.is_some() {
            let id = self.settings.sound.selected_sound_id.clone();
            match self.audio.play(&id).await {
                Ok(outcome) => debug!(sound_id = %id, ?outcome, "session sound"),
                Err(err) => warn!(sound_id = %id, error = %err, "session sound failed"),
            }
        }
        Ok(events)
    }

    pub fn tick(&mut self, delta_secs: u64) -> Result<Vec<Event>, SessionError> {
        let events = self.engine.tick(delta_secs)?;
        self.settle(&events);
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>, SessionError> {
        let events = self.engine.pause()?;
        if self.sound_mode == Some(SoundMode::TimerOnly) {
            self.audio.pause();
        }
        Ok(events)
    }

    pub async fn resume(&mut self) -> Result<Vec<Event>, SessionError> {
        let events = self.engine.resume()?;
        self.resume_sound().await;
        Ok(events)
    }

    pub fn cancel(&mut self) -> Result<Vec<Event>, SessionError> {
        let events = self.engine.cancel()?;
        self.settle(&events);
        Ok(events)
    }

    /// Skipping a break from Paused also resumes the countdown.
    pub async fn skip_break(&mut self) -> Result<Vec<Event>, SessionError> {
        let events = self.engine.skip_break()?;
        self.settle(&events);
        if self.engine.status() == SessionStatus::Running {
            self.resume_sound().await;
        }
        Ok(events)
    }

    /// End an open-ended stopwatch session.
    pub fn finish(&mut self) -> Result<Vec<Event>, SessionError> {
        let events = self.engine.finish()?;
        self.settle(&events);
        Ok(events)
    }

    /// One volume control tick.
    pub fn ramp_tick(&self) -> f32 {
        self.audio.tick_volume()
    }

    pub fn set_dynamic_volume_scale(&self, scale: f32) {
        self.audio.set_dynamic_volume_scale(scale);
    }

    /// Silence everything, including always-on sound.
    pub fn shutdown(&mut self) {
        self.audio.stop();
        self.sound_mode = None;
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Runs on user gestures: continues a suspended voice and restarts a
    /// selection whose start was blocked.
    async fn resume_sound(&self) {
        let Some(mode) = self.sound_mode else {
            return;
        };
        if mode == SoundMode::TimerOnly {
            if let Err(err) = self.audio.resume().await {
                warn!(error = %err, "session sound failed to resume");
            }
        }
        if self.audio.needs_retry() {
            match self.audio.retry().await {
                Ok(outcome) => debug!(?outcome, "retried session sound"),
                Err(err) => warn!(error = %err, "session sound retry failed"),
            }
        }
    }

    fn settle(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::SessionCompleted {
                    focused_minutes,
                    task_should_be_marked_done,
                } => self.finalize(focused_minutes, true, task_should_be_marked_done),
                Event::SessionCancelled { focused_minutes } => {
                    self.finalize(focused_minutes, false, false)
                }
                _ => {}
            }
        }
    }

    /// History gets every session with focused time. Only completed
    /// sessions feed the pet and the streak.
    fn finalize(&mut self, focused_minutes: u64, completed: bool, task_done: bool) {
        let Some(mode) = self.engine.mode() else {
            return;
        };
        let today = (self.today)();

        if focused_minutes > 0 {
            let record = FocusRecord {
                date: today,
                duration_minutes: focused_minutes,
                mode,
            };
            if let Err(err) = self.persistence.record_focus(&record) {
                warn!(error = %err, "failed to record focus session");
            }
        }

        let (pet, streak, rewarded) = if completed {
            self.reward(focused_minutes, today)
        } else {
            (None, None, false)
        };

        let task_id = self.task.as_ref().map(|t| t.id.clone());
        let mut task_marked_done = false;
        if let Some(id) = task_id.as_deref().filter(|_| completed && task_done) {
            match self.persistence.mark_task_done(id) {
                Ok(()) => task_marked_done = true,
                Err(err) => warn!(task_id = id, error = %err, "failed to mark task done"),
            }
        }

        self.pulse(if completed {
            HapticCue::Complete
        } else {
            HapticCue::Cancel
        });
        if self.sound_mode == Some(SoundMode::TimerOnly) {
            self.audio.stop();
        }

        self.outcome = Some(SessionOutcome {
            mode,
            completed,
            focused_minutes,
            task_id,
            task_marked_done,
            rewarded,
            pet,
            streak,
        });
    }

    fn reward(
        &self,
        focused_minutes: u64,
        today: NaiveDate,
    ) -> (Option<PetState>, Option<StreakState>, bool) {
        let (pet, rewarded) = match self.persistence.load_pet() {
            Ok(pet) => {
                let next = apply_reward(&pet, focused_minutes, today);
                let rewarded = next != pet;
                if rewarded {
                    if let Err(err) = self.persistence.save_pet(&next) {
                        warn!(error = %err, "failed to save pet");
                    }
                }
                (Some(next), rewarded)
            }
            Err(err) => {
                warn!(error = %err, "failed to load pet");
                (None, false)
            }
        };

        let streak = match self.persistence.load_streak() {
            Ok(streak) => {
                let next = streak.record(focused_minutes, today);
                if next != streak {
                    if let Err(err) = self.persistence.save_streak(&next) {
                        warn!(error = %err, "failed to save streak");
                    }
                }
                Some(next)
            }
            Err(err) => {
                warn!(error = %err, "failed to load streak");
                None
            }
        };

        (pet, streak, rewarded)
    }

    fn pulse(&self, cue: HapticCue) {
        if let Err(err) = self.haptics.pulse(cue) {
            debug!(?cue, error = %err, "haptics failed");
        }
    }
}

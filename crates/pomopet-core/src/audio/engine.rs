//! Ambient sound engine.
//!
//! Owns the single live output voice. Every play/stop request goes through
//! one reducer ([`EngineState::reduce`]) that decides which voice to stop and
//! which to start; the device start is then awaited outside the lock and
//! discarded if a newer request arrived meanwhile.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::{SoundCatalog, SoundOption, NONE_SOUND_ID};
use super::device::{OutputDevice, OutputSource, Voice, VoiceHandle};
use super::noise::{GeneratorKind, NoiseSynthesizer};
use super::ramp::VolumeRamp;
use crate::error::AudioError;

/// Result of a [`AudioEngine::play`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayOutcome {
    Started,
    /// Same id already selected.
    Unchanged,
    /// The "none" sentinel: everything silenced.
    Stopped,
    /// The device refused; the id stays selected so a later gesture can
    /// [`retry`](AudioEngine::retry).
    Blocked,
    /// A newer play/stop arrived while the start was pending.
    Superseded,
    /// Unknown id, treated as "none".
    Unresolved,
}

enum Command<'a> {
    Play(&'a str),
    Retry,
    Stop,
}

struct PendingStart {
    generation: u64,
    voice: Voice,
    gain: f32,
}

struct Transition {
    stop: Option<VoiceHandle>,
    start: Option<PendingStart>,
    outcome: PlayOutcome,
}

struct EngineState {
    current_sound_id: String,
    source: OutputSource,
    voice: Option<VoiceHandle>,
    /// Bumped by every request that changes the desired output.
    generation: u64,
    suspended: bool,
    ramp: VolumeRamp,
    synth: NoiseSynthesizer,
    catalog: SoundCatalog,
}

impl EngineState {
    fn reduce(&mut self, command: Command<'_>) -> Transition {
        match command {
            Command::Play(id) if id == NONE_SOUND_ID => self.silence(PlayOutcome::Stopped),
            Command::Stop => self.silence(PlayOutcome::Stopped),
            Command::Play(id) if id == self.current_sound_id => Transition {
                stop: None,
                start: None,
                outcome: PlayOutcome::Unchanged,
            },
            Command::Play(id) => match self.catalog.resolve(id) {
                Some(OutputSource::None) => self.silence(PlayOutcome::Stopped),
                Some(source) => {
                    let stop = self.voice.take();
                    self.current_sound_id = id.to_string();
                    self.begin(source, stop)
                }
                None => {
                    warn!(sound_id = id, "unknown sound id, falling back to silence");
                    self.silence(PlayOutcome::Unresolved)
                }
            },
            Command::Retry => {
                if self.voice.is_some() || self.source == OutputSource::None {
                    return Transition {
                        stop: None,
                        start: None,
                        outcome: PlayOutcome::Unchanged,
                    };
                }
                let source = self.source.clone();
                self.begin(source, None)
            }
        }
    }

    fn silence(&mut self, outcome: PlayOutcome) -> Transition {
        self.generation += 1;
        self.current_sound_id = NONE_SOUND_ID.to_string();
        self.source = OutputSource::None;
        self.suspended = false;
        Transition {
            stop: self.voice.take(),
            start: None,
            outcome,
        }
    }

    /// New sources always fade in from silence.
    fn begin(&mut self, source: OutputSource, stop: Option<VoiceHandle>) -> Transition {
        self.generation += 1;
        self.suspended = false;
        self.ramp.reset_to(0.0);
        let voice = match &source {
            OutputSource::Generated(GeneratorKind::Tone { hz }) => {
                Some(Voice::Oscillator { hz: *hz as f32 })
            }
            OutputSource::Generated(kind) => self.synth.render(*kind).map(|samples| Voice::Loop {
                samples: Arc::from(samples),
            }),
            OutputSource::Streamed(url) => Some(Voice::Stream { url: url.clone() }),
            OutputSource::None => None,
        };
        self.source = source;
        debug!(sound_id = %self.current_sound_id, source = ?self.source, "switching output");
        Transition {
            stop,
            start: voice.map(|voice| PendingStart {
                generation: self.generation,
                voice,
                gain: 0.0,
            }),
            outcome: PlayOutcome::Started,
        }
    }

    fn channel_gain(&self) -> f32 {
        match self.source {
            OutputSource::Generated(_) => self.ramp.generated_gain(),
            OutputSource::Streamed(_) => self.ramp.primary_gain(),
            OutputSource::None => 0.0,
        }
    }
}

pub struct AudioEngine<D: OutputDevice> {
    device: D,
    state: Mutex<EngineState>,
}

impl<D: OutputDevice> AudioEngine<D> {
    pub fn new(device: D) -> Self {
        let synth = NoiseSynthesizer::new(device.sample_rate());
        Self::with_synthesizer(device, synth)
    }

    pub fn with_synthesizer(device: D, synth: NoiseSynthesizer) -> Self {
        Self {
            device,
            state: Mutex::new(EngineState {
                current_sound_id: NONE_SOUND_ID.to_string(),
                source: OutputSource::None,
                voice: None,
                generation: 0,
                suspended: false,
                ramp: VolumeRamp::default(),
                synth,
                catalog: SoundCatalog::new(),
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn current_sound_id(&self) -> String {
        self.lock().current_sound_id.clone()
    }

    pub fn source(&self) -> OutputSource {
        self.lock().source.clone()
    }

    /// True while a voice is sounding (started and not suspended).
    pub fn is_audible(&self) -> bool {
        let state = self.lock();
        state.voice.is_some() && !state.suspended
    }

    /// True when a sound is selected but no voice is live, e.g. after a
    /// blocked start. [`retry`](Self::retry) restarts it.
    pub fn needs_retry(&self) -> bool {
        let state = self.lock();
        state.voice.is_none() && state.source != OutputSource::None
    }

    pub fn is_suspended(&self) -> bool {
        self.lock().suspended
    }

    pub fn current_volume(&self) -> f32 {
        self.lock().ramp.current()
    }

    pub fn target_volume(&self) -> f32 {
        self.lock().ramp.target()
    }

    pub fn sound_options(&self) -> Vec<SoundOption> {
        self.lock().catalog.options()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Switch to sound `id`.
    ///
    /// Idempotent for the current id; `"none"` silences. Only device
    /// failures other than a blocked autoplay are returned as errors.
    pub async fn play(&self, id: &str) -> Result<PlayOutcome, AudioError> {
        let transition = self.lock().reduce(Command::Play(id));
        self.apply(transition).await
    }

    /// Restart the selected sound after a blocked or failed start.
    pub async fn retry(&self) -> Result<PlayOutcome, AudioError> {
        let transition = self.lock().reduce(Command::Retry);
        self.apply(transition).await
    }

    /// Halt output and select "none". Takes effect immediately, including
    /// over a start that is still pending.
    pub fn stop(&self) {
        let transition = self.lock().reduce(Command::Stop);
        if let Some(handle) = transition.stop {
            self.device.stop(handle);
        }
    }

    /// Suspend output, keeping the selection and position.
    pub fn pause(&self) {
        let mut state = self.lock();
        if state.suspended {
            return;
        }
        state.suspended = true;
        if let Some(handle) = state.voice {
            self.device.suspend(handle);
        }
    }

    pub async fn resume(&self) -> Result<(), AudioError> {
        let handle = {
            let mut state = self.lock();
            if !state.suspended {
                return Ok(());
            }
            state.suspended = false;
            state.voice
        };
        let Some(handle) = handle else {
            return Ok(());
        };
        match self.device.resume(handle).await {
            Err(AudioError::AutoplayBlocked(what)) => {
                warn!(%what, "resume blocked by output device");
                Ok(())
            }
            other => other,
        }
    }

    pub fn register_custom_sound(&self, id: &str, url: &str) -> bool {
        self.lock().catalog.register_custom(id, url)
    }

    pub fn set_base_volume(&self, volume: f32) {
        self.lock().ramp.set_base_volume(volume);
    }

    pub fn set_auto_volume(&self, enabled: bool) {
        self.lock().ramp.set_auto_volume(enabled);
    }

    /// External attention signal. No effect while auto-volume is off.
    pub fn set_dynamic_volume_scale(&self, scale: f32) {
        self.lock().ramp.set_dynamic_scale(scale);
    }

    /// One volume control tick. Returns the ramp level after the tick.
    pub fn tick_volume(&self) -> f32 {
        let mut state = self.lock();
        if state.ramp.tick() {
            if let Some(handle) = state.voice {
                self.device.set_gain(handle, state.channel_gain());
            }
        }
        state.ramp.current()
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn apply(&self, transition: Transition) -> Result<PlayOutcome, AudioError> {
        if let Some(handle) = transition.stop {
            self.device.stop(handle);
        }
        let Some(pending) = transition.start else {
            return Ok(transition.outcome);
        };

        let result = self.device.start(pending.voice, pending.gain).await;

        let mut state = self.lock();
        if state.generation != pending.generation {
            if let Ok(handle) = result {
                self.device.stop(handle);
            }
            debug!("discarding stale start");
            return Ok(PlayOutcome::Superseded);
        }
        match result {
            Ok(handle) => {
                state.voice = Some(handle);
                self.device.set_gain(handle, state.channel_gain());
                if state.suspended {
                    self.device.suspend(handle);
                }
                Ok(transition.outcome)
            }
            Err(AudioError::AutoplayBlocked(what)) => {
                warn!(sound_id = %state.current_sound_id, %what, "playback blocked, waiting for a user gesture");
                Ok(PlayOutcome::Blocked)
            }
            Err(err) => {
                warn!(sound_id = %state.current_sound_id, error = %err, "output device failed to start");
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::device::MemoryDevice;
    use crate::audio::ramp::GENERATED_CHANNEL_SCALE;

    fn engine() -> AudioEngine<MemoryDevice> {
        AudioEngine::with_synthesizer(MemoryDevice::new(8000), NoiseSynthesizer::with_seed(8000, 1))
    }

    #[tokio::test]
    async fn replaying_same_id_is_a_noop() {
        let engine = engine();
        assert_eq!(engine.play("pink").await.unwrap(), PlayOutcome::Started);
        let first = engine.device().voices()[0].handle;
        assert_eq!(engine.play("pink").await.unwrap(), PlayOutcome::Unchanged);
        let voices = engine.device().voices();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].handle, first);
    }

    #[tokio::test]
    async fn switching_replaces_the_live_voice() {
        let engine = engine();
        engine.play("pink").await.unwrap();
        engine.play("40hz").await.unwrap();
        let voices = engine.device().voices();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].voice, Voice::Oscillator { hz: 40.0 });
        assert_eq!(
            engine.source(),
            OutputSource::Generated(GeneratorKind::Tone { hz: 40 })
        );
    }

    #[tokio::test]
    async fn none_sentinel_silences() {
        let engine = engine();
        engine.play("brown").await.unwrap();
        assert_eq!(engine.play(NONE_SOUND_ID).await.unwrap(), PlayOutcome::Stopped);
        assert_eq!(engine.device().live_count(), 0);
        assert_eq!(engine.current_sound_id(), NONE_SOUND_ID);
    }

    #[tokio::test]
    async fn unknown_id_falls_back_to_silence() {
        let engine = engine();
        engine.play("rain").await.unwrap();
        assert_eq!(engine.play("no-such-sound").await.unwrap(), PlayOutcome::Unresolved);
        assert_eq!(engine.device().live_count(), 0);
        assert_eq!(engine.source(), OutputSource::None);
    }

    #[tokio::test]
    async fn streamed_start_fades_in_from_zero() {
        let engine = engine();
        engine.set_base_volume(0.5);
        engine.play("forest").await.unwrap();
        assert_eq!(engine.device().voices()[0].gain, 0.0);

        for _ in 0..25 {
            engine.tick_volume();
        }
        assert_eq!(engine.device().voices()[0].gain, 0.5);
    }

    #[tokio::test]
    async fn generated_sources_use_attenuated_channel() {
        let engine = engine();
        engine.set_base_volume(1.0);
        engine.play("pink").await.unwrap();
        for _ in 0..60 {
            engine.tick_volume();
        }
        let gain = engine.device().voices()[0].gain;
        assert!((gain - GENERATED_CHANNEL_SCALE).abs() < 1e-6);
    }

    #[tokio::test]
    async fn blocked_autoplay_keeps_selection_for_retry() {
        let engine = engine();
        engine.device().set_autoplay_blocked(true);
        assert_eq!(engine.play("cafe").await.unwrap(), PlayOutcome::Blocked);
        assert_eq!(engine.current_sound_id(), "cafe");
        assert!(!engine.is_audible());

        engine.device().set_autoplay_blocked(false);
        assert_eq!(engine.retry().await.unwrap(), PlayOutcome::Started);
        assert!(engine.is_audible());
        assert_eq!(engine.retry().await.unwrap(), PlayOutcome::Unchanged);
    }

    #[tokio::test]
    async fn pause_and_resume_keep_selection() {
        let engine = engine();
        engine.play("40hz").await.unwrap();
        engine.pause();
        assert!(engine.device().voices()[0].suspended);
        assert_eq!(engine.current_sound_id(), "40hz");

        engine.resume().await.unwrap();
        assert!(!engine.device().voices()[0].suspended);
        assert!(engine.is_audible());
    }

    #[tokio::test]
    async fn stop_resets_to_none() {
        let engine = engine();
        engine.play("rain").await.unwrap();
        engine.stop();
        assert_eq!(engine.current_sound_id(), NONE_SOUND_ID);
        assert_eq!(engine.device().live_count(), 0);
    }

    #[tokio::test]
    async fn custom_sounds_play_as_streams() {
        let engine = engine();
        assert!(engine.register_custom_sound("mine", "blob:abc"));
        engine.play("mine").await.unwrap();
        assert_eq!(
            engine.device().voices()[0].voice,
            Voice::Stream {
                url: "blob:abc".into()
            }
        );
    }
}

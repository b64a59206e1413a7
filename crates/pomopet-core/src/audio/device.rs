//! Output device abstraction.
//!
//! The audio engine never talks to a sound card directly; it drives an
//! [`OutputDevice`] injected by the caller. [`MemoryDevice`] is the headless
//! implementation used by tests and the CLI.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::noise::{GeneratorKind, Oscillator};
use crate::error::AudioError;

/// What the engine is currently sounding. At most one source is live.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OutputSource {
    #[default]
    None,
    Generated(GeneratorKind),
    Streamed(String),
}

/// A concrete voice handed to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum Voice {
    /// Seamlessly looping mono buffer.
    Loop { samples: Arc<[f32]> },
    Oscillator { hz: f32 },
    Stream { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(pub u64);

#[async_trait]
pub trait OutputDevice: Send + Sync {
    fn sample_rate(&self) -> u32;

    /// Start `voice` at `gain`. May suspend at a permission boundary and
    /// fail with [`AudioError::AutoplayBlocked`].
    async fn start(&self, voice: Voice, gain: f32) -> Result<VoiceHandle, AudioError>;

    /// Stop and release a voice. Unknown handles are ignored.
    fn stop(&self, handle: VoiceHandle);

    fn set_gain(&self, handle: VoiceHandle, gain: f32);

    /// Suspend without losing position.
    fn suspend(&self, handle: VoiceHandle);

    async fn resume(&self, handle: VoiceHandle) -> Result<(), AudioError>;
}

/// Snapshot of one live voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceInfo {
    pub handle: VoiceHandle,
    pub voice: Voice,
    pub gain: f32,
    pub suspended: bool,
}

struct LiveVoice {
    voice: Voice,
    gain: f32,
    suspended: bool,
    cursor: usize,
    oscillator: Option<Oscillator>,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    voices: BTreeMap<VoiceHandle, LiveVoice>,
}

/// In-memory mixer. Loops and oscillators render real samples; streams
/// have no decoder here and render silence.
pub struct MemoryDevice {
    sample_rate: u32,
    block_autoplay: AtomicBool,
    state: Mutex<MemoryState>,
}

impl MemoryDevice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            block_autoplay: AtomicBool::new(false),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Refuse streamed starts until unblocked, like a browser without a
    /// user gesture.
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.block_autoplay.store(blocked, Ordering::SeqCst);
    }

    pub fn voices(&self) -> Vec<VoiceInfo> {
        self.lock()
            .voices
            .iter()
            .map(|(handle, live)| VoiceInfo {
                handle: *handle,
                voice: live.voice.clone(),
                gain: live.gain,
                suspended: live.suspended,
            })
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.lock().voices.len()
    }

    /// Mix `frames` samples of every unsuspended voice.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames];
        let mut state = self.lock();
        for live in state.voices.values_mut() {
            if live.suspended {
                continue;
            }
            let gain = live.gain;
            match (&live.voice, live.oscillator.as_mut()) {
                (Voice::Loop { samples }, _) if !samples.is_empty() => {
                    for slot in out.iter_mut() {
                        *slot += samples[live.cursor] * gain;
                        live.cursor = (live.cursor + 1) % samples.len();
                    }
                }
                (Voice::Oscillator { .. }, Some(osc)) => {
                    for slot in out.iter_mut() {
                        *slot += osc.next_sample() * gain;
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OutputDevice for MemoryDevice {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn start(&self, voice: Voice, gain: f32) -> Result<VoiceHandle, AudioError> {
        if let Voice::Stream { url } = &voice {
            if self.block_autoplay.load(Ordering::SeqCst) {
                return Err(AudioError::AutoplayBlocked(url.clone()));
            }
        }
        let oscillator = match &voice {
            Voice::Oscillator { hz } => Some(Oscillator::new(*hz, self.sample_rate)),
            _ => None,
        };

        let mut state = self.lock();
        state.next_id += 1;
        let handle = VoiceHandle(state.next_id);
        state.voices.insert(
            handle,
            LiveVoice {
                voice,
                gain,
                suspended: false,
                cursor: 0,
                oscillator,
            },
        );
        Ok(handle)
    }

    fn stop(&self, handle: VoiceHandle) {
        self.lock().voices.remove(&handle);
    }

    fn set_gain(&self, handle: VoiceHandle, gain: f32) {
        if let Some(live) = self.lock().voices.get_mut(&handle) {
            live.gain = gain;
        }
    }

    fn suspend(&self, handle: VoiceHandle) {
        if let Some(live) = self.lock().voices.get_mut(&handle) {
            live.suspended = true;
        }
    }

    async fn resume(&self, handle: VoiceHandle) -> Result<(), AudioError> {
        match self.lock().voices.get_mut(&handle) {
            Some(live) => {
                live.suspended = false;
                Ok(())
            }
            None => Err(AudioError::Device(format!("unknown voice {}", handle.0))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loop_voice_wraps_and_scales() {
        let device = MemoryDevice::new(8);
        let samples: Arc<[f32]> = Arc::from(vec![1.0, 0.5]);
        let handle = device.start(Voice::Loop { samples }, 0.5).await.unwrap();
        assert_eq!(device.render(4), vec![0.5, 0.25, 0.5, 0.25]);

        device.suspend(handle);
        assert_eq!(device.render(2), vec![0.0, 0.0]);
        device.resume(handle).await.unwrap();
        device.stop(handle);
        assert_eq!(device.live_count(), 0);
    }

    #[tokio::test]
    async fn blocked_autoplay_only_affects_streams() {
        let device = MemoryDevice::new(8);
        device.set_autoplay_blocked(true);
        let err = device
            .start(Voice::Stream { url: "a.mp3".into() }, 0.0)
            .await
            .unwrap_err();
        assert_eq!(err, AudioError::AutoplayBlocked("a.mp3".into()));
        assert!(device.start(Voice::Oscillator { hz: 40.0 }, 0.1).await.is_ok());
    }
}

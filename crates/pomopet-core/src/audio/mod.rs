//! Procedural ambient-sound mixer.
//!
//! - [`NoiseSynthesizer`]: loopable pink/brown/rain buffers and tones
//! - [`VolumeRamp`]: fades the output level toward its target
//! - [`AudioEngine`]: owns the one live voice on an injected [`OutputDevice`]

mod catalog;
mod device;
mod engine;
mod filter;
mod noise;
mod ramp;

pub use catalog::{SoundCatalog, SoundCategory, SoundOption, NONE_SOUND_ID};
pub use device::{MemoryDevice, OutputDevice, OutputSource, Voice, VoiceHandle, VoiceInfo};
pub use engine::{AudioEngine, PlayOutcome};
pub use filter::LowPass;
pub use noise::{GeneratorKind, NoiseSynthesizer, Oscillator, DEFAULT_SAMPLE_RATE, LOOP_SECONDS};
pub use ramp::{VolumeRamp, GENERATED_CHANNEL_SCALE, RAMP_PERIOD, RAMP_STEP};

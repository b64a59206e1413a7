//! Procedural sound sources.
//!
//! Noise kinds are rendered into fixed-length loop buffers; the tone is a
//! free-running [`Oscillator`] instead of a buffer.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::filter::LowPass;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Length of one generated loop.
pub const LOOP_SECONDS: f32 = 2.0;
/// Overlap folded back into the loop head so the wrap point is continuous.
const SEAM_SECONDS: f32 = 0.05;
const PINK_GAIN: f32 = 0.11;
const BROWN_GAIN: f32 = 3.5;
const RAIN_CUTOFF_HZ: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorKind {
    PinkNoise,
    BrownNoise,
    /// Brown noise through a ~1 kHz low-pass.
    Rain,
    Tone { hz: u32 },
}

impl GeneratorKind {
    pub fn lowpass_cutoff_hz(&self) -> Option<f32> {
        match self {
            GeneratorKind::Rain => Some(RAIN_CUTOFF_HZ),
            _ => None,
        }
    }

    /// False for the oscillator, which never renders a buffer.
    pub fn is_buffered(&self) -> bool {
        !matches!(self, GeneratorKind::Tone { .. })
    }
}

/// Seven-pole pink filter (Paul Kellet's refined method).
#[derive(Debug, Default, Clone)]
struct PinkFilter {
    b: [f32; 7],
}

impl PinkFilter {
    fn next(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.0555179;
        b[1] = 0.99332 * b[1] + white * 0.0750759;
        b[2] = 0.96900 * b[2] + white * 0.1538520;
        b[3] = 0.86650 * b[3] + white * 0.3104856;
        b[4] = 0.55000 * b[4] + white * 0.5329522;
        b[5] = -0.7616 * b[5] - white * 0.0168980;
        let out = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115926;
        out * PINK_GAIN
    }
}

/// Leaky integrator: `y[n] = (y[n-1] + 0.02 * w[n]) / 1.02`.
#[derive(Debug, Default, Clone)]
struct BrownFilter {
    last: f32,
}

impl BrownFilter {
    fn next(&mut self, white: f32) -> f32 {
        self.last = (self.last + 0.02 * white) / 1.02;
        self.last * BROWN_GAIN
    }
}

/// Renders loopable noise buffers.
///
/// Filter state lives only for the duration of one [`render`] call; the
/// random source is the only thing carried between calls.
///
/// [`render`]: NoiseSynthesizer::render
#[derive(Debug, Clone)]
pub struct NoiseSynthesizer {
    sample_rate: u32,
    rng: Pcg32,
}

impl NoiseSynthesizer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            rng: Pcg32::from_entropy(),
        }
    }

    /// Deterministic output, for tests and previews.
    pub fn with_seed(sample_rate: u32, seed: u64) -> Self {
        Self {
            sample_rate,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn loop_len(&self) -> usize {
        (self.sample_rate as f32 * LOOP_SECONDS) as usize
    }

    /// Render one mono loop for `kind`. `None` for the tone.
    pub fn render(&mut self, kind: GeneratorKind) -> Option<Vec<f32>> {
        let len = self.loop_len();
        let seam = (self.sample_rate as f32 * SEAM_SECONDS) as usize;
        let total = len + seam;

        let mut raw = match kind {
            GeneratorKind::PinkNoise => {
                let mut filter = PinkFilter::default();
                self.white(total).map(|w| filter.next(w)).collect::<Vec<_>>()
            }
            GeneratorKind::BrownNoise | GeneratorKind::Rain => {
                let mut filter = BrownFilter::default();
                self.white(total).map(|w| filter.next(w)).collect::<Vec<_>>()
            }
            GeneratorKind::Tone { .. } => return None,
        };

        if let Some(cutoff) = kind.lowpass_cutoff_hz() {
            LowPass::new(cutoff, self.sample_rate).process(&mut raw);
        }
        Some(close_loop(raw, len))
    }

    fn white(&mut self, len: usize) -> impl Iterator<Item = f32> + '_ {
        (0..len).map(move |_| self.rng.gen_range(-1.0f32..1.0))
    }
}

/// Crossfade the overlap past `len` into the head and truncate, so the
/// sample after the last one is the sample that originally followed it.
fn close_loop(mut raw: Vec<f32>, len: usize) -> Vec<f32> {
    let seam = raw.len().saturating_sub(len);
    for i in 0..seam {
        let t = i as f32 / seam as f32;
        raw[i] = raw[i] * t + raw[len + i] * (1.0 - t);
    }
    raw.truncate(len);
    raw
}

/// Continuous sine source for fixed-frequency tones.
#[derive(Debug, Clone)]
pub struct Oscillator {
    hz: f64,
    sample_rate: f64,
    phase: f64,
}

impl Oscillator {
    pub fn new(hz: f32, sample_rate: u32) -> Self {
        Self {
            hz: f64::from(hz),
            sample_rate: f64::from(sample_rate.max(1)),
            phase: 0.0,
        }
    }

    pub fn hz(&self) -> f32 {
        self.hz as f32
    }

    pub fn next_sample(&mut self) -> f32 {
        let out = (self.phase * TAU).sin();
        self.phase = (self.phase + self.hz / self.sample_rate).fract();
        out as f32
    }

    pub fn fill(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.next_sample();
        }
    }
}

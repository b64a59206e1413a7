//! Biquad low-pass used downstream of the noise generators.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Second-order low-pass (RBJ cookbook), Direct Form II Transposed in f64
/// so long buffers do not accumulate f32 error.
#[derive(Debug, Clone)]
pub struct LowPass {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl LowPass {
    /// Butterworth-Q low-pass at `cutoff_hz`. The cutoff is clamped below
    /// Nyquist.
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        let fs = f64::from(sample_rate.max(1));
        let fc = f64::from(cutoff_hz).clamp(1.0, fs * 0.49);
        let w0 = 2.0 * PI * fc / fs;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos_w0) / 2.0 / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: (1.0 - cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn process_sample(&mut self, input: f32) -> f32 {
        let x = f64::from(input);
        let out = x * self.b0 + self.z1;
        self.z1 = x * self.b1 - out * self.a1 + self.z2;
        self.z2 = x * self.b2 - out * self.a2;
        out as f32
    }

    /// Filter a block in place, keeping state across calls.
    pub fn process(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(block: &[f32]) -> f32 {
        (block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32).sqrt()
    }

    fn sine(hz: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * std::f32::consts::PI * hz * n as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn passes_dc() {
        let mut lp = LowPass::new(1000.0, 44_100);
        let mut block = vec![1.0f32; 4096];
        lp.process(&mut block);
        assert!((block[4095] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn attenuates_well_above_cutoff() {
        let mut low = sine(200.0, 44_100, 44_100);
        let mut high = sine(10_000.0, 44_100, 44_100);
        LowPass::new(1000.0, 44_100).process(&mut low);
        LowPass::new(1000.0, 44_100).process(&mut high);
        assert!(rms(&low[4410..]) > 0.6);
        assert!(rms(&high[4410..]) < 0.05);
    }
}

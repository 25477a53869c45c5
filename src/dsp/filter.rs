//! Lowpass biquad used as the hand-controlled wah.

use std::f64::consts::PI;

/// Map a normalized cutoff in [0, 1] exponentially onto [min_hz, max_hz].
pub fn cutoff_hz(normalized: f64, min_hz: f64, max_hz: f64) -> f64 {
    let x = normalized.clamp(0.0, 1.0);
    min_hz * (max_hz / min_hz).powf(x)
}

/// A 2nd-order lowpass (Audio EQ Cookbook), Direct Form II Transposed.
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    pub frequency: f64,
    pub q: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,

    sample_rate: f64,
    dirty: bool,
}

impl LowpassFilter {
    pub fn new(sample_rate: f64, frequency: f64, q: f64) -> Self {
        let mut f = LowpassFilter {
            frequency,
            q,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
            dirty: true,
        };
        f.update_coefficients();
        f
    }

    /// Recompute filter coefficients from current parameters.
    pub fn update_coefficients(&mut self) {
        let nyquist = self.sample_rate / 2.0;
        let freq = self.frequency.clamp(10.0, nyquist * 0.99);
        let w0 = 2.0 * PI * freq / self.sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * self.q.max(0.01));

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let a0 = 1.0 + alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b0 / a0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
        self.dirty = false;
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.dirty {
            self.update_coefficients();
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Set frequency; coefficients are recomputed lazily on the next sample.
    pub fn set_frequency(&mut self, freq: f64) {
        if (freq - self.frequency).abs() > 1e-6 {
            self.frequency = freq;
            self.dirty = true;
        }
    }
}

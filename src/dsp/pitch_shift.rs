//! Delay-line pitch shifter for small vibrato offsets.
//!
//! Two read taps sweep through a short window at a rate set by the pitch
//! ratio, half a window apart, and are crossfaded with complementary
//! sin²/cos² gains so one tap is always silent when it wraps.

use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct PitchShifter {
    buffer: Vec<f64>,
    write_pos: usize,
    window: f64,
    phase: f64,
    ratio: f64,
}

impl PitchShifter {
    /// `window_seconds` is the sweep window (typ. 0.05 s).
    pub fn new(sample_rate: f64, window_seconds: f64) -> Self {
        let window = (window_seconds * sample_rate).max(4.0);
        Self {
            buffer: vec![0.0; window as usize + 4],
            write_pos: 0,
            window,
            phase: 0.0,
            ratio: 1.0,
        }
    }

    /// Shift in semitones (fractional values are the normal case).
    pub fn set_semitones(&mut self, semitones: f64) {
        self.ratio = 2.0_f64.powf(semitones / 12.0);
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    #[inline]
    fn read(&self, delay: f64) -> f64 {
        let len = self.buffer.len();
        let delay_int = delay as usize;
        let frac = delay - delay_int as f64;
        let p0 = (self.write_pos + len - delay_int) % len;
        let p1 = (p0 + len - 1) % len;
        self.buffer[p0] + frac * (self.buffer[p1] - self.buffer[p0])
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.buffer[self.write_pos] = input;

        let phase_b = (self.phase + 0.5) % 1.0;
        let tap_a = self.read(1.0 + self.phase * self.window);
        let tap_b = self.read(1.0 + phase_b * self.window);
        let gain_a = (PI * self.phase).sin().powi(2);
        let out = tap_a * gain_a + tap_b * (1.0 - gain_a);

        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        // A shrinking delay raises pitch.
        self.phase = (self.phase + (1.0 - self.ratio) / self.window).rem_euclid(1.0);
        out
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_crossings(samples: &[f64]) -> usize {
        samples
            .windows(2)
            .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
            .count()
    }

    fn shifted_sine(semitones: f64) -> Vec<f64> {
        let sr = 48000.0;
        let mut ps = PitchShifter::new(sr, 0.05);
        ps.set_semitones(semitones);
        (0..96000)
            .map(|i| ps.process((2.0 * PI * 440.0 * i as f64 / sr).sin()))
            .skip(4800)
            .collect()
    }

    #[test]
    fn unity_ratio_keeps_pitch() {
        let out = shifted_sine(0.0);
        let crossings = zero_crossings(&out) as f64;
        // 1.9 s of 440 Hz.
        assert!((crossings - 836.0).abs() < 4.0, "got {crossings}");
    }

    #[test]
    fn octave_up_doubles_crossings() {
        let base = zero_crossings(&shifted_sine(0.0)) as f64;
        let up = zero_crossings(&shifted_sine(12.0)) as f64;
        assert!((up / base - 2.0).abs() < 0.1, "ratio {}", up / base);
    }

    #[test]
    fn output_is_bounded() {
        let out = shifted_sine(0.08);
        assert!(out.iter().all(|s| s.abs() <= 1.01));
    }
}

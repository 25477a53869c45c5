//! Output limiter, the last stage of each hand's chain.
//!
//! A feed-forward peak compressor run with a high ratio and hard knee so
//! stacked crossfade lanes and reverb never push the output past the
//! threshold for long.

#[derive(Debug, Clone)]
pub struct Limiter {
    /// Threshold in dBFS.
    pub threshold: f64,
    /// Ratio above threshold (20:1 acts as a limiter).
    pub ratio: f64,
    attack_coef: f64,
    release_coef: f64,
    envelope: f64,
}

impl Limiter {
    pub fn new(sample_rate: f64, threshold: f64, ratio: f64) -> Self {
        let coef = |seconds: f64| (-1.0 / (seconds * sample_rate)).exp();
        Self {
            threshold: threshold.clamp(-60.0, 0.0),
            ratio: ratio.clamp(1.0, 100.0),
            attack_coef: coef(0.001),
            release_coef: coef(0.1),
            envelope: 0.0,
        }
    }

    #[inline]
    fn linear_to_db(linear: f64) -> f64 {
        if linear <= 0.0 {
            -120.0
        } else {
            20.0 * linear.log10()
        }
    }

    #[inline]
    fn db_to_linear(db: f64) -> f64 {
        10.0_f64.powf(db / 20.0)
    }

    /// Gain reduction in dB (<= 0) for an envelope level in dB.
    #[inline]
    fn gain_db(&self, level_db: f64) -> f64 {
        if level_db <= self.threshold {
            0.0
        } else {
            (self.threshold - level_db) * (1.0 - 1.0 / self.ratio)
        }
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = left.abs().max(right.abs()) as f64;
        let coef = if level > self.envelope {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.envelope = coef * self.envelope + (1.0 - coef) * level;

        let gain = Self::db_to_linear(self.gain_db(Self::linear_to_db(self.envelope))) as f32;
        (left * gain, right * gain)
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    /// Current gain reduction in dB (positive number), for metering.
    pub fn gain_reduction(&self) -> f64 {
        -self.gain_db(Self::linear_to_db(self.envelope))
    }
}

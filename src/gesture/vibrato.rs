//! Vibrato from vertical hand shaking.
//!
//! There is no LFO. Direction flips of the wrist's Y velocity are counted,
//! their rate is tracked, and while the hand is shaking fast enough the
//! Y velocity itself becomes the pitch offset. The raw target is jumpy, so
//! it passes through a speed-dependent low-pass, a slew limiter and an
//! asymmetric follower before it reaches the pitch shifter.

use crate::config::VibratoConfig;

#[derive(Debug, Clone)]
pub struct VibratoDetector {
    cfg: VibratoConfig,
    prev_y_velocity: Option<f64>,
    last_flip_ms: Option<f64>,
    /// Flips per second, exponentially averaged.
    flip_rate: f64,
    target_lp: f64,
    slewed: f64,
    output: f64,
}

impl VibratoDetector {
    pub fn new(cfg: VibratoConfig) -> Self {
        VibratoDetector {
            cfg,
            prev_y_velocity: None,
            last_flip_ms: None,
            flip_rate: 0.0,
            target_lp: 0.0,
            slewed: 0.0,
            output: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = VibratoDetector::new(self.cfg.clone());
    }

    pub fn flip_rate(&self) -> f64 {
        self.flip_rate
    }

    /// Current pitch offset in semitones.
    pub fn output(&self) -> f64 {
        self.output
    }

    fn flip_is_recent(&self, now_ms: f64) -> bool {
        self.last_flip_ms
            .is_some_and(|t| now_ms - t <= self.cfg.flip_window_ms)
    }

    /// Feed one frame. `dt` is the frame interval in seconds.
    pub fn update(&mut self, y_velocity: f64, now_ms: f64, dt: f64) -> f64 {
        let cfg = &self.cfg;
        let threshold = cfg.velocity_threshold;

        let flipped = self.prev_y_velocity.is_some_and(|prev| {
            prev.signum() != y_velocity.signum() && prev.abs() > threshold && y_velocity.abs() > threshold
        });
        if flipped {
            if let Some(last) = self.last_flip_ms {
                let interval = (now_ms - last) / 1000.0;
                if interval > 0.0 {
                    let rate = 1.0 / interval;
                    self.flip_rate += cfg.flip_rate_alpha * (rate - self.flip_rate);
                }
            }
            self.last_flip_ms = Some(now_ms);
        } else if !self.flip_is_recent(now_ms) && dt > 0.0 {
            self.flip_rate *= (-dt / cfg.flip_decay_tau).exp();
        }
        self.prev_y_velocity = Some(y_velocity);

        let active = y_velocity.abs() > threshold
            && self.flip_rate >= cfg.min_flip_hz
            && self.flip_is_recent(now_ms);

        let target = if active {
            (-y_velocity * cfg.cents_per_velocity).clamp(-cfg.max_depth_cents, cfg.max_depth_cents) / 100.0
        } else {
            0.0
        };

        if dt > 0.0 {
            let speed = (y_velocity.abs() / cfg.full_speed).clamp(0.0, 1.0);
            let tau = cfg.lowpass_tau_min + (cfg.lowpass_tau_max - cfg.lowpass_tau_min) * speed;
            self.target_lp += (1.0 - (-dt / tau).exp()) * (target - self.target_lp);

            let max_step = cfg.max_slew * dt;
            self.slewed += (self.target_lp - self.slewed).clamp(-max_step, max_step);
        }

        let alpha = if self.slewed.abs() > self.output.abs() {
            cfg.attack_alpha
        } else {
            cfg.release_alpha
        };
        self.output += alpha * (self.slewed - self.output);

        let limit = cfg.max_depth_cents / 100.0;
        self.output = self.output.clamp(-limit, limit);
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f64 = 16.0;

    /// Square-wave shaking: velocity flips sign every `half_period` frames.
    fn shake(det: &mut VibratoDetector, frames: usize, half_period: usize, speed: f64) -> Vec<f64> {
        (0..frames)
            .map(|i| {
                let sign = if (i / half_period) % 2 == 0 { 1.0 } else { -1.0 };
                det.update(sign * speed, i as f64 * FRAME_MS, FRAME_MS / 1000.0)
            })
            .collect()
    }

    #[test]
    fn still_hand_has_no_vibrato() {
        let mut det = VibratoDetector::new(VibratoConfig::default());
        for i in 0..100 {
            assert_eq!(det.update(0.0, i as f64 * FRAME_MS, 0.016), 0.0);
        }
    }

    #[test]
    fn slow_drift_does_not_engage() {
        let mut det = VibratoDetector::new(VibratoConfig::default());
        // One flip every 320 ms is ~3 flips/s.
        let out = shake(&mut det, 200, 20, 1.0);
        assert!(det.flip_rate() < 5.0);
        assert!(out.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn fast_shaking_engages_within_depth_limit() {
        let mut det = VibratoDetector::new(VibratoConfig::default());
        // A flip every 64 ms is ~15.6 flips/s.
        let out = shake(&mut det, 200, 4, 1.0);
        assert!(det.flip_rate() > 10.0);
        let peak = out.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(peak > 0.005, "peak {peak}");
        assert!(peak <= 0.08);
    }

    #[test]
    fn flip_rate_decays_after_shaking_stops() {
        let mut det = VibratoDetector::new(VibratoConfig::default());
        shake(&mut det, 100, 4, 1.0);
        let engaged = det.flip_rate();
        for i in 100..130 {
            det.update(0.0, i as f64 * FRAME_MS, 0.016);
        }
        assert!(det.flip_rate() < engaged * 0.05);
        for i in 130..400 {
            det.update(0.0, i as f64 * FRAME_MS, 0.016);
        }
        assert!(det.output().abs() < 1e-3);
    }

    #[test]
    fn output_slew_is_limited() {
        let mut det = VibratoDetector::new(VibratoConfig::default());
        let out = shake(&mut det, 200, 4, 5.0);
        for pair in out.windows(2) {
            // Slew limit 0.35 st/s at 16 ms frames, smoothed further.
            assert!((pair[1] - pair[0]).abs() <= 0.35 * 0.016 + 1e-12);
        }
    }
}

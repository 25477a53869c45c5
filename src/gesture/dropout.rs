//! Tracking-loss policy.
//!
//! A sounding note survives short gaps in detection. Up to the grace
//! window the last parameters are frozen; up to the maximum hold the
//! modulation drifts down while gain stays put; beyond that the note is
//! released. When the hand comes back after a long gap the parameters
//! glide from the held values to the fresh ones.

use crate::config::DropoutConfig;

use super::params::AudioParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropoutStage {
    /// Gap within grace: parameters frozen.
    Frozen,
    /// Past grace: delay and feedback decaying.
    Decaying,
    /// Past the maximum hold: the note must be released.
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct Blend {
    from: AudioParams,
    started_ms: f64,
}

#[derive(Debug, Clone)]
pub struct DropoutTracker {
    cfg: DropoutConfig,
    last_seen_ms: Option<f64>,
    last_tick_ms: Option<f64>,
    held: Option<AudioParams>,
    blend: Option<Blend>,
}

impl DropoutTracker {
    pub fn new(cfg: DropoutConfig) -> Self {
        DropoutTracker {
            cfg,
            last_seen_ms: None,
            last_tick_ms: None,
            held: None,
            blend: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_seen_ms = None;
        self.last_tick_ms = None;
        self.held = None;
        self.blend = None;
    }

    /// Milliseconds since the hand was last seen.
    pub fn gap_ms(&self, now_ms: f64) -> Option<f64> {
        self.last_seen_ms.map(|t| now_ms - t)
    }

    /// The hand is visible. Returns the parameters to apply, blended from
    /// the held values if the hand was gone longer than the grace window.
    pub fn on_seen(&mut self, now_ms: f64, fresh: AudioParams) -> AudioParams {
        if let (Some(gap), Some(held)) = (self.gap_ms(now_ms), self.held) {
            if gap > self.cfg.grace_ms && self.cfg.reacquire_blend_ms > 0.0 {
                self.blend = Some(Blend {
                    from: held,
                    started_ms: now_ms,
                });
            }
        }

        let out = match self.blend {
            Some(blend) => {
                let t = (now_ms - blend.started_ms) / self.cfg.reacquire_blend_ms;
                if t >= 1.0 {
                    self.blend = None;
                    fresh
                } else {
                    blend.from.lerp(&fresh, t)
                }
            }
            None => fresh,
        };

        self.last_seen_ms = Some(now_ms);
        self.last_tick_ms = Some(now_ms);
        self.held = Some(out);
        out
    }

    /// The hand is missing this frame. Updates the held parameters in place.
    pub fn on_missing(&mut self, now_ms: f64) -> DropoutStage {
        let gap = self.gap_ms(now_ms).unwrap_or(0.0);
        let since_tick = self.last_tick_ms.map_or(0.0, |t| (now_ms - t).max(0.0));
        self.last_tick_ms = Some(now_ms);

        let stage = if gap > self.cfg.max_hold_ms {
            DropoutStage::Expired
        } else if gap > self.cfg.grace_ms {
            DropoutStage::Decaying
        } else {
            DropoutStage::Frozen
        };

        if stage == DropoutStage::Decaying {
            if let Some(held) = self.held.as_mut() {
                let frames = since_tick / self.cfg.frame_ms;
                held.delay_time *= self.cfg.delay_decay.powf(frames);
                held.feedback *= self.cfg.feedback_decay.powf(frames);
            }
        }
        stage
    }

    /// Last parameters handed to the engine.
    pub fn held(&self) -> Option<AudioParams> {
        self.held
    }

    /// Overwrite the held gain (after a forced release).
    pub fn set_held_gain(&mut self, gain: f64) {
        if let Some(held) = self.held.as_mut() {
            held.gain = gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AudioParams {
        AudioParams {
            pitch_shift: 0.02,
            gain: 0.9,
            filter_cutoff: 0.7,
            delay_time: 0.5,
            feedback: 0.8,
            reverb_mix: 0.3,
            reverb_decay: 2.0,
        }
    }

    fn frames(t: &mut DropoutTracker, from_ms: f64, to_ms: f64) -> DropoutStage {
        let mut now = from_ms;
        let mut stage = DropoutStage::Frozen;
        while now <= to_ms {
            stage = t.on_missing(now);
            now += 1000.0 / 60.0;
        }
        stage
    }

    #[test]
    fn short_gap_freezes_everything() {
        let mut t = DropoutTracker::new(DropoutConfig::default());
        t.on_seen(0.0, params());
        assert_eq!(frames(&mut t, 16.0, 400.0), DropoutStage::Frozen);
        assert_eq!(t.held(), Some(params()));
    }

    #[test]
    fn past_grace_modulation_decays_but_gain_holds() {
        let mut t = DropoutTracker::new(DropoutConfig::default());
        t.on_seen(0.0, params());
        assert_eq!(frames(&mut t, 16.0, 1000.0), DropoutStage::Decaying);
        let held = t.held().unwrap();
        assert_eq!(held.gain, 0.9);
        assert_eq!(held.filter_cutoff, 0.7);
        assert!(held.delay_time < 0.5 * 0.9_f64.powi(20));
        assert!(held.feedback < 0.8 && held.feedback > 0.8 * 0.98_f64.powi(30));
    }

    #[test]
    fn past_max_hold_expires() {
        let mut t = DropoutTracker::new(DropoutConfig::default());
        t.on_seen(0.0, params());
        assert_eq!(frames(&mut t, 16.0, 2990.0), DropoutStage::Decaying);
        assert_eq!(t.on_missing(3001.0), DropoutStage::Expired);
    }

    #[test]
    fn reacquire_after_long_gap_blends() {
        let mut t = DropoutTracker::new(DropoutConfig::default());
        t.on_seen(0.0, params());
        frames(&mut t, 16.0, 1000.0);
        let held = t.held().unwrap();

        let fresh = AudioParams {
            delay_time: 1.0,
            ..params()
        };
        let first = t.on_seen(1010.0, fresh);
        assert_eq!(first.delay_time, held.delay_time);
        let mid = t.on_seen(1085.0, fresh);
        assert!((mid.delay_time - (held.delay_time + 1.0) / 2.0).abs() < 1e-9);
        assert_eq!(t.on_seen(1160.0, fresh), fresh);
    }

    #[test]
    fn reacquire_within_grace_is_immediate() {
        let mut t = DropoutTracker::new(DropoutConfig::default());
        t.on_seen(0.0, params());
        frames(&mut t, 16.0, 300.0);
        let fresh = AudioParams {
            gain: 0.4,
            ..params()
        };
        assert_eq!(t.on_seen(320.0, fresh), fresh);
    }
}

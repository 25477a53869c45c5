//! The per-hand effects chain.
//!
//! ```text
//! lanes ─▶ pitch shift ─▶ lowpass ─┬─▶ delay (wet 0) ─▶ dry ─┐
//!                                   └─▶ reverb send ─▶ wet ───┴─▶ volume ─▶ limiter
//! ```
//!
//! Each control parameter chases its target with its own time constant.

use crate::config::EngineConfig;
use crate::dsp::delay::Delay;
use crate::dsp::filter::{LowpassFilter, cutoff_hz};
use crate::dsp::limiter::Limiter;
use crate::dsp::pitch_shift::PitchShifter;
use crate::dsp::reverb::{Reverb, room_size_for_decay};
use crate::dsp::smoother::ParamSmoother;
use crate::gesture::AudioParams;

/// Sweep window of the pitch shifter.
const PITCH_WINDOW: f64 = 0.05;
/// Longest delay time at a normalized delay of 1.0.
const MAX_DELAY_SECONDS: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct EffectsChain {
    min_hz: f64,
    max_hz: f64,

    pitch_shifter: PitchShifter,
    filter: LowpassFilter,
    delay: Delay,
    reverb: Reverb,
    limiter: Limiter,

    pitch: ParamSmoother,
    volume: ParamSmoother,
    cutoff: ParamSmoother,
    send: ParamSmoother,
    decay: ParamSmoother,
    last_semitones: f64,
}

impl EffectsChain {
    pub fn new(sample_rate: f64, cfg: &EngineConfig) -> Self {
        let initial = AudioParams::default();
        let mut chain = EffectsChain {
            min_hz: cfg.filter_min_hz,
            max_hz: cfg.filter_max_hz,
            pitch_shifter: PitchShifter::new(sample_rate, PITCH_WINDOW),
            filter: LowpassFilter::new(sample_rate, cfg.filter_min_hz, cfg.filter_q),
            delay: Delay::new(sample_rate, MAX_DELAY_SECONDS),
            reverb: Reverb::new(sample_rate),
            limiter: Limiter::new(sample_rate, cfg.limiter_threshold_db, cfg.limiter_ratio),
            pitch: ParamSmoother::new(initial.pitch_shift, cfg.pitch_ramp, sample_rate),
            volume: ParamSmoother::new(initial.gain, cfg.gain_ramp, sample_rate),
            cutoff: ParamSmoother::new(initial.filter_cutoff, cfg.filter_ramp, sample_rate),
            send: ParamSmoother::new(initial.reverb_mix, cfg.reverb_send_ramp, sample_rate),
            decay: ParamSmoother::new(initial.reverb_decay, cfg.reverb_size_ramp, sample_rate),
            last_semitones: 0.0,
        };
        chain.reverb.set_room_size(room_size_for_decay(initial.reverb_decay));
        chain
    }

    /// Retarget every smoother. Delay time and feedback are applied as-is.
    pub fn apply(&mut self, params: &AudioParams) {
        self.pitch.set_target(params.pitch_shift);
        self.volume.set_target(params.gain);
        self.cutoff.set_target(params.filter_cutoff);
        self.send.set_target(params.reverb_mix);
        self.decay.set_target(params.reverb_decay);
        self.delay.set_normalized(params.delay_time, params.feedback);
    }

    /// Current smoothed values, for metering and tests.
    pub fn current(&self) -> AudioParams {
        AudioParams {
            pitch_shift: self.pitch.value(),
            gain: self.volume.value(),
            filter_cutoff: self.cutoff.value(),
            delay_time: self.delay.delay_time,
            feedback: self.delay.feedback,
            reverb_mix: self.send.value(),
            reverb_decay: self.decay.value(),
        }
    }

    pub fn limiter_reduction_db(&self) -> f64 {
        self.limiter.gain_reduction()
    }

    #[inline]
    pub fn process(&mut self, input: f64) -> (f32, f32) {
        let semitones = self.pitch.next();
        if (semitones - self.last_semitones).abs() > 1e-6 {
            self.pitch_shifter.set_semitones(semitones);
            self.last_semitones = semitones;
        }
        let shifted = self.pitch_shifter.process(input);

        self.filter.set_frequency(cutoff_hz(self.cutoff.next(), self.min_hz, self.max_hz));
        let filtered = self.filter.process(shifted);

        let dry = self.delay.process(filtered as f32);

        let send = self.send.next();
        self.reverb.set_room_size(room_size_for_decay(self.decay.next()));
        let (wet_l, wet_r) = self.reverb.process((filtered * send) as f32);

        let volume = self.volume.next() as f32;
        self.limiter.process((dry + wet_l) * volume, (dry + wet_r) * volume)
    }

    /// Silence all internal state (delay lines, reverb tails, smoothers
    /// keep their values).
    pub fn clear(&mut self) {
        self.pitch_shifter.clear();
        self.filter.reset();
        self.delay.clear();
        self.reverb.clear();
        self.limiter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn silence_in_silence_out() {
        let mut chain = EffectsChain::new(SR, &EngineConfig::default());
        chain.apply(&AudioParams {
            gain: 1.0,
            reverb_mix: 0.75,
            ..AudioParams::default()
        });
        for _ in 0..4800 {
            assert_eq!(chain.process(0.0), (0.0, 0.0));
        }
    }

    #[test]
    fn gain_smoother_reaches_target() {
        let mut chain = EffectsChain::new(SR, &EngineConfig::default());
        let target = AudioParams {
            gain: 0.8,
            filter_cutoff: 1.0,
            reverb_decay: 3.0,
            ..AudioParams::default()
        };
        chain.apply(&target);
        for _ in 0..(SR as usize) {
            chain.process(0.0);
        }
        let now = chain.current();
        assert!((now.gain - 0.8).abs() < 1e-6);
        assert!((now.filter_cutoff - 1.0).abs() < 1e-6);
        // 120 ms time constant: ~8 time constants in one second.
        assert!((now.reverb_decay - 3.0).abs() < 0.01);
    }

    #[test]
    fn output_never_exceeds_limiter_for_long() {
        let mut chain = EffectsChain::new(SR, &EngineConfig::default());
        chain.apply(&AudioParams {
            gain: 1.0,
            filter_cutoff: 1.0,
            reverb_mix: 0.75,
            reverb_decay: 6.0,
            ..AudioParams::default()
        });
        let mut peak = 0.0_f32;
        for i in 0..(SR as usize) {
            let x = 2.0 * (2.0 * std::f64::consts::PI * 220.0 * i as f64 / SR).sin();
            let (l, r) = chain.process(x);
            if i > 4800 {
                peak = peak.max(l.abs()).max(r.abs());
            }
        }
        assert!(peak < 1.2, "peak {peak}");
        assert!(chain.limiter_reduction_db() > 0.0);
    }
}

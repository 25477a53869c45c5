//! Feature vector + note state → engine control parameters.

use serde::{Deserialize, Serialize};

use crate::config::{GestureConfig, TrailConfig};

use super::features::HandFeatures;

/// Largest vibrato offset in semitones.
pub const MAX_PITCH_SHIFT: f64 = 0.08;

/// One frame's worth of control values for a hand's engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioParams {
    /// Semitones, within ±[`MAX_PITCH_SHIFT`].
    pub pitch_shift: f64,
    pub gain: f64,
    pub filter_cutoff: f64,
    pub delay_time: f64,
    pub feedback: f64,
    /// 0.0 to 0.75.
    pub reverb_mix: f64,
    /// Seconds of reverb tail, 0.3 to 6.0.
    pub reverb_decay: f64,
}

impl Default for AudioParams {
    fn default() -> Self {
        AudioParams {
            pitch_shift: 0.0,
            gain: 0.0,
            filter_cutoff: 0.0,
            delay_time: 0.0,
            feedback: 0.0,
            reverb_mix: 0.0,
            reverb_decay: 0.3,
        }
    }
}

impl AudioParams {
    /// Force every field into its documented range.
    pub fn clamped(self, trail: &TrailConfig) -> Self {
        let unit = |v: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        AudioParams {
            pitch_shift: if self.pitch_shift.is_finite() {
                self.pitch_shift.clamp(-MAX_PITCH_SHIFT, MAX_PITCH_SHIFT)
            } else {
                0.0
            },
            gain: unit(self.gain),
            filter_cutoff: unit(self.filter_cutoff),
            delay_time: unit(self.delay_time),
            feedback: unit(self.feedback),
            reverb_mix: if self.reverb_mix.is_finite() {
                self.reverb_mix.clamp(0.0, trail.reverb_mix_max)
            } else {
                0.0
            },
            reverb_decay: if self.reverb_decay.is_finite() {
                self.reverb_decay.clamp(trail.decay_min, trail.decay_max)
            } else {
                trail.decay_min
            },
        }
    }

    /// Component-wise linear blend, `t` = 0 gives `self`.
    pub fn lerp(&self, other: &AudioParams, t: f64) -> AudioParams {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        AudioParams {
            pitch_shift: mix(self.pitch_shift, other.pitch_shift),
            gain: mix(self.gain, other.gain),
            filter_cutoff: mix(self.filter_cutoff, other.filter_cutoff),
            delay_time: mix(self.delay_time, other.delay_time),
            feedback: mix(self.feedback, other.feedback),
            reverb_mix: mix(self.reverb_mix, other.reverb_mix),
            reverb_decay: mix(self.reverb_decay, other.reverb_decay),
        }
    }
}

/// Inputs gathered for one mapping pass.
#[derive(Debug, Clone, Copy)]
pub struct MappingInput<'a> {
    pub features: &'a HandFeatures,
    /// Vibrato offset in semitones.
    pub vibrato: f64,
    /// Slewed note gain.
    pub note_gain: f64,
    /// Openness normalized between the closed threshold and fully open.
    pub open_norm: f64,
    pub trail_length: f64,
    /// Seconds since the previous mapping pass.
    pub dt: f64,
}

#[derive(Debug, Clone)]
pub struct ParameterMapper {
    gesture: GestureConfig,
    trail: TrailConfig,
    /// Trail length after the reverb-hold limiter.
    held_length: f64,
}

impl ParameterMapper {
    pub fn new(gesture: GestureConfig, trail: TrailConfig) -> Self {
        ParameterMapper {
            gesture,
            trail,
            held_length: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.held_length = 0.0;
    }

    pub fn map(&mut self, input: MappingInput<'_>) -> AudioParams {
        // The trail may vanish in one frame; the reverb send may not.
        let fall = if self.trail.reverb_hold_seconds > 0.0 {
            input.dt.max(0.0) / self.trail.reverb_hold_seconds
        } else {
            1.0
        };
        self.held_length = input.trail_length.max(self.held_length - fall);

        let trail = &self.trail;
        AudioParams {
            pitch_shift: input.vibrato,
            gain: input.note_gain,
            filter_cutoff: input.open_norm,
            delay_time: input.features.velocity / self.gesture.velocity_full_scale,
            feedback: input.features.palm_rotation,
            reverb_mix: trail.reverb_mix_max * self.held_length,
            reverb_decay: trail.decay_min + (trail.decay_max - trail.decay_min) * self.held_length,
        }
        .clamped(trail)
    }
}

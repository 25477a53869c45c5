//! Tunable constants for the gesture pipeline and playback engine.
//!
//! Every value has a working default; a partial JSON object (camelCase
//! keys) overrides only the fields it names.

use serde::{Deserialize, Serialize};

use crate::catalog::{InstrumentMode, PitchMode};
use crate::error::Result;

/// Top-level configuration for an [`Instrument`](crate::instrument::Instrument).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumentConfig {
    pub gesture: GestureConfig,
    pub vibrato: VibratoConfig,
    pub note: NoteConfig,
    pub dropout: DropoutConfig,
    pub trail: TrailConfig,
    pub engine: EngineConfig,
    /// Seed for sample-variety randomness.
    pub seed: u64,
}

impl InstrumentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ── Gesture features ────────────────────────────────────────

/// Smoothing and normalization constants for per-hand features.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    /// Smoothing toward a higher velocity.
    pub velocity_attack_alpha: f64,
    /// Smoothing toward a lower velocity.
    pub velocity_release_alpha: f64,
    /// Acceleration (units/s²) that maps to jerkiness 1.0.
    pub jerk_cap: f64,
    pub jerk_alpha: f64,
    /// Below this jerkiness the soft layer is used.
    pub soft_jerk: f64,
    /// Above this jerkiness the hard layer is used.
    pub hard_jerk: f64,
    /// Half-width of the wrist-vs-knuckle depth window.
    pub rotation_window: f64,
    pub rotation_alpha: f64,
    pub openness_alpha: f64,
    /// Raw openness treated as a fully open hand.
    pub openness_full: f64,
    /// Velocity (units/s) mapped to a delay time of 1.0.
    pub velocity_full_scale: f64,
    /// Frames further apart than this (seconds) skip derivative updates.
    pub max_frame_dt: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            velocity_attack_alpha: 0.1,
            velocity_release_alpha: 0.02,
            jerk_cap: 30.0,
            jerk_alpha: 0.4,
            soft_jerk: 0.15,
            hard_jerk: 0.4,
            rotation_window: 0.1,
            rotation_alpha: 0.3,
            openness_alpha: 0.35,
            openness_full: 0.30,
            velocity_full_scale: 2.0,
            max_frame_dt: 0.25,
        }
    }
}

/// Vertical-oscillation vibrato detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VibratoConfig {
    /// |Y velocity| (units/s) required on both sides of a flip.
    pub velocity_threshold: f64,
    /// Minimum flip rate (flips per second) for vibrato to engage.
    pub min_flip_hz: f64,
    /// The last flip must be at most this old (ms).
    pub flip_window_ms: f64,
    pub flip_rate_alpha: f64,
    /// Time constant (s) of the flip-rate decay once flips stop.
    pub flip_decay_tau: f64,
    /// Cents of depth per unit/s of Y velocity.
    pub cents_per_velocity: f64,
    pub max_depth_cents: f64,
    /// Target low-pass time constant at rest (s).
    pub lowpass_tau_min: f64,
    /// Target low-pass time constant at full speed (s).
    pub lowpass_tau_max: f64,
    /// |Y velocity| treated as full speed for the low-pass widening.
    pub full_speed: f64,
    /// Slew limit in semitones per second.
    pub max_slew: f64,
    pub attack_alpha: f64,
    pub release_alpha: f64,
}

impl Default for VibratoConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.38,
            min_flip_hz: 5.0,
            flip_window_ms: 140.0,
            flip_rate_alpha: 0.3,
            flip_decay_tau: 0.10,
            cents_per_velocity: 14.0,
            max_depth_cents: 8.0,
            lowpass_tau_min: 0.08,
            lowpass_tau_max: 0.22,
            full_speed: 2.0,
            max_slew: 0.35,
            attack_alpha: 0.25,
            release_alpha: 0.1,
        }
    }
}

// ── Note state machine ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteConfig {
    pub open_threshold: f64,
    /// Divided by the sensitivity multiplier before use.
    pub closed_threshold: f64,
    pub open_confirm_ms: f64,
    /// Open confirmation while a release is in progress.
    pub reopen_confirm_ms: f64,
    pub closed_confirm_ms: f64,
    pub release_timeout_ms: f64,
    pub gain_floor: f64,
    pub gain_curve: f64,
    pub release_gain: f64,
    /// One-pole coefficient of the final gain slew.
    pub gain_slew: f64,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            open_threshold: 0.12,
            closed_threshold: 0.09,
            open_confirm_ms: 35.0,
            reopen_confirm_ms: 25.0,
            closed_confirm_ms: 90.0,
            release_timeout_ms: 2000.0,
            gain_floor: 0.25,
            gain_curve: 0.5,
            release_gain: 0.5,
            gain_slew: 0.22,
        }
    }
}

// ── Dropout policy ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropoutConfig {
    /// Parameters are frozen while the gap is at most this long.
    pub grace_ms: f64,
    /// Past this gap the note is forced into release.
    pub max_hold_ms: f64,
    /// Delay-time multiplier per reference frame while decaying.
    pub delay_decay: f64,
    /// Feedback multiplier per reference frame while decaying.
    pub feedback_decay: f64,
    /// Duration of one reference frame (ms).
    pub frame_ms: f64,
    /// Blend from held to fresh parameters after a long gap.
    pub reacquire_blend_ms: f64,
}

impl Default for DropoutConfig {
    fn default() -> Self {
        Self {
            grace_ms: 600.0,
            max_hold_ms: 3000.0,
            delay_decay: 0.9,
            feedback_decay: 0.98,
            frame_ms: 1000.0 / 60.0,
            reacquire_blend_ms: 150.0,
        }
    }
}

// ── Trail (reverb length input) ─────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrailConfig {
    pub max_points: usize,
    pub performance_max_points: usize,
    /// Path length (normalized units) that maps to lengthNorm 1.0.
    pub full_length: f64,
    pub fade_ms: f64,
    pub reverb_mix_max: f64,
    pub decay_min: f64,
    pub decay_max: f64,
    /// Shortest time (s) over which the reverb send may collapse.
    pub reverb_hold_seconds: f64,
    /// CSS colors for trails; hand slot `i` draws with entry `i`.
    pub palette: Vec<String>,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_points: 64,
            performance_max_points: 24,
            full_length: 1.5,
            fade_ms: 800.0,
            reverb_mix_max: 0.75,
            decay_min: 0.3,
            decay_max: 6.0,
            reverb_hold_seconds: 0.5,
            palette: vec!["#4fc3f7".to_string(), "#f06292".to_string()],
        }
    }
}

// ── Playback engine ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Loop crossfade length in seconds.
    pub crossfade: f64,
    /// Overlap between a retriggered attack and the dying release tail.
    pub retrigger_overlap: f64,
    pub pitch_ramp: f64,
    pub gain_ramp: f64,
    pub filter_ramp: f64,
    pub reverb_send_ramp: f64,
    pub reverb_size_ramp: f64,
    pub filter_min_hz: f64,
    pub filter_max_hz: f64,
    pub filter_q: f64,
    pub max_load_attempts: usize,
    pub limiter_threshold_db: f64,
    pub limiter_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crossfade: 0.15,
            retrigger_overlap: 0.12,
            pitch_ramp: 0.030,
            gain_ramp: 0.015,
            filter_ramp: 0.008,
            reverb_send_ramp: 0.050,
            reverb_size_ramp: 0.120,
            filter_min_hz: 200.0,
            filter_max_hz: 4000.0,
            filter_q: 1.2,
            max_load_attempts: 5,
            limiter_threshold_db: -1.0,
            limiter_ratio: 20.0,
        }
    }
}

// ── Control surface ─────────────────────────────────────────

pub const MIN_SENSITIVITY: f64 = 1.0;
pub const MAX_SENSITIVITY: f64 = 2.5;

/// Setters exposed to the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSettings {
    pub running: bool,
    pub instrument_mode: InstrumentMode,
    pub pitch_mode: PitchMode,
    pub single_hand: bool,
    sensitivity: f64,
    /// Hint to the landmark detector to trade accuracy for speed; the core
    /// also keeps shorter trails.
    pub performance_mode: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            running: false,
            instrument_mode: InstrumentMode::Brass,
            pitch_mode: PitchMode::All,
            single_hand: false,
            sensitivity: MIN_SENSITIVITY,
            performance_mode: false,
        }
    }
}

impl ControlSettings {
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, value: f64) {
        self.sensitivity = if value.is_finite() {
            value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
        } else {
            MIN_SENSITIVITY
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = InstrumentConfig::from_json(
            r#"{ "note": { "closedConfirmMs": 120 }, "engine": { "crossfade": 0.2 }, "seed": 7 }"#,
        )
        .unwrap();
        assert_eq!(cfg.note.closed_confirm_ms, 120.0);
        assert_eq!(cfg.note.open_confirm_ms, 35.0);
        assert_eq!(cfg.engine.crossfade, 0.2);
        assert_eq!(cfg.engine.retrigger_overlap, 0.12);
        assert_eq!(cfg.dropout.grace_ms, 600.0);
        assert_eq!(cfg.seed, 7);
    }

    #[test]
    fn empty_object_is_all_defaults() {
        let cfg = InstrumentConfig::from_json("{}").unwrap();
        assert_eq!(cfg.vibrato.velocity_threshold, 0.38);
        assert_eq!(cfg.trail.max_points, 64);
    }

    #[test]
    fn sensitivity_is_clamped() {
        let mut s = ControlSettings::default();
        s.set_sensitivity(4.0);
        assert_eq!(s.sensitivity(), MAX_SENSITIVITY);
        s.set_sensitivity(0.2);
        assert_eq!(s.sensitivity(), MIN_SENSITIVITY);
        s.set_sensitivity(f64::NAN);
        assert_eq!(s.sensitivity(), MIN_SENSITIVITY);
        s.set_sensitivity(1.7);
        assert_eq!(s.sensitivity(), 1.7);
    }
}

//! Per-hand continuous features: openness, speed, jerkiness, palm tilt.
//!
//! These signals are always valid, whatever the note is doing. The tracker
//! only differentiates across frames that are close together; after a gap
//! it re-seeds its position history and reports zero motion for that frame.

use crate::catalog::Articulation;
use crate::config::GestureConfig;

use super::landmarks::{HandFrame, Landmark};

/// Snapshot of one hand's smoothed features after a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFeatures {
    /// Smoothed raw-scale openness.
    pub openness: f64,
    /// Smoothed wrist speed (units/s).
    pub velocity: f64,
    /// Smoothed normalized jerk in [0, 1].
    pub jerkiness: f64,
    /// Smoothed palm tilt in [0, 1].
    pub palm_rotation: f64,
    /// Instantaneous vertical wrist velocity (units/s, +y is down).
    pub y_velocity: f64,
    pub palm: Landmark,
    pub articulation: Articulation,
}

/// Sample layer for a jerkiness value; deliberately without hysteresis.
pub fn articulation_for(jerkiness: f64, cfg: &GestureConfig) -> Articulation {
    if jerkiness < cfg.soft_jerk {
        Articulation::Soft
    } else if jerkiness > cfg.hard_jerk {
        Articulation::Hard
    } else {
        Articulation::Medium
    }
}

#[derive(Debug, Clone)]
pub struct FeatureTracker {
    cfg: GestureConfig,
    openness: Option<f64>,
    velocity: f64,
    jerkiness: f64,
    palm_rotation: f64,
    prev_wrist: Option<Landmark>,
    prev_raw_velocity: f64,
    last_timestamp: Option<f64>,
}

impl FeatureTracker {
    pub fn new(cfg: GestureConfig) -> Self {
        FeatureTracker {
            cfg,
            openness: None,
            velocity: 0.0,
            jerkiness: 0.0,
            palm_rotation: 0.5,
            prev_wrist: None,
            prev_raw_velocity: 0.0,
            last_timestamp: None,
        }
    }

    pub fn reset(&mut self) {
        *self = FeatureTracker::new(self.cfg.clone());
    }

    pub fn update(&mut self, hand: &HandFrame, timestamp_ms: f64) -> HandFeatures {
        let cfg = &self.cfg;
        let wrist = hand.wrist();

        let dt = self
            .last_timestamp
            .map(|last| (timestamp_ms - last) / 1000.0)
            .filter(|&dt| dt > 0.0 && dt <= cfg.max_frame_dt);

        let mut y_velocity = 0.0;
        match (dt, self.prev_wrist) {
            (Some(dt), Some(prev)) => {
                let raw_velocity = wrist.distance(&prev) / dt;
                y_velocity = (wrist.y - prev.y) / dt;

                let alpha = if raw_velocity > self.velocity {
                    cfg.velocity_attack_alpha
                } else {
                    cfg.velocity_release_alpha
                };
                self.velocity += alpha * (raw_velocity - self.velocity);

                let accel = (raw_velocity - self.prev_raw_velocity).abs() / dt;
                let jerk = (accel / cfg.jerk_cap).min(1.0);
                self.jerkiness += cfg.jerk_alpha * (jerk - self.jerkiness);
                self.prev_raw_velocity = raw_velocity;
            }
            _ => self.prev_raw_velocity = 0.0,
        }

        let window = cfg.rotation_window;
        let tilt = ((hand.palm_tilt() + window) / (2.0 * window)).clamp(0.0, 1.0);
        self.palm_rotation += cfg.rotation_alpha * (tilt - self.palm_rotation);

        let raw_openness = hand.openness();
        let openness = match self.openness {
            Some(prev) => prev + cfg.openness_alpha * (raw_openness - prev),
            None => raw_openness,
        };
        self.openness = Some(openness);

        self.prev_wrist = Some(wrist);
        self.last_timestamp = Some(timestamp_ms);

        HandFeatures {
            openness,
            velocity: self.velocity,
            jerkiness: self.jerkiness,
            palm_rotation: self.palm_rotation,
            y_velocity,
            palm: hand.palm_center(),
            articulation: articulation_for(self.jerkiness, cfg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::{Handedness, test_hand};

    #[test]
    fn first_frame_seeds_openness() {
        let mut t = FeatureTracker::new(GestureConfig::default());
        let f = t.update(&test_hand(Handedness::Left, (0.5, 0.5), 0.2), 0.0);
        assert!((f.openness - 0.2).abs() < 1e-12);
        assert_eq!(f.velocity, 0.0);
        assert_eq!(f.articulation, Articulation::Soft);
    }

    #[test]
    fn openness_is_exponentially_smoothed() {
        let mut t = FeatureTracker::new(GestureConfig::default());
        t.update(&test_hand(Handedness::Left, (0.5, 0.5), 0.0), 0.0);
        let f = t.update(&test_hand(Handedness::Left, (0.5, 0.5), 0.2), 16.0);
        assert!((f.openness - 0.35 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn velocity_rises_fast_and_falls_slowly() {
        let mut t = FeatureTracker::new(GestureConfig::default());
        t.update(&test_hand(Handedness::Left, (0.5, 0.5), 0.2), 0.0);
        // 0.02 units in 10 ms = 2 units/s.
        let moving = t.update(&test_hand(Handedness::Left, (0.52, 0.5), 0.2), 10.0);
        assert!((moving.velocity - 0.2).abs() < 1e-9);
        let still = t.update(&test_hand(Handedness::Left, (0.52, 0.5), 0.2), 20.0);
        assert!((still.velocity - 0.2 * 0.98).abs() < 1e-9);
    }

    #[test]
    fn sudden_acceleration_selects_hard_layer() {
        let mut t = FeatureTracker::new(GestureConfig::default());
        let mut x = 0.5;
        t.update(&test_hand(Handedness::Right, (x, 0.5), 0.2), 0.0);
        let mut last = None;
        for i in 1..6 {
            // Alternate between fast and still frames.
            if i % 2 == 1 {
                x += 0.05;
            }
            last = Some(t.update(&test_hand(Handedness::Right, (x, 0.5), 0.2), i as f64 * 16.0));
        }
        let f = last.unwrap();
        assert!(f.jerkiness > 0.4, "jerkiness {}", f.jerkiness);
        assert_eq!(f.articulation, Articulation::Hard);
    }

    #[test]
    fn long_gap_skips_derivatives() {
        let mut t = FeatureTracker::new(GestureConfig::default());
        t.update(&test_hand(Handedness::Left, (0.2, 0.5), 0.2), 0.0);
        let f = t.update(&test_hand(Handedness::Left, (0.8, 0.1), 0.2), 1000.0);
        assert_eq!(f.velocity, 0.0);
        assert_eq!(f.y_velocity, 0.0);
        assert_eq!(f.jerkiness, 0.0);
    }

    #[test]
    fn palm_rotation_tracks_wrist_depth() {
        let mut t = FeatureTracker::new(GestureConfig::default());
        let mut hand = test_hand(Handedness::Left, (0.5, 0.5), 0.2);
        hand.landmarks[0].z = 0.2;
        let mut f = t.update(&hand, 0.0);
        for i in 1..40 {
            f = t.update(&hand, i as f64 * 16.0);
        }
        assert!((f.palm_rotation - 1.0).abs() < 1e-3);
    }

    #[test]
    fn layer_thresholds() {
        let cfg = GestureConfig::default();
        assert_eq!(articulation_for(0.1, &cfg), Articulation::Soft);
        assert_eq!(articulation_for(0.15, &cfg), Articulation::Medium);
        assert_eq!(articulation_for(0.4, &cfg), Articulation::Medium);
        assert_eq!(articulation_for(0.41, &cfg), Articulation::Hard);
    }
}

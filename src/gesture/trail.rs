//! Palm trail bookkeeping. Only its length matters here: it sets how much
//! reverb a phrase accumulates.

use std::collections::VecDeque;

use crate::config::TrailConfig;

use super::landmarks::Landmark;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrailPhase {
    Idle,
    Active,
    Fading { started_ms: f64 },
}

#[derive(Debug, Clone)]
pub struct TrailState {
    cfg: TrailConfig,
    phase: TrailPhase,
    points: VecDeque<Landmark>,
    max_points: usize,
    /// Accumulated planar path length since the trail started.
    length: f64,
    /// Color new trails of this hand are drawn in.
    hand_color: Option<String>,
    /// Color of the current trail; `None` while idle.
    color: Option<String>,
}

impl TrailState {
    pub fn new(cfg: TrailConfig) -> Self {
        let max_points = cfg.max_points;
        TrailState {
            cfg,
            phase: TrailPhase::Idle,
            points: VecDeque::with_capacity(max_points),
            max_points,
            length: 0.0,
            hand_color: None,
            color: None,
        }
    }

    pub fn set_hand_color(&mut self, color: Option<String>) {
        self.hand_color = color;
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn phase(&self) -> TrailPhase {
        self.phase
    }

    pub fn points(&self) -> impl Iterator<Item = &Landmark> {
        self.points.iter()
    }

    /// Shorter trails in performance mode.
    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.max_points = if enabled {
            self.cfg.performance_max_points
        } else {
            self.cfg.max_points
        };
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }
    }

    /// Begin a new trail (note attack).
    pub fn start(&mut self) {
        self.points.clear();
        self.length = 0.0;
        self.phase = TrailPhase::Active;
        self.color = self.hand_color.clone();
    }

    pub fn push(&mut self, point: Landmark) {
        if self.phase != TrailPhase::Active {
            return;
        }
        if let Some(last) = self.points.back() {
            self.length += last.planar_distance(&point);
        }
        if self.points.len() == self.max_points {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Note released: start fading.
    pub fn release(&mut self, now_ms: f64) {
        if self.phase == TrailPhase::Active {
            self.phase = TrailPhase::Fading { started_ms: now_ms };
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.length = 0.0;
        self.phase = TrailPhase::Idle;
        self.color = None;
    }

    /// Path length in [0, 1], scaled down while fading. A finished fade
    /// clears the trail.
    pub fn length_norm(&mut self, now_ms: f64) -> f64 {
        let full = (self.length / self.cfg.full_length).min(1.0);
        match self.phase {
            TrailPhase::Idle => 0.0,
            TrailPhase::Active => full,
            TrailPhase::Fading { started_ms } => {
                let remaining = 1.0 - (now_ms - started_ms) / self.cfg.fade_ms;
                if remaining <= 0.0 {
                    self.clear();
                    0.0
                } else {
                    full * remaining.min(1.0)
                }
            }
        }
    }
}

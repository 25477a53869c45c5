//! One hand slot's complete gesture pipeline.
//!
//! [`HandTracker`] owns the smoothing state, the note machine, the trail
//! and the dropout policy for one slot, and turns each frame (or missing
//! frame) into a [`HandUpdate`] for the engine.

use log::{debug, warn};

use crate::catalog::Articulation;
use crate::config::InstrumentConfig;

use super::dropout::{DropoutStage, DropoutTracker};
use super::features::{FeatureTracker, HandFeatures};
use super::landmarks::{HandFrame, Landmark};
use super::note_state::{NoteEvent, NotePhase, NoteStateMachine, normalized_openness};
use super::params::{AudioParams, MappingInput, ParameterMapper};
use super::trail::TrailState;
use super::vibrato::VibratoDetector;

/// What the engine needs from one slot this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandUpdate {
    pub event: Option<NoteEvent>,
    pub params: AudioParams,
    pub articulation: Articulation,
    /// 0.0 = bottom of the image, 1.0 = top.
    pub pitch_position: f64,
    pub present: bool,
}

#[derive(Debug, Clone)]
pub struct HandTracker {
    features: FeatureTracker,
    vibrato: VibratoDetector,
    note: NoteStateMachine,
    trail: TrailState,
    mapper: ParameterMapper,
    dropout: DropoutTracker,
    last_frame_ms: Option<f64>,
    last_palm: Option<Landmark>,
    articulation: Articulation,
    pitch_position: f64,
}

impl HandTracker {
    pub fn new(config: &InstrumentConfig) -> Self {
        HandTracker {
            features: FeatureTracker::new(config.gesture.clone()),
            vibrato: VibratoDetector::new(config.vibrato.clone()),
            note: NoteStateMachine::new(config.note.clone(), config.gesture.openness_full),
            trail: TrailState::new(config.trail.clone()),
            mapper: ParameterMapper::new(config.gesture.clone(), config.trail.clone()),
            dropout: DropoutTracker::new(config.dropout.clone()),
            last_frame_ms: None,
            last_palm: None,
            articulation: Articulation::Medium,
            pitch_position: 0.5,
        }
    }

    /// Tracker for hand slot `slot`, drawing trails in that slot's color.
    pub fn for_slot(config: &InstrumentConfig, slot: usize) -> Self {
        let mut tracker = Self::new(config);
        let palette = &config.trail.palette;
        if !palette.is_empty() {
            tracker.trail.set_hand_color(Some(palette[slot % palette.len()].clone()));
        }
        tracker
    }

    /// Back to a fresh session state; the trail length setting is kept.
    pub fn reset(&mut self) {
        self.features.reset();
        self.vibrato.reset();
        self.note.reset();
        self.trail.clear();
        self.mapper.reset();
        self.dropout.reset();
        self.last_frame_ms = None;
        self.last_palm = None;
        self.articulation = Articulation::Medium;
        self.pitch_position = 0.5;
    }

    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.trail.set_performance_mode(enabled);
    }

    pub fn phase(&self) -> NotePhase {
        self.note.phase()
    }

    pub fn trail(&self) -> &TrailState {
        &self.trail
    }

    pub fn last_palm(&self) -> Option<Landmark> {
        self.last_palm
    }

    pub fn pitch_position(&self) -> f64 {
        self.pitch_position
    }

    pub fn articulation(&self) -> Articulation {
        self.articulation
    }

    pub fn params(&self) -> AudioParams {
        self.dropout.held().unwrap_or_default()
    }

    fn frame_dt(&mut self, now_ms: f64) -> f64 {
        let dt = self
            .last_frame_ms
            .map_or(0.0, |t| ((now_ms - t) / 1000.0).max(0.0));
        self.last_frame_ms = Some(now_ms);
        dt
    }

    fn follow_trail(&mut self, event: Option<NoteEvent>, now_ms: f64) {
        match event {
            Some(NoteEvent::Attack { .. }) => self.trail.start(),
            Some(NoteEvent::Release) => self.trail.release(now_ms),
            Some(NoteEvent::ReleaseTimeout) => self.trail.clear(),
            None => {}
        }
    }

    /// The hand was detected this frame.
    pub fn observe(&mut self, hand: &HandFrame, sensitivity: f64, now_ms: f64) -> HandUpdate {
        let dt = self.frame_dt(now_ms);
        let features: HandFeatures = self.features.update(hand, now_ms);
        let vibrato = self.vibrato.update(features.y_velocity, now_ms, dt);
        let event = self.note.update(features.openness, sensitivity, now_ms);

        self.follow_trail(event, now_ms);
        if self.note.is_playing() {
            self.trail.push(features.palm);
        }

        let closed = self.note.closed_threshold(sensitivity);
        let fresh = self.mapper.map(MappingInput {
            features: &features,
            vibrato,
            note_gain: self.note.gain(),
            open_norm: normalized_openness(features.openness, closed, self.note.openness_full()),
            trail_length: self.trail.length_norm(now_ms),
            dt,
        });
        let params = self.dropout.on_seen(now_ms, fresh);

        self.last_palm = Some(features.palm);
        self.articulation = features.articulation;
        self.pitch_position = (1.0 - features.palm.y).clamp(0.0, 1.0);

        HandUpdate {
            event,
            params,
            articulation: self.articulation,
            pitch_position: self.pitch_position,
            present: true,
        }
    }

    /// The hand was not detected this frame.
    pub fn missing(&mut self, now_ms: f64) -> HandUpdate {
        self.frame_dt(now_ms);
        let mut event = None;

        if !self.note.is_idle() {
            match self.dropout.on_missing(now_ms) {
                DropoutStage::Expired if self.note.is_playing() => {
                    let gap = self.dropout.gap_ms(now_ms).unwrap_or(0.0);
                    warn!("Hand lost for {gap:.0} ms; forcing release");
                    event = self.note.force_release(now_ms);
                    self.dropout.set_held_gain(self.note.gain());
                    self.trail.clear();
                }
                DropoutStage::Decaying | DropoutStage::Expired | DropoutStage::Frozen => {}
            }
        }
        if event.is_none() {
            event = self.note.tick(now_ms);
            if event.is_some() {
                debug!("Release timed out while hand missing");
            }
        }
        self.follow_trail(event, now_ms);

        HandUpdate {
            event,
            params: self.params(),
            articulation: self.articulation,
            pitch_position: self.pitch_position,
            present: false,
        }
    }
}

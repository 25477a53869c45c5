//! Attack-sustain-release playback over two crossfade lanes.
//!
//! A note starts on one lane from the top of the sample. When the read
//! head reaches the loop start the engine enters sustain, and from then on
//! every pass through the loop starts a fresh source at the loop start on
//! the other lane and crossfades into it shortly before the current one
//! reaches the loop end. Release crossfades into a source that starts at
//! the loop end and lets the recorded tail play out.
//!
//! Lanes are never added: at most two sources exist. A lane that is still
//! fading when it is needed again is stolen (its pending stop is dropped
//! and its gain ramp restarts from wherever it is).

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::dsp::sampler::SampleBuffer;
use crate::dsp::smoother::GainRamp;
use crate::gesture::AudioParams;

use super::bank::LoadedSample;
use super::graph::EffectsChain;
use super::lane::{Lane, Source};
use super::scheduler::{EventKind, ScheduledEvent, Scheduler, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Idle,
    Attack,
    Sustain,
    Release,
}

pub struct PlaybackEngine {
    sample_rate: f64,
    cfg: EngineConfig,
    /// Output samples rendered so far.
    clock: u64,
    lanes: [Lane; 2],
    active: usize,
    state: PlayState,
    /// Sample the next note will use.
    next_sample: Option<LoadedSample>,
    /// Sample of the note currently sounding.
    current: Option<LoadedSample>,
    scheduler: Scheduler,
    next_source_id: u64,
    /// The release tail whose natural end finishes the note.
    tail_source: Option<SourceId>,
    reload_pending: bool,
    chain: EffectsChain,
}

/// True if the analysis describes a usable loop inside the buffer.
fn loops(sample: &LoadedSample) -> bool {
    let a = &sample.analysis;
    a.use_asr && a.loop_end > a.loop_start && a.loop_start >= 0.0 && a.loop_end <= sample.buffer.duration() + 1e-9
}

impl PlaybackEngine {
    pub fn new(sample_rate: f64, cfg: &EngineConfig) -> Self {
        PlaybackEngine {
            sample_rate,
            cfg: cfg.clone(),
            clock: 0,
            lanes: [Lane::silent(), Lane::silent()],
            active: 0,
            state: PlayState::Idle,
            next_sample: None,
            current: None,
            scheduler: Scheduler::new(),
            next_source_id: 0,
            tail_source: None,
            reload_pending: false,
            chain: EffectsChain::new(sample_rate, cfg),
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn loaded(&self) -> Option<&LoadedSample> {
        self.next_sample.as_ref()
    }

    pub fn playing(&self) -> Option<&LoadedSample> {
        self.current.as_ref()
    }

    pub fn active_lane(&self) -> usize {
        self.active
    }

    pub fn lane_gain(&self, lane: usize) -> f64 {
        self.lanes[lane].gain.value_at(self.clock)
    }

    pub fn lane_source(&self, lane: usize) -> Option<SourceId> {
        self.lanes[lane].source_id()
    }

    pub fn source_count(&self) -> usize {
        self.lanes.iter().filter(|l| l.source.is_some()).count()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Smoothed parameter values inside the effects chain.
    pub fn current_params(&self) -> AudioParams {
        self.chain.current()
    }

    /// Make `sample` the one the next attack plays.
    pub fn load(&mut self, sample: LoadedSample) {
        debug!("Engine loaded {}", sample.path);
        self.next_sample = Some(sample);
        self.reload_pending = false;
    }

    pub fn request_reload(&mut self) {
        self.reload_pending = true;
    }

    /// True once after a note finished (or a mode change) asked for a
    /// fresh sample.
    pub fn take_reload_request(&mut self) -> bool {
        std::mem::take(&mut self.reload_pending)
    }

    fn seconds(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate).round() as u64
    }

    fn crossfade_samples(&self, sample: &LoadedSample) -> u64 {
        let half_loop = sample.analysis.loop_length() / 2.0;
        self.seconds(self.cfg.crossfade.min(half_loop))
    }

    fn new_source(&mut self, buffer: &Arc<SampleBuffer>, offset_seconds: f64) -> Source {
        let id = SourceId(self.next_source_id);
        self.next_source_id += 1;
        Source::new(id, Arc::clone(buffer), offset_seconds, self.sample_rate)
    }

    /// Take a lane back for a new source, dropping whatever it held.
    fn steal_lane(&mut self, lane: usize) {
        if let Some(old) = self.lanes[lane].source.take() {
            self.scheduler.cancel_stop(old.id);
            debug!("Lane {lane}: stole {}", old.id);
        }
    }

    fn fade_in(&mut self, lane: usize, source: Source, duration: u64) {
        self.steal_lane(lane);
        let lane_ref = &mut self.lanes[lane];
        lane_ref.gain = GainRamp::ramp_from(&lane_ref.gain, self.clock, 1.0, duration);
        lane_ref.source = Some(source);
    }

    fn fade_out(&mut self, lane: usize, duration: u64) {
        let lane_ref = &mut self.lanes[lane];
        lane_ref.gain = GainRamp::ramp_from(&lane_ref.gain, self.clock, 0.0, duration);
        if let Some(id) = lane_ref.source_id() {
            self.scheduler.cancel_stop(id);
            self.scheduler
                .schedule(self.clock + duration, EventKind::StopSource { lane, source: id });
        }
    }

    /// Start (or restart) a note. A no-op while a note is already attacking
    /// or sustaining; interrupts a release with a short overlap.
    pub fn attack(&mut self) -> bool {
        self.heal_if_stuck();
        let Some(sample) = self.next_sample.clone() else {
            warn!("Attack ignored: no sample loaded");
            return false;
        };
        match self.state {
            PlayState::Attack | PlayState::Sustain => false,
            PlayState::Idle => {
                // A finished note can leave its last fade still running.
                let lane = match self.lanes.iter().position(|l| l.source.is_some()) {
                    Some(busy) => {
                        self.scheduler.cancel_timers();
                        let overlap = self.seconds(self.cfg.retrigger_overlap);
                        self.fade_out(busy, overlap);
                        1 - busy
                    }
                    None => {
                        self.scheduler.cancel_all();
                        self.lanes = [Lane::silent(), Lane::silent()];
                        0
                    }
                };
                self.steal_lane(lane);
                let source = self.new_source(&sample.buffer, 0.0);
                self.lanes[lane] = Lane {
                    source: Some(source),
                    gain: GainRamp::hold(1.0),
                };
                self.active = lane;
                debug!("Attack {} on lane {lane}", sample.path);
                self.begin_note(sample);
                true
            }
            PlayState::Release => {
                let overlap = self.seconds(self.cfg.retrigger_overlap);
                let lane = 1 - self.active;
                self.scheduler.cancel_timers();
                let source = self.new_source(&sample.buffer, 0.0);
                self.fade_in(lane, source, overlap);
                self.fade_out(self.active, overlap);
                self.active = lane;
                debug!("Retrigger {} on lane {lane}", sample.path);
                self.begin_note(sample);
                true
            }
        }
    }

    fn begin_note(&mut self, sample: LoadedSample) {
        self.tail_source = None;
        self.state = PlayState::Attack;
        if loops(&sample) {
            if let Some(source) = &self.lanes[self.active].source {
                let at = self.clock + source.samples_until(sample.analysis.loop_start);
                self.scheduler.schedule(at, EventKind::EnterSustain);
            }
        }
        self.current = Some(sample);
    }

    /// Move to release. A no-op when idle or already releasing.
    pub fn release(&mut self) -> bool {
        self.heal_if_stuck();
        if !matches!(self.state, PlayState::Attack | PlayState::Sustain) {
            return false;
        }
        self.scheduler.cancel_timers();

        // The fade never outlasts the tail, so the sustain lane is silent
        // by the time the tail ends the note.
        let looped = self.current.as_ref().filter(|s| loops(s)).map(|s| {
            let tail = self.seconds(s.buffer.duration() - s.analysis.loop_end);
            (
                Arc::clone(&s.buffer),
                s.analysis.loop_end,
                self.crossfade_samples(s).min(tail),
            )
        });
        match looped {
            Some((buffer, loop_end, crossfade)) => {
                let lane = 1 - self.active;
                let tail = self.new_source(&buffer, loop_end);
                self.tail_source = Some(tail.id);
                self.fade_in(lane, tail, crossfade);
                self.fade_out(self.active, crossfade);
                self.active = lane;
                debug!("Release tail on lane {lane}");
            }
            None => {
                // One-shot: the playing source is its own tail.
                self.tail_source = self.lanes[self.active].source_id();
            }
        }
        self.state = PlayState::Release;
        true
    }

    fn enter_sustain(&mut self) {
        if self.state != PlayState::Attack {
            return;
        }
        self.state = PlayState::Sustain;
        debug!("Sustain at clock {}", self.clock);
        self.schedule_loop_crossfade();
    }

    fn schedule_loop_crossfade(&mut self) {
        let Some(sample) = self.current.as_ref() else {
            return;
        };
        let Some(source) = self.lanes[self.active].source.as_ref() else {
            return;
        };
        let crossfade = self.crossfade_samples(sample);
        let until_end = source.samples_until(sample.analysis.loop_end);
        let at = self.clock + until_end.saturating_sub(crossfade);
        self.scheduler.schedule(at, EventKind::LoopCrossfade);
    }

    fn loop_crossfade(&mut self) {
        if self.state != PlayState::Sustain {
            return;
        }
        let Some((buffer, loop_start, crossfade)) = self
            .current
            .as_ref()
            .map(|s| (Arc::clone(&s.buffer), s.analysis.loop_start, self.crossfade_samples(s)))
        else {
            return;
        };
        let lane = 1 - self.active;
        let source = self.new_source(&buffer, loop_start);
        self.fade_in(lane, source, crossfade);
        self.fade_out(self.active, crossfade);
        self.active = lane;
        self.schedule_loop_crossfade();
    }

    fn dispatch(&mut self, event: ScheduledEvent) {
        match event.kind {
            EventKind::EnterSustain => self.enter_sustain(),
            EventKind::LoopCrossfade => self.loop_crossfade(),
            EventKind::StopSource { lane, source } => {
                if self.lanes[lane].source_id() == Some(source) {
                    self.lanes[lane].source = None;
                }
            }
        }
    }

    fn source_ended(&mut self, lane: usize, id: SourceId) {
        self.lanes[lane].source = None;
        self.scheduler.cancel_stop(id);

        let is_tail = self.tail_source == Some(id);
        let is_active = lane == self.active && self.state != PlayState::Idle;
        if is_tail || is_active {
            self.finish_note();
        }
    }

    fn finish_note(&mut self) {
        debug!("Note finished at clock {}", self.clock);
        self.scheduler.cancel_timers();
        self.state = PlayState::Idle;
        self.tail_source = None;
        self.current = None;
        self.reload_pending = true;
    }

    /// Reset to idle when the state claims playback but no source exists.
    pub fn heal_if_stuck(&mut self) -> bool {
        if self.state == PlayState::Idle || self.source_count() > 0 {
            return false;
        }
        warn!("Engine stuck in {:?} with no source; resetting", self.state);
        self.scheduler.cancel_all();
        self.state = PlayState::Idle;
        self.tail_source = None;
        self.current = None;
        self.reload_pending = true;
        true
    }

    /// Cancel everything and silence both lanes immediately.
    pub fn stop_all(&mut self) {
        self.scheduler.cancel_all();
        self.lanes = [Lane::silent(), Lane::silent()];
        self.active = 0;
        self.state = PlayState::Idle;
        self.tail_source = None;
        self.current = None;
        self.reload_pending = false;
        self.chain.clear();
    }

    pub fn update_params(&mut self, params: &AudioParams) {
        self.heal_if_stuck();
        self.chain.apply(params);
    }

    /// Render and mix into `left`/`right` (added to what is there).
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        for i in 0..frames {
            while let Some(event) = self.scheduler.pop_due(self.clock) {
                self.dispatch(event);
            }

            let clock = self.clock;
            let mut mix = 0.0;
            let mut ended = [None; 2];
            for (n, lane) in self.lanes.iter_mut().enumerate() {
                if let Some(source) = lane.source.as_mut() {
                    mix += source.next() * lane.gain.value_at(clock);
                    if source.is_finished() {
                        ended[n] = Some(source.id);
                    }
                }
            }
            for (n, id) in ended.into_iter().enumerate() {
                if let Some(id) = id {
                    self.source_ended(n, id);
                }
            }

            let (l, r) = self.chain.process(mix);
            left[i] += l;
            right[i] += r;
            self.clock += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Articulation, InstrumentMode, PitchMode, SelectionRequest};
    use crate::dsp::loop_points::{LoopAnalysis, find_loop_points};
    use std::f64::consts::PI;

    const SR: f64 = 8000.0;

    fn tone(seconds: f64) -> Arc<SampleBuffer> {
        let n = (seconds * SR) as usize;
        Arc::new(SampleBuffer::new(
            (0..n).map(|i| 0.5 * (2.0 * PI * 220.0 * i as f64 / SR).sin()).collect(),
            SR as u32,
        ))
    }

    fn loaded(buffer: Arc<SampleBuffer>, analysis: LoopAnalysis) -> LoadedSample {
        LoadedSample {
            path: "trombone/t_C3.wav".to_string(),
            buffer,
            analysis,
            midi_note: Some(48),
            request: SelectionRequest {
                mode: InstrumentMode::Brass,
                articulation: Articulation::Medium,
                pitch_mode: PitchMode::All,
                pitch_position: 0.5,
            },
        }
    }

    /// 2 s tone with loop 0.5..1.5 s.
    fn looping() -> LoadedSample {
        loaded(
            tone(2.0),
            LoopAnalysis {
                loop_start: 0.5,
                loop_end: 1.5,
                rms_diff: 0.0,
                is_acceptable: true,
                use_asr: true,
                duration: 2.0,
            },
        )
    }

    fn engine_with(sample: LoadedSample) -> PlaybackEngine {
        let mut e = PlaybackEngine::new(SR, &EngineConfig::default());
        e.update_params(&AudioParams {
            gain: 1.0,
            filter_cutoff: 1.0,
            ..AudioParams::default()
        });
        e.load(sample);
        e
    }

    fn run(e: &mut PlaybackEngine, seconds: f64) {
        let n = (seconds * SR) as usize;
        let mut l = vec![0.0; n];
        let mut r = vec![0.0; n];
        e.render(&mut l, &mut r);
    }

    fn step(e: &mut PlaybackEngine) {
        e.render(&mut [0.0], &mut [0.0]);
    }

    /// Every pending stop refers to a source that still exists on its lane.
    fn assert_no_orphan_stops(e: &PlaybackEngine) {
        for ev in e.scheduler().pending() {
            if let EventKind::StopSource { lane, source } = ev.kind {
                assert_eq!(e.lane_source(lane), Some(source), "orphan stop {ev:?}");
            }
        }
    }

    #[test]
    fn attack_then_sustain_at_loop_start() {
        let mut e = engine_with(looping());
        assert!(e.attack());
        assert_eq!(e.state(), PlayState::Attack);
        run(&mut e, 0.49);
        assert_eq!(e.state(), PlayState::Attack);
        run(&mut e, 0.02);
        assert_eq!(e.state(), PlayState::Sustain);
        assert_eq!(e.scheduler().count(|k| *k == EventKind::LoopCrossfade), 1);
    }

    #[test]
    fn repeated_attack_and_idle_release_are_no_ops() {
        let mut e = engine_with(looping());
        assert!(!e.release());
        assert_eq!(e.source_count(), 0);
        assert!(e.scheduler().is_empty());

        assert!(e.attack());
        let pending = e.scheduler().pending().len();
        assert!(!e.attack());
        run(&mut e, 0.6);
        assert!(!e.attack());
        assert_eq!(e.source_count(), 1);
        assert_eq!(e.scheduler().pending().len(), pending);
    }

    #[test]
    fn loop_crossfade_ramps_are_monotonic_and_stop_after_fade() {
        let mut e = engine_with(looping());
        e.attack();
        let crossfade = (0.15 * SR) as usize;
        let mut swaps = 0;
        let mut i = 0;
        while i < (4.0 * SR) as usize {
            let before = e.active_lane();
            step(&mut e);
            i += 1;
            assert!(e.source_count() <= 2);
            if e.active_lane() == before {
                continue;
            }
            swaps += 1;
            let new = e.active_lane();
            let old = before;
            let old_source = e.lane_source(old);
            assert!(old_source.is_some());
            let (mut g_new, mut g_old) = (e.lane_gain(new), e.lane_gain(old));
            for _ in 0..crossfade {
                step(&mut e);
                i += 1;
                let (n, o) = (e.lane_gain(new), e.lane_gain(old));
                assert!(n >= g_new - 1e-12 && o <= g_old + 1e-12);
                if e.lane_source(old).is_none() {
                    assert!(o < 1e-9, "old lane stopped at gain {o}");
                }
                g_new = n;
                g_old = o;
            }
            step(&mut e);
            i += 1;
            assert!(e.lane_source(old).is_none());
            assert!(e.lane_gain(old) < 1e-9);
            assert!((e.lane_gain(new) - 1.0).abs() < 1e-9);
        }
        // Loop passes of 1 s after entering sustain at 0.5 s.
        assert!(swaps >= 3, "swaps {swaps}");
        assert_eq!(e.state(), PlayState::Sustain);
    }

    #[test]
    fn release_plays_tail_then_requests_reload() {
        let mut e = engine_with(looping());
        e.attack();
        run(&mut e, 0.8);
        let sustain_lane = e.active_lane();
        assert!(e.release());
        assert_eq!(e.state(), PlayState::Release);
        assert_ne!(e.active_lane(), sustain_lane);
        assert_eq!(e.scheduler().count(|k| k.is_timer()), 0);
        assert!(!e.release());

        run(&mut e, 0.3);
        assert_eq!(e.state(), PlayState::Release);
        assert_eq!(e.source_count(), 1);
        // Tail is 0.5 s long.
        run(&mut e, 0.25);
        assert_eq!(e.state(), PlayState::Idle);
        assert!(e.take_reload_request());
        assert!(!e.take_reload_request());
    }

    #[test]
    fn retrigger_overlaps_tail_and_ignores_its_end() {
        // Tail of only 50 ms: it ends inside the 120 ms overlap.
        let sample = loaded(
            tone(2.0),
            LoopAnalysis {
                loop_start: 0.5,
                loop_end: 1.95,
                rms_diff: 0.0,
                is_acceptable: true,
                use_asr: true,
                duration: 2.0,
            },
        );
        let mut e = engine_with(sample);
        e.attack();
        run(&mut e, 0.7);
        e.release();
        run(&mut e, 0.01);
        let tail_lane = e.active_lane();
        let (g_tail, g_other) = (e.lane_gain(tail_lane), e.lane_gain(1 - tail_lane));
        assert!(e.attack());
        assert_eq!(e.state(), PlayState::Attack);
        assert_ne!(e.active_lane(), tail_lane);
        assert_eq!(e.source_count(), 2);
        // Both ramps continue from where they were.
        assert!((e.lane_gain(e.active_lane()) - g_other).abs() < 1e-9);
        assert!((e.lane_gain(tail_lane) - g_tail).abs() < 1e-9);
        assert_no_orphan_stops(&e);

        run(&mut e, 0.2);
        assert_eq!(e.state(), PlayState::Attack);
        assert_eq!(e.source_count(), 1);
        assert!(!e.take_reload_request());
        assert!((e.lane_gain(e.active_lane()) - 1.0).abs() < 1e-9);
        run(&mut e, 0.4);
        assert_eq!(e.state(), PlayState::Sustain);
    }

    fn short_tail() -> LoadedSample {
        loaded(
            tone(2.0),
            LoopAnalysis {
                loop_start: 0.5,
                loop_end: 1.95,
                rms_diff: 0.0,
                is_acceptable: true,
                use_asr: true,
                duration: 2.0,
            },
        )
    }

    #[test]
    fn short_tail_release_fades_sustain_out_before_the_note_ends() {
        let mut e = engine_with(short_tail());
        e.attack();
        run(&mut e, 0.7);
        let sustain_lane = e.active_lane();
        e.release();

        let mut g_prev = e.lane_gain(sustain_lane);
        for _ in 0..(0.06 * SR) as usize {
            step(&mut e);
            let g = e.lane_gain(sustain_lane);
            assert!(g <= g_prev + 1e-12);
            if e.lane_source(sustain_lane).is_none() || e.state() == PlayState::Idle {
                assert!(g < 0.01, "sustain lane at {g} when the note ended");
            }
            g_prev = g;
        }
        assert_eq!(e.state(), PlayState::Idle);
        assert_eq!(e.source_count(), 0);
        assert!(e.lane_gain(sustain_lane) < 1e-9);
    }

    #[test]
    fn attack_right_after_idle_fades_out_the_leftover_lane() {
        let mut e = engine_with(short_tail());
        e.attack();
        run(&mut e, 0.7);
        let sustain_lane = e.active_lane();
        e.release();
        while e.state() != PlayState::Idle {
            step(&mut e);
        }
        // The tail ended one sample before the sustain lane's stop.
        assert!(e.lane_source(sustain_lane).is_some());
        let g = e.lane_gain(sustain_lane);

        assert!(e.attack());
        assert_ne!(e.active_lane(), sustain_lane);
        assert!(e.lane_source(sustain_lane).is_some());
        assert!((e.lane_gain(sustain_lane) - g).abs() < 1e-9);
        assert!((e.lane_gain(e.active_lane()) - 1.0).abs() < 1e-9);
        assert_no_orphan_stops(&e);

        run(&mut e, 0.2);
        assert_eq!(e.source_count(), 1);
        assert_eq!(e.state(), PlayState::Attack);
        run(&mut e, 0.4);
        assert_eq!(e.state(), PlayState::Sustain);
    }

    #[test]
    fn release_during_loop_crossfade_steals_fading_lane() {
        let mut e = engine_with(looping());
        e.attack();
        // First loop crossfade starts at 1.35 s.
        run(&mut e, 1.40);
        assert_eq!(e.source_count(), 2);
        let fading = 1 - e.active_lane();
        let g = e.lane_gain(fading);
        assert!(g > 0.1 && g < 0.9, "mid-fade gain {g}");

        assert!(e.release());
        assert_eq!(e.active_lane(), fading);
        assert!(e.source_count() <= 2);
        assert_no_orphan_stops(&e);
        // The ramp restarts from where the stolen lane was.
        assert!((e.lane_gain(fading) - g).abs() < 1e-9);
        step(&mut e);
        assert!(e.lane_gain(fading) > g);

        run(&mut e, 0.7);
        assert_eq!(e.state(), PlayState::Idle);
    }

    #[test]
    fn one_shot_plays_once_and_goes_idle() {
        let buffer = tone(0.3);
        let analysis = find_loop_points(&buffer);
        assert!(!analysis.use_asr);
        let mut e = engine_with(loaded(buffer, analysis));
        e.attack();
        assert!(e.scheduler().is_empty());
        run(&mut e, 0.2);
        assert_eq!(e.state(), PlayState::Attack);
        run(&mut e, 0.15);
        assert_eq!(e.state(), PlayState::Idle);
        assert!(e.take_reload_request());
    }

    #[test]
    fn stop_all_silences_everything() {
        let mut e = engine_with(looping());
        e.attack();
        run(&mut e, 1.4);
        e.stop_all();
        assert_eq!(e.state(), PlayState::Idle);
        assert_eq!(e.source_count(), 0);
        assert!(e.scheduler().is_empty());
        let mut l = vec![0.0; 800];
        let mut r = vec![0.0; 800];
        e.render(&mut l, &mut r);
        assert!(l.iter().chain(&r).all(|s| *s == 0.0));
    }

    #[test]
    fn stuck_state_heals_to_idle() {
        let mut e = engine_with(looping());
        e.attack();
        run(&mut e, 0.6);
        e.lanes[0].source = None;
        e.lanes[1].source = None;
        e.update_params(&AudioParams::default());
        assert_eq!(e.state(), PlayState::Idle);
        assert!(e.scheduler().is_empty());
        assert!(e.take_reload_request());
    }

    #[test]
    fn sustain_produces_sound() {
        let mut e = engine_with(looping());
        e.attack();
        let mut l = vec![0.0; 8000];
        let mut r = vec![0.0; 8000];
        e.render(&mut l, &mut r);
        let energy: f32 = l[4000..].iter().map(|s| s * s).sum();
        assert!(energy > 1.0, "energy {energy}");
    }

    #[test]
    fn attack_without_sample_is_refused() {
        let mut e = PlaybackEngine::new(SR, &EngineConfig::default());
        assert!(!e.attack());
        assert_eq!(e.state(), PlayState::Idle);
    }
}

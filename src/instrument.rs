//! The two-hand instrument: hand slots, their engines and the controls.
//!
//! [`Instrument::process_frame`] is called once per video frame with the
//! detected hands. Gesture processing for both slots finishes before any
//! engine sees an event or parameter update. [`Instrument::render`] is
//! called from the audio side and mixes both engines.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::{LoopManifest, SampleCatalog, SelectionRequest};
use crate::config::{ControlSettings, InstrumentConfig};
use crate::engine::{PlayState, PlaybackEngine, SampleBank, SampleLoader};
use crate::gesture::{AudioParams, HandFrame, HandTracker, HandUpdate, Handedness, NoteEvent};

/// A preloaded sample is reused for an attack when the hand moved less
/// than this (normalized pitch position) since it was chosen.
const PITCH_REUSE_TOLERANCE: f64 = 0.05;

pub const SLOT_COUNT: usize = 2;

struct Slot {
    tracker: HandTracker,
    engine: PlaybackEngine,
    last_params: AudioParams,
}

impl Slot {
    fn reset(&mut self) {
        self.engine.stop_all();
        self.tracker.reset();
        self.last_params = AudioParams::default();
    }
}

fn reusable(loaded: &SelectionRequest, wanted: &SelectionRequest) -> bool {
    loaded.mode == wanted.mode
        && loaded.articulation == wanted.articulation
        && loaded.pitch_mode == wanted.pitch_mode
        && (loaded.pitch_position - wanted.pitch_position).abs() < PITCH_REUSE_TOLERANCE
}

pub struct Instrument {
    settings: ControlSettings,
    bank: SampleBank,
    rng: StdRng,
    slots: [Slot; SLOT_COUNT],
    /// Handedness slot 0 follows in single-hand mode.
    latched: Option<Handedness>,
    slot0_seen: bool,
}

impl Instrument {
    pub fn new(
        config: InstrumentConfig,
        catalog: Arc<SampleCatalog>,
        loader: Box<dyn SampleLoader>,
        manifest: LoopManifest,
        sample_rate: f64,
    ) -> Self {
        let slot = |i| Slot {
            tracker: HandTracker::for_slot(&config, i),
            engine: PlaybackEngine::new(sample_rate, &config.engine),
            last_params: AudioParams::default(),
        };
        Instrument {
            settings: ControlSettings::default(),
            bank: SampleBank::new(catalog, loader, manifest, config.engine.max_load_attempts),
            rng: StdRng::seed_from_u64(config.seed),
            slots: [slot(0), slot(1)],
            latched: None,
            slot0_seen: false,
        }
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn bank_mut(&mut self) -> &mut SampleBank {
        &mut self.bank
    }

    pub fn engine(&self, slot: usize) -> &PlaybackEngine {
        &self.slots[slot].engine
    }

    pub fn tracker(&self, slot: usize) -> &HandTracker {
        &self.slots[slot].tracker
    }

    /// Parameters each slot last sent to its engine.
    pub fn params(&self) -> [AudioParams; SLOT_COUNT] {
        [self.slots[0].last_params, self.slots[1].last_params]
    }

    // ── Control surface ─────────────────────────────────────

    pub fn start(&mut self) {
        if self.settings.running {
            return;
        }
        info!(
            "Instrument started ({:?}, pitch {:?}, single hand {})",
            self.settings.instrument_mode, self.settings.pitch_mode, self.settings.single_hand
        );
        self.settings.running = true;
        for slot in 0..SLOT_COUNT {
            self.load_sample(slot);
        }
    }

    pub fn stop(&mut self) {
        if !self.settings.running {
            return;
        }
        info!("Instrument stopped");
        self.settings.running = false;
        self.reset_slots();
    }

    pub fn toggle_instrument_mode(&mut self) {
        self.settings.instrument_mode = self.settings.instrument_mode.toggled();
        info!("Instrument mode: {:?}", self.settings.instrument_mode);
        self.reset_slots();
        if self.settings.running {
            for slot in 0..SLOT_COUNT {
                self.load_sample(slot);
            }
        }
    }

    /// Switch to the next pitch band; samples are reselected as soon as
    /// each engine can take them.
    pub fn cycle_pitch_mode(&mut self) {
        self.settings.pitch_mode = self.settings.pitch_mode.cycled();
        info!("Pitch mode: {:?}", self.settings.pitch_mode);
        for slot in &mut self.slots {
            slot.engine.request_reload();
        }
    }

    pub fn set_single_hand(&mut self, enabled: bool) {
        if self.settings.single_hand == enabled {
            return;
        }
        info!("Single-hand mode: {enabled}");
        self.settings.single_hand = enabled;
        self.reset_slots();
    }

    pub fn set_sensitivity(&mut self, value: f64) {
        self.settings.set_sensitivity(value);
        debug!("Openness sensitivity: {:.2}", self.settings.sensitivity());
    }

    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.settings.performance_mode = enabled;
        for slot in &mut self.slots {
            slot.tracker.set_performance_mode(enabled);
        }
    }

    fn reset_slots(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
        self.latched = None;
        self.slot0_seen = false;
    }

    // ── Frame loop ──────────────────────────────────────────

    fn assign<'a>(&mut self, hands: &'a [HandFrame]) -> [Option<&'a HandFrame>; SLOT_COUNT] {
        if !self.settings.single_hand {
            let find = |h: Handedness| hands.iter().find(|f| f.handedness == h);
            return [find(Handedness::Left), find(Handedness::Right)];
        }

        let chosen = match hands {
            [] => None,
            [only] => Some(only),
            many => {
                let latched = self
                    .latched
                    .and_then(|l| many.iter().find(|f| f.handedness == l));
                let nearest = self.slots[0].tracker.last_palm().and_then(|palm| {
                    many.iter().min_by(|a, b| {
                        let da = a.palm_center().planar_distance(&palm);
                        let db = b.palm_center().planar_distance(&palm);
                        da.total_cmp(&db)
                    })
                });
                let preferred = if self.slot0_seen {
                    latched.or(nearest)
                } else {
                    nearest.or(latched)
                };
                preferred.or(many.first())
            }
        };

        if let Some(hand) = chosen {
            if self.latched != Some(hand.handedness) {
                debug!("Single hand latched to {:?}", hand.handedness);
                self.latched = Some(hand.handedness);
            }
        }
        self.slot0_seen = chosen.is_some();
        [chosen, None]
    }

    /// Process one video frame. Returns the note event each slot produced.
    pub fn process_frame(&mut self, hands: &[HandFrame], now_ms: f64) -> [Option<NoteEvent>; SLOT_COUNT] {
        if !self.settings.running {
            return [None; SLOT_COUNT];
        }
        let assigned = self.assign(hands);
        let sensitivity = self.settings.sensitivity();

        let updates: [HandUpdate; SLOT_COUNT] = std::array::from_fn(|i| {
            let tracker = &mut self.slots[i].tracker;
            match assigned[i] {
                Some(hand) if hand.is_finite() => tracker.observe(hand, sensitivity, now_ms),
                _ => tracker.missing(now_ms),
            }
        });

        for (slot, update) in updates.iter().enumerate() {
            self.apply(slot, update);
        }
        updates.map(|u| u.event)
    }

    fn request_for(&self, update: &HandUpdate) -> SelectionRequest {
        SelectionRequest {
            mode: self.settings.instrument_mode,
            articulation: update.articulation,
            pitch_mode: self.settings.pitch_mode,
            pitch_position: update.pitch_position,
        }
    }

    fn apply(&mut self, slot: usize, update: &HandUpdate) {
        let request = self.request_for(update);

        match update.event {
            Some(NoteEvent::Attack { retrigger }) => {
                let fresh = self.slots[slot]
                    .engine
                    .loaded()
                    .is_some_and(|s| reusable(&s.request, &request));
                if !fresh {
                    self.load_with(slot, &request);
                }
                let engine = &mut self.slots[slot].engine;
                engine.update_params(&update.params);
                if engine.attack() {
                    debug!("Slot {slot}: attack (retrigger {retrigger})");
                }
            }
            Some(NoteEvent::Release) => {
                if self.slots[slot].engine.release() {
                    debug!("Slot {slot}: release");
                }
            }
            Some(NoteEvent::ReleaseTimeout) => debug!("Slot {slot}: release timed out"),
            None => {}
        }

        let s = &mut self.slots[slot];
        s.engine.update_params(&update.params);
        s.last_params = update.params;
        if s.engine.take_reload_request() {
            self.load_with(slot, &request);
        }
    }

    fn load_sample(&mut self, slot: usize) {
        let tracker = &self.slots[slot].tracker;
        let request = SelectionRequest {
            mode: self.settings.instrument_mode,
            articulation: tracker.articulation(),
            pitch_mode: self.settings.pitch_mode,
            pitch_position: tracker.pitch_position(),
        };
        self.load_with(slot, &request);
    }

    fn load_with(&mut self, slot: usize, request: &SelectionRequest) {
        match self.bank.acquire(request, &mut self.rng) {
            Ok(sample) => self.slots[slot].engine.load(sample),
            Err(e) => warn!("Slot {slot}: no sample loaded: {e}"),
        }
    }

    /// Render both engines into `left`/`right` (overwritten).
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        for slot in &mut self.slots {
            slot.engine.render(left, right);
        }
    }

    pub fn play_states(&self) -> [PlayState; SLOT_COUNT] {
        [self.slots[0].engine.state(), self.slots[1].engine.state()]
    }
}

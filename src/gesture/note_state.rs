//! Open/closed hand → note lifecycle.
//!
//! The phase is a tagged enum, so "playing" and "releasing" can never both
//! hold. Open and closed candidates are debounced with start timestamps:
//! a candidate counts only while it has held continuously, and any frame
//! without it clears the timestamp.

use log::debug;

use crate::config::NoteConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotePhase {
    Idle,
    /// Attack or sustain; the engine tells those apart.
    Playing { started_ms: f64 },
    Releasing { started_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    /// Start a note. `retrigger` is set when it interrupts a release.
    Attack { retrigger: bool },
    Release,
    /// A release ran past its timeout and the hand went idle.
    ReleaseTimeout,
}

/// Openness rescaled so the closed threshold is 0 and `full` is 1.
pub fn normalized_openness(openness: f64, closed_threshold: f64, full: f64) -> f64 {
    let span = full - closed_threshold;
    if span <= 0.0 {
        return if openness > closed_threshold { 1.0 } else { 0.0 };
    }
    ((openness - closed_threshold) / span).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct NoteStateMachine {
    cfg: NoteConfig,
    openness_full: f64,
    phase: NotePhase,
    open_since: Option<f64>,
    closed_since: Option<f64>,
    gain: f64,
}

impl NoteStateMachine {
    pub fn new(cfg: NoteConfig, openness_full: f64) -> Self {
        NoteStateMachine {
            cfg,
            openness_full,
            phase: NotePhase::Idle,
            open_since: None,
            closed_since: None,
            gain: 0.0,
        }
    }

    pub fn phase(&self) -> NotePhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, NotePhase::Playing { .. })
    }

    pub fn is_releasing(&self) -> bool {
        matches!(self.phase, NotePhase::Releasing { .. })
    }

    pub fn is_idle(&self) -> bool {
        self.phase == NotePhase::Idle
    }

    /// Slewed output gain.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn openness_full(&self) -> f64 {
        self.openness_full
    }

    pub fn closed_threshold(&self, sensitivity: f64) -> f64 {
        self.cfg.closed_threshold / sensitivity.max(f64::EPSILON)
    }

    pub fn reset(&mut self) {
        self.phase = NotePhase::Idle;
        self.open_since = None;
        self.closed_since = None;
        self.gain = 0.0;
    }

    fn held_ms(since: Option<f64>, now_ms: f64) -> f64 {
        since.map_or(0.0, |t| now_ms - t)
    }

    /// Process one frame of smoothed openness.
    pub fn update(&mut self, openness: f64, sensitivity: f64, now_ms: f64) -> Option<NoteEvent> {
        let closed_threshold = self.closed_threshold(sensitivity);
        let is_open = openness > self.cfg.open_threshold;
        let is_closed = openness < closed_threshold;

        if is_open && !is_closed {
            self.open_since.get_or_insert(now_ms);
            self.closed_since = None;
        } else if is_closed && !is_open {
            self.closed_since.get_or_insert(now_ms);
            self.open_since = None;
        } else {
            self.open_since = None;
            self.closed_since = None;
        }

        let open_held = Self::held_ms(self.open_since, now_ms);
        let closed_held = Self::held_ms(self.closed_since, now_ms);

        let event = match self.phase {
            NotePhase::Idle if self.open_since.is_some() && open_held >= self.cfg.open_confirm_ms => {
                self.phase = NotePhase::Playing { started_ms: now_ms };
                self.open_since = None;
                Some(NoteEvent::Attack { retrigger: false })
            }
            NotePhase::Playing { .. }
                if self.closed_since.is_some() && closed_held >= self.cfg.closed_confirm_ms =>
            {
                self.phase = NotePhase::Releasing { started_ms: now_ms };
                self.closed_since = None;
                Some(NoteEvent::Release)
            }
            NotePhase::Releasing { .. }
                if self.open_since.is_some() && open_held >= self.cfg.reopen_confirm_ms =>
            {
                self.phase = NotePhase::Playing { started_ms: now_ms };
                self.open_since = None;
                Some(NoteEvent::Attack { retrigger: true })
            }
            _ => self.check_timeout(now_ms),
        };
        if let Some(e) = event {
            debug!("Note {:?} at {:.0} ms (openness {:.3})", e, now_ms, openness);
        }

        let target = match self.phase {
            NotePhase::Idle => 0.0,
            NotePhase::Playing { .. } => {
                let open = normalized_openness(openness, closed_threshold, self.openness_full);
                self.cfg.gain_floor + (1.0 - self.cfg.gain_floor) * open.powf(self.cfg.gain_curve)
            }
            NotePhase::Releasing { .. } => self.cfg.release_gain,
        };
        self.gain += self.cfg.gain_slew * (target - self.gain);

        event
    }

    /// Advance timers on a frame without a hand.
    pub fn tick(&mut self, now_ms: f64) -> Option<NoteEvent> {
        self.open_since = None;
        self.closed_since = None;
        self.check_timeout(now_ms)
    }

    fn check_timeout(&mut self, now_ms: f64) -> Option<NoteEvent> {
        match self.phase {
            NotePhase::Releasing { started_ms } if now_ms - started_ms >= self.cfg.release_timeout_ms => {
                self.phase = NotePhase::Idle;
                Some(NoteEvent::ReleaseTimeout)
            }
            _ => None,
        }
    }

    /// Start a release immediately (tracking lost too long).
    pub fn force_release(&mut self, now_ms: f64) -> Option<NoteEvent> {
        if self.is_playing() {
            self.phase = NotePhase::Releasing { started_ms: now_ms };
            self.open_since = None;
            self.closed_since = None;
            self.gain = self.cfg.release_gain;
            Some(NoteEvent::Release)
        } else {
            None
        }
    }
}

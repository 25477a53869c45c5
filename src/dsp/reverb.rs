//! Reverb send: Schroeder/Freeverb-style algorithmic reverb.
//!
//! Parallel damped combs into series allpasses. The tail length is steered
//! through the room size (comb feedback) so it can move continuously
//! without regenerating an impulse response.

/// A comb filter delay line with damped feedback.
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damp1: f32,
    damp2: f32,
    filterstore: f32,
}

impl CombFilter {
    fn new(size: usize, feedback: f32, damp: f32) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback,
            damp1: damp,
            damp2: 1.0 - damp,
            filterstore: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filterstore = output * self.damp2 + self.filterstore * self.damp1;
        self.buffer[self.index] = input + self.filterstore * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filterstore = 0.0;
    }
}

#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    const FEEDBACK: f32 = 0.5;

    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let bufout = self.buffer[self.index];
        self.buffer[self.index] = input + bufout * Self::FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        bufout - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// Tuning constants (scaled for 44100 Hz sample rate)
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const ROOM_SCALE: f64 = 0.28;
const ROOM_OFFSET: f64 = 0.7;
const INPUT_GAIN: f32 = 0.015;

/// Mean comb delay in seconds; sets the RT60 for a given feedback.
fn mean_comb_seconds() -> f64 {
    COMB_TUNING.iter().sum::<usize>() as f64 / COMB_TUNING.len() as f64 / 44100.0
}

/// Room size whose comb feedback gives roughly `decay_seconds` of RT60.
pub fn room_size_for_decay(decay_seconds: f64) -> f64 {
    let rt60 = decay_seconds.max(0.01);
    let feedback = 10.0_f64.powf(-3.0 * mean_comb_seconds() / rt60);
    ((feedback - ROOM_OFFSET) / ROOM_SCALE).clamp(0.0, 1.0)
}

/// Mono-in, stereo-out wet reverb. The dry path lives in the caller's graph.
#[derive(Debug, Clone)]
pub struct Reverb {
    comb_l: Vec<CombFilter>,
    comb_r: Vec<CombFilter>,
    allpass_l: Vec<AllpassFilter>,
    allpass_r: Vec<AllpassFilter>,
    room_size: f64,
    damping: f64,
}

impl Reverb {
    pub fn new(sample_rate: f64) -> Self {
        let scale = sample_rate / 44100.0;
        let sized = |t: usize, spread: usize| ((t as f64) * scale) as usize + spread;

        let mut reverb = Self {
            comb_l: COMB_TUNING.iter().map(|&t| CombFilter::new(sized(t, 0), 0.84, 0.2)).collect(),
            comb_r: COMB_TUNING
                .iter()
                .map(|&t| CombFilter::new(sized(t, STEREO_SPREAD), 0.84, 0.2))
                .collect(),
            allpass_l: ALLPASS_TUNING.iter().map(|&t| AllpassFilter::new(sized(t, 0))).collect(),
            allpass_r: ALLPASS_TUNING
                .iter()
                .map(|&t| AllpassFilter::new(sized(t, STEREO_SPREAD)))
                .collect(),
            room_size: 0.5,
            damping: 0.4,
        };
        reverb.update_parameters();
        reverb
    }

    pub fn room_size(&self) -> f64 {
        self.room_size
    }

    /// Set room size (0..1); comb feedback is updated immediately.
    pub fn set_room_size(&mut self, room_size: f64) {
        let room_size = room_size.clamp(0.0, 1.0);
        if (room_size - self.room_size).abs() > 1e-6 {
            self.room_size = room_size;
            self.update_parameters();
        }
    }

    fn update_parameters(&mut self) {
        let feedback = (self.room_size * ROOM_SCALE + ROOM_OFFSET) as f32;
        let damp = self.damping as f32;
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.feedback = feedback;
            comb.damp1 = damp;
            comb.damp2 = 1.0 - damp;
        }
    }

    /// Feed one mono send sample, returning the wet stereo pair.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let input = input * INPUT_GAIN;

        let mut out_l: f32 = self.comb_l.iter_mut().map(|c| c.process(input)).sum();
        let mut out_r: f32 = self.comb_r.iter_mut().map(|c| c.process(input)).sum();

        for allpass in &mut self.allpass_l {
            out_l = allpass.process(out_l);
        }
        for allpass in &mut self.allpass_r {
            out_r = allpass.process(out_r);
        }
        (out_l, out_r)
    }

    pub fn clear(&mut self) {
        for comb in self.comb_l.iter_mut().chain(self.comb_r.iter_mut()) {
            comb.clear();
        }
        for allpass in self.allpass_l.iter_mut().chain(self.allpass_r.iter_mut()) {
            allpass.clear();
        }
    }
}

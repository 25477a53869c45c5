//! Crossfade lanes and the buffer sources that play on them.

use std::sync::Arc;

use crate::dsp::sampler::SampleBuffer;
use crate::dsp::smoother::GainRamp;

use super::scheduler::SourceId;

/// A one-shot read head over a shared buffer at the buffer's native rate.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: SourceId,
    buffer: Arc<SampleBuffer>,
    /// Read position in buffer samples.
    position: f64,
    /// Buffer samples per output sample.
    step: f64,
}

impl Source {
    /// Start reading `buffer` at `offset_seconds`.
    pub fn new(id: SourceId, buffer: Arc<SampleBuffer>, offset_seconds: f64, output_rate: f64) -> Self {
        let native = buffer.sample_rate as f64;
        Source {
            id,
            position: (offset_seconds.max(0.0) * native).min(buffer.len() as f64),
            step: if output_rate > 0.0 { native / output_rate } else { 1.0 },
            buffer,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.buffer.len() as f64
    }

    /// Current position in seconds of buffer time.
    pub fn position_seconds(&self) -> f64 {
        self.position / self.buffer.sample_rate.max(1) as f64
    }

    /// Output samples until the read head reaches `seconds` of buffer time.
    pub fn samples_until(&self, seconds: f64) -> u64 {
        let target = seconds * self.buffer.sample_rate as f64;
        ((target - self.position) / self.step).ceil().max(0.0) as u64
    }

    #[inline]
    pub fn next(&mut self) -> f64 {
        let s = self.buffer.read_interpolated(self.position);
        self.position += self.step;
        s
    }
}

/// One of the two crossfade slots: an optional source and its gain.
#[derive(Debug, Clone)]
pub struct Lane {
    pub source: Option<Source>,
    pub gain: GainRamp,
}

impl Lane {
    pub fn silent() -> Self {
        Lane {
            source: None,
            gain: GainRamp::hold(0.0),
        }
    }

    pub fn source_id(&self) -> Option<SourceId> {
        self.source.as_ref().map(|s| s.id)
    }
}

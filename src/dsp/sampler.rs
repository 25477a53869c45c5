//! Decoded sample buffers.
//!
//! Holds mono audio at its native rate with fractional-position reads,
//! window RMS for loop analysis, and WAV decoding via `hound`.

use std::io::Read;

use crate::error::Result;

/// A single sample buffer loaded into memory.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Mono f64 samples.
    pub data: Vec<f64>,
    /// Native sample rate of the audio.
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f64>, sample_rate: u32) -> Self {
        SampleBuffer { data, sample_rate }
    }

    /// Create from interleaved 16-bit PCM, averaging channels to mono.
    pub fn from_i16(pcm: &[i16], channels: u16, sample_rate: u32) -> Self {
        let data = downmix(pcm.iter().map(|&s| s as f64 / 32768.0), channels);
        SampleBuffer { data, sample_rate }
    }

    /// Create from interleaved f32 samples, averaging channels to mono.
    pub fn from_f32(samples: &[f32], channels: u16, sample_rate: u32) -> Self {
        let data = downmix(samples.iter().map(|&s| s as f64), channels);
        SampleBuffer { data, sample_rate }
    }

    /// Decode a WAV stream (integer or float PCM, any channel count).
    pub fn from_wav<R: Read>(reader: R) -> Result<Self> {
        let mut wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let buffer = match spec.sample_format {
            hound::SampleFormat::Float => {
                let samples = wav.samples::<f32>().collect::<std::result::Result<Vec<_>, _>>()?;
                Self::from_f32(&samples, spec.channels, spec.sample_rate)
            }
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f64;
                let samples = wav
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f64 / scale))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                SampleBuffer {
                    data: downmix(samples.into_iter(), spec.channels),
                    sample_rate: spec.sample_rate,
                }
            }
        };
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.data.len() as f64 / self.sample_rate as f64
    }

    /// Read a sample with linear interpolation at a fractional position.
    pub fn read_interpolated(&self, position: f64) -> f64 {
        if self.data.is_empty() || position < 0.0 {
            return 0.0;
        }

        let idx = position as usize;
        if idx >= self.data.len() - 1 {
            return if idx < self.data.len() {
                self.data[idx]
            } else {
                0.0
            };
        }

        let frac = position - idx as f64;
        self.data[idx] * (1.0 - frac) + self.data[idx + 1] * frac
    }

    /// RMS over `len` samples starting at `start`, truncated at the buffer end.
    pub fn window_rms(&self, start: usize, len: usize) -> f64 {
        let end = (start + len).min(self.data.len());
        if start >= end {
            return 0.0;
        }
        let sum: f64 = self.data[start..end].iter().map(|s| s * s).sum();
        (sum / (end - start) as f64).sqrt()
    }
}

fn downmix(samples: impl Iterator<Item = f64>, channels: u16) -> Vec<f64> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.collect();
    }
    let interleaved: Vec<f64> = samples.collect();
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

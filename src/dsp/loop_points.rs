//! Loop-point search for crossfade sustain.
//!
//! Candidate loop starts are scanned in a window around 30% of the sample
//! and candidate ends around 70%. Each candidate is scored by the RMS of a
//! short window; the start/end pair with the smallest absolute RMS
//! difference wins, and only then is the difference normalized by the
//! pair's mean level for the acceptability check. A silent pair has no
//! level to compare and is never acceptable. The same
//! constants produce the offline manifest, so precomputed and runtime
//! results are interchangeable.

use serde::{Deserialize, Serialize};

use super::sampler::SampleBuffer;

/// Half-width of each search window in seconds.
pub const SEARCH_RADIUS: f64 = 0.15;
/// RMS window length in seconds.
pub const RMS_WINDOW: f64 = 0.030;
/// Step between candidates in seconds.
pub const SEARCH_STEP: f64 = 0.002;
/// Relative positions of the start and end search windows.
pub const START_POSITION: f64 = 0.3;
pub const END_POSITION: f64 = 0.7;
/// Maximum normalized RMS mismatch of an acceptable loop.
pub const MAX_RMS_DIFF: f64 = 0.05;
pub const MIN_LOOP_LENGTH: f64 = 0.4;
pub const MAX_LOOP_LENGTH: f64 = 4.0;
/// Samples shorter than this are played once.
pub const ONE_SHOT_MAX: f64 = 0.5;

/// Loop points for one sample, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopAnalysis {
    pub loop_start: f64,
    pub loop_end: f64,
    /// |rms(start) - rms(end)| / mean(rms(start), rms(end)); 0 for a silent pair.
    pub rms_diff: f64,
    pub is_acceptable: bool,
    /// False for one-shot samples.
    #[serde(rename = "useASR")]
    pub use_asr: bool,
    pub duration: f64,
}

impl LoopAnalysis {
    /// One-shot: no loop, plays start to finish.
    pub fn one_shot(duration: f64) -> Self {
        LoopAnalysis {
            loop_start: 0.0,
            loop_end: duration,
            rms_diff: 0.0,
            is_acceptable: true,
            use_asr: false,
            duration,
        }
    }

    pub fn loop_length(&self) -> f64 {
        self.loop_end - self.loop_start
    }
}

/// Acceptability against the documented thresholds.
pub fn is_acceptable(rms_diff: f64, loop_length: f64) -> bool {
    rms_diff <= MAX_RMS_DIFF && (MIN_LOOP_LENGTH..=MAX_LOOP_LENGTH).contains(&loop_length)
}

/// Candidate window starts (in samples) centered on `center` seconds.
fn candidates(buffer: &SampleBuffer, center: f64, window: usize, step: usize) -> Vec<usize> {
    let sr = buffer.sample_rate as f64;
    let last = buffer.len().saturating_sub(window);
    let lo = (((center - SEARCH_RADIUS) * sr).max(0.0) as usize).min(last);
    let hi = (((center + SEARCH_RADIUS) * sr) as usize).min(last);
    (lo..=hi).step_by(step.max(1)).collect()
}

/// Run the loop search on a decoded buffer.
pub fn find_loop_points(buffer: &SampleBuffer) -> LoopAnalysis {
    let duration = buffer.duration();
    if duration < ONE_SHOT_MAX {
        return LoopAnalysis::one_shot(duration);
    }

    let sr = buffer.sample_rate as f64;
    let window = ((RMS_WINDOW * sr).round() as usize).max(1);
    let step = ((SEARCH_STEP * sr).round() as usize).max(1);

    let score = |positions: Vec<usize>| -> Vec<(usize, f64)> {
        positions
            .into_iter()
            .map(|p| (p, buffer.window_rms(p, window)))
            .collect()
    };
    let starts = score(candidates(buffer, duration * START_POSITION, window, step));
    let ends = score(candidates(buffer, duration * END_POSITION, window, step));

    let mut best: Option<(usize, usize, f64, f64)> = None;
    for &(s, rms_s) in &starts {
        for &(e, rms_e) in &ends {
            if e <= s {
                continue;
            }
            let diff = (rms_s - rms_e).abs();
            if best.is_none_or(|(_, _, d, _)| diff < d) {
                best = Some((s, e, diff, (rms_s + rms_e) / 2.0));
            }
        }
    }

    match best {
        Some((s, e, diff, avg)) => {
            let loop_start = s as f64 / sr;
            let loop_end = e as f64 / sr;
            let rms_diff = if avg > 0.0 { diff / avg } else { 0.0 };
            LoopAnalysis {
                loop_start,
                loop_end,
                rms_diff,
                is_acceptable: avg > 0.0 && is_acceptable(rms_diff, loop_end - loop_start),
                use_asr: true,
                duration,
            }
        }
        None => LoopAnalysis {
            is_acceptable: false,
            ..LoopAnalysis::one_shot(duration)
        },
    }
}

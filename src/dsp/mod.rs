//! DSP building blocks for the per-hand playback graph.
//!
//! Everything here is sample-by-sample and allocation-free after
//! construction, so the engine can drive it straight from its render loop.

pub mod delay;
pub mod filter;
pub mod limiter;
pub mod loop_points;
pub mod pitch_shift;
pub mod reverb;
pub mod sampler;
pub mod smoother;

pub mod catalog;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod instrument;
pub mod wasm;

use std::io::Cursor;

use crate::dsp::loop_points::{LoopAnalysis, find_loop_points};
use crate::dsp::sampler::SampleBuffer;
use crate::error::Result;
use wasm_bindgen::prelude::*;

pub use crate::instrument::Instrument;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the handtone-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Decode a WAV file image and run the loop-point search on it.
/// The result is the value a loop manifest stores for that sample.
pub fn analyze_wav(bytes: &[u8]) -> Result<LoopAnalysis> {
    let buffer = SampleBuffer::from_wav(Cursor::new(bytes))?;
    Ok(find_loop_points(&buffer))
}

/// WASM-exposed: loop analysis of a WAV byte array as a JSON-shaped object.
#[wasm_bindgen]
pub fn analyze_loop(wav_bytes: &[u8]) -> std::result::Result<JsValue, JsValue> {
    let analysis = analyze_wav(wav_bytes).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    serde_wasm_bindgen::to_value(&analysis).map_err(|e| JsValue::from_str(&format!("{e}")))
}

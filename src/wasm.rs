//! Browser host bindings.
//!
//! The page owns the camera, the landmark model and the AudioWorklet. It
//! hands this object the sample catalog, the decoded-on-demand WAV bytes,
//! one flat landmark array per video frame, and pulls audio blocks from
//! [`WasmInstrument::render`].

use std::io::Cursor;
use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::catalog::{LoopManifest, SampleCatalog};
use crate::config::InstrumentConfig;
use crate::dsp::sampler::SampleBuffer;
use crate::engine::MemoryLoader;
use crate::gesture::HandFrame;
use crate::instrument::Instrument;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

#[wasm_bindgen]
pub struct WasmInstrument {
    inner: Instrument,
}

#[wasm_bindgen]
impl WasmInstrument {
    /// `catalog_json` maps folder names to filename arrays. `config_json`
    /// may override any subset of the tuning constants.
    #[wasm_bindgen(constructor)]
    pub fn new(
        catalog_json: &str,
        manifest_json: Option<String>,
        config_json: Option<String>,
        sample_rate: f64,
    ) -> Result<WasmInstrument, JsValue> {
        let catalog = SampleCatalog::from_json(catalog_json).map_err(js_error)?;
        let manifest = match manifest_json {
            Some(json) => LoopManifest::from_json(&json).map_err(js_error)?,
            None => LoopManifest::default(),
        };
        let config = match config_json {
            Some(json) => InstrumentConfig::from_json(&json).map_err(js_error)?,
            None => InstrumentConfig::default(),
        };
        Ok(WasmInstrument {
            inner: Instrument::new(
                config,
                Arc::new(catalog),
                Box::new(MemoryLoader::new()),
                manifest,
                sample_rate,
            ),
        })
    }

    /// Register the WAV file behind a catalog path.
    pub fn add_sample(&mut self, path: &str, wav_bytes: &[u8]) -> Result<(), JsValue> {
        let buffer = SampleBuffer::from_wav(Cursor::new(wav_bytes)).map_err(js_error)?;
        self.inner.bank_mut().insert(path, buffer).map_err(js_error)
    }

    pub fn start(&mut self) {
        self.inner.start();
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    pub fn toggle_instrument_mode(&mut self) {
        self.inner.toggle_instrument_mode();
    }

    pub fn cycle_pitch_mode(&mut self) {
        self.inner.cycle_pitch_mode();
    }

    pub fn set_single_hand(&mut self, enabled: bool) {
        self.inner.set_single_hand(enabled);
    }

    pub fn set_sensitivity(&mut self, value: f64) {
        self.inner.set_sensitivity(value);
    }

    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.inner.set_performance_mode(enabled);
    }

    /// `landmarks` holds 63 values (x, y, z × 21) per hand, in the order of
    /// `labels`.
    pub fn process_frame(
        &mut self,
        landmarks: &[f64],
        labels: Vec<String>,
        timestamp_ms: f64,
    ) -> Result<(), JsValue> {
        let hands = HandFrame::parse_all(landmarks, labels.as_slice()).map_err(js_error)?;
        self.inner.process_frame(&hands, timestamp_ms);
        Ok(())
    }

    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.inner.render(left, right);
    }

    /// Per-slot `AudioParams` as `[left, right]`.
    pub fn params(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.params()).map_err(js_error)
    }

    pub fn play_states(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.play_states()).map_err(js_error)
    }

    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.settings()).map_err(js_error)
    }
}

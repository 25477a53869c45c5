//! Decoded-sample cache with selection retries.
//!
//! [`SampleBank::acquire`] is the only way the instrument gets audio: it
//! asks the catalog for a sample, loads and analyzes it, and keeps trying
//! other samples when a load fails or the loop is poor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, error, warn};
use rand::Rng;

use crate::catalog::{LoopManifest, SampleCatalog, SelectionRequest};
use crate::dsp::loop_points::{LoopAnalysis, find_loop_points};
use crate::dsp::sampler::SampleBuffer;
use crate::error::{InstrumentError, Result};

use super::loader::SampleLoader;

/// A decoded sample ready for an engine.
#[derive(Debug, Clone)]
pub struct LoadedSample {
    pub path: String,
    pub buffer: Arc<SampleBuffer>,
    pub analysis: LoopAnalysis,
    pub midi_note: Option<u8>,
    /// The request this sample was chosen for.
    pub request: SelectionRequest,
}

#[derive(Debug, Clone)]
struct CachedSample {
    buffer: Arc<SampleBuffer>,
    analysis: LoopAnalysis,
}

pub struct SampleBank {
    catalog: Arc<SampleCatalog>,
    loader: Box<dyn SampleLoader>,
    manifest: LoopManifest,
    cache: HashMap<String, CachedSample>,
    max_attempts: usize,
}

impl SampleBank {
    pub fn new(
        catalog: Arc<SampleCatalog>,
        loader: Box<dyn SampleLoader>,
        manifest: LoopManifest,
        max_attempts: usize,
    ) -> Self {
        SampleBank {
            catalog,
            loader,
            manifest,
            cache: HashMap::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn catalog(&self) -> &SampleCatalog {
        &self.catalog
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }

    fn analyze(&self, path: &str, buffer: &SampleBuffer) -> LoopAnalysis {
        match self.manifest.get(path) {
            Some(precomputed) => precomputed.clone(),
            None => {
                let analysis = find_loop_points(buffer);
                debug!(
                    "Loop search {path}: {:.3}..{:.3}s diff {:.3} ok={}",
                    analysis.loop_start, analysis.loop_end, analysis.rms_diff, analysis.is_acceptable
                );
                analysis
            }
        }
    }

    /// Add an already decoded buffer to the cache.
    pub fn insert(&mut self, path: impl Into<String>, buffer: SampleBuffer) -> Result<()> {
        let path = path.into();
        if buffer.is_empty() {
            return Err(InstrumentError::EmptyBuffer { path });
        }
        let analysis = self.analyze(&path, &buffer);
        self.cache.insert(
            path,
            CachedSample {
                buffer: Arc::new(buffer),
                analysis,
            },
        );
        Ok(())
    }

    /// Buffer and loop analysis for one path, loading on a cache miss.
    pub fn fetch(&mut self, path: &str) -> Result<(Arc<SampleBuffer>, LoopAnalysis)> {
        if let Some(hit) = self.cache.get(path) {
            return Ok((Arc::clone(&hit.buffer), hit.analysis.clone()));
        }
        let buffer = self.loader.load(path)?;
        self.insert(path, buffer)?;
        let hit = self.cache.get(path).ok_or_else(|| InstrumentError::UnknownSample {
            path: path.to_string(),
        })?;
        Ok((Arc::clone(&hit.buffer), hit.analysis.clone()))
    }

    /// Select and load a sample for `request`.
    ///
    /// Samples that fail to load or whose loop is unacceptable are excluded
    /// and another is chosen, up to the attempt limit. After that the
    /// closest-matching loop found so far is used anyway.
    pub fn acquire<R: Rng>(&mut self, request: &SelectionRequest, rng: &mut R) -> Result<LoadedSample> {
        let mut exclude: HashSet<String> = HashSet::new();
        let mut best: Option<LoadedSample> = None;
        let mut attempts = 0;

        while attempts < self.max_attempts {
            attempts += 1;
            let selection = self.catalog.select(request, &exclude, rng);

            match self.fetch(&selection.path) {
                Ok((buffer, analysis)) => {
                    let candidate = LoadedSample {
                        path: selection.path.clone(),
                        buffer,
                        analysis,
                        midi_note: selection.midi_note,
                        request: *request,
                    };
                    if candidate.analysis.is_acceptable {
                        debug!("Acquired {} on attempt {attempts}", candidate.path);
                        return Ok(candidate);
                    }
                    debug!(
                        "Loop in {} rejected (diff {:.3}, length {:.2}s)",
                        candidate.path,
                        candidate.analysis.rms_diff,
                        candidate.analysis.loop_length()
                    );
                    if best
                        .as_ref()
                        .is_none_or(|b| candidate.analysis.rms_diff < b.analysis.rms_diff)
                    {
                        best = Some(candidate);
                    }
                }
                Err(e) => warn!("Failed to load {}: {e}", selection.path),
            }

            if selection.is_fallback() {
                // Exclusion cannot change the default path.
                break;
            }
            exclude.insert(selection.path);
        }

        match best {
            Some(sample) => {
                warn!(
                    "Using {} despite loop mismatch {:.3} after {attempts} attempts",
                    sample.path, sample.analysis.rms_diff
                );
                Ok(sample)
            }
            None => {
                error!("No usable sample for {:?} after {attempts} attempts", request.mode);
                Err(InstrumentError::SampleUnavailable { attempts })
            }
        }
    }
}

//! Where sample audio comes from.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::PathBuf;

use log::debug;

use crate::dsp::sampler::SampleBuffer;
use crate::error::{InstrumentError, Result};

/// Fetches and decodes a sample by its catalog path.
pub trait SampleLoader {
    fn load(&mut self, path: &str) -> Result<SampleBuffer>;
}

fn non_empty(path: &str, buffer: SampleBuffer) -> Result<SampleBuffer> {
    if buffer.is_empty() {
        Err(InstrumentError::EmptyBuffer {
            path: path.to_string(),
        })
    } else {
        Ok(buffer)
    }
}

/// WAV files under a root directory.
#[derive(Debug, Clone)]
pub struct WavFileLoader {
    root: PathBuf,
}

impl WavFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WavFileLoader { root: root.into() }
    }
}

impl SampleLoader for WavFileLoader {
    fn load(&mut self, path: &str) -> Result<SampleBuffer> {
        let full = self.root.join(path);
        debug!("Loading {}", full.display());
        let file = File::open(&full)?;
        non_empty(path, SampleBuffer::from_wav(BufReader::new(file))?)
    }
}

/// Buffers registered up front, keyed by catalog path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    samples: HashMap<String, SampleBuffer>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, buffer: SampleBuffer) {
        self.samples.insert(path.into(), buffer);
    }

    /// Decode WAV bytes and register them.
    pub fn insert_wav(&mut self, path: impl Into<String>, bytes: &[u8]) -> Result<()> {
        let buffer = SampleBuffer::from_wav(Cursor::new(bytes))?;
        self.insert(path, buffer);
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.samples.contains_key(path)
    }
}

impl SampleLoader for MemoryLoader {
    fn load(&mut self, path: &str) -> Result<SampleBuffer> {
        let buffer = self
            .samples
            .get(path)
            .cloned()
            .ok_or_else(|| InstrumentError::UnknownSample {
                path: path.to_string(),
            })?;
        non_empty(path, buffer)
    }
}

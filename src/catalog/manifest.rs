//! Precomputed loop analysis, keyed by sample path.
//!
//! Generated offline so runtime loads skip the loop-point search. A missing
//! entry is not an error; the sample is analyzed when it loads.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dsp::loop_points::LoopAnalysis;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopManifest {
    entries: HashMap<String, LoopAnalysis>,
}

impl LoopManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, path: &str) -> Option<&LoopAnalysis> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, analysis: LoopAnalysis) {
        self.entries.insert(path.into(), analysis);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_camel_case_entries() {
        let json = r#"{
            "trombone/trombone_medium_A2.wav": {
                "loopStart": 0.62, "loopEnd": 1.9, "rmsDiff": 0.01,
                "isAcceptable": true, "useASR": true, "duration": 2.4
            }
        }"#;
        let manifest = LoopManifest::from_json(json).unwrap();
        let entry = manifest.get("trombone/trombone_medium_A2.wav").unwrap();
        assert!(entry.use_asr);
        assert!((entry.loop_start - 0.62).abs() < 1e-12);
        assert!(manifest.get("cello/cello_medium_A2.wav").is_none());
    }

    #[test]
    fn file_round_trip() {
        let mut manifest = LoopManifest::default();
        manifest.insert("viola/v_A3.wav", LoopAnalysis::one_shot(0.3));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(manifest.to_json().unwrap().as_bytes()).unwrap();

        let loaded = LoopManifest::from_file(file.path()).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoopManifest::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, crate::error::InstrumentError::Io(_)));
    }
}

//! The in-memory sample catalog and pitch-nearest selection.
//!
//! Built once from a `{ folder: [filename, ...] }` listing, then shared
//! read-only (`Arc<SampleCatalog>`) by every hand.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use rand::Rng;

use super::note_name::parse_sample_filename;
use super::{Articulation, InstrumentGroup, InstrumentMode, PitchMode};
use crate::error::Result;

/// One playable sample file.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInfo {
    /// Path relative to the sample root (`folder/filename`).
    pub path: String,
    pub midi_note: u8,
    pub octave: i32,
    pub articulation: Articulation,
    pub group: InstrumentGroup,
}

/// What the caller wants to play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRequest {
    pub mode: InstrumentMode,
    pub articulation: Articulation,
    pub pitch_mode: PitchMode,
    /// 0.0 = bottom of the band, 1.0 = top.
    pub pitch_position: f64,
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub path: String,
    /// `None` for the hardcoded fallback sample.
    pub midi_note: Option<u8>,
    pub target_midi: f64,
}

impl Selection {
    pub fn is_fallback(&self) -> bool {
        self.midi_note.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampleCatalog {
    /// Sorted by (midi_note, path).
    partitions: HashMap<(InstrumentGroup, Articulation), Vec<SampleInfo>>,
}

/// Group and articulation named by a folder like `trombone_soft` or `cello-ff`.
fn classify_folder(folder: &str) -> Option<(InstrumentGroup, Articulation)> {
    let tokens: Vec<&str> = folder
        .split(['_', '-', ' ', '/'])
        .filter(|t| !t.is_empty())
        .collect();
    let group = tokens.iter().find_map(|t| InstrumentGroup::from_token(t))?;
    let articulation = tokens
        .iter()
        .find_map(|t| Articulation::from_token(t))
        .unwrap_or(Articulation::Medium);
    Some((group, articulation))
}

impl SampleCatalog {
    /// Build from a folder → filenames listing. Unknown folders and
    /// filenames without a note are skipped.
    pub fn from_listing<'a, I, F>(listing: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, F)>,
        F: IntoIterator<Item = &'a String>,
    {
        let mut partitions: HashMap<(InstrumentGroup, Articulation), Vec<SampleInfo>> =
            HashMap::new();
        let mut skipped = 0usize;

        for (folder, files) in listing {
            let Some((group, articulation)) = classify_folder(folder) else {
                skipped += 1;
                continue;
            };
            for file in files {
                let Some(note) = parse_sample_filename(file) else {
                    skipped += 1;
                    continue;
                };
                partitions.entry((group, articulation)).or_default().push(SampleInfo {
                    path: format!("{folder}/{file}"),
                    midi_note: note.midi,
                    octave: note.octave,
                    articulation,
                    group,
                });
            }
        }

        for samples in partitions.values_mut() {
            samples.sort_by(|a, b| a.midi_note.cmp(&b.midi_note).then_with(|| a.path.cmp(&b.path)));
        }

        let catalog = SampleCatalog { partitions };
        debug!("Sample catalog: {} samples, {} entries skipped", catalog.len(), skipped);
        catalog
    }

    /// Parse a JSON object mapping folder names to filename arrays.
    pub fn from_json(json: &str) -> Result<Self> {
        let listing: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_listing(listing.iter()))
    }

    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples for one group and layer, sorted by pitch.
    pub fn samples(&self, group: InstrumentGroup, articulation: Articulation) -> &[SampleInfo] {
        self.partitions
            .get(&(group, articulation))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn layer(
        &self,
        mode: InstrumentMode,
        articulation: Articulation,
        exclude: &HashSet<String>,
    ) -> Vec<&SampleInfo> {
        let mut out: Vec<&SampleInfo> = mode
            .groups()
            .iter()
            .flat_map(|g| self.samples(*g, articulation))
            .filter(|s| !exclude.contains(&s.path))
            .collect();
        out.sort_by(|a, b| a.midi_note.cmp(&b.midi_note).then_with(|| a.path.cmp(&b.path)));
        out
    }

    /// Pitch-sorted candidates for a mode, falling back from the requested
    /// layer to medium, then to any layer. Paths in `exclude` never count,
    /// so a layer whose samples all failed falls through like an empty one.
    pub fn candidates(
        &self,
        mode: InstrumentMode,
        articulation: Articulation,
        exclude: &HashSet<String>,
    ) -> Vec<&SampleInfo> {
        let requested = self.layer(mode, articulation, exclude);
        if !requested.is_empty() {
            return requested;
        }
        let medium = self.layer(mode, Articulation::Medium, exclude);
        if !medium.is_empty() {
            return medium;
        }
        Articulation::ALL
            .iter()
            .map(|a| self.layer(mode, *a, exclude))
            .find(|c| !c.is_empty())
            .unwrap_or_default()
    }

    /// Pick a sample for `request`, skipping paths in `exclude`.
    pub fn select<R: Rng>(
        &self,
        request: &SelectionRequest,
        exclude: &HashSet<String>,
        rng: &mut R,
    ) -> Selection {
        let candidates = self.candidates(request.mode, request.articulation, exclude);
        let band = pitch_band(request.mode, request.pitch_mode, candidates);

        let (Some(lo), Some(hi)) = (band.first(), band.last()) else {
            warn!(
                "No {:?} samples for {:?}; using default sample",
                request.articulation, request.mode
            );
            return Selection {
                path: request.mode.default_sample().to_string(),
                midi_note: None,
                target_midi: 0.0,
            };
        };

        let position = request.pitch_position.clamp(0.0, 1.0);
        let target = lo.midi_note as f64 + position * (hi.midi_note as f64 - lo.midi_note as f64);
        let nearest = nearest_by_midi(&band, target);
        let chosen = nearest[rng.random_range(0..nearest.len())];

        Selection {
            path: chosen.path.clone(),
            midi_note: Some(chosen.midi_note),
            target_midi: target,
        }
    }
}

/// Restrict pitch-sorted candidates to a band. An empty band yields all.
pub fn pitch_band(
    mode: InstrumentMode,
    pitch_mode: PitchMode,
    candidates: Vec<&SampleInfo>,
) -> Vec<&SampleInfo> {
    if pitch_mode == PitchMode::All {
        return candidates;
    }

    let band: Vec<&SampleInfo> = match mode {
        InstrumentMode::Brass => candidates
            .iter()
            .copied()
            .filter(|s| match pitch_mode {
                PitchMode::Low => s.octave <= 2,
                PitchMode::Mid => s.octave == 3,
                PitchMode::High => s.octave >= 4,
                PitchMode::All => true,
            })
            .collect(),
        InstrumentMode::Strings => {
            let mut pitches: Vec<u8> = candidates.iter().map(|s| s.midi_note).collect();
            pitches.dedup();
            let n = pitches.len() as f64;
            let b1 = (n / 3.0).round() as usize;
            let b2 = (2.0 * n / 3.0).round() as usize;
            let range = match pitch_mode {
                PitchMode::Low => &pitches[..b1],
                PitchMode::Mid => &pitches[b1..b2],
                PitchMode::High => &pitches[b2..],
                PitchMode::All => &pitches[..],
            };
            candidates
                .iter()
                .copied()
                .filter(|s| range.contains(&s.midi_note))
                .collect()
        }
    };

    if band.is_empty() { candidates } else { band }
}

/// All samples at the minimum MIDI distance from `target`.
///
/// `sorted` must be ordered by pitch and non-empty. Ties and several
/// recordings of the same pitch all come back so the caller can choose.
pub fn nearest_by_midi<'a>(sorted: &[&'a SampleInfo], target: f64) -> Vec<&'a SampleInfo> {
    let idx = sorted.partition_point(|s| (s.midi_note as f64) < target);
    let distance = |i: usize| (sorted[i].midi_note as f64 - target).abs();

    let best = match (idx.checked_sub(1), idx < sorted.len()) {
        (Some(below), true) => distance(below).min(distance(idx)),
        (Some(below), false) => distance(below),
        (None, _) => distance(idx),
    };

    const EPS: f64 = 1e-9;
    let lo = sorted.partition_point(|s| (s.midi_note as f64) < target - best - EPS);
    let hi = sorted.partition_point(|s| (s.midi_note as f64) <= target + best + EPS);
    sorted[lo..hi]
        .iter()
        .copied()
        .filter(|s| ((s.midi_note as f64 - target).abs() - best).abs() < EPS)
        .collect()
}

//! Sample catalog: instrument groups, articulation layers, and
//! pitch-nearest sample selection.

pub mod index;
pub mod manifest;
pub mod note_name;

pub use index::{SampleCatalog, SampleInfo, Selection, SelectionRequest};
pub use manifest::LoopManifest;

use serde::{Deserialize, Serialize};

/// Sample bank chosen by how jerky the hand is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    Soft,
    Medium,
    Hard,
}

impl Articulation {
    pub const ALL: [Articulation; 3] = [Articulation::Soft, Articulation::Medium, Articulation::Hard];

    /// Recognize a folder/file token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "soft" | "pp" | "p" => Some(Articulation::Soft),
            "medium" | "mp" | "mf" => Some(Articulation::Medium),
            "hard" | "f" | "ff" | "fff" => Some(Articulation::Hard),
            _ => None,
        }
    }
}

/// A recorded instrument inside a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstrumentGroup {
    #[serde(rename = "brass:trombone")]
    Trombone,
    #[serde(rename = "strings:cello")]
    Cello,
    #[serde(rename = "strings:viola")]
    Viola,
}

impl InstrumentGroup {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "trombone" => Some(InstrumentGroup::Trombone),
            "cello" => Some(InstrumentGroup::Cello),
            "viola" => Some(InstrumentGroup::Viola),
            _ => None,
        }
    }

    pub fn mode(&self) -> InstrumentMode {
        match self {
            InstrumentGroup::Trombone => InstrumentMode::Brass,
            InstrumentGroup::Cello | InstrumentGroup::Viola => InstrumentMode::Strings,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentGroup::Trombone => "brass:trombone",
            InstrumentGroup::Cello => "strings:cello",
            InstrumentGroup::Viola => "strings:viola",
        }
    }
}

/// Instrument family played by both hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentMode {
    Brass,
    Strings,
}

impl InstrumentMode {
    pub fn groups(&self) -> &'static [InstrumentGroup] {
        match self {
            InstrumentMode::Brass => &[InstrumentGroup::Trombone],
            InstrumentMode::Strings => &[InstrumentGroup::Cello, InstrumentGroup::Viola],
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            InstrumentMode::Brass => InstrumentMode::Strings,
            InstrumentMode::Strings => InstrumentMode::Brass,
        }
    }

    /// Used when the catalog has nothing to offer.
    pub fn default_sample(&self) -> &'static str {
        match self {
            InstrumentMode::Brass => "trombone/trombone_medium_A2.wav",
            InstrumentMode::Strings => "cello/cello_medium_A2.wav",
        }
    }
}

/// Restriction of the playable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchMode {
    Low,
    Mid,
    High,
    All,
}

impl PitchMode {
    pub fn cycled(&self) -> Self {
        match self {
            PitchMode::Low => PitchMode::Mid,
            PitchMode::Mid => PitchMode::High,
            PitchMode::High => PitchMode::All,
            PitchMode::All => PitchMode::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_mode_cycles_through_all_bands() {
        let mut mode = PitchMode::Low;
        let mut seen = vec![mode];
        for _ in 0..3 {
            mode = mode.cycled();
            seen.push(mode);
        }
        assert_eq!(seen, vec![PitchMode::Low, PitchMode::Mid, PitchMode::High, PitchMode::All]);
        assert_eq!(mode.cycled(), PitchMode::Low);
    }

    #[test]
    fn tokens_map_to_layers_and_groups() {
        assert_eq!(Articulation::from_token("FF"), Some(Articulation::Hard));
        assert_eq!(Articulation::from_token("mf"), Some(Articulation::Medium));
        assert_eq!(Articulation::from_token("arco"), None);
        assert_eq!(InstrumentGroup::from_token("Viola"), Some(InstrumentGroup::Viola));
        assert_eq!(InstrumentGroup::Cello.mode(), InstrumentMode::Strings);
        assert_eq!(InstrumentMode::Brass.toggled(), InstrumentMode::Strings);
    }

    #[test]
    fn group_serializes_with_family_prefix() {
        let json = serde_json::to_string(&InstrumentGroup::Trombone).unwrap();
        assert_eq!(json, "\"brass:trombone\"");
    }
}

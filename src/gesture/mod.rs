//! Gesture pipeline: landmarks in, note events and control parameters out.
//!
//! Every hand slot runs the same chain each video frame:
//! features → vibrato → note state → trail → parameter mapping → dropout.

pub mod dropout;
pub mod features;
pub mod hand;
pub mod landmarks;
pub mod note_state;
pub mod params;
pub mod trail;
pub mod vibrato;

pub use hand::{HandTracker, HandUpdate};
pub use landmarks::{HandFrame, Handedness, Landmark};
pub use note_state::{NoteEvent, NotePhase};
pub use params::AudioParams;

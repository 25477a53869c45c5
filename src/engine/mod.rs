//! Sample playback: asset loading, the event scheduler, crossfade lanes,
//! the effects chain and the ASR engine that ties them together.

pub mod bank;
pub mod graph;
pub mod lane;
pub mod loader;
pub mod playback;
pub mod scheduler;

pub use bank::{LoadedSample, SampleBank};
pub use loader::{MemoryLoader, SampleLoader, WavFileLoader};
pub use playback::{PlayState, PlaybackEngine};
pub use scheduler::{EventKind, Scheduler, SourceId};

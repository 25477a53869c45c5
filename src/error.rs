use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV decode error: {0}")]
    Decode(#[from] hound::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown sample '{path}'")]
    UnknownSample { path: String },

    #[error("Sample '{path}' decoded to an empty buffer")]
    EmptyBuffer { path: String },

    #[error("No usable sample after {attempts} attempts")]
    SampleUnavailable { attempts: usize },

    #[error("Expected {expected} landmark values, got {found}")]
    InvalidLandmarks { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, InstrumentError>;

//! Error taxonomy shared by the recorder, the player and the front-end

use crate::step::Phase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Pointer position could not be read when the trigger fired.
    #[error("could not sample pointer position: {0}")]
    CaptureSample(String),

    /// A single synthetic move or click was rejected by the host.
    #[error("step {index} of {phase} failed: {reason}")]
    PlaybackStep {
        phase: Phase,
        index: usize,
        reason: String,
    },

    #[error("a run is already in progress")]
    Busy,

    /// Persisted sequence snapshot has the wrong shape or non-numeric fields.
    #[error("malformed sequence file: {0}")]
    LoadFormat(String),

    #[error("could not load settings: {0}")]
    SettingsLoad(String),

    #[error("{phase} has no step at index {index} (len {len})")]
    IndexOutOfRange { phase: Phase, index: usize, len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stable machine-readable code, used by the terminal's JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    CaptureSample,
    PlaybackStep,
    Busy,
    LoadFormat,
    SettingsLoad,
    IndexOutOfRange,
    Io,
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::CaptureSample(_) => ErrorCode::CaptureSample,
            Error::PlaybackStep { .. } => ErrorCode::PlaybackStep,
            Error::Busy => ErrorCode::Busy,
            Error::LoadFormat(_) => ErrorCode::LoadFormat,
            Error::SettingsLoad(_) => ErrorCode::SettingsLoad,
            Error::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Error::Io(_) => ErrorCode::Io,
        }
    }

    pub fn load_format(message: impl Into<String>) -> Self {
        Error::LoadFormat(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::LoadFormat(e.to_string())
    }
}

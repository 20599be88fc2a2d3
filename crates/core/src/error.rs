use saund_project::ProjectError;
use saund_transport::{ClipId, TrackId};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Clip {clip} not found on track {track}")]
    ClipNotFound { track: TrackId, clip: ClipId },

    #[error("Invalid clip range [{start}, {end})")]
    InvalidRange { start: f64, end: f64 },

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("No recording in progress")]
    NoActiveRecording,

    #[error("Failed to decode audio file '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl EngineError {
    /// Whether the operation referenced an id absent from the current state.
    /// Callers treat these as no-ops after reporting them.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::TrackNotFound(_) | EngineError::ClipNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

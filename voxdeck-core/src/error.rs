use thiserror::Error;

use crate::composition::SegmentId;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Speech provider returned no audio")]
    EmptyResult,

    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    #[error("Segment {0} has no generated audio")]
    NoAudio(SegmentId),

    #[error("Generation failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("Playback failed: {0:#}")]
    Playback(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<base64::DecodeError> for StudioError {
    fn from(source: base64::DecodeError) -> Self {
        Self::MalformedInput(source.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

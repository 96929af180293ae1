use anyhow::Result;
use async_trait::async_trait;

use super::types::{SynthesisRequest, Voice};
use crate::audio::RawAudio;

/// Trait for text-to-speech engines that return raw s16le mono PCM at the
/// configured sample rate
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Voice used when the settings do not name one
    fn default_voice(&self) -> Voice;

    /// Synthesize speech. An empty buffer means the engine produced nothing.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<RawAudio>;

    async fn list_voices(&self) -> Result<Vec<Voice>>;
}

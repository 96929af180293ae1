use anyhow::Result;
use async_trait::async_trait;

use crate::audio::decode::DecodedAudio;

/// Something that can turn decoded audio into sound
pub trait ClipOutput: Send + Sync {
    /// Begin playing `audio` immediately and return its handle
    fn start(&self, audio: DecodedAudio) -> Result<Box<dyn ClipHandle>>;
}

/// A clip that has been handed to the output
#[async_trait]
pub trait ClipHandle: Send + Sync {
    /// Halt output immediately. Calling it more than once is harmless.
    fn stop(&self);

    /// True once the clip ran to its end or was stopped
    fn is_finished(&self) -> bool;

    /// Resolves when the clip ends naturally or after `stop`
    async fn wait(&self);
}

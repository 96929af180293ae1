//! Join independently generated PCM buffers into one track
//!
//! Pure byte concatenation: no resampling, gaps or cross-fades.

use tracing::debug;

use super::wav::{create_container, ContainerBlob};
use super::RawAudio;
use crate::composition::Segment;

/// Concatenate the present buffers in order, skipping `None`.
pub fn concatenate<'a, I>(buffers: I) -> RawAudio
where
    I: IntoIterator<Item = Option<&'a RawAudio>>,
{
    let present: Vec<&RawAudio> = buffers.into_iter().flatten().collect();
    let total_len: usize = present.iter().map(|b| b.len()).sum();

    let mut output = Vec::with_capacity(total_len);
    for buffer in &present {
        output.extend_from_slice(buffer.as_bytes());
    }

    debug!(
        parts = present.len(),
        total_len, "concatenated PCM buffers"
    );
    RawAudio::from(output)
}

pub fn concatenate_segments(segments: &[Segment]) -> RawAudio {
    concatenate(segments.iter().map(|s| s.audio.as_ref()))
}

/// Concatenate every segment with audio and frame the result
pub fn concatenate_to_single_wav(segments: &[Segment], sample_rate: u32) -> ContainerBlob {
    let track = concatenate_segments(segments);
    create_container(&track, sample_rate)
}

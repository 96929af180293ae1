//! Raw PCM handling: transport codec, WAV framing, decoding and concatenation

pub mod codec;
pub mod concat;
pub mod decode;
#[cfg(feature = "device")]
pub mod device;
pub mod wav;

use std::ops::Deref;
use std::sync::Arc;

/// Sample rate the speech provider produces by convention
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Audio format profile shared by the framer and the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.bytes_per_frame() as u32
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::mono(DEFAULT_SAMPLE_RATE)
    }
}

/// Signed 16-bit little-endian PCM bytes as returned by a speech provider.
///
/// Immutable once produced. Clones share the same allocation so a buffer can
/// be handed to the sequencer, the exporter and the composition at once.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RawAudio(Arc<[u8]>);

impl RawAudio {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of whole 16-bit samples; a trailing odd byte is not counted
    pub fn sample_count(&self) -> usize {
        self.0.len() / 2
    }

    pub fn duration_ms(&self, format: &PcmFormat) -> u64 {
        let frame_bytes = format.bytes_per_frame().max(1) as u64;
        let frames = self.0.len() as u64 / frame_bytes;
        frames * 1000 / format.sample_rate.max(1) as u64
    }
}

impl Deref for RawAudio {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for RawAudio {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for RawAudio {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl std::fmt::Debug for RawAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawAudio")
            .field("len", &self.0.len())
            .finish()
    }
}

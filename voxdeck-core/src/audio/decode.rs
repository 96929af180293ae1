//! PCM s16le -> normalized per-channel f32 frames for an output device

use anyhow::anyhow;
use tracing::{debug, warn};

use super::{PcmFormat, RawAudio};
use crate::error::{Result, StudioError};

/// Planar float audio ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// One sample vector per channel, all `frame_count()` long
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn duration_secs(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate.max(1) as f32
    }

    /// Interleave channels back into `[c0, c1, c0, c1, ...]`
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut output = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                output.push(channel[i]);
            }
        }
        output
    }
}

/// Decode signed 16-bit little-endian PCM.
///
/// Each sample maps to `value / 32768.0`, so the range is [-1.0, 1.0) with no
/// clamping. A trailing odd byte is dropped with a warning, as are samples
/// that do not complete a frame.
pub fn decode_pcm16(bytes: &[u8], format: &PcmFormat) -> DecodedAudio {
    if bytes.len() % 2 != 0 {
        warn!(
            len = bytes.len(),
            "PCM buffer has odd length, dropping trailing byte"
        );
    }

    let channel_count = format.channels as usize;
    if channel_count == 0 {
        return DecodedAudio {
            sample_rate: format.sample_rate,
            channels: Vec::new(),
        };
    }

    let sample_count = bytes.len() / 2;
    let frame_count = sample_count / channel_count;
    let mut channels = vec![Vec::with_capacity(frame_count); channel_count];

    for (index, chunk) in bytes
        .chunks_exact(2)
        .take(frame_count * channel_count)
        .enumerate()
    {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        channels[index % channel_count].push(sample as f32 / 32768.0);
    }

    debug!(
        frames = frame_count,
        channels = channel_count,
        sample_rate = format.sample_rate,
        "decoded PCM"
    );

    DecodedAudio {
        sample_rate: format.sample_rate,
        channels,
    }
}

/// Async boundary for the playback path. Decoding is pure; it runs on the
/// blocking pool so long clips do not stall the scheduler.
pub async fn decode_for_playback(audio: RawAudio, format: PcmFormat) -> Result<DecodedAudio> {
    tokio::task::spawn_blocking(move || decode_pcm16(&audio, &format))
        .await
        .map_err(|e| StudioError::Playback(anyhow!("decode task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_normalization() {
        let decoded = decode_pcm16(&pcm(&[0, 32767, -32768, -1]), &PcmFormat::default());

        assert_eq!(decoded.sample_rate, 24000);
        assert_eq!(decoded.channel_count(), 1);
        let samples = &decoded.channels[0];
        assert_eq!(samples.len(), 4);
        assert!((samples[0] - 0.0).abs() < f32::EPSILON);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
        assert!((samples[2] - -1.0).abs() < f32::EPSILON);
        assert!((samples[3] - -1.0 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_odd_length_drops_trailing_byte() {
        for n in [0usize, 1, 5, 100] {
            let mut bytes = pcm(&vec![1000i16; n]);
            bytes.push(0x7f);
            let decoded = decode_pcm16(&bytes, &PcmFormat::default());
            assert_eq!(decoded.frame_count(), n, "{} bytes", bytes.len());
        }
    }

    #[test]
    fn test_stereo_deinterleaves() {
        let format = PcmFormat {
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: 16,
        };
        // 2 full frames plus a dangling left sample
        let decoded = decode_pcm16(&pcm(&[16384, -16384, 8192, -8192, 100]), &format);

        assert_eq!(decoded.frame_count(), 2);
        assert_eq!(decoded.channels[0], vec![0.5, 0.25]);
        assert_eq!(decoded.channels[1], vec![-0.5, -0.25]);
        assert_eq!(decoded.interleaved(), vec![0.5, -0.5, 0.25, -0.25]);
    }

    #[test]
    fn test_empty_buffer() {
        let decoded = decode_pcm16(&[], &PcmFormat::default());
        assert_eq!(decoded.frame_count(), 0);
        assert_eq!(decoded.duration_secs(), 0.0);
    }

    #[tokio::test]
    async fn test_decode_for_playback_matches_sync_decode() {
        let bytes = pcm(&[1, 2, 3, -4]);
        let format = PcmFormat::default();
        let decoded = decode_for_playback(RawAudio::from(bytes.clone()), format)
            .await
            .unwrap();
        assert_eq!(decoded, decode_pcm16(&bytes, &format));
    }
}

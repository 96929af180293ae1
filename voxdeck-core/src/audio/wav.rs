//! Canonical 44-byte RIFF/WAVE framing for raw PCM
//!
//! Header layout (all integers little-endian):
//!
//! | offset | field           | value                  |
//! |--------|-----------------|------------------------|
//! | 0      | chunk id        | `RIFF`                 |
//! | 4      | chunk size      | 36 + payload length    |
//! | 8      | format          | `WAVE`                 |
//! | 12     | subchunk1 id    | `fmt `                 |
//! | 16     | subchunk1 size  | 16                     |
//! | 20     | audio format    | 1 (linear PCM)         |
//! | 22     | channels        | 1                      |
//! | 24     | sample rate     | as given               |
//! | 28     | byte rate       | sample rate * 2        |
//! | 32     | block align     | 2                      |
//! | 34     | bits per sample | 16                     |
//! | 36     | subchunk2 id    | `data`                 |
//! | 40     | subchunk2 size  | payload length         |

use tracing::debug;

use super::{PcmFormat, DEFAULT_SAMPLE_RATE};

pub const HEADER_LEN: usize = 44;

/// Header plus payload, playable and downloadable on its own
#[derive(Clone, PartialEq, Eq)]
pub struct ContainerBlob(Vec<u8>);

impl ContainerBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn header(&self) -> &[u8] {
        &self.0[..HEADER_LEN]
    }

    pub fn payload(&self) -> &[u8] {
        &self.0[HEADER_LEN..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the container carries no samples (header only)
    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

impl AsRef<[u8]> for ContainerBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for ContainerBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBlob")
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

/// Frame mono 16-bit PCM at `sample_rate`. Never fails; payload parity is
/// not checked here.
pub fn create_container(payload: &[u8], sample_rate: u32) -> ContainerBlob {
    let format = PcmFormat::mono(sample_rate);
    // Size fields are 32-bit; oversized payloads saturate rather than wrap.
    let data_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    let riff_len = data_len.saturating_add(36);

    let mut wav = Vec::with_capacity(HEADER_LEN + payload.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&riff_len.to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.wrapping_mul(2).to_le_bytes());
    wav.extend_from_slice(&(format.bytes_per_frame() as u16).to_le_bytes());
    wav.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(payload);

    debug!(
        payload_len = payload.len(),
        sample_rate, "framed PCM into WAV container"
    );
    ContainerBlob(wav)
}

pub fn create_default_container(payload: &[u8]) -> ContainerBlob {
    create_container(payload, DEFAULT_SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[rstest]
    fn test_header_fields(
        #[values(0, 1, 1000)] payload_len: usize,
        #[values(8000, 16000, 24000, 44100)] sample_rate: u32,
    ) {
        let payload: Vec<u8> = (0..payload_len).map(|i| i as u8).collect();
        let blob = create_container(&payload, sample_rate);
        let header = blob.header();

        assert_eq!(blob.len(), 44 + payload_len);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32_at(header, 4), 36 + payload_len as u32);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u32_at(header, 16), 16);
        assert_eq!(u16_at(header, 20), 1);
        assert_eq!(u16_at(header, 22), 1);
        assert_eq!(u32_at(header, 24), sample_rate);
        assert_eq!(u32_at(header, 28), sample_rate * 2);
        assert_eq!(u16_at(header, 32), 2);
        assert_eq!(u16_at(header, 34), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32_at(header, 40), payload_len as u32);
        assert_eq!(blob.payload(), payload.as_slice());
    }

    #[test]
    fn test_exact_bytes_for_empty_payload() {
        let blob = create_default_container(&[]);
        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 36, 0, 0, 0, b'W', b'A', b'V', b'E', b'f', b'm', b't', b' ',
            16, 0, 0, 0, 1, 0, 1, 0, 0xC0, 0x5D, 0, 0, 0x80, 0xBB, 0, 0, 2, 0, 16, 0, b'd', b'a',
            b't', b'a', 0, 0, 0, 0,
        ];
        assert_eq!(blob.as_bytes(), &expected);
        assert!(blob.is_empty());
    }

    #[test]
    fn test_readable_by_generic_wav_reader() {
        let samples: Vec<i16> = vec![0, 1, -1, i16::MAX, i16::MIN, 1234];
        let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let blob = create_container(&payload, 16000);

        let reader = hound::WavReader::new(std::io::Cursor::new(blob.into_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }
}

//! Byte buffer <-> transport text
//!
//! Providers ship PCM inline in JSON, so audio crosses the wire as padded
//! standard base64.

use base64::{engine::general_purpose, Engine as _};

use crate::error::Result;

pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Inverse of [`encode`]. Rejects characters outside the alphabet and
/// non-canonical padding with `StudioError::MalformedInput`.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(general_purpose::STANDARD.decode(text)?)
}

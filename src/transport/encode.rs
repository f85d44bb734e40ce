//! Wire encoding for audio payloads.
//!
//! Chunks cross the transcription boundary as base64-encoded PCM16
//! little-endian, labeled with a mime string carrying the sample rate.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::format::{f32_slice_to_i16, i16_slice_to_f32};
use crate::TransportError;

/// Mime label for 24kHz PCM16 payloads.
pub const PCM16_MIME: &str = "audio/pcm;rate=24000";

/// One encoded chunk ready for a transcription sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    /// Base64-encoded PCM16 little-endian samples.
    pub data: String,
    /// Mime type describing the encoding and rate.
    pub mime: &'static str,
}

/// Encodes a chunk of f32 samples into a wire payload.
pub fn encode_chunk(samples: &[f32]) -> AudioPayload {
    let pcm = f32_slice_to_i16(samples);
    let mut bytes = Vec::with_capacity(pcm.len() * 2);
    for sample in pcm {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    AudioPayload {
        data: BASE64.encode(bytes),
        mime: PCM16_MIME,
    }
}

/// Decodes a wire payload back into f32 samples.
///
/// Used by the microphone path to recover the system-audio reference
/// from the buffer it shares with the far channel.
///
/// # Errors
///
/// Returns an error for invalid base64 or an odd byte count.
pub fn decode_payload(data: &str) -> Result<Vec<f32>, TransportError> {
    let bytes = BASE64
        .decode(data)
        .map_err(|e| TransportError::send_failed(format!("invalid base64: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(TransportError::send_failed("odd PCM16 byte count"));
    }

    let pcm: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(i16_slice_to_f32(&pcm))
}

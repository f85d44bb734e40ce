//! Encoding and delivery of audio to transcription sinks.
//!
//! Chunks leave the pipeline as base64 PCM16 payloads on one of two
//! logical channels: near (the user's microphone) and far (system
//! audio). Delivery is fire-and-forget; a failing sink drops chunks and
//! never stalls capture.

mod dispatch;
mod encode;
mod sink;

pub use dispatch::Transport;
pub use encode::{decode_payload, encode_chunk, AudioPayload, PCM16_MIME};
pub use sink::{ChannelTranscriptionSink, TranscriptMessage, TranscriptionSink};

/// The conversational side an audio payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportChannel {
    /// The user's own voice (microphone, after echo cancellation).
    Near,
    /// Remote participants (system audio).
    Far,
}

impl std::fmt::Display for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Near => write!(f, "near"),
            Self::Far => write!(f, "far"),
        }
    }
}

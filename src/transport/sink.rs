//! Transcription sink trait and the tokio channel implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{AudioPayload, TransportChannel};
use crate::TransportError;

/// A payload tagged with the channel it belongs to.
#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    /// Which conversational side the audio came from.
    pub channel: TransportChannel,
    /// The encoded audio.
    pub payload: AudioPayload,
}

/// A destination for encoded audio payloads.
///
/// Sinks receive the near (microphone) and far (system audio) streams as
/// tagged payloads. Send errors are recoverable: the dispatcher logs them
/// and the capture loop keeps running.
///
/// Methods take `&self`; use interior mutability if state is needed.
#[async_trait]
pub trait TranscriptionSink: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Called once before audio flows. Errors here abort session start.
    async fn on_start(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Delivers one encoded chunk.
    async fn send(
        &self,
        channel: TransportChannel,
        payload: AudioPayload,
    ) -> Result<(), TransportError>;

    /// Called during graceful shutdown.
    async fn on_stop(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A sink that forwards payloads to a tokio mpsc channel.
///
/// This is the primary way for an embedding application to receive the
/// encoded streams for its transcription session.
///
/// # Example
///
/// ```
/// use echo_capture::transport::{ChannelTranscriptionSink, TranscriptMessage};
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<TranscriptMessage>(100);
/// let sink = ChannelTranscriptionSink::new(tx);
/// // register via CaptureBuilder::add_sink, then:
/// // while let Some(msg) = rx.recv().await { ... }
/// ```
pub struct ChannelTranscriptionSink {
    name: String,
    sender: mpsc::Sender<TranscriptMessage>,
}

impl ChannelTranscriptionSink {
    /// Creates a sink with the given sender.
    pub fn new(sender: mpsc::Sender<TranscriptMessage>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<TranscriptMessage>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }
}

#[async_trait]
impl TranscriptionSink for ChannelTranscriptionSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        channel: TransportChannel,
        payload: AudioPayload,
    ) -> Result<(), TransportError> {
        self.sender
            .send(TranscriptMessage { channel, payload })
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

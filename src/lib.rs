//! # echo-capture
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Real-time two-path audio capture with acoustic echo cancellation,
//! built for live meeting transcription.
//!
//! `echo-capture` captures the user's microphone and, when a
//! virtual-loopback device is installed, the system's own playback. The
//! microphone stream is echo-cancelled against the system audio so the
//! transcription backend never hears the meeting's remote participants
//! twice. Both streams leave the pipeline as 100 ms base64 PCM16 chunks
//! at 24 kHz mono, tagged near (the user) or far (everyone else).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use echo_capture::{CaptureBuilder, ChannelTranscriptionSink};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel(100);
//!
//! let session = CaptureBuilder::new()
//!     .add_sink(ChannelTranscriptionSink::new(tx))
//!     .on_event(|e| tracing::warn!(?e, "capture event"))
//!     .start()
//!     .await?;
//!
//! while let Some(msg) = rx.recv().await {
//!     // msg.channel is Near or Far; msg.payload.data is base64 PCM16
//! }
//!
//! session.stop().await?;
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict thread boundary:
//!
//! - **CPAL threads**: one high-priority audio callback per device that
//!   never blocks
//! - **Ring buffers**: lock-free SPSC queues absorb pressure between the
//!   callbacks and the async side
//! - **Tokio runtime**: one bridge task per path shapes chunks, runs the
//!   canceller, and dispatches fire-and-forget to the sinks
//!
//! Degradation is always graceful: a missing loopback device, a missing
//! native canceller, or a failing sink reduces capability and keeps the
//! microphone flowing.

// unsafe_code lint is configured in Cargo.toml as "deny" to allow the speex module override
#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

pub mod aec;
mod builder;
mod chunk;
mod config;
mod controller;
pub mod device;
mod error;
mod event;
pub mod format;
pub mod pipeline;
mod reference;
mod session;
pub mod source;
mod tokens;
pub mod transport;

pub use aec::{AecEngine, EchoCanceller, MockCanceller};
pub use builder::{BackendFactory, CaptureBuilder};
pub use chunk::AudioChunk;
pub use config::{AecParams, CaptureConfig, DspFlags};
pub use controller::CaptureController;
pub use device::{
    classify_label, detect_virtual_loopback, DeviceClass, DeviceDescriptor, LoopbackDetection,
    LOOPBACK_INSTALL_URL,
};
pub use error::{CaptureError, TransportError};
pub use event::{event_callback, CaptureEvent, EventCallback};
pub use pipeline::ChunkAccumulator;
pub use reference::{ReferenceBuffer, ReferenceEntry};
pub use session::{Session, SessionStats};
pub use source::{AudioDevice, CaptureSource, DeviceConfig, MockSource, SourceId, SourceRole};
pub use tokens::{TokenBudgetTracker, TokenKind};
pub use transport::{
    encode_chunk, AudioPayload, ChannelTranscriptionSink, TranscriptMessage, TranscriptionSink,
    Transport, TransportChannel, PCM16_MIME,
};

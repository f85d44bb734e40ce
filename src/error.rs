//! Error types for echo-capture.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`CaptureError`]): prevent a capture session from starting
//! - **Recoverable conditions**: runtime degradations surfaced via
//!   [`EventCallback`](crate::EventCallback) or [`TransportError`], which is
//!   logged per chunk and never stops the capture loop

/// Fatal errors that prevent a capture session from starting.
///
/// Once a session is running, only explicit `stop()` ends it: secondary
/// source failures, a missing native engine, and transport failures all
/// degrade capability instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The requested audio device was not found.
    #[error("device not found: {name}")]
    DeviceNotFound {
        /// Name or id of the device that wasn't found.
        name: String,
    },

    /// The requested device exists but could not be opened.
    #[error("device unavailable: {name} - {reason}")]
    DeviceUnavailable {
        /// Name of the unavailable device.
        name: String,
        /// Reason the device is unavailable.
        reason: String,
    },

    /// No default input device is configured on this system.
    #[error("no default input device configured")]
    NoDefaultDevice,

    /// Permission to capture the primary microphone was denied.
    ///
    /// This is the only permission failure that aborts session start;
    /// secondary sources degrade instead.
    #[error("microphone permission denied (check OS privacy settings)")]
    PermissionDenied,

    /// The device's sample format is not supported.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// The format that wasn't supported.
        format: String,
    },

    /// The native echo-cancellation engine could not be created.
    ///
    /// Callers that want the bypass degrade path instead of an error should
    /// build the engine with [`AecEngine::bypass`](crate::AecEngine::bypass).
    #[error("native echo canceller unavailable: {reason}")]
    NativeEngineUnavailable {
        /// Why the engine is unavailable.
        reason: String,
    },

    /// No transcription sinks were configured before starting.
    #[error("no transcription sinks configured - add at least one sink")]
    NoSinksConfigured,

    /// An error from the underlying audio library (cpal).
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Errors from a [`TranscriptionSink`](crate::TranscriptionSink).
///
/// Transport errors are recoverable: the dispatcher logs them per chunk and
/// the capture loop continues.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The receiving channel was closed.
    #[error("transcription channel closed")]
    ChannelClosed,

    /// A send to the downstream boundary failed.
    #[error("dispatch failed: {reason}")]
    SendFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The sink was used before initialization.
    #[error("sink not initialized (call on_start first)")]
    NotInitialized,
}

impl TransportError {
    /// Creates a send-failed error with the given reason.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed {
            reason: reason.into(),
        }
    }
}

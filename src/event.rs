//! Runtime events for monitoring capture health.
//!
//! Events are non-fatal notifications about pipeline behavior. Capture
//! continues running after events are emitted - they're for logging,
//! metrics, and orchestrator decisions, not error handling.

use std::sync::Arc;

use crate::source::SourceId;
use crate::transport::TransportChannel;

/// Runtime events emitted during a capture session.
///
/// These are informational, not errors. The session keeps running after
/// every one of them; use the [`EventCallback`] to log them or to let an
/// orchestrator react (e.g. show a "reduced capability" banner).
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A capture source started producing audio.
    SourceStarted {
        /// ID of the source that started.
        source_id: SourceId,
    },

    /// A secondary source could not be acquired and was disabled.
    ///
    /// The session continues with the remaining sources.
    SourceDisabled {
        /// ID of the disabled source.
        source_id: SourceId,
        /// Why the source was disabled.
        reason: String,
    },

    /// The session is running without some capability (no system audio,
    /// no native echo canceller). Capture continues.
    ReducedCapability {
        /// Human-readable description of what is missing.
        detail: String,
    },

    /// A microphone chunk skipped echo cancellation.
    ///
    /// Emitted once per session per distinct reason, not per chunk.
    AecBypassed {
        /// Why the chunk passed through unmodified.
        reason: String,
    },

    /// A transport dispatch failed; the chunk was dropped.
    TransportError {
        /// Logical channel the chunk was headed for.
        channel: TransportChannel,
        /// Description of the error.
        error: String,
    },

    /// The per-source ring buffer dropped audio because the bridge task
    /// couldn't keep up.
    BufferOverflow {
        /// Source whose buffer overflowed.
        source_id: SourceId,
        /// Approximate duration of audio that was dropped.
        dropped_ms: u64,
    },

    /// The token tracker crossed the advisory throttle threshold.
    ///
    /// Purely informational: nothing in the pipeline slows down. An
    /// external orchestrator decides what, if anything, to do.
    ThrottleAdvised {
        /// Tokens counted in the current one-minute window.
        tokens_in_window: u64,
    },
}

/// Callback type for receiving runtime events.
///
/// Register via [`CaptureBuilder::on_event()`](crate::CaptureBuilder::on_event).
///
/// # Example
///
/// ```ignore
/// let controller = CaptureBuilder::new()
///     .on_event(|event| tracing::warn!(?event, "capture event"))
///     // ...
/// ```
pub type EventCallback = Arc<dyn Fn(CaptureEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(CaptureEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_debug() {
        let event = CaptureEvent::ReducedCapability {
            detail: "no system audio".to_string(),
        };
        let debug = format!("{event:?}");
        assert!(debug.contains("ReducedCapability"));
        assert!(debug.contains("no system audio"));
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        callback(CaptureEvent::ThrottleAdvised {
            tokens_in_window: 1000,
        });
        assert!(called.load(Ordering::SeqCst));
    }
}

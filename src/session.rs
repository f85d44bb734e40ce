//! Capture session lifecycle and shared state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::reference::ReferenceBuffer;
use crate::source::CaptureStream;
use crate::transport::Transport;
use crate::CaptureError;

/// Statistics about a capture session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Total chunks produced across both paths.
    pub chunks_processed: u64,
    /// Total samples captured across both paths.
    pub samples_captured: u64,
    /// Microphone chunks that went through echo cancellation.
    pub chunks_cancelled: u64,
    /// Microphone chunks that skipped echo cancellation.
    pub chunks_bypassed: u64,
    /// System-audio chunks suppressed by the silence gate.
    pub chunks_gated: u64,
    /// Failed sink deliveries (chunks dropped at the transport boundary).
    pub transport_errors: u64,
    /// Reference entries evicted because the FIFO was full.
    pub reference_evictions: u64,
}

/// Internal state shared between the session handle and bridge tasks.
pub(crate) struct SessionState {
    pub running: AtomicBool,
    /// Paused sessions keep capturing but stop forwarding to sinks.
    pub paused: AtomicBool,
    pub chunks_processed: AtomicU64,
    pub samples_captured: AtomicU64,
    pub chunks_cancelled: AtomicU64,
    pub chunks_bypassed: AtomicU64,
    pub chunks_gated: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            chunks_processed: AtomicU64::new(0),
            samples_captured: AtomicU64::new(0),
            chunks_cancelled: AtomicU64::new(0),
            chunks_bypassed: AtomicU64::new(0),
            chunks_gated: AtomicU64::new(0),
        }
    }
}

/// Handle to a running capture session.
///
/// Returned by [`CaptureBuilder::start()`]; the bridge tasks run in the
/// background until [`stop()`](Session::stop) is called or the handle is
/// dropped. Prefer explicit `stop()` so trailing audio is drained.
///
/// [`CaptureBuilder::start()`]: crate::CaptureBuilder::start
pub struct Session {
    state: Arc<SessionState>,
    transport: Arc<Transport>,
    reference: Arc<ReferenceBuffer>,
    bridge_handles: Vec<JoinHandle<()>>,
    // Keep the capture streams alive - dropping them stops CPAL
    #[allow(dead_code)]
    streams: Vec<CaptureStream>,
}

impl Session {
    pub(crate) fn new(
        state: Arc<SessionState>,
        transport: Arc<Transport>,
        reference: Arc<ReferenceBuffer>,
        bridge_handles: Vec<JoinHandle<()>>,
        streams: Vec<CaptureStream>,
    ) -> Self {
        Self {
            state,
            transport,
            reference,
            bridge_handles,
            streams,
        }
    }

    /// Returns `true` while the session is capturing.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Returns `true` while forwarding is suspended.
    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    /// Suspends forwarding to sinks. Capture keeps running so resume is
    /// instant and device streams stay warm.
    pub fn pause(&self) {
        self.state.paused.store(true, Ordering::SeqCst);
        tracing::info!("capture paused");
    }

    /// Resumes forwarding after a pause.
    pub fn resume(&self) {
        self.state.paused.store(false, Ordering::SeqCst);
        tracing::info!("capture resumed");
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            chunks_processed: self.state.chunks_processed.load(Ordering::SeqCst),
            samples_captured: self.state.samples_captured.load(Ordering::SeqCst),
            chunks_cancelled: self.state.chunks_cancelled.load(Ordering::SeqCst),
            chunks_bypassed: self.state.chunks_bypassed.load(Ordering::SeqCst),
            chunks_gated: self.state.chunks_gated.load(Ordering::SeqCst),
            transport_errors: self.transport.errors(),
            reference_evictions: self.reference.evictions(),
        }
    }

    /// Gracefully stops the session.
    ///
    /// Stops the device streams, lets the bridges drain remaining audio,
    /// and runs every sink's `on_stop` hook.
    ///
    /// # Errors
    ///
    /// Returns an error if shutdown fails.
    pub async fn stop(mut self) -> Result<(), CaptureError> {
        if !self.state.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let handles: Vec<_> = self.bridge_handles.drain(..).collect();
        futures::future::join_all(handles).await;
        self.transport.stop().await;

        tracing::info!(
            chunks = self.state.chunks_processed.load(Ordering::SeqCst),
            "capture session stopped"
        );
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Dropped without explicit stop() - signal the bridges to exit
        self.state.running.store(false, Ordering::SeqCst);
    }
}

//! Idempotent start/stop/pause control over capture sessions.

use crate::builder::CaptureBuilder;
use crate::session::{Session, SessionStats};
use crate::CaptureError;

/// Drives capture sessions from an orchestrator's point of view.
///
/// The controller owns a reusable builder and at most one live session.
/// `start()` is idempotent: calling it while a session is running is a
/// no-op, so UI double-clicks and retry loops are safe. After `stop()`
/// the controller is fully restartable; each new session gets a fresh
/// token tracker and reference buffer.
///
/// # Example
///
/// ```ignore
/// let mut controller = CaptureController::new(
///     CaptureBuilder::new().add_sink(sink),
/// );
/// controller.start().await?;
/// controller.start().await?; // no-op, already running
/// controller.stop().await?;
/// controller.start().await?; // fresh session
/// ```
pub struct CaptureController {
    builder: CaptureBuilder,
    session: Option<Session>,
}

impl CaptureController {
    /// Creates a controller around a configured builder.
    pub fn new(builder: CaptureBuilder) -> Self {
        Self {
            builder,
            session: None,
        }
    }

    /// Whether a session is currently capturing.
    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_running)
    }

    /// Whether the current session has forwarding suspended.
    pub fn is_paused(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_paused)
    }

    /// Starts a capture session. No-op if one is already running.
    ///
    /// # Errors
    ///
    /// Propagates session startup failures: no sinks, no microphone, or
    /// a failed sink `on_start`.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_running() {
            tracing::info!("capture already running, start ignored");
            return Ok(());
        }

        let session = self.builder.clone().start().await?;
        self.session = Some(session);
        Ok(())
    }

    /// Stops the current session. No-op if none is running.
    ///
    /// # Errors
    ///
    /// Propagates shutdown failures from the session.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        match self.session.take() {
            Some(session) => session.stop().await,
            None => Ok(()),
        }
    }

    /// Suspends forwarding without tearing the session down.
    pub fn pause(&self) {
        if let Some(ref session) = self.session {
            session.pause();
        }
    }

    /// Resumes forwarding after a pause.
    pub fn resume(&self) {
        if let Some(ref session) = self.session {
            session.resume();
        }
    }

    /// Statistics for the current session, if any.
    pub fn stats(&self) -> Option<SessionStats> {
        self.session.as_ref().map(Session::stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_starts_idle() {
        let controller = CaptureController::new(CaptureBuilder::new());
        assert!(!controller.is_running());
        assert!(!controller.is_paused());
        assert!(controller.stats().is_none());
    }

    #[tokio::test]
    async fn test_stop_without_session_is_ok() {
        let mut controller = CaptureController::new(CaptureBuilder::new());
        assert!(controller.stop().await.is_ok());
    }

    #[tokio::test]
    async fn test_start_without_sinks_fails() {
        let mut controller = CaptureController::new(CaptureBuilder::new());
        assert!(matches!(
            controller.start().await,
            Err(CaptureError::NoSinksConfigured)
        ));
        assert!(!controller.is_running());
    }

    #[test]
    fn test_pause_without_session_is_noop() {
        let controller = CaptureController::new(CaptureBuilder::new());
        controller.pause();
        controller.resume();
    }
}

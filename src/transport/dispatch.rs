//! Fire-and-forget payload dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::sink::TranscriptionSink;
use super::{AudioPayload, TransportChannel};
use crate::event::{CaptureEvent, EventCallback};

/// Dispatches encoded payloads to all registered sinks.
///
/// Dispatch is fire-and-forget: each send runs on its own tokio task so a
/// slow or failing sink can never stall the capture loop. Failures are
/// logged, counted, and surfaced through the event callback; the chunk is
/// simply dropped for that sink.
pub struct Transport {
    sinks: Vec<Arc<dyn TranscriptionSink>>,
    event_callback: Option<EventCallback>,
    dispatched: AtomicU64,
    errors: Arc<AtomicU64>,
}

impl Transport {
    /// Creates a dispatcher over the given sinks.
    pub fn new(sinks: Vec<Arc<dyn TranscriptionSink>>, event_callback: Option<EventCallback>) -> Self {
        Self {
            sinks,
            event_callback,
            dispatched: AtomicU64::new(0),
            errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Payloads handed off so far (one per sink per chunk).
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Failed sends so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Runs every sink's `on_start` hook.
    ///
    /// # Errors
    ///
    /// Propagates the first sink failure; startup errors are fatal.
    pub async fn start(&self) -> Result<(), crate::TransportError> {
        for sink in &self.sinks {
            sink.on_start().await?;
            tracing::debug!(sink = sink.name(), "sink started");
        }
        Ok(())
    }

    /// Runs every sink's `on_stop` hook, logging failures.
    pub async fn stop(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.on_stop().await {
                tracing::warn!(sink = sink.name(), error = %e, "sink stop failed");
            }
        }
    }

    /// Hands one payload to every sink without waiting for delivery.
    pub fn dispatch(&self, channel: TransportChannel, payload: AudioPayload) {
        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let payload = payload.clone();
            let errors = Arc::clone(&self.errors);
            let callback = self.event_callback.clone();

            self.dispatched.fetch_add(1, Ordering::Relaxed);
            tokio::spawn(async move {
                if let Err(e) = sink.send(channel, payload).await {
                    errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        sink = sink.name(),
                        ?channel,
                        error = %e,
                        "payload dropped"
                    );
                    if let Some(cb) = callback {
                        cb(CaptureEvent::TransportError {
                            channel,
                            error: e.to_string(),
                        });
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_callback;
    use crate::transport::{encode_chunk, ChannelTranscriptionSink, TranscriptMessage};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_dispatch_reaches_all_sinks() {
        let (tx_a, mut rx_a) = mpsc::channel::<TranscriptMessage>(10);
        let (tx_b, mut rx_b) = mpsc::channel::<TranscriptMessage>(10);
        let transport = Transport::new(
            vec![
                Arc::new(ChannelTranscriptionSink::with_name("a", tx_a)),
                Arc::new(ChannelTranscriptionSink::with_name("b", tx_b)),
            ],
            None,
        );

        transport.dispatch(TransportChannel::Near, encode_chunk(&[0.1; 240]));

        assert_eq!(rx_a.recv().await.unwrap().channel, TransportChannel::Near);
        assert_eq!(rx_b.recv().await.unwrap().channel, TransportChannel::Near);
        assert_eq!(transport.dispatched(), 2);
    }

    #[tokio::test]
    async fn test_failed_sink_counts_and_emits_event() {
        let (tx, rx) = mpsc::channel::<TranscriptMessage>(10);
        drop(rx); // force ChannelClosed on send

        let events = Arc::new(AtomicUsize::new(0));
        let events_clone = Arc::clone(&events);
        let transport = Transport::new(
            vec![Arc::new(ChannelTranscriptionSink::new(tx))],
            Some(event_callback(move |event| {
                if matches!(event, CaptureEvent::TransportError { .. }) {
                    events_clone.fetch_add(1, Ordering::SeqCst);
                }
            })),
        );

        transport.dispatch(TransportChannel::Far, encode_chunk(&[0.0; 240]));

        // Give the spawned send task a chance to run
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(transport.errors(), 1);
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_never_blocks_on_full_sink() {
        let (tx, _rx) = mpsc::channel::<TranscriptMessage>(1);
        let transport = Transport::new(vec![Arc::new(ChannelTranscriptionSink::new(tx))], None);

        // Far more payloads than the sink channel can hold; dispatch must
        // return immediately every time
        for _ in 0..100 {
            transport.dispatch(TransportChannel::Near, encode_chunk(&[0.0; 10]));
        }
        assert_eq!(transport.dispatched(), 100);
    }
}

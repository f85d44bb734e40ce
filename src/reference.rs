//! System-audio reference buffer.
//!
//! A bounded FIFO of recently captured system-output chunks. The
//! microphone path reads the single most recent entry as the far/echo
//! signal for whatever chunk it is currently cancelling. This is a
//! deliberate best-effort temporal alignment between two independently
//! clocked capture paths, not sample-accurate synchronization.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One system-audio chunk as seen by the echo canceller.
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    /// Session-relative timestamp of the chunk.
    pub timestamp: Duration,
    /// Base64-encoded PCM16 payload, as shipped on the far channel.
    pub payload: String,
}

/// Bounded FIFO of recent system-audio chunks.
///
/// The producer (system-audio bridge) appends; overflow evicts the oldest
/// entry. The consumer (microphone bridge) only ever reads the latest
/// entry. The two run on independent tasks, so the queue is mutex-guarded.
pub struct ReferenceBuffer {
    entries: Mutex<VecDeque<ReferenceEntry>>,
    capacity: usize,
    evictions: Mutex<u64>,
}

impl ReferenceBuffer {
    /// Creates a buffer holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            evictions: Mutex::new(0),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&self, entry: ReferenceEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() >= self.capacity {
            entries.pop_front();
            let mut evictions = self.evictions.lock().unwrap_or_else(|e| e.into_inner());
            *evictions += 1;
        }
        entries.push_back(entry);
    }

    /// Returns a clone of the most recent entry, if any.
    pub fn latest(&self) -> Option<ReferenceEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.back().cloned()
    }

    /// Number of entries currently buffered.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Returns `true` if no reference audio has arrived yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total entries evicted since creation.
    pub fn evictions(&self) -> u64 {
        *self.evictions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drops all buffered entries.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: u64) -> ReferenceEntry {
        ReferenceEntry {
            timestamp: Duration::from_millis(n * 100),
            payload: format!("payload-{n}"),
        }
    }

    #[test]
    fn test_push_and_latest() {
        let buffer = ReferenceBuffer::new(10);
        assert!(buffer.latest().is_none());

        buffer.push(entry(0));
        buffer.push(entry(1));

        let latest = buffer.latest().unwrap();
        assert_eq!(latest.payload, "payload-1");
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_never_exceeds_capacity_under_burst() {
        let buffer = ReferenceBuffer::new(10);
        for n in 0..1000 {
            buffer.push(entry(n));
            assert!(buffer.len() <= 10);
        }
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.evictions(), 990);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let buffer = ReferenceBuffer::new(3);
        for n in 0..5 {
            buffer.push(entry(n));
        }
        // 0 and 1 evicted; 4 is the latest
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.latest().unwrap().payload, "payload-4");

        let entries = buffer.entries.lock().unwrap();
        assert_eq!(entries.front().unwrap().payload, "payload-2");
    }

    #[test]
    fn test_clear() {
        let buffer = ReferenceBuffer::new(10);
        buffer.push(entry(0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let buffer = ReferenceBuffer::new(0);
        buffer.push(entry(0));
        assert_eq!(buffer.len(), 1);
    }
}

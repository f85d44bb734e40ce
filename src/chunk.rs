//! Audio data chunk with metadata.

use std::sync::Arc;
use std::time::Duration;

use crate::source::SourceId;

/// A discrete buffer of audio samples with associated metadata.
///
/// `AudioChunk` is the fundamental unit of audio data passed through the
/// pipeline: 100 ms of 24 kHz mono float samples (2,400 samples) in the
/// default configuration. Chunks are sliced off the accumulation buffer,
/// optionally echo-cancelled, then encoded for transport.
///
/// Samples are stored in an `Arc<Vec<f32>>` so the chunk can be shared
/// between the echo canceller, the reference buffer, and transport without
/// copying.
///
/// # Example
///
/// ```
/// use echo_capture::AudioChunk;
/// use std::time::Duration;
///
/// let chunk = AudioChunk::new(vec![0.0f32; 2400], Duration::ZERO, 24000);
/// assert_eq!(chunk.duration(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Normalized float samples in [-1.0, 1.0], mono.
    ///
    /// Wrapped in `Arc` for zero-copy sharing.
    pub samples: Arc<Vec<f32>>,

    /// Timestamp from the start of the capture session.
    pub timestamp: Duration,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Source identifier for multi-source capture.
    ///
    /// `None` for synthesized chunks (tests, reference decode).
    pub source_id: Option<SourceId>,
}

impl AudioChunk {
    /// Creates a new `AudioChunk` without a source identifier.
    pub fn new(samples: Vec<f32>, timestamp: Duration, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            timestamp,
            sample_rate,
            source_id: None,
        }
    }

    /// Creates a new `AudioChunk` tagged with the device that produced it.
    pub fn with_source(
        samples: Vec<f32>,
        timestamp: Duration,
        sample_rate: u32,
        source_id: SourceId,
    ) -> Self {
        Self {
            samples: Arc::new(samples),
            timestamp,
            sample_rate,
            source_id: Some(source_id),
        }
    }

    /// Returns the duration of this audio chunk.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Returns the root-mean-square level of the chunk.
    pub fn rms(&self) -> f32 {
        crate::format::rms(&self.samples)
    }

    /// Returns `true` if the chunk's RMS level exceeds `threshold`.
    ///
    /// The system-audio path uses this to avoid shipping silence.
    pub fn is_active(&self, threshold: f32) -> bool {
        crate::format::is_voice_active(&self.samples, threshold)
    }

    /// Returns `true` if this chunk contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_100ms_at_24khz() {
        let chunk = AudioChunk::new(vec![0.0; 2400], Duration::ZERO, 24000);
        assert_eq!(chunk.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_sample_rate() {
        let chunk = AudioChunk::new(vec![0.0; 100], Duration::ZERO, 0);
        assert_eq!(chunk.duration(), Duration::ZERO);
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = AudioChunk::new(vec![], Duration::ZERO, 24000);
        assert!(chunk.is_empty());
        assert_eq!(chunk.duration(), Duration::ZERO);
        assert!(!chunk.is_active(0.005));
    }

    #[test]
    fn test_silence_is_inactive() {
        let chunk = AudioChunk::new(vec![0.0; 2400], Duration::ZERO, 24000);
        assert!(!chunk.is_active(0.005));
        assert_eq!(chunk.rms(), 0.0);
    }

    #[test]
    fn test_with_source() {
        let chunk = AudioChunk::with_source(
            vec![0.0; 2400],
            Duration::ZERO,
            24000,
            SourceId::new("mic"),
        );
        assert_eq!(chunk.source_id.as_ref().map(SourceId::as_str), Some("mic"));
    }
}

//! Bridge tasks - read from ring buffers, shape chunks, feed the transport.
//!
//! Each capture path runs one bridge on the tokio runtime:
//! - the microphone bridge cancels echo against the system-audio
//!   reference and dispatches on the near channel
//! - the system bridge gates silence, publishes the reference, and
//!   dispatches on the far channel

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ringbuf::traits::Consumer;

use crate::aec::AecEngine;
use crate::chunk::AudioChunk;
use crate::config::CaptureConfig;
use crate::event::{CaptureEvent, EventCallback};
use crate::format::{resample, stereo_to_mono};
use crate::pipeline::ChunkAccumulator;
use crate::reference::{ReferenceBuffer, ReferenceEntry};
use crate::session::SessionState;
use crate::source::SourceId;
use crate::tokens::TokenBudgetTracker;
use crate::transport::{decode_payload, encode_chunk, Transport, TransportChannel};

/// Device-side format for one bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Sample rate the device actually captures at.
    pub device_sample_rate: u32,
    /// Channel count the device actually captures.
    pub device_channels: u16,
    /// Identifier stamped on every chunk from this bridge.
    pub source_id: SourceId,
    /// Pipeline-wide settings (target rate, chunk duration, gates).
    pub capture: CaptureConfig,
}

/// Reads raw samples off a ring buffer and yields pipeline-format chunks.
///
/// Downmixes to mono, accumulates to exact device-rate chunk boundaries,
/// and resamples each chunk to the target rate. The remainder below one
/// chunk is carried forward so nothing is lost between polls.
pub struct ChunkProducer {
    ring: ringbuf::HeapCons<f32>,
    accumulator: ChunkAccumulator,
    device_sample_rate: u32,
    device_channels: u16,
    target_sample_rate: u32,
    source_id: SourceId,
    chunk_duration: Duration,
    timestamp: Duration,
    scratch: Vec<f32>,
}

impl ChunkProducer {
    /// Creates a producer over a device ring buffer.
    pub fn new(ring: ringbuf::HeapCons<f32>, config: &BridgeConfig) -> Self {
        // Accumulate in device format; one device chunk resamples to one
        // pipeline chunk
        let device_chunk_samples = (f64::from(config.device_sample_rate)
            * config.capture.chunk_duration.as_secs_f64())
            as usize;

        Self {
            ring,
            accumulator: ChunkAccumulator::new(device_chunk_samples.max(1)),
            device_sample_rate: config.device_sample_rate,
            device_channels: config.device_channels,
            target_sample_rate: config.capture.sample_rate,
            source_id: config.source_id.clone(),
            chunk_duration: config.capture.chunk_duration,
            timestamp: Duration::ZERO,
            scratch: vec![0.0; 4096],
        }
    }

    /// Drains the ring buffer and returns any complete chunks.
    pub fn poll(&mut self) -> Vec<AudioChunk> {
        loop {
            let n = self.ring.pop_slice(&mut self.scratch);
            if n == 0 {
                break;
            }
            let mono = self.to_mono(&self.scratch[..n].to_vec());
            self.accumulator.push(&mono);
        }

        let mut chunks = Vec::new();
        while let Some(device_chunk) = self.accumulator.pop_chunk() {
            chunks.push(self.finish_chunk(device_chunk));
        }
        chunks
    }

    /// Takes whatever is left as a final short chunk, if anything.
    pub fn drain(&mut self) -> Option<AudioChunk> {
        let _ = self.poll();
        let remainder = self.accumulator.take_remainder();
        if remainder.is_empty() {
            return None;
        }
        Some(self.finish_chunk(remainder))
    }

    fn to_mono(&self, samples: &[f32]) -> Vec<f32> {
        match self.device_channels {
            0 | 1 => samples.to_vec(),
            2 => stereo_to_mono(samples),
            n => samples
                .chunks(n as usize)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect(),
        }
    }

    fn finish_chunk(&mut self, device_samples: Vec<f32>) -> AudioChunk {
        let samples = resample(
            &device_samples,
            self.device_sample_rate,
            self.target_sample_rate,
        );
        let chunk = AudioChunk::with_source(
            samples,
            self.timestamp,
            self.target_sample_rate,
            self.source_id.clone(),
        );
        self.timestamp += self.chunk_duration;
        chunk
    }
}

/// Microphone path: echo cancellation, encode, dispatch near.
pub struct MicBridge {
    producer: ChunkProducer,
    engine: AecEngine,
    reference: Arc<ReferenceBuffer>,
    transport: Arc<Transport>,
    state: Arc<SessionState>,
    event_callback: Option<EventCallback>,
    tokens: Arc<Mutex<TokenBudgetTracker>>,
    token_budget: u64,
    throttle_percent: u8,
    poll_interval: Duration,
    bypass_reasons_seen: HashSet<&'static str>,
    throttle_advised: bool,
}

impl MicBridge {
    /// Creates the microphone bridge.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ring: ringbuf::HeapCons<f32>,
        config: &BridgeConfig,
        engine: AecEngine,
        reference: Arc<ReferenceBuffer>,
        transport: Arc<Transport>,
        state: Arc<SessionState>,
        tokens: Arc<Mutex<TokenBudgetTracker>>,
        event_callback: Option<EventCallback>,
    ) -> Self {
        tracing::info!(
            source = %config.source_id,
            device_rate = config.device_sample_rate,
            device_channels = config.device_channels,
            backend = engine.backend_name(),
            "mic bridge created"
        );

        // Poll at half the chunk duration for responsiveness
        let poll_interval = config.capture.chunk_duration / 2;

        Self {
            producer: ChunkProducer::new(ring, config),
            engine,
            reference,
            transport,
            state,
            event_callback,
            tokens,
            token_budget: config.capture.token_budget,
            throttle_percent: config.capture.throttle_percent,
            poll_interval,
            bypass_reasons_seen: HashSet::new(),
            throttle_advised: false,
        }
    }

    /// Runs until the session stops, then drains trailing audio.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.poll_interval);

        while self.state.running.load(Ordering::SeqCst) {
            interval.tick().await;
            for chunk in self.producer.poll() {
                self.process_chunk(&chunk);
            }
        }

        if let Some(chunk) = self.producer.drain() {
            self.process_chunk(&chunk);
        }
    }

    fn process_chunk(&mut self, chunk: &AudioChunk) {
        let far = self
            .reference
            .latest()
            .and_then(|entry| decode_payload(&entry.payload).ok());

        if self.engine.is_bypassed() {
            self.note_bypass("no native echo canceller");
        } else if far.is_none() {
            self.note_bypass("no system-audio reference");
        }

        let before = self.engine.frames_processed();
        let out = self.engine.process(&chunk.samples, far.as_deref());
        if self.engine.frames_processed() > before {
            self.state.chunks_cancelled.fetch_add(1, Ordering::SeqCst);
        } else {
            self.state.chunks_bypassed.fetch_add(1, Ordering::SeqCst);
        }

        let payload = encode_chunk(&out);
        self.track_tokens();
        self.update_stats(chunk);

        if !self.state.paused.load(Ordering::SeqCst) {
            self.transport.dispatch(TransportChannel::Near, payload);
        }
    }

    /// Emits the bypass event once per distinct reason, not per chunk.
    fn note_bypass(&mut self, reason: &'static str) {
        if !self.bypass_reasons_seen.insert(reason) {
            return;
        }
        tracing::warn!(reason, "echo cancellation bypassed");
        if let Some(ref callback) = self.event_callback {
            callback(CaptureEvent::AecBypassed {
                reason: reason.to_string(),
            });
        }
    }

    fn track_tokens(&mut self) {
        let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        tokens.track_audio_tokens();
        if !self.throttle_advised && tokens.should_throttle(self.token_budget, self.throttle_percent)
        {
            self.throttle_advised = true;
            let tokens_in_window = tokens.tokens_in_window();
            tracing::warn!(tokens_in_window, "token budget threshold crossed");
            if let Some(ref callback) = self.event_callback {
                callback(CaptureEvent::ThrottleAdvised { tokens_in_window });
            }
        }
    }

    fn update_stats(&self, chunk: &AudioChunk) {
        self.state
            .samples_captured
            .fetch_add(chunk.samples.len() as u64, Ordering::SeqCst);
        let chunks = self.state.chunks_processed.fetch_add(1, Ordering::SeqCst);
        if chunks % 50 == 0 {
            tracing::debug!(
                chunk = chunks,
                samples = chunk.samples.len(),
                ts = ?chunk.timestamp,
                "mic bridge progress"
            );
        }
    }
}

/// System-audio path: silence gate, reference publish, dispatch far.
pub struct SystemBridge {
    producer: ChunkProducer,
    gate_threshold: f32,
    reference: Arc<ReferenceBuffer>,
    transport: Arc<Transport>,
    state: Arc<SessionState>,
    poll_interval: Duration,
}

impl SystemBridge {
    /// Creates the system-audio bridge.
    ///
    /// `gate_threshold` is the RMS floor below which chunks are treated
    /// as silence; virtual-loopback devices get the lower threshold.
    pub fn new(
        ring: ringbuf::HeapCons<f32>,
        config: &BridgeConfig,
        gate_threshold: f32,
        reference: Arc<ReferenceBuffer>,
        transport: Arc<Transport>,
        state: Arc<SessionState>,
    ) -> Self {
        tracing::info!(
            source = %config.source_id,
            device_rate = config.device_sample_rate,
            gate = gate_threshold,
            "system bridge created"
        );

        let poll_interval = config.capture.chunk_duration / 2;

        Self {
            producer: ChunkProducer::new(ring, config),
            gate_threshold,
            reference,
            transport,
            state,
            poll_interval,
        }
    }

    /// Runs until the session stops, then drains trailing audio.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.poll_interval);

        while self.state.running.load(Ordering::SeqCst) {
            interval.tick().await;
            for chunk in self.producer.poll() {
                self.process_chunk(&chunk);
            }
        }

        if let Some(chunk) = self.producer.drain() {
            self.process_chunk(&chunk);
        }
    }

    fn process_chunk(&mut self, chunk: &AudioChunk) {
        self.state
            .samples_captured
            .fetch_add(chunk.samples.len() as u64, Ordering::SeqCst);
        let chunks = self.state.chunks_processed.fetch_add(1, Ordering::SeqCst);
        if chunks % 50 == 0 {
            tracing::debug!(chunk = chunks, ts = ?chunk.timestamp, "system bridge progress");
        }

        // Silence never reaches the reference buffer or the far channel
        if !chunk.is_active(self.gate_threshold) {
            self.state.chunks_gated.fetch_add(1, Ordering::SeqCst);
            return;
        }

        let payload = encode_chunk(&chunk.samples);
        self.reference.push(ReferenceEntry {
            timestamp: chunk.timestamp,
            payload: payload.data.clone(),
        });

        if !self.state.paused.load(Ordering::SeqCst) {
            self.transport.dispatch(TransportChannel::Far, payload);
        }
    }
}

/// Spawns the microphone bridge as a background task.
pub fn spawn_mic_bridge(bridge: MicBridge) -> tokio::task::JoinHandle<()> {
    tokio::spawn(bridge.run())
}

/// Spawns the system-audio bridge as a background task.
pub fn spawn_system_bridge(bridge: SystemBridge) -> tokio::task::JoinHandle<()> {
    tokio::spawn(bridge.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;

    fn bridge_config(device_rate: u32, channels: u16) -> BridgeConfig {
        BridgeConfig {
            device_sample_rate: device_rate,
            device_channels: channels,
            source_id: SourceId::new("mic"),
            capture: CaptureConfig::default(),
        }
    }

    #[test]
    fn test_producer_yields_exact_chunks() {
        let mut mock = MockSource::transcription();
        mock.generate_sine(440.0, 250, 0.5); // 2.5 chunks worth

        let config = bridge_config(24_000, 1);
        let mut producer = ChunkProducer::new(mock.into_ring_buffer(), &config);

        let chunks = producer.poll();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.samples.len() == 2400));
        assert_eq!(chunks[0].timestamp, Duration::ZERO);
        assert_eq!(chunks[1].timestamp, Duration::from_millis(100));
    }

    #[test]
    fn test_producer_drains_remainder() {
        let mut mock = MockSource::transcription();
        mock.generate_sine(440.0, 250, 0.5);

        let config = bridge_config(24_000, 1);
        let mut producer = ChunkProducer::new(mock.into_ring_buffer(), &config);

        let _ = producer.poll();
        let tail = producer.drain().unwrap();
        assert_eq!(tail.samples.len(), 1200); // the half chunk
        assert!(producer.drain().is_none());
    }

    #[test]
    fn test_producer_resamples_to_target_rate() {
        let mut mock = MockSource::new(48_000, 1);
        mock.generate_sine(440.0, 100, 0.5);

        let config = bridge_config(48_000, 1);
        let mut producer = ChunkProducer::new(mock.into_ring_buffer(), &config);

        let chunks = producer.poll();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].sample_rate, 24_000);
        // 4800 device samples at 48kHz resample to ~2400 at 24kHz
        let len = chunks[0].samples.len();
        assert!((2395..=2405).contains(&len), "unexpected length {len}");
    }

    #[test]
    fn test_producer_downmixes_stereo() {
        let mut mock = MockSource::new(24_000, 2);
        mock.generate_sine(440.0, 100, 0.5);

        let config = bridge_config(24_000, 2);
        let mut producer = ChunkProducer::new(mock.into_ring_buffer(), &config);

        // 4800 interleaved samples downmix to 2400 mono, one full chunk
        let chunks = producer.poll();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].samples.len(), 2400);
    }
}

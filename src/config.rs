//! Configuration types for the capture pipeline.

use std::time::Duration;

/// Parameters for the native echo-cancellation engine.
///
/// These are fixed at engine creation and reused for every chunk the
/// engine processes. The defaults match the transcription ingestion
/// contract: 160-sample frames, a 1,600-sample echo tail, 24 kHz mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AecParams {
    /// Samples per native cancellation call.
    pub frame_size: usize,
    /// Echo tail length in samples (filter length for the canceller).
    pub tail_length: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (the pipeline is mono end to end).
    pub channels: u16,
}

impl Default for AecParams {
    fn default() -> Self {
        Self {
            frame_size: 160,
            tail_length: 1600,
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

/// Host-level DSP flags requested when opening an input stream.
///
/// cpal cannot toggle these on every backend; they are recorded on the
/// source and logged so backends that do honor them (or a future host
/// boundary that does) apply the right set. Loopback/reference capture
/// must run with everything disabled so the far signal stays untouched;
/// a standalone microphone with no echo reference gets the OS DSP instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DspFlags {
    /// OS-level acoustic echo cancellation.
    pub echo_cancellation: bool,
    /// OS-level noise suppression.
    pub noise_suppression: bool,
    /// OS-level automatic gain control.
    pub auto_gain_control: bool,
}

impl DspFlags {
    /// All DSP disabled, required for loopback/reference capture.
    pub const fn disabled() -> Self {
        Self {
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
        }
    }

    /// All DSP enabled, the standalone-microphone fallback.
    pub const fn standalone_mic() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Configuration for capture behavior.
///
/// Use [`CaptureConfig::default()`] for the transcription-ready defaults,
/// or customize as needed.
///
/// # Example
///
/// ```
/// use echo_capture::CaptureConfig;
/// use std::time::Duration;
///
/// let config = CaptureConfig {
///     chunk_duration: Duration::from_millis(50),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate for the whole pipeline.
    ///
    /// Default: 24 kHz (the transcription ingestion rate).
    pub sample_rate: u32,

    /// Duration of each transport chunk.
    ///
    /// Default: 100 ms (2,400 samples at 24 kHz).
    pub chunk_duration: Duration,

    /// RMS threshold below which a system-audio chunk is considered silence
    /// and not forwarded. Default: 0.005.
    pub silence_gate: f32,

    /// RMS threshold for the virtual-loopback device path, which tends to
    /// carry a lower noise floor. Default: 0.003.
    pub virtual_device_gate: f32,

    /// Capacity of the system-audio reference FIFO. Default: 10 entries
    /// (one second of reference audio at 100 ms chunks).
    pub reference_capacity: usize,

    /// Size of the per-source ring buffer between the audio callback and
    /// the bridge task. Default: 30 seconds.
    pub ring_buffer_duration: Duration,

    /// Native engine parameters.
    pub aec: AecParams,

    /// Advisory token budget per one-minute window. Default: 1,000,000.
    pub token_budget: u64,

    /// Percent of the budget at which a throttle advisory is emitted.
    /// Default: 75.
    pub throttle_percent: u8,
}

impl CaptureConfig {
    /// Samples per chunk at the configured rate and duration.
    pub fn samples_per_chunk(&self) -> usize {
        (f64::from(self.sample_rate) * self.chunk_duration.as_secs_f64()) as usize
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            chunk_duration: Duration::from_millis(100),
            silence_gate: 0.005,
            virtual_device_gate: 0.003,
            reference_capacity: 10,
            ring_buffer_duration: Duration::from_secs(30),
            aec: AecParams::default(),
            token_budget: 1_000_000,
            throttle_percent: 75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.chunk_duration, Duration::from_millis(100));
        assert_eq!(config.samples_per_chunk(), 2400);
        assert_eq!(config.reference_capacity, 10);
    }

    #[test]
    fn test_aec_params_default() {
        let params = AecParams::default();
        assert_eq!(params.frame_size, 160);
        assert_eq!(params.tail_length, 1600);
        assert_eq!(params.sample_rate, 24_000);
        assert_eq!(params.channels, 1);
        // A default chunk divides evenly into frames
        assert_eq!(CaptureConfig::default().samples_per_chunk() % params.frame_size, 0);
    }

    #[test]
    fn test_dsp_flag_presets() {
        let loopback = DspFlags::disabled();
        assert!(!loopback.echo_cancellation);
        assert!(!loopback.noise_suppression);
        assert!(!loopback.auto_gain_control);

        let mic = DspFlags::standalone_mic();
        assert!(mic.echo_cancellation);
        assert!(mic.noise_suppression);
        assert!(mic.auto_gain_control);
    }
}

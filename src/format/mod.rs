//! Audio format conversion utilities.
//!
//! This module provides utilities for converting between audio formats:
//! - PCM sample format conversion (f32 ↔ i16)
//! - Channel downmix (stereo → mono)
//! - Sample rate conversion (resampling)
//! - Signal level measurement (RMS)

mod convert;
mod resample;

pub use convert::{f32_slice_to_i16, f32_to_i16, i16_slice_to_f32, i16_to_f32, stereo_to_mono};
pub use resample::resample;

/// Computes the root-mean-square level of a float sample buffer.
///
/// Returns 0.0 for an empty buffer.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Returns `true` if the buffer's RMS level exceeds `threshold`.
///
/// Used to gate silent chunks off auxiliary transport paths. An empty
/// buffer is never active.
pub fn is_voice_active(samples: &[f32], threshold: f32) -> bool {
    rms(samples) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_empty() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_constant_signal() {
        let samples = vec![0.5f32; 1000];
        assert!((rms(&samples) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_voice_active_silence() {
        let silence = vec![0.0f32; 2400];
        assert!(!is_voice_active(&silence, 0.005));
    }

    #[test]
    fn test_voice_active_speech_level() {
        // A 0.1-amplitude sine has RMS ~0.0707, well above the gate
        let samples: Vec<f32> = (0..2400).map(|i| 0.1 * (i as f32 * 0.05).sin()).collect();
        assert!(is_voice_active(&samples, 0.005));
    }

    #[test]
    fn test_voice_active_empty_is_inactive() {
        assert!(!is_voice_active(&[], 0.005));
    }
}

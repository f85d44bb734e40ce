//! Sample format and channel conversion.

/// Converts an f32 sample in [-1.0, 1.0] to i16.
///
/// Scales symmetrically by 32768 with the top clamped to `i16::MAX`, so
/// -1.0 maps exactly to `i16::MIN` and 1.0 to `i16::MAX` without overflow.
/// Values outside [-1.0, 1.0] are clamped first.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    (s * 32768.0).min(32767.0) as i16
}

/// Converts an i16 sample to f32.
///
/// Output is in [-1.0, 1.0); the divisor 32768 matches the encode scale
/// of [`f32_to_i16`] so the round trip error stays within 1/32768.
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Batch converts f32 samples to i16 PCM.
pub fn f32_slice_to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| f32_to_i16(s)).collect()
}

/// Batch converts i16 PCM samples to f32.
pub fn i16_slice_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| i16_to_f32(s)).collect()
}

/// Converts interleaved stereo f32 samples to mono by averaging channels.
///
/// A trailing unpaired sample is dropped.
pub fn stereo_to_mono(stereo: &[f32]) -> Vec<f32> {
    stereo
        .chunks_exact(2)
        .map(|pair| (pair[0] + pair[1]) * 0.5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_extremes() {
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32768);
        assert_eq!(f32_to_i16(0.0), 0);
    }

    #[test]
    fn test_f32_to_i16_clamping() {
        assert_eq!(f32_to_i16(2.0), 32767);
        assert_eq!(f32_to_i16(-2.0), -32768);
    }

    #[test]
    fn test_i16_to_f32_range() {
        assert_eq!(i16_to_f32(-32768), -1.0);
        assert!((i16_to_f32(32767) - 0.99997).abs() < 0.001);
        assert_eq!(i16_to_f32(0), 0.0);
    }

    #[test]
    fn test_roundtrip_error_bound() {
        // |x - roundtrip(x)| <= 1/32768 across the full range
        let bound = 1.0 / 32768.0;
        for i in -1000..=1000 {
            let x = i as f32 / 1000.0;
            let back = i16_to_f32(f32_to_i16(x));
            assert!(
                (x - back).abs() <= bound,
                "roundtrip error too large at {x}: {back}"
            );
        }
    }

    #[test]
    fn test_roundtrip_upper_positive_range() {
        // Positive samples near full scale stay within the quantization
        // step; an asymmetric positive scale would double the error here
        let bound = 1.0 / 32768.0;
        for &x in &[0.5f32, 0.75, 0.97, 0.999] {
            let back = i16_to_f32(f32_to_i16(x));
            assert!(
                (x - back).abs() <= bound,
                "roundtrip error too large at {x}: {back}"
            );
        }
    }

    #[test]
    fn test_roundtrip_i16_exact_negatives() {
        for &original in &[0i16, 1000, -1000, -32768] {
            let back = f32_to_i16(i16_to_f32(original));
            assert_eq!(original, back);
        }
    }

    #[test]
    fn test_stereo_to_mono() {
        let stereo = vec![0.2f32, 0.4, -0.6, -0.2];
        let mono = stereo_to_mono(&stereo);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_stereo_to_mono_cancellation() {
        let stereo = vec![0.5f32, -0.5];
        let mono = stereo_to_mono(&stereo);
        assert_eq!(mono, vec![0.0]);
    }

    #[test]
    fn test_batch_conversion() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0];
        let pcm = f32_slice_to_i16(&samples);
        assert_eq!(pcm[0], 0);
        assert_eq!(pcm[1], 16384);
        assert_eq!(pcm[2], -16384);
        assert_eq!(pcm[3], 32767);
    }
}

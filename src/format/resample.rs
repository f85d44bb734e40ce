//! Sample rate conversion.
//!
//! Basic resampling using linear interpolation. Adequate for speech headed
//! to a transcription service; use a dedicated resampling crate if fidelity
//! matters more than latency.

/// Resamples mono f32 audio from one sample rate to another.
///
/// Returns the input unchanged when the rates match or the input is empty.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < samples.len() {
            let s1 = f64::from(samples[src_idx]);
            let s2 = f64::from(samples[src_idx + 1]);
            (s1 + (s2 - s1) * frac) as f32
        } else if src_idx < samples.len() {
            samples[src_idx]
        } else {
            *samples.last().unwrap_or(&0.0)
        };

        output.push(sample);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![0.1f32, 0.2, 0.3];
        assert_eq!(resample(&samples, 24000, 24000), samples);
    }

    #[test]
    fn test_resample_empty() {
        let samples: Vec<f32> = vec![];
        assert!(resample(&samples, 48000, 24000).is_empty());
    }

    #[test]
    fn test_resample_downsample_length() {
        // 48kHz -> 24kHz halves the sample count
        let samples: Vec<f32> = (0..480).map(|i| i as f32 / 480.0).collect();
        let out = resample(&samples, 48000, 24000);
        assert_eq!(out.len(), 240);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let samples = vec![0.0f32, 1.0];
        let out = resample(&samples, 1, 2);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert!(out[1] > 0.0 && out[1] < 1.0);
    }

    #[test]
    fn test_resample_boundary_samples_preserved() {
        let samples = vec![0.0f32, 0.1, 0.2, 0.3];
        let out = resample(&samples, 1, 2);
        assert_eq!(out[0], 0.0);
        assert!((out[2] - 0.1).abs() < 1e-6);
        assert!((out[4] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_resample_single_sample() {
        let out = resample(&[0.5f32], 1, 10);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }
}

//! Deterministic echo canceller for tests.

use super::backend::EchoCanceller;

/// A toy canceller that subtracts an attenuated copy of the reference.
///
/// `out = near - far / 2`, saturating. When the microphone picks up an
/// exact copy of the system audio, the output drops to half amplitude;
/// with no reference, input passes through unchanged. That is enough to
/// verify the engine's framing, alignment, and arena accounting in tests
/// without linking a real DSP library.
pub struct MockCanceller {
    frame_size: usize,
}

impl MockCanceller {
    /// Creates a mock canceller for the given frame size.
    pub fn new(frame_size: usize) -> Self {
        Self { frame_size }
    }
}

impl EchoCanceller for MockCanceller {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn cancel_frame(&mut self, near: &[i16], far: &[i16], out: &mut [i16]) {
        for i in 0..out.len() {
            let n = i32::from(near.get(i).copied().unwrap_or(0));
            let f = i32::from(far.get(i).copied().unwrap_or(0));
            out[i] = (n - f / 2).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_halves_identical_signal() {
        let mut canceller = MockCanceller::new(4);
        let near = [1000i16, -1000, 2000, -2000];
        let far = near;
        let mut out = [0i16; 4];

        canceller.cancel_frame(&near, &far, &mut out);
        assert_eq!(out, [500, -500, 1000, -1000]);
    }

    #[test]
    fn test_mock_passes_through_on_silent_reference() {
        let mut canceller = MockCanceller::new(4);
        let near = [100i16, 200, 300, 400];
        let far = [0i16; 4];
        let mut out = [0i16; 4];

        canceller.cancel_frame(&near, &far, &mut out);
        assert_eq!(out, near);
    }
}

//! Echo canceller backend trait.

/// A frame-oriented acoustic echo canceller.
///
/// Backends consume fixed-size PCM16 frames: `near` is the microphone
/// signal, `far` the system-audio reference, and `out` receives the
/// echo-reduced result. All three slices have the same length, the frame
/// size the backend was created with.
///
/// Backends are stateful (the adaptive filter carries history across
/// frames) and are owned by a single engine, so `&mut self` is enough.
pub trait EchoCanceller: Send {
    /// Number of samples per frame this backend expects.
    fn frame_size(&self) -> usize;

    /// Cancels echo for one frame.
    ///
    /// Implementations must not panic on in-range input; a backend that
    /// cannot process a frame should pass `near` through to `out`.
    fn cancel_frame(&mut self, near: &[i16], far: &[i16], out: &mut [i16]);

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

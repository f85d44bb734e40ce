//! Acoustic echo cancellation.
//!
//! The engine consumes microphone chunks plus a system-audio reference
//! and produces echo-reduced chunks of the same length. The actual DSP
//! lives behind the [`EchoCanceller`] trait: the `speex-aec` feature
//! provides a native speexdsp backend, [`MockCanceller`] provides a
//! deterministic one for tests, and an engine with no backend at all is
//! the bypass degrade path.

mod backend;
mod engine;
mod mock;
mod scratch;
#[cfg(feature = "speex-aec")]
mod speex;

pub use backend::EchoCanceller;
pub use engine::AecEngine;
pub use mock::MockCanceller;
pub use scratch::{Frame, FrameArena};
#[cfg(feature = "speex-aec")]
pub use speex::SpeexCanceller;

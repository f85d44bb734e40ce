//! Chunk-level echo cancellation engine.

use super::backend::EchoCanceller;
use super::scratch::FrameArena;
use crate::config::AecParams;
use crate::format::{f32_slice_to_i16, i16_slice_to_f32};
use crate::CaptureError;

/// Echo cancellation engine for microphone chunks.
///
/// Wraps a frame-oriented [`EchoCanceller`] backend and handles the
/// chunk-to-frame plumbing: the far reference is aligned to the near
/// chunk's length, full frames go through the backend via per-call
/// scratch buffers, and any trailing partial frame passes through
/// unprocessed.
///
/// An engine without a backend is in **bypass**: `process()` returns the
/// input unchanged. This is the degrade path when no native canceller is
/// available, and capture continues at full fidelity minus echo removal.
pub struct AecEngine {
    backend: Option<Box<dyn EchoCanceller>>,
    arena: FrameArena,
    params: AecParams,
    frames_processed: u64,
    chunks_bypassed: u64,
}

impl AecEngine {
    /// Creates an engine backed by the native speexdsp canceller.
    ///
    /// # Errors
    ///
    /// Returns `NativeEngineUnavailable` when the crate was built without
    /// the `speex-aec` feature or the native state cannot be allocated.
    /// Callers wanting graceful degradation should fall back to
    /// [`bypass`](Self::bypass) and surface a reduced-capability event.
    pub fn new(params: AecParams) -> Result<Self, CaptureError> {
        #[cfg(feature = "speex-aec")]
        {
            let backend = super::speex::SpeexCanceller::new(&params)?;
            Ok(Self::with_backend(params, Box::new(backend)))
        }
        #[cfg(not(feature = "speex-aec"))]
        {
            Err(CaptureError::NativeEngineUnavailable {
                reason: "built without the speex-aec feature".to_string(),
            })
        }
    }

    /// Creates an engine with an explicit backend.
    pub fn with_backend(params: AecParams, backend: Box<dyn EchoCanceller>) -> Self {
        let arena = FrameArena::new(params.frame_size);
        Self {
            backend: Some(backend),
            arena,
            params,
            frames_processed: 0,
            chunks_bypassed: 0,
        }
    }

    /// Creates a bypass engine that passes audio through unmodified.
    pub fn bypass(params: AecParams) -> Self {
        let arena = FrameArena::new(params.frame_size);
        Self {
            backend: None,
            arena,
            params,
            frames_processed: 0,
            chunks_bypassed: 0,
        }
    }

    /// Whether this engine is running without a backend.
    pub fn is_bypassed(&self) -> bool {
        self.backend.is_none()
    }

    /// Backend name for logs, or `"bypass"`.
    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("bypass", |b| b.name())
    }

    /// The engine's frame and tail configuration.
    pub fn params(&self) -> &AecParams {
        &self.params
    }

    /// Full frames run through the backend so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Chunks that passed through without cancellation.
    pub fn chunks_bypassed(&self) -> u64 {
        self.chunks_bypassed
    }

    /// Scratch frames currently outstanding. Zero between calls.
    pub fn scratch_balance(&self) -> u64 {
        self.arena.balance()
    }

    /// Processes one microphone chunk against the system-audio reference.
    ///
    /// The output always has the same length as `near`. With no backend,
    /// no reference, or an empty reference, the chunk passes through
    /// unchanged. Otherwise the reference is truncated or zero-padded to
    /// the chunk length, full frames are cancelled, and a trailing
    /// partial frame passes through as-is.
    pub fn process(&mut self, near: &[f32], far: Option<&[f32]>) -> Vec<f32> {
        let Some(backend) = self.backend.as_mut() else {
            self.chunks_bypassed += 1;
            return near.to_vec();
        };
        let far = match far {
            Some(f) if !f.is_empty() => f,
            _ => {
                self.chunks_bypassed += 1;
                return near.to_vec();
            }
        };

        let frame_size = self.params.frame_size;
        let near_i16 = f32_slice_to_i16(near);

        // Align the reference to the chunk: truncate or zero-pad
        let mut far_i16 = f32_slice_to_i16(&far[..far.len().min(near.len())]);
        far_i16.resize(near.len(), 0);

        let mut out_i16 = Vec::with_capacity(near.len());
        let full_frames = near.len() / frame_size;

        for frame_idx in 0..full_frames {
            let start = frame_idx * frame_size;
            let end = start + frame_size;

            let mut near_frame = self.arena.acquire();
            let mut far_frame = self.arena.acquire();
            let mut out_frame = self.arena.acquire();

            near_frame.fill_from(&near_i16[start..end]);
            far_frame.fill_from(&far_i16[start..end]);

            backend.cancel_frame(
                near_frame.as_slice(),
                far_frame.as_slice(),
                out_frame.as_mut_slice(),
            );
            out_i16.extend_from_slice(out_frame.as_slice());

            self.arena.release(near_frame);
            self.arena.release(far_frame);
            self.arena.release(out_frame);

            self.frames_processed += 1;
        }

        // Trailing partial frame passes through unprocessed
        out_i16.extend_from_slice(&near_i16[full_frames * frame_size..]);

        debug_assert_eq!(self.arena.balance(), 0);
        i16_slice_to_f32(&out_i16)
    }
}

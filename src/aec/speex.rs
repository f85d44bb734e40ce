//! Native echo canceller backed by the system `speexdsp` library.
//!
//! Only compiled with the `speex-aec` feature, which requires libspeexdsp
//! to be installed. Without the feature the engine runs in bypass and
//! emits a reduced-capability event instead of failing.
#![allow(unsafe_code)]

use std::ffi::c_void;
use std::os::raw::c_int;

use super::backend::EchoCanceller;
use crate::config::AecParams;
use crate::CaptureError;

#[repr(C)]
struct SpeexEchoState {
    _private: [u8; 0],
}

const SPEEX_ECHO_SET_SAMPLING_RATE: c_int = 24;

#[link(name = "speexdsp")]
extern "C" {
    fn speex_echo_state_init(frame_size: c_int, filter_length: c_int) -> *mut SpeexEchoState;
    fn speex_echo_state_destroy(st: *mut SpeexEchoState);
    fn speex_echo_cancellation(
        st: *mut SpeexEchoState,
        rec: *const i16,
        play: *const i16,
        out: *mut i16,
    );
    fn speex_echo_ctl(st: *mut SpeexEchoState, request: c_int, ptr: *mut c_void) -> c_int;
}

/// Speex adaptive echo canceller.
///
/// Owns a `SpeexEchoState` for the lifetime of a capture session. The
/// state carries the adaptive filter across frames, so one instance must
/// see the near and far streams in order.
pub struct SpeexCanceller {
    state: *mut SpeexEchoState,
    frame_size: usize,
}

// The raw state pointer is only touched through &mut self.
unsafe impl Send for SpeexCanceller {}

impl SpeexCanceller {
    /// Creates a canceller with the given frame size, tail length, and
    /// sample rate.
    ///
    /// # Errors
    ///
    /// Returns `NativeEngineUnavailable` if the state cannot be allocated.
    pub fn new(params: &AecParams) -> Result<Self, CaptureError> {
        let state = unsafe {
            speex_echo_state_init(params.frame_size as c_int, params.tail_length as c_int)
        };
        if state.is_null() {
            return Err(CaptureError::NativeEngineUnavailable {
                reason: "speex_echo_state_init returned null".to_string(),
            });
        }

        let mut rate = params.sample_rate as c_int;
        unsafe {
            speex_echo_ctl(
                state,
                SPEEX_ECHO_SET_SAMPLING_RATE,
                std::ptr::addr_of_mut!(rate).cast::<c_void>(),
            );
        }

        tracing::info!(
            frame_size = params.frame_size,
            tail_length = params.tail_length,
            rate = params.sample_rate,
            "speex echo canceller initialized"
        );

        Ok(Self {
            state,
            frame_size: params.frame_size,
        })
    }
}

impl EchoCanceller for SpeexCanceller {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn cancel_frame(&mut self, near: &[i16], far: &[i16], out: &mut [i16]) {
        debug_assert_eq!(near.len(), self.frame_size);
        debug_assert_eq!(far.len(), self.frame_size);
        debug_assert_eq!(out.len(), self.frame_size);

        unsafe {
            speex_echo_cancellation(self.state, near.as_ptr(), far.as_ptr(), out.as_mut_ptr());
        }
    }

    fn name(&self) -> &'static str {
        "speexdsp"
    }
}

impl Drop for SpeexCanceller {
    fn drop(&mut self) {
        unsafe {
            speex_echo_state_destroy(self.state);
        }
    }
}

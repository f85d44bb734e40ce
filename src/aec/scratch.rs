//! Per-call scratch frames for the canceller boundary.
//!
//! Native cancellers read and write raw PCM16 buffers. Each `process()`
//! call acquires three frames (near, far, out), runs the backend, copies
//! the result out, and releases all three before returning. The acquire
//! and release counters make that balance observable: after any number of
//! calls, including ones that bypassed cancellation, `balance()` is zero.

/// A PCM16 scratch frame leased from a [`FrameArena`].
pub struct Frame {
    buf: Box<[i16]>,
}

impl Frame {
    /// The frame's samples.
    pub fn as_slice(&self) -> &[i16] {
        &self.buf
    }

    /// The frame's samples, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [i16] {
        &mut self.buf
    }

    /// Copies `src` into the frame, zero-filling any remainder.
    ///
    /// `src` longer than the frame is truncated.
    pub fn fill_from(&mut self, src: &[i16]) {
        let n = src.len().min(self.buf.len());
        self.buf[..n].copy_from_slice(&src[..n]);
        self.buf[n..].fill(0);
    }
}

/// Allocator for canceller scratch frames with balance accounting.
pub struct FrameArena {
    frame_size: usize,
    acquired: u64,
    released: u64,
}

impl FrameArena {
    /// Creates an arena producing frames of `frame_size` samples.
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            acquired: 0,
            released: 0,
        }
    }

    /// Leases one zeroed frame.
    pub fn acquire(&mut self) -> Frame {
        self.acquired += 1;
        Frame {
            buf: vec![0i16; self.frame_size].into_boxed_slice(),
        }
    }

    /// Returns a frame to the arena.
    pub fn release(&mut self, frame: Frame) {
        self.released += 1;
        drop(frame);
    }

    /// Frames currently outstanding. Zero between `process()` calls.
    pub fn balance(&self) -> u64 {
        self.acquired - self.released
    }

    /// Total frames ever acquired.
    pub fn acquired(&self) -> u64 {
        self.acquired
    }

    /// Total frames ever released.
    pub fn released(&self) -> u64 {
        self.released
    }
}

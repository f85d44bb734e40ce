//! Sliding sample accumulator.
//!
//! Device callbacks deliver audio in whatever block size the OS picked;
//! the pipeline needs exact fixed-size chunks. The accumulator collects
//! incoming samples and slices complete chunks off the front, carrying
//! any remainder into the next chunk so no sample is dropped or
//! duplicated at chunk boundaries.

use std::collections::VecDeque;

/// Accumulates samples and yields exact fixed-size chunks.
pub struct ChunkAccumulator {
    buffer: VecDeque<f32>,
    chunk_size: usize,
}

impl ChunkAccumulator {
    /// Creates an accumulator producing chunks of `chunk_size` samples.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(chunk_size * 2),
            chunk_size,
        }
    }

    /// The configured chunk size in samples.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Appends samples to the pending buffer.
    pub fn push(&mut self, samples: &[f32]) {
        self.buffer.extend(samples.iter().copied());
    }

    /// Whether at least one complete chunk is pending.
    pub fn has_chunk(&self) -> bool {
        self.buffer.len() >= self.chunk_size
    }

    /// Removes and returns one complete chunk, if available.
    pub fn pop_chunk(&mut self) -> Option<Vec<f32>> {
        if !self.has_chunk() {
            return None;
        }
        Some(self.buffer.drain(..self.chunk_size).collect())
    }

    /// Samples currently pending (less than one chunk after draining).
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Takes whatever remains, even if it is less than a full chunk.
    ///
    /// Used on shutdown so trailing audio still reaches the sinks.
    pub fn take_remainder(&mut self) -> Vec<f32> {
        self.buffer.drain(..).collect()
    }
}

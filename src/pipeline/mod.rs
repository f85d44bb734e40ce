//! Chunk assembly and the per-path bridge tasks.

mod accumulator;
mod capture;

pub use accumulator::ChunkAccumulator;
pub use capture::{
    spawn_mic_bridge, spawn_system_bridge, BridgeConfig, ChunkProducer, MicBridge, SystemBridge,
};

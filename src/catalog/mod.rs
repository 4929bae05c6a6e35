//! Catalog module - Manifest parsing, arena allocation and frame loading.

mod arena;
mod loader;
pub mod manifest;
mod pool;

pub use arena::{FrameArena, FrameDescriptor};
pub use loader::{LoadSummary, load_frames};
pub use manifest::{ManifestEntry, ManifestReader, ManifestScan, write_manifest};
pub use pool::{MemoryPool, MemoryPools, PoolBuffer};

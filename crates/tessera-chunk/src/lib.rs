//! Chunk coordinates, build-time voxel snapshots, and the in-memory world store.
#![forbid(unsafe_code)]

mod coord;
mod store;
mod view;

pub use coord::{CHUNK_SIZE, ChunkCoord};
pub use store::{ChunkStore, VoxelSource};
pub use view::{BuildParams, Crack, VoxelChunkView};

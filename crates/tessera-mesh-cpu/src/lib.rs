//! CPU meshing: greedy faces, per-node drawtypes, buffer assembly,
//! transparency ordering and mesh animation.
#![forbid(unsafe_code)]

mod animation;
mod bsp;
mod collector;
mod context;
mod face;
mod greedy;
mod mesh;
mod mesh_build;
mod special;

pub use animation::{AnimationController, LayerFrame};
pub use bsp::{BspNode, MeshTriangle, TransparencySorter};
pub use collector::{MAX_BUFFER_VERTICES, MeshAssembler};
pub use context::MeshContext;
pub use face::{TileRotation, facedir_tile, vertex_dirs};
pub use greedy::{FaceContents, FaceMeshBuilder, FaceOwner, face_contents};
pub use mesh::{ChunkMesh, build_chunk_mesh};
pub use mesh_build::{PreMeshBuffer, TileKey, TileSpec, Vertex};
pub use special::SpecialGenerator;

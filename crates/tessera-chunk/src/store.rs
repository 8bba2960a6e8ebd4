use std::sync::RwLock;

use hashbrown::HashMap;
use tessera_blocks::Node;
use tessera_geom::NodePos;

use crate::coord::{CHUNK_SIZE, ChunkCoord};

/// Anything that can hand out a box of nodes in world coordinates.
pub trait VoxelSource {
    /// Replaces `out` with the `dims` box starting at `min`, in
    /// `(y * dz + z) * dx + x` order. Unavailable cells read as ignore.
    fn copy_region(&self, min: NodePos, dims: NodePos, out: &mut Vec<Node>);
}

const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

#[inline]
fn local_idx(x: i32, y: i32, z: i32) -> usize {
    ((y * CHUNK_SIZE + z) * CHUNK_SIZE + x) as usize
}

/// In-memory world of loaded chunks behind a reader/writer lock.
#[derive(Default)]
pub struct ChunkStore {
    chunks: RwLock<HashMap<ChunkCoord, Box<[Node]>>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a chunk built from `f(local_pos)`, replacing any previous one.
    pub fn insert_with(&self, coord: ChunkCoord, mut f: impl FnMut(NodePos) -> Node) {
        let mut nodes = vec![Node::AIR; CHUNK_VOLUME].into_boxed_slice();
        for y in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    nodes[local_idx(x, y, z)] = f(NodePos::new(x, y, z));
                }
            }
        }
        self.write().insert(coord, nodes);
    }

    pub fn remove(&self, coord: ChunkCoord) -> bool {
        self.write().remove(&coord).is_some()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.read().contains_key(&coord)
    }

    pub fn loaded(&self) -> Vec<ChunkCoord> {
        self.read().keys().copied().collect()
    }

    pub fn get_node(&self, p: NodePos) -> Node {
        let coord = ChunkCoord::containing(p);
        let rel = p - coord.origin();
        self.read()
            .get(&coord)
            .map(|c| c[local_idx(rel.x, rel.y, rel.z)])
            .unwrap_or(Node::IGNORE)
    }

    /// Returns false when the containing chunk is not loaded.
    pub fn set_node(&self, p: NodePos, n: Node) -> bool {
        let coord = ChunkCoord::containing(p);
        let rel = p - coord.origin();
        match self.write().get_mut(&coord) {
            Some(c) => {
                c[local_idx(rel.x, rel.y, rel.z)] = n;
                true
            }
            None => false,
        }
    }

    // A poisoned lock still holds consistent node data; keep serving it.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ChunkCoord, Box<[Node]>>> {
        self.chunks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ChunkCoord, Box<[Node]>>> {
        self.chunks.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl VoxelSource for ChunkStore {
    fn copy_region(&self, min: NodePos, dims: NodePos, out: &mut Vec<Node>) {
        out.clear();
        out.reserve((dims.x * dims.y * dims.z).max(0) as usize);
        // Read lock held only for the copy.
        let chunks = self.read();
        let mut cached: Option<(ChunkCoord, Option<&[Node]>)> = None;
        for y in 0..dims.y {
            for z in 0..dims.z {
                for x in 0..dims.x {
                    let p = min + NodePos::new(x, y, z);
                    let coord = ChunkCoord::containing(p);
                    let chunk = match cached {
                        Some((c, data)) if c == coord => data,
                        _ => {
                            let data = chunks.get(&coord).map(|b| &b[..]);
                            cached = Some((coord, data));
                            data
                        }
                    };
                    let rel = p - coord.origin();
                    out.push(
                        chunk
                            .map(|c| c[local_idx(rel.x, rel.y, rel.z)])
                            .unwrap_or(Node::IGNORE),
                    );
                }
            }
        }
    }
}

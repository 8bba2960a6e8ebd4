use crate::mesh_build::{PreMeshBuffer, TileKey, Vertex};

/// Most vertices a single buffer may hold with 16-bit indices.
pub const MAX_BUFFER_VERTICES: usize = u16::MAX as usize;

/// Collects quads and triangles into per-tile buffers.
#[derive(Default, Debug)]
pub struct MeshAssembler {
    buffers: Vec<PreMeshBuffer>,
}

impl MeshAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends geometry whose `indices` refer to `vertices`.
    ///
    /// Goes into the first buffer with the same key that still has room;
    /// otherwise a new buffer for that key is started.
    pub fn append(&mut self, key: TileKey, vertices: &[Vertex], indices: &[u16]) {
        if vertices.len() > MAX_BUFFER_VERTICES {
            log::warn!(
                target: "mesh",
                "dropping primitive with {} vertices (limit {})",
                vertices.len(),
                MAX_BUFFER_VERTICES
            );
            return;
        }
        let slot = self
            .buffers
            .iter()
            .position(|b| b.key == key && b.vertices.len() + vertices.len() <= MAX_BUFFER_VERTICES);
        let buf = match slot {
            Some(i) => &mut self.buffers[i],
            None => {
                self.buffers.push(PreMeshBuffer::new(key));
                let last = self.buffers.len() - 1;
                &mut self.buffers[last]
            }
        };
        let base = buf.vertices.len() as u16;
        buf.indices.extend(indices.iter().map(|&i| base + i));
        buf.vertices.extend_from_slice(vertices);
    }

    #[inline]
    pub fn buffers(&self) -> &[PreMeshBuffer] {
        &self.buffers
    }

    pub fn into_buffers(self) -> Vec<PreMeshBuffer> {
        self.buffers
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(|b| b.indices.is_empty())
    }

    pub fn vertex_count(&self) -> usize {
        self.buffers.iter().map(|b| b.vertices.len()).sum()
    }
}

use std::time::Instant;

use tessera_chunk::{CHUNK_SIZE, ChunkCoord, VoxelChunkView};
use tessera_geom::{BoundingSphere, NodePos, Vec3};

use crate::animation::{AnimationController, LayerFrame};
use crate::bsp::TransparencySorter;
use crate::collector::MeshAssembler;
use crate::context::MeshContext;
use crate::greedy::FaceMeshBuilder;
use crate::mesh_build::PreMeshBuffer;
use crate::special::SpecialGenerator;

/// Finished geometry of one chunk, owned by the frame thread once delivered.
#[derive(Clone, Debug)]
pub struct ChunkMesh {
    coord: ChunkCoord,
    step: u8,
    buffers: Vec<PreMeshBuffer>,
    frames: Vec<LayerFrame>,
    sorter: TransparencySorter,
    animation: AnimationController,
    bounds: BoundingSphere,
    camera_offset: NodePos,
}

/// Meshes `view`; `None` when the chunk has nothing to draw.
pub fn build_chunk_mesh(ctx: &MeshContext, view: &VoxelChunkView) -> Option<ChunkMesh> {
    if view.is_all_air() {
        return None;
    }
    let t0 = Instant::now();
    let mut asm = MeshAssembler::new();
    let quads = FaceMeshBuilder::new(ctx, view).build(&mut asm);
    let special = SpecialGenerator::new(ctx, view).generate(&mut asm);
    if asm.is_empty() {
        return None;
    }
    let mesh = ChunkMesh::from_buffers(ctx, view, asm.into_buffers());
    let ms: u32 = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    let c = view.coord();
    log::debug!(
        target: "mesh",
        "ms={} chunk_mesh coord=({}, {}, {}) step={} quads={} special={} buffers={} translucent_tris={}",
        ms,
        c.cx,
        c.cy,
        c.cz,
        view.step(),
        quads,
        special,
        mesh.buffers.len(),
        mesh.sorter.triangles().len()
    );
    Some(mesh)
}

impl ChunkMesh {
    fn from_buffers(ctx: &MeshContext, view: &VoxelChunkView, mut buffers: Vec<PreMeshBuffer>) -> Self {
        let coord = view.coord();
        let (animation, frames) = AnimationController::new(
            ctx.registry(),
            &mut buffers,
            view.crack_level(),
            ctx.animation_offset(coord),
        );
        // Node centers sit on integer positions.
        let mid = (CHUNK_SIZE - 1) as f32 / 2.0;
        let mut bounds = BoundingSphere::around(Vec3::from(coord.origin()) + Vec3::new(mid, mid, mid));
        for v in buffers.iter().flat_map(|b| &b.vertices) {
            bounds.include(v.pos);
        }
        let sorter = TransparencySorter::build(&buffers);
        Self {
            coord,
            step: view.step(),
            buffers,
            frames,
            sorter,
            animation,
            bounds,
            camera_offset: NodePos::ZERO,
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn step(&self) -> u8 {
        self.step
    }

    #[inline]
    pub fn buffers(&self) -> &[PreMeshBuffer] {
        &self.buffers
    }

    /// Texture state per buffer, parallel to `buffers()`.
    #[inline]
    pub fn frames(&self) -> &[LayerFrame] {
        &self.frames
    }

    #[inline]
    pub fn bounds(&self) -> &BoundingSphere {
        &self.bounds
    }

    #[inline]
    pub fn sorter(&self) -> &TransparencySorter {
        &self.sorter
    }

    #[inline]
    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    #[inline]
    pub fn camera_offset(&self) -> NodePos {
        self.camera_offset
    }

    pub fn quad_count(&self) -> usize {
        self.buffers.iter().map(|b| b.indices.len() / 6).sum()
    }

    pub fn has_translucency(&self) -> bool {
        !self.sorter.is_empty()
    }

    /// Counts the settle timer down; true when the mesh is due for `animate`.
    pub fn animation_due(&mut self) -> bool {
        self.animation.count_down()
    }

    /// Updates crack, texture frames and day/night colors.
    /// Returns true if anything the renderer uses changed.
    pub fn animate(&mut self, time: f32, crack: i32, daynight_ratio: u32, faraway: bool) -> bool {
        self.animation.tick(
            time,
            crack,
            daynight_ratio,
            faraway,
            &mut self.frames,
            &mut self.buffers,
        )
    }

    /// Back-to-front translucent triangle order seen from a world position.
    pub fn transparency_order(&self, viewpoint: Vec3) -> Vec<u32> {
        self.sorter.order(viewpoint)
    }

    /// Reorders the translucent index lists for `viewpoint`.
    pub fn sort_translucent(&mut self, viewpoint: Vec3) {
        if self.sorter.is_empty() {
            return;
        }
        let order = self.sorter.order(viewpoint);
        self.sorter.apply_order(&order, &mut self.buffers);
    }

    /// Moves vertices so they are relative to `offset` instead of the previous one.
    pub fn update_camera_offset(&mut self, offset: NodePos) {
        if offset == self.camera_offset {
            return;
        }
        let delta = Vec3::from(self.camera_offset - offset);
        for v in self.buffers.iter_mut().flat_map(|b| b.vertices.iter_mut()) {
            v.pos += delta;
        }
        self.camera_offset = offset;
    }
}

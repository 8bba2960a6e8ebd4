use hashbrown::{HashMap, HashSet};
use tessera_chunk::ChunkCoord;
use tessera_geom::{NodePos, Vec3};
use tessera_mesh_cpu::ChunkMesh;
use tessera_runtime::BuildResult;

/// Chunks at least this many chunks away skip texture animation.
pub const FARAWAY_RANGE: u32 = 4;

/// Receives finished chunk meshes on the frame thread.
pub trait MeshSink {
    fn submit_mesh(&mut self, coord: ChunkCoord, mesh: ChunkMesh);
    fn release_mesh(&mut self, coord: ChunkCoord);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Submitted,
    Released,
    /// The chunk was unloaded while its build ran.
    Stale,
}

/// Per-frame inputs to the scene update.
#[derive(Clone, Copy, Debug)]
pub struct FrameParams {
    pub time: f32,
    pub daynight_ratio: u32,
    pub viewpoint: Vec3,
    pub center: ChunkCoord,
    pub camera_offset: NodePos,
    /// Chunk being dug and its crack level.
    pub crack: Option<(ChunkCoord, i32)>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes: usize,
    pub animated: usize,
    pub sorted: usize,
    pub translucent_tris: usize,
}

/// Owns every delivered mesh and keeps them animated and sorted.
#[derive(Default)]
pub struct Scene {
    active: HashSet<ChunkCoord>,
    meshes: HashMap<ChunkCoord, ChunkMesh>,
    camera_offset: NodePos,
    stale: usize,
}

impl MeshSink for Scene {
    fn submit_mesh(&mut self, coord: ChunkCoord, mut mesh: ChunkMesh) {
        mesh.update_camera_offset(self.camera_offset);
        self.meshes.insert(coord, mesh);
    }

    fn release_mesh(&mut self, coord: ChunkCoord) {
        self.meshes.remove(&coord);
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `coord` as loaded; only loaded chunks accept meshes.
    pub fn activate(&mut self, coord: ChunkCoord) {
        self.active.insert(coord);
    }

    /// Unloads `coord` and drops its mesh.
    pub fn deactivate(&mut self, coord: ChunkCoord) {
        self.active.remove(&coord);
        self.release_mesh(coord);
    }

    pub fn is_active(&self, coord: ChunkCoord) -> bool {
        self.active.contains(&coord)
    }

    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMesh> {
        self.meshes.get(&coord)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (&ChunkCoord, &ChunkMesh)> {
        self.meshes.iter()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Results dropped because their chunk was gone.
    pub fn stale_count(&self) -> usize {
        self.stale
    }

    pub fn quad_count(&self) -> usize {
        self.meshes.values().map(ChunkMesh::quad_count).sum()
    }

    pub fn apply(&mut self, result: BuildResult) -> Applied {
        let BuildResult { coord, mesh, .. } = result;
        if !self.is_active(coord) {
            self.stale += 1;
            log::debug!(
                target: "frame",
                "stale result coord=({}, {}, {})",
                coord.cx,
                coord.cy,
                coord.cz
            );
            return Applied::Stale;
        }
        match mesh {
            Some(mesh) => {
                self.submit_mesh(coord, mesh);
                Applied::Submitted
            }
            None => {
                self.release_mesh(coord);
                Applied::Released
            }
        }
    }

    /// Moves camera-relative geometry, ticks animations that are due and
    /// re-sorts translucent triangles for the viewpoint.
    pub fn update(&mut self, frame: &FrameParams) -> FrameStats {
        let offset_changed = frame.camera_offset != self.camera_offset;
        self.camera_offset = frame.camera_offset;
        let mut stats = FrameStats {
            meshes: self.meshes.len(),
            ..FrameStats::default()
        };
        for (coord, mesh) in self.meshes.iter_mut() {
            if offset_changed {
                mesh.update_camera_offset(frame.camera_offset);
            }
            let crack = match frame.crack {
                Some((c, level)) if c == *coord => level,
                _ => -1,
            };
            if mesh.animation_due() {
                let faraway = mesh.step() > 1 || coord.range_to(frame.center) >= FARAWAY_RANGE;
                if mesh.animate(frame.time, crack, frame.daynight_ratio, faraway) {
                    stats.animated += 1;
                }
            }
            if mesh.has_translucency() {
                mesh.sort_translucent(frame.viewpoint);
                stats.sorted += 1;
                stats.translucent_tris += mesh.sorter().triangles().len();
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::load_registry;
    use tessera_blocks::{LightBank, Node};
    use tessera_chunk::{BuildParams, VoxelChunkView};
    use tessera_mesh_cpu::{MeshContext, build_chunk_mesh};

    fn mesh_of(name: &str, coord: ChunkCoord) -> ChunkMesh {
        let reg = load_registry(None, None).unwrap();
        let node = Node::new(reg.id_by_name(name).unwrap());
        let ctx = MeshContext::new(Arc::new(reg)).with_desync_animation(false);
        let mut air = Node::AIR;
        air.set_light(LightBank::Day, 15);
        let view = VoxelChunkView::filled(coord, BuildParams::default(), node, air);
        build_chunk_mesh(&ctx, &view).unwrap()
    }

    fn result(coord: ChunkCoord, mesh: Option<ChunkMesh>) -> BuildResult {
        BuildResult {
            coord,
            mesh,
            build_ms: 1,
            urgent: false,
        }
    }

    fn frame(ratio: u32) -> FrameParams {
        FrameParams {
            time: 1.0,
            daynight_ratio: ratio,
            viewpoint: Vec3::new(40.0, 30.0, 20.0),
            center: ChunkCoord::default(),
            camera_offset: NodePos::ZERO,
            crack: None,
        }
    }

    #[test]
    fn results_for_unloaded_chunks_are_dropped() {
        let c = ChunkCoord::new(0, 0, 0);
        let mut scene = Scene::new();
        assert_eq!(scene.apply(result(c, Some(mesh_of("stone", c)))), Applied::Stale);
        assert_eq!(scene.stale_count(), 1);
        assert_eq!(scene.mesh_count(), 0);

        scene.activate(c);
        assert_eq!(scene.apply(result(c, Some(mesh_of("stone", c)))), Applied::Submitted);
        assert_eq!(scene.quad_count(), 6);
        // An empty rebuild removes the old mesh
        assert_eq!(scene.apply(result(c, None)), Applied::Released);
        assert!(scene.mesh(c).is_none());
    }

    #[test]
    fn deactivate_releases_the_mesh() {
        let c = ChunkCoord::new(1, 0, 0);
        let mut scene = Scene::new();
        scene.activate(c);
        scene.apply(result(c, Some(mesh_of("stone", c))));
        scene.deactivate(c);
        assert!(!scene.is_active(c));
        assert_eq!(scene.mesh_count(), 0);
    }

    #[test]
    fn update_animates_and_sorts() {
        let c = ChunkCoord::new(0, 0, 0);
        let mut scene = Scene::new();
        scene.activate(c);
        scene.apply(result(c, Some(mesh_of("water", c))));
        let stats = scene.update(&frame(500));
        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.animated, 1);
        assert_eq!(stats.sorted, 1);
        assert_eq!(stats.translucent_tris, 12);
        // Settled until its timer runs out
        assert_eq!(scene.update(&frame(200)).animated, 0);
    }

    #[test]
    fn new_meshes_adopt_the_camera_offset() {
        let c = ChunkCoord::new(0, 0, 0);
        let mut scene = Scene::new();
        scene.activate(c);
        let offset = NodePos::new(64, 0, 0);
        scene.update(&FrameParams {
            camera_offset: offset,
            ..frame(1000)
        });
        scene.apply(result(c, Some(mesh_of("stone", c))));
        let mesh = scene.mesh(c).unwrap();
        assert_eq!(mesh.camera_offset(), offset);
        assert!(mesh.buffers()[0].vertices.iter().all(|v| v.pos.x <= 15.5 - 64.0));
    }
}

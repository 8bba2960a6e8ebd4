use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashSet;
use tessera_blocks::Node;
use tessera_chunk::{BuildParams, CHUNK_SIZE, ChunkCoord, ChunkStore, Crack, VoxelChunkView};
use tessera_geom::{NodePos, Vec3};
use tessera_mesh_cpu::MeshContext;
use tessera_runtime::{MeshBuildScheduler, SchedulerError, default_worker_count, farmesh_step};

use crate::assets::load_registry;
use crate::config::TesseraConfig;
use crate::day_cycle::DayCycle;
use crate::scene::{FrameParams, Scene};
use crate::terrain::{DemoTerrain, sunlit};

/// Camera-relative rendering recenters every this many nodes.
const CAMERA_OFFSET_GRID: i32 = 64;
/// Frames per crack level while digging.
const DIG_FRAMES_PER_LEVEL: u32 = 6;
const CRACK_LEVELS: i32 = 5;
/// Camera height above the sea.
const CAMERA_ALTITUDE: f32 = 28.0;
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug)]
struct Dig {
    pos: NodePos,
    started: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RunSummary {
    pub frames: u32,
    pub chunks: usize,
    pub meshes: usize,
    pub built: usize,
    pub failed: usize,
    pub stale: usize,
    pub quads: usize,
}

/// Headless frame loop: streams terrain around a moving camera, feeds the
/// mesh scheduler and keeps the scene animated.
pub struct App {
    cfg: TesseraConfig,
    store: ChunkStore,
    terrain: DemoTerrain,
    scheduler: MeshBuildScheduler,
    scene: Scene,
    day: DayCycle,
    loaded: HashSet<ChunkCoord>,
    camera: Vec3,
    time: f32,
    frame: u32,
    dig: Option<Dig>,
    dig_count: i32,
}

fn camera_offset(camera: Vec3) -> NodePos {
    let snap = |v: f32| (v / CAMERA_OFFSET_GRID as f32).floor() as i32 * CAMERA_OFFSET_GRID;
    NodePos::new(snap(camera.x), snap(camera.y), snap(camera.z))
}

impl App {
    pub fn new(cfg: TesseraConfig) -> Result<Self, Box<dyn Error>> {
        let reg = load_registry(cfg.materials.as_deref(), cfg.nodes.as_deref())?;
        let terrain = DemoTerrain::new(&reg, cfg.demo.seed)?;
        let ctx = MeshContext::new(Arc::new(reg))
            .with_light_gamma(cfg.mesh.light_gamma)
            .with_desync_animation(cfg.mesh.desync_animation);
        let workers = match cfg.scheduler.workers {
            0 => default_worker_count(),
            n => n,
        };
        let scheduler = MeshBuildScheduler::new(Arc::new(ctx), workers)?;
        let day = DayCycle::new(cfg.demo.day_length_s);
        let camera = Vec3::new(8.0, terrain.sea_level() as f32 + CAMERA_ALTITUDE, 8.0);
        Ok(Self {
            cfg,
            store: ChunkStore::new(),
            terrain,
            scheduler,
            scene: Scene::new(),
            day,
            loaded: HashSet::new(),
            camera,
            time: 0.0,
            frame: 0,
            dig: None,
            dig_count: 0,
        })
    }

    pub fn run(&mut self) -> Result<RunSummary, SchedulerError> {
        for _ in 0..self.cfg.demo.frames {
            self.step()?;
        }
        self.settle(SETTLE_TIMEOUT);
        self.scheduler.shutdown();
        let stats = self.scheduler.stats();
        Ok(RunSummary {
            frames: self.frame,
            chunks: self.loaded.len(),
            meshes: self.scene.mesh_count(),
            built: stats.built,
            failed: stats.failed,
            stale: self.scene.stale_count(),
            quads: self.scene.quad_count(),
        })
    }

    /// Applies results until nothing is queued or building, or `timeout` passes.
    fn settle(&mut self, timeout: Duration) {
        let t0 = Instant::now();
        loop {
            let s = self.scheduler.stats();
            if s.queued == 0 && s.in_flight == 0 {
                break;
            }
            let left = timeout.saturating_sub(t0.elapsed());
            if left.is_zero() {
                log::warn!(target: "frame", "settle timed out queued={} in_flight={}", s.queued, s.in_flight);
                break;
            }
            if let Some(r) = self.scheduler.wait_result(left.min(Duration::from_millis(50))) {
                self.scene.apply(r);
            }
        }
        // Results are sent before their build is marked done.
        for r in self.scheduler.poll_results(usize::MAX, Duration::MAX) {
            self.scene.apply(r);
        }
    }

    fn center(&self) -> ChunkCoord {
        ChunkCoord::containing(NodePos::new(
            self.camera.x.floor() as i32,
            self.camera.y.floor() as i32,
            self.camera.z.floor() as i32,
        ))
    }

    pub fn step(&mut self) -> Result<(), SchedulerError> {
        let t0 = Instant::now();
        let dt = self.cfg.demo.frame_ms as f32 / 1000.0;
        self.time += dt;
        let ratio = self.day.advance(dt);

        // Straight line along +X with a slow sway on Z.
        self.camera.x += self.cfg.demo.camera_speed * dt;
        self.camera.z = 8.0 + (self.time * 0.2).sin() * 24.0;
        let center = self.center();

        self.stream(center)?;
        let crack = self.update_dig(center)?;

        let drained = self.scheduler.poll_results(
            self.cfg.scheduler.max_results_per_frame,
            Duration::from_millis(self.cfg.scheduler.drain_budget_ms),
        );
        let n_results = drained.len();
        for r in drained {
            self.scene.apply(r);
        }

        let stats = self.scene.update(&FrameParams {
            time: self.time,
            daynight_ratio: ratio,
            viewpoint: self.camera,
            center,
            camera_offset: camera_offset(self.camera),
            crack,
        });
        let sched = self.scheduler.stats();
        let ms: u32 = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
        log::debug!(
            target: "frame",
            "ms={} frame={} ratio={} results={} meshes={} animated={} sorted={} translucent_tris={} queued={} in_flight={}",
            ms,
            self.frame,
            ratio,
            n_results,
            stats.meshes,
            stats.animated,
            stats.sorted,
            stats.translucent_tris,
            sched.queued,
            sched.in_flight
        );
        self.frame += 1;
        Ok(())
    }

    /// Chunk columns within the demo radius, `layers` chunks tall from y = -1.
    fn wanted(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let r = self.cfg.demo.radius as i32;
        let mut out = Vec::new();
        for cy in -1..self.cfg.demo.layers as i32 - 1 {
            for cz in -r..=r {
                for cx in -r..=r {
                    out.push(ChunkCoord::new(center.cx + cx, cy, center.cz + cz));
                }
            }
        }
        out
    }

    fn stream(&mut self, center: ChunkCoord) -> Result<(), SchedulerError> {
        let wanted: HashSet<ChunkCoord> = self.wanted(center).into_iter().collect();
        let gone: Vec<ChunkCoord> = self.loaded.difference(&wanted).copied().collect();
        for coord in gone {
            self.loaded.remove(&coord);
            self.store.remove(coord);
            self.scheduler.cancel(coord);
            self.scene.deactivate(coord);
        }
        let mut fresh: Vec<ChunkCoord> = wanted.difference(&self.loaded).copied().collect();
        // Nearest first so the first meshes land around the camera.
        fresh.sort_by_key(|c| c.distance_sq(center));
        let mut dirty = HashSet::new();
        for coord in fresh {
            self.terrain.generate(&self.store, coord);
            self.loaded.insert(coord);
            self.scene.activate(coord);
            dirty.insert(coord);
            // Neighbors can now see this chunk's border.
            for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
                let n = coord.offset(dx, dy, dz);
                if self.loaded.contains(&n) {
                    dirty.insert(n);
                }
            }
        }
        for coord in dirty {
            self.request(coord, center, false)?;
        }
        Ok(())
    }

    fn request(&self, coord: ChunkCoord, center: ChunkCoord, urgent: bool) -> Result<(), SchedulerError> {
        let range = coord.range_to(center);
        let crack = self.dig.and_then(|d| {
            (ChunkCoord::containing(d.pos) == coord).then(|| Crack {
                pos: d.pos,
                level: self.crack_level(d),
            })
        });
        let sched = &self.cfg.scheduler;
        let params = BuildParams {
            smooth_lighting: self.cfg.mesh.smooth_lighting,
            crack,
            step: 1,
            distance_rank: range,
        }
        .with_step(farmesh_step(range, sched.farmesh, sched.farmesh_step));
        let view = VoxelChunkView::snapshot(&self.store, coord, params);
        self.scheduler.request_build(coord, view, urgent)?;
        Ok(())
    }

    fn crack_level(&self, d: Dig) -> i32 {
        (self.frame.saturating_sub(d.started) / DIG_FRAMES_PER_LEVEL) as i32
    }

    /// Walks a dig through its crack levels and removes the node at the end.
    fn update_dig(&mut self, center: ChunkCoord) -> Result<Option<(ChunkCoord, i32)>, SchedulerError> {
        let every = self.cfg.demo.dig_every;
        if self.dig.is_none() && every > 0 && self.frame % every == 0 {
            let x = self.camera.x.floor() as i32;
            let z = self.camera.z.floor() as i32;
            let pos = NodePos::new(x, self.terrain.height(x, z) - self.dig_count % 3, z);
            let coord = ChunkCoord::containing(pos);
            if self.loaded.contains(&coord) {
                self.dig = Some(Dig {
                    pos,
                    started: self.frame,
                });
                self.dig_count += 1;
                // Rebuild with the crack overlay in place.
                self.request(coord, center, true)?;
            }
        }
        let Some(d) = self.dig else {
            return Ok(None);
        };
        let coord = ChunkCoord::containing(d.pos);
        let level = self.crack_level(d);
        if level < CRACK_LEVELS {
            return Ok(Some((coord, level)));
        }
        self.dig = None;
        self.store.set_node(d.pos, sunlit(Node::AIR));
        log::debug!(
            target: "frame",
            "dug pos=({}, {}, {}) frame={}",
            d.pos.x,
            d.pos.y,
            d.pos.z,
            self.frame
        );
        let local = d.pos - coord.origin();
        let mut touched = vec![coord];
        for (axis, v) in [local.x, local.y, local.z].into_iter().enumerate() {
            let step = if v == 0 {
                -1
            } else if v == CHUNK_SIZE - 1 {
                1
            } else {
                continue;
            };
            let mut delta = [0; 3];
            delta[axis] = step;
            touched.push(coord.offset(delta[0], delta[1], delta[2]));
        }
        for c in touched {
            if self.loaded.contains(&c) {
                self.request(c, center, true)?;
            }
        }
        Ok(None)
    }
}

use tessera_blocks::{CONTENT_IGNORE, ContentId, Face, Node, NodeRegistry};
use tessera_chunk::VoxelChunkView;
use tessera_geom::{NodePos, Vec3};
use tessera_lighting::LightingEvaluator;

use crate::collector::MeshAssembler;
use crate::context::MeshContext;
use crate::face::{TileRotation, facedir_tile, vertex_dirs};
use crate::mesh_build::{TileSpec, light_color, quad_indices, quad_vertices};

/// Which of the two nodes across a face draws it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceOwner {
    First,
    Second,
}

impl FaceOwner {
    #[inline]
    pub fn flipped(self) -> FaceOwner {
        match self {
            FaceOwner::First => FaceOwner::Second,
            FaceOwner::Second => FaceOwner::First,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceContents {
    pub owner: FaceOwner,
    /// Both sides are equally solid; the face is drawn backface-culled.
    pub equivalent: bool,
}

/// Decides whether a face exists between `m1` and its neighbor `m2`.
pub fn face_contents(reg: &NodeRegistry, m1: ContentId, m2: ContentId) -> Option<FaceContents> {
    if m1 == CONTENT_IGNORE || m2 == CONTENT_IGNORE {
        return None;
    }
    let f1 = reg.get(m1);
    let f2 = reg.get(m2);
    if m1 == m2 || f1.same_liquid(f2) || f1.solidness == f2.solidness {
        return None;
    }
    let c1 = if f1.solidness == 0 { f1.visual_solidness } else { f1.solidness };
    let c2 = if f2.solidness == 0 { f2.visual_solidness } else { f2.solidness };
    let owner = if c1 != c2 {
        if c1 > c2 { FaceOwner::First } else { FaceOwner::Second }
    } else {
        match (f1.is_liquid(), f2.is_liquid()) {
            (true, false) => FaceOwner::First,
            (false, true) => FaceOwner::Second,
            // Lower content id wins so swapping the pair swaps the owner.
            _ if m1 < m2 => FaceOwner::First,
            _ => FaceOwner::Second,
        }
    };
    Some(FaceContents {
        owner,
        equivalent: c1 == c2,
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FaceInfo {
    owner: NodePos,
    face: Face,
    lights: [u16; 4],
    tile: TileSpec,
    light_source: u8,
}

impl FaceInfo {
    /// `next` extends this face by one cell along `dir`.
    #[inline]
    fn continued_by(&self, next: &FaceInfo, dir: NodePos) -> bool {
        next.owner == self.owner + dir
            && next.face == self.face
            && next.lights == self.lights
            && next.tile == self.tile
            && next.light_source == self.light_source
            && self.tile.rotation == TileRotation::R0
    }
}

#[derive(Clone, Copy, Debug)]
struct Run {
    first: FaceInfo,
    last: FaceInfo,
    start: i32,
    len: i32,
}

#[derive(Clone, Copy, Debug)]
struct Rect {
    first: FaceInfo,
    // First face of the most recently stacked row.
    row_head: FaceInfo,
    start: i32,
    len: i32,
    rows: i32,
}

impl From<Run> for Rect {
    fn from(r: Run) -> Self {
        Rect {
            first: r.first,
            row_head: r.first,
            start: r.start,
            len: r.len,
            rows: 1,
        }
    }
}

// Face direction, run axis, stacking axis. Runs always follow the texture u axis.
const PASSES: [(Face, NodePos, NodePos); 3] = [
    (Face::PosY, NodePos::new(1, 0, 0), NodePos::new(0, 0, 1)),
    (Face::PosX, NodePos::new(0, 0, 1), NodePos::new(0, 1, 0)),
    (Face::PosZ, NodePos::new(1, 0, 0), NodePos::new(0, 1, 0)),
];

/// Greedy mesher for the cube-shaped faces of one chunk.
pub struct FaceMeshBuilder<'a> {
    ctx: &'a MeshContext,
    view: &'a VoxelChunkView,
    light: LightingEvaluator<'a>,
    cells: i32,
    step: i32,
    smooth: bool,
    crack: Option<NodePos>,
    origin: Vec3,
}

impl<'a> FaceMeshBuilder<'a> {
    pub fn new(ctx: &'a MeshContext, view: &'a VoxelChunkView) -> Self {
        let step = i32::from(view.step());
        Self {
            ctx,
            view,
            light: LightingEvaluator::new(ctx.registry(), ctx.curve()),
            cells: view.cells(),
            step,
            smooth: view.smooth_lighting() && step == 1,
            crack: if step == 1 { view.crack_pos_relative() } else { None },
            origin: Vec3::from(view.coord().origin()),
        }
    }

    /// Emits every exposed face owned by this chunk; returns the quad count.
    pub fn build(&mut self, out: &mut MeshAssembler) -> usize {
        let mut quads = 0;
        for (face, along, across) in PASSES {
            for plane in -1..self.cells {
                quads += self.plane(face, plane, along, across, out);
            }
        }
        quads
    }

    fn plane(&self, dir: Face, plane: i32, along: NodePos, across: NodePos, out: &mut MeshAssembler) -> usize {
        let base = dir.delta() * plane;
        let mut quads = 0;
        let mut open: Vec<Rect> = Vec::new();
        for row in 0..self.cells {
            let runs = self.row_runs(dir, base + across * row, along);
            let mut next_open = Vec::with_capacity(runs.len());
            for run in runs {
                let stacked = open.iter().position(|r| {
                    r.start == run.start && r.len == run.len && r.row_head.continued_by(&run.first, across)
                });
                match stacked {
                    Some(i) => {
                        let mut rect = open.swap_remove(i);
                        rect.rows += 1;
                        rect.row_head = run.first;
                        next_open.push(rect);
                    }
                    None => next_open.push(Rect::from(run)),
                }
            }
            for rect in open.drain(..) {
                self.emit(&rect, along, across, out);
                quads += 1;
            }
            open = next_open;
        }
        for rect in &open {
            self.emit(rect, along, across, out);
            quads += 1;
        }
        quads
    }

    fn row_runs(&self, dir: Face, row_start: NodePos, along: NodePos) -> Vec<Run> {
        let mut runs = Vec::new();
        let mut current: Option<Run> = None;
        for i in 0..self.cells {
            let info = self.face_info(row_start + along * i, dir);
            if let (Some(run), Some(next)) = (current.as_mut(), info.as_ref()) {
                if run.last.continued_by(next, along) {
                    run.len += 1;
                    run.last = *next;
                    continue;
                }
            }
            runs.extend(current.take());
            current = info.map(|f| Run {
                first: f,
                last: f,
                start: i,
                len: 1,
            });
        }
        runs.extend(current);
        runs
    }

    fn contains_cell(&self, p: NodePos) -> bool {
        (0..self.cells).contains(&p.x) && (0..self.cells).contains(&p.y) && (0..self.cells).contains(&p.z)
    }

    fn face_info(&self, p: NodePos, dir: Face) -> Option<FaceInfo> {
        let reg = self.ctx.registry();
        let n0 = self.view.get_cell(p);
        let n1 = self.view.get_cell(p + dir.delta());
        let fc = face_contents(reg, n0.content, n1.content)?;
        let (node, owner, face) = match fc.owner {
            FaceOwner::First => (n0, p, dir),
            FaceOwner::Second => (n1, p + dir.delta(), dir.opposite()),
        };
        if !self.contains_cell(owner) {
            return None;
        }
        let mut tile = self.node_tile(node, owner, face)?;
        if fc.equivalent {
            tile.key.backface_culling = true;
        }
        let lights = if self.smooth {
            self.light.smooth_face_light(self.view, owner, &vertex_dirs(face))
        } else {
            [self.light.face_light(n0, n1, face); 4]
        };
        Some(FaceInfo {
            owner,
            face,
            lights,
            tile,
            light_source: reg.features(node).light_source,
        })
    }

    fn node_tile(&self, n: Node, p: NodePos, face: Face) -> Option<TileSpec> {
        let f = self.ctx.registry().features(n);
        let (slot, rotation) = facedir_tile(f, n, face);
        let mut tile = self
            .ctx
            .tile_spec(f, f.tile(slot), f.tile_name(slot), self.crack == Some(p))?;
        tile.rotation = rotation;
        Some(tile)
    }

    fn emit(&self, rect: &Rect, along: NodePos, across: NodePos, out: &mut MeshAssembler) {
        let info = &rect.first;
        let (n, m) = (rect.len as f32, rect.rows as f32);
        let step = self.step as f32;
        let center = Vec3::from(info.owner) + Vec3::from(along) * ((n - 1.0) / 2.0) + Vec3::from(across) * ((m - 1.0) / 2.0);
        let scale = Vec3::ONE + Vec3::from(along) * (n - 1.0) + Vec3::from(across) * (m - 1.0);
        let half_cell = (step - 1.0) / 2.0;
        let center = self.origin + center * step + Vec3::new(half_cell, half_cell, half_cell);

        let rot = info.tile.rotation;
        let corners = rot
            .rotate(vertex_dirs(info.face))
            .map(|d| center + Vec3::from(d).scale(scale) * (0.5 * step));
        let colors = rot
            .rotate(info.lights)
            .map(|l| light_color(l, info.light_source, info.tile.alpha));
        let vertices = quad_vertices(corners, info.face.normal(), rot.uvs(n, m), colors);
        out.append(info.tile.key, &vertices, quad_indices(&vertices));
    }
}

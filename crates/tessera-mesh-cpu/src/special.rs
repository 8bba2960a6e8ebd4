use tessera_blocks::{
    BlendMode, CONTENT_IGNORE, DrawType, Face, LiquidKind, Node, NodeFeatures, NodeRegistry,
};
use tessera_chunk::VoxelChunkView;
use tessera_geom::{Aabb, NodePos, Vec3};
use tessera_lighting::{LightingEvaluator, PackedLight};

use crate::collector::MeshAssembler;
use crate::context::MeshContext;
use crate::face::{TileRotation, vertex_dirs};
use crate::mesh_build::{TileSpec, light_color, quad_indices, quad_vertices};

const UNIT_UVS: [[f32; 2]; 4] = [[1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
const SIDES: [Face; 4] = [Face::PosX, Face::NegX, Face::PosZ, Face::NegZ];

// Wallmounted param2 to the direction of the supporting surface.
const WALLMOUNTED_DIRS: [NodePos; 6] = [
    NodePos::new(0, 1, 0),
    NodePos::new(0, -1, 0),
    NodePos::new(1, 0, 0),
    NodePos::new(-1, 0, 0),
    NodePos::new(0, 0, 1),
    NodePos::new(0, 0, -1),
];

/// Per-node geometry for every drawtype the greedy mesher does not handle.
pub struct SpecialGenerator<'a> {
    ctx: &'a MeshContext,
    view: &'a VoxelChunkView,
    light: LightingEvaluator<'a>,
    crack: Option<NodePos>,
    origin: Vec3,
}

/// Node being drawn with its resolved features and light.
struct Cell<'f> {
    p: NodePos,
    n: Node,
    f: &'f NodeFeatures,
    light: PackedLight,
}

impl<'a> SpecialGenerator<'a> {
    pub fn new(ctx: &'a MeshContext, view: &'a VoxelChunkView) -> Self {
        Self {
            ctx,
            view,
            light: LightingEvaluator::new(ctx.registry(), ctx.curve()),
            crack: view.crack_pos_relative(),
            origin: Vec3::from(view.coord().origin()),
        }
    }

    #[inline]
    fn reg(&self) -> &'a NodeRegistry {
        self.ctx.registry()
    }

    /// Draws every special node of the chunk; returns how many were drawn.
    /// Down-sampled views have none.
    pub fn generate(&self, out: &mut MeshAssembler) -> usize {
        if self.view.step() != 1 {
            return 0;
        }
        let size = self.view.size();
        let mut drawn = 0;
        for y in 0..size {
            for z in 0..size {
                for x in 0..size {
                    let p = NodePos::new(x, y, z);
                    let n = self.view.get(p);
                    let f = self.reg().features(n);
                    if !f.drawtype.is_special() {
                        continue;
                    }
                    let cell = Cell {
                        p,
                        n,
                        f,
                        light: self.light.interior_light(n, 0),
                    };
                    self.draw(&cell, out);
                    drawn += 1;
                }
            }
        }
        drawn
    }

    fn draw(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        match c.f.drawtype {
            DrawType::FlowingLiquid => self.draw_flowing_liquid(c, out),
            DrawType::Glasslike => self.draw_glasslike(c, out),
            DrawType::Allfaces => self.draw_allfaces(c, out),
            DrawType::Plantlike => self.draw_plantlike(c, out),
            DrawType::Torchlike => self.draw_torchlike(c, out),
            DrawType::Signlike => self.draw_signlike(c, out),
            DrawType::Fencelike => self.draw_fencelike(c, out),
            DrawType::Raillike => self.draw_raillike(c, out),
            DrawType::Nodebox => self.draw_nodebox(c, out),
            DrawType::Normal | DrawType::Airlike | DrawType::Liquid => {}
        }
    }

    fn tile(&self, c: &Cell<'_>, face: Face) -> Option<TileSpec> {
        self.ctx
            .tile_spec(c.f, c.f.tile(face), c.f.tile_name(face), self.crack == Some(c.p))
    }

    fn neighbor(&self, c: &Cell<'_>, d: NodePos) -> (Node, &'a NodeFeatures) {
        let n = self.view.get(c.p + d);
        (n, self.reg().features(n))
    }

    /// Appends one quad given node-relative corners.
    fn quad(
        &self,
        c: &Cell<'_>,
        tile: &TileSpec,
        corners: [Vec3; 4],
        normal: Vec3,
        uvs: [[f32; 2]; 4],
        out: &mut MeshAssembler,
    ) {
        let base = self.origin + Vec3::from(c.p);
        let color = light_color(c.light, c.f.light_source, tile.alpha);
        let vertices = quad_vertices(corners.map(|v| base + v), normal, uvs, [color; 4]);
        out.append(tile.key, &vertices, quad_indices(&vertices));
    }

    /// Full-size cube face of the node.
    fn unit_face(&self, c: &Cell<'_>, tile: &TileSpec, face: Face, out: &mut MeshAssembler) {
        let corners = vertex_dirs(face).map(|d| Vec3::from(d) * 0.5);
        self.quad(c, tile, corners, face.normal(), UNIT_UVS, out);
    }

    fn draw_flowing_liquid(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let (layer, name) = match c.f.special_tile(0) {
            Some(id) => (Some(id), c.f.special_tile_name(0)),
            None => (c.f.tile(Face::PosY), c.f.tile_name(Face::PosY)),
        };
        let Some(tile) = self.ctx.tile_spec(c.f, layer, name, false) else {
            return;
        };
        let top_covered = self.is_same_liquid(c, Face::PosY.delta());

        // Corner heights in node units above the node floor.
        let mut heights = [[1.0f32; 2]; 2];
        if !top_covered {
            for (ix, dx) in [-1, 1].into_iter().enumerate() {
                for (iz, dz) in [-1, 1].into_iter().enumerate() {
                    heights[ix][iz] = self.liquid_corner_height(c, dx, dz);
                }
            }
        }
        let height_at = |d: NodePos| heights[usize::from(d.x > 0)][usize::from(d.z > 0)];
        let surface = |d: NodePos| {
            let y = if d.y > 0 { height_at(d) - 0.5 } else { -0.5 };
            Vec3::new(d.x as f32 * 0.5, y, d.z as f32 * 0.5)
        };

        if !top_covered {
            let corners = vertex_dirs(Face::PosY).map(surface);
            self.quad(c, &tile, corners, Face::PosY.normal(), UNIT_UVS, out);
        }
        for face in SIDES {
            if self.liquid_side_hidden(c, face) {
                continue;
            }
            let dirs = vertex_dirs(face);
            let uvs = [0, 1, 2, 3].map(|i| {
                let [u, v] = UNIT_UVS[i];
                if dirs[i].y > 0 { [u, 1.0 - height_at(dirs[i])] } else { [u, v] }
            });
            self.quad(c, &tile, dirs.map(surface), face.normal(), uvs, out);
        }
        if !self.liquid_side_hidden(c, Face::NegY) {
            self.unit_face(c, &tile, Face::NegY, out);
        }
    }

    fn liquid_side_hidden(&self, c: &Cell<'_>, face: Face) -> bool {
        let (n, f) = self.neighbor(c, face.delta());
        n.content == CONTENT_IGNORE || f.solidness == 2 || self.is_same_liquid(c, face.delta())
    }

    fn is_same_liquid(&self, c: &Cell<'_>, d: NodePos) -> bool {
        let (n, f) = self.neighbor(c, d);
        n.content == c.n.content || f.same_liquid(c.f)
    }

    /// Averages the liquid levels of the four nodes around a top corner.
    fn liquid_corner_height(&self, c: &Cell<'_>, dx: i32, dz: i32) -> f32 {
        let mut sum = 0.0;
        let mut count = 0;
        for d in [
            NodePos::new(0, 0, 0),
            NodePos::new(dx, 0, 0),
            NodePos::new(0, 0, dz),
            NodePos::new(dx, 0, dz),
        ] {
            let (n, f) = self.neighbor(c, d);
            if self.is_same_liquid(c, d) {
                if f.liquid == LiquidKind::Source || self.is_same_liquid(c, d + Face::PosY.delta()) {
                    return 1.0;
                }
                sum += (f32::from(n.liquid_level()) + 0.5) / 8.0;
                count += 1;
            } else if n.content != CONTENT_IGNORE && f.solidness == 0 && !f.is_liquid() {
                count += 1;
            }
        }
        if count == 0 {
            (f32::from(c.n.liquid_level()) + 0.5) / 8.0
        } else {
            sum / count as f32
        }
    }

    fn draw_glasslike(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        for face in Face::ALL {
            let (n, f) = self.neighbor(c, face.delta());
            if n.content == c.n.content || n.content == CONTENT_IGNORE || f.solidness == 2 {
                continue;
            }
            if let Some(tile) = self.tile(c, face) {
                self.unit_face(c, &tile, face, out);
            }
        }
    }

    fn draw_allfaces(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        for face in Face::ALL {
            let (n, f) = self.neighbor(c, face.delta());
            if f.solidness == 2 {
                continue;
            }
            let Some(tile) = self.tile(c, face) else {
                continue;
            };
            // Opaque leaves hide the faces between them.
            if n.content == c.n.content && tile.key.blend == BlendMode::Opaque {
                continue;
            }
            self.unit_face(c, &tile, face, out);
        }
    }

    /// Two upright quads along the cell diagonals, standing on the node floor.
    fn crossed_quads(
        &self,
        c: &Cell<'_>,
        tile: &TileSpec,
        (width, height): (f32, f32),
        shift: Vec3,
        uvs: [[f32; 2]; 4],
        out: &mut MeshAssembler,
    ) {
        let d = 0.5 * width * std::f32::consts::FRAC_1_SQRT_2;
        let bottom = -0.5;
        for (a, b) in [((-d, -d), (d, d)), ((-d, d), (d, -d))] {
            let corners = [
                Vec3::new(b.0, bottom, b.1),
                Vec3::new(a.0, bottom, a.1),
                Vec3::new(a.0, bottom + height, a.1),
                Vec3::new(b.0, bottom + height, b.1),
            ]
            .map(|v| v + shift);
            let along = Vec3::new(b.0 - a.0, 0.0, b.1 - a.1);
            let normal = along.cross(Vec3::UP).normalized();
            self.quad(c, tile, corners, normal, uvs, out);
        }
    }

    fn draw_plantlike(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let Some(tile) = self.tile(c, Face::PosY) else {
            return;
        };
        let s = c.f.visual_scale;
        self.crossed_quads(c, &tile, (s, s), Vec3::ZERO, UNIT_UVS, out);
    }

    fn draw_torchlike(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let dir = WALLMOUNTED_DIRS[usize::from(c.n.wallmounted())];
        // Floor, ceiling and wall torches use tiles 0, 1 and 2.
        let (slot, uvs, shift) = match dir.y {
            -1 => (Face::PosY, UNIT_UVS, Vec3::ZERO),
            1 => (Face::NegY, TileRotation::Fx.uvs(1.0, 1.0), Vec3::ZERO),
            _ => (Face::PosX, UNIT_UVS, Vec3::from(dir) * 0.25),
        };
        let Some(tile) = self.tile(c, slot) else {
            return;
        };
        self.crossed_quads(c, &tile, (0.5, 1.0), shift, uvs, out);
    }

    fn draw_signlike(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let dir = WALLMOUNTED_DIRS[usize::from(c.n.wallmounted())];
        let Some(facing) = Face::from_delta(-dir) else {
            return;
        };
        let Some(tile) = self.tile(c, Face::PosY) else {
            return;
        };
        let offset = 0.5 - 1.0 / 16.0;
        let wall = Vec3::from(dir);
        let corners = vertex_dirs(facing).map(|d| {
            let v = Vec3::from(d) * 0.5;
            // Replace the component along the wall normal.
            v - wall * v.dot(wall) + wall * offset
        });
        self.quad(c, &tile, corners, facing.normal(), UNIT_UVS, out);
    }

    fn draw_fencelike(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let tiles = Face::ALL.map(|face| self.tile(c, face));
        let post = 0.125;
        self.cuboid(c, &tiles, Aabb::new(Vec3::new(-post, -0.5, -post), Vec3::new(post, 0.5, post)), out);

        // Only +X and +Z connect; the neighbor draws the other half.
        let bar = 1.0 / 16.0;
        for d in [NodePos::new(1, 0, 0), NodePos::new(0, 0, 1)] {
            let (n, _) = self.neighbor(c, d);
            if n.content != c.n.content {
                continue;
            }
            for (y0, y1) in [(0.25, 0.375), (-0.25, -0.125)] {
                let (min, max) = if d.x > 0 {
                    (Vec3::new(post, y0, -bar), Vec3::new(1.0 - post, y1, bar))
                } else {
                    (Vec3::new(-bar, y0, post), Vec3::new(bar, y1, 1.0 - post))
                };
                self.cuboid(c, &tiles, Aabb::new(min, max), out);
            }
        }
    }

    fn draw_raillike(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let mut mask = 0u8;
        for (bit, face) in SIDES.into_iter().enumerate() {
            let (n, _) = self.neighbor(c, face.delta());
            if n.content == c.n.content {
                mask |= 1 << bit;
            }
        }
        // Bits: +X, -X, +Z, -Z. Tiles: straight, curved, junction, crossing.
        let (slot, turns) = match mask {
            0b0001 | 0b0010 | 0b0011 => (0, 1),
            0b0101 => (1, 0),
            0b1001 => (1, 1),
            0b1010 => (1, 2),
            0b0110 => (1, 3),
            0b0111 => (2, 0),
            0b1110 => (2, 1),
            0b1011 => (2, 2),
            0b1101 => (2, 3),
            0b1111 => (3, 0),
            _ => (0, 0),
        };
        let Some(tile) = self.tile(c, Face::from_index(slot)) else {
            return;
        };
        let rotation = TileRotation::from_index(turns);
        let y = -0.5 + 1.0 / 16.0;
        let corners = vertex_dirs(Face::PosY).map(|d| Vec3::new(d.x as f32 * 0.5, y, d.z as f32 * 0.5));
        self.quad(c, &tile, corners, Face::PosY.normal(), rotation.rotate(UNIT_UVS), out);
    }

    fn draw_nodebox(&self, c: &Cell<'_>, out: &mut MeshAssembler) {
        let tiles = Face::ALL.map(|face| self.tile(c, face));
        for b in &c.f.node_boxes {
            self.cuboid(c, &tiles, *b, out);
        }
    }

    /// Box with per-face tiles; texture coordinates are cropped to the box.
    fn cuboid(&self, c: &Cell<'_>, tiles: &[Option<TileSpec>; 6], b: Aabb, out: &mut MeshAssembler) {
        for face in Face::ALL {
            let Some(tile) = &tiles[face.index()] else {
                continue;
            };
            let corners = vertex_dirs(face).map(|d| {
                Vec3::new(
                    if d.x > 0 { b.max.x } else { b.min.x },
                    if d.y > 0 { b.max.y } else { b.min.y },
                    if d.z > 0 { b.max.z } else { b.min.z },
                )
            });
            let [u0, v0, u1, v1] = cuboid_txc(&b, face);
            let uvs = [[u1, v1], [u0, v1], [u0, v0], [u1, v0]];
            self.quad(c, tile, corners, face.normal(), uvs, out);
        }
    }
}

/// Texture window `[u0, v0, u1, v1]` of a box face inside the node's tile.
fn cuboid_txc(b: &Aabb, face: Face) -> [f32; 4] {
    let (x1, y1, z1) = (b.min.x + 0.5, b.min.y + 0.5, b.min.z + 0.5);
    let (x2, y2, z2) = (b.max.x + 0.5, b.max.y + 0.5, b.max.z + 0.5);
    match face {
        Face::PosY => [x1, 1.0 - z2, x2, 1.0 - z1],
        Face::NegY => [x1, z1, x2, z2],
        Face::PosX => [z1, 1.0 - y2, z2, 1.0 - y1],
        Face::NegX => [1.0 - z2, 1.0 - y2, 1.0 - z1, 1.0 - y1],
        Face::PosZ => [1.0 - x2, 1.0 - y2, 1.0 - x1, 1.0 - y1],
        Face::NegZ => [x1, 1.0 - y2, x2, 1.0 - y1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_box_uses_whole_tile() {
        let b = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        for face in Face::ALL {
            assert_eq!(cuboid_txc(&b, face), [0.0, 0.0, 1.0, 1.0], "{face:?}");
        }
    }

    #[test]
    fn slab_side_crops_lower_half() {
        let b = Aabb::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.0, 0.5));
        assert_eq!(cuboid_txc(&b, Face::PosX), [0.0, 0.5, 1.0, 1.0]);
        assert_eq!(cuboid_txc(&b, Face::PosY), [0.0, 0.0, 1.0, 1.0]);
    }
}

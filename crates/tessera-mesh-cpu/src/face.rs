use tessera_blocks::{Face, Node, NodeFeatures, Param2Kind};
use tessera_geom::NodePos;

/// Corner directions of a face: bottom-right, bottom-left, top-left, top-right
/// as seen from outside. `cross(v1 - v0, v2 - v0)` points along the face normal.
pub fn vertex_dirs(face: Face) -> [NodePos; 4] {
    let v = NodePos::new;
    match face {
        Face::PosZ => [v(-1, -1, 1), v(1, -1, 1), v(1, 1, 1), v(-1, 1, 1)],
        Face::NegZ => [v(1, -1, -1), v(-1, -1, -1), v(-1, 1, -1), v(1, 1, -1)],
        Face::PosX => [v(1, -1, 1), v(1, -1, -1), v(1, 1, -1), v(1, 1, 1)],
        Face::NegX => [v(-1, -1, -1), v(-1, -1, 1), v(-1, 1, 1), v(-1, 1, -1)],
        Face::PosY => [v(1, 1, -1), v(-1, 1, -1), v(-1, 1, 1), v(1, 1, 1)],
        Face::NegY => [v(1, -1, 1), v(-1, -1, 1), v(-1, -1, -1), v(1, -1, -1)],
    }
}

/// Texture rotation and mirroring of a face tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileRotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
    FxR90,
    FxR270,
    FyR90,
    FyR270,
    Fx,
    Fy,
}

impl TileRotation {
    pub fn from_index(i: u8) -> TileRotation {
        match i {
            1 => TileRotation::R90,
            2 => TileRotation::R180,
            3 => TileRotation::R270,
            4 => TileRotation::FxR90,
            5 => TileRotation::FxR270,
            6 => TileRotation::FyR90,
            7 => TileRotation::FyR270,
            8 => TileRotation::Fx,
            9 => TileRotation::Fy,
            _ => TileRotation::R0,
        }
    }

    /// Reorders corners (and their lights) the way the tile is turned.
    pub fn rotate<T: Copy>(self, c: [T; 4]) -> [T; 4] {
        match self {
            TileRotation::R90 | TileRotation::FxR90 | TileRotation::FyR90 => [c[3], c[0], c[1], c[2]],
            TileRotation::R180 => [c[2], c[3], c[0], c[1]],
            TileRotation::R270 | TileRotation::FxR270 | TileRotation::FyR270 => {
                [c[1], c[2], c[3], c[0]]
            }
            TileRotation::R0 | TileRotation::Fx | TileRotation::Fy => c,
        }
    }

    #[inline]
    fn flips_v(self) -> bool {
        matches!(self, TileRotation::FxR90 | TileRotation::FxR270 | TileRotation::Fx)
    }

    #[inline]
    fn flips_u(self) -> bool {
        matches!(self, TileRotation::FyR90 | TileRotation::FyR270 | TileRotation::Fy)
    }

    /// Corner UVs for a face repeated `su` times along u and `sv` times along v.
    pub fn uvs(self, su: f32, sv: f32) -> [[f32; 2]; 4] {
        let (mut x0, mut y0, mut w, mut h) = (0.0f32, 0.0f32, 1.0f32, 1.0f32);
        if self.flips_v() {
            y0 += h;
            h = -h;
        }
        if self.flips_u() {
            x0 += w;
            w = -w;
        }
        [
            [x0 + w * su, y0 + h * sv],
            [x0, y0 + h * sv],
            [x0, y0],
            [x0 + w * su, y0],
        ]
    }
}

// Tile slot and rotation per (facedir, face), faces in `Face` order.
const FACEDIR_TILES: [[(u8, u8); 6]; 24] = [
    [(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0)],
    [(0, 3), (1, 1), (4, 0), (5, 0), (3, 0), (2, 0)],
    [(0, 2), (1, 2), (3, 0), (2, 0), (5, 0), (4, 0)],
    [(0, 1), (1, 3), (5, 0), (4, 0), (2, 0), (3, 0)],
    [(5, 0), (4, 2), (2, 3), (3, 1), (0, 2), (1, 0)],
    [(2, 0), (3, 2), (4, 3), (5, 1), (0, 1), (1, 1)],
    [(4, 0), (5, 2), (3, 3), (2, 1), (0, 0), (1, 2)],
    [(3, 0), (2, 2), (5, 3), (4, 1), (0, 3), (1, 3)],
    [(4, 2), (5, 0), (2, 1), (3, 3), (1, 2), (0, 0)],
    [(3, 2), (2, 0), (4, 1), (5, 3), (1, 3), (0, 3)],
    [(5, 2), (4, 0), (3, 1), (2, 3), (1, 0), (0, 2)],
    [(2, 2), (3, 0), (5, 1), (4, 3), (1, 1), (0, 1)],
    [(3, 3), (2, 3), (0, 3), (1, 3), (4, 1), (5, 3)],
    [(5, 3), (4, 3), (0, 2), (1, 0), (3, 1), (2, 3)],
    [(2, 3), (3, 3), (0, 1), (1, 1), (5, 1), (4, 3)],
    [(4, 3), (5, 3), (0, 0), (1, 2), (2, 1), (3, 3)],
    [(2, 1), (3, 1), (1, 1), (0, 1), (4, 3), (5, 1)],
    [(4, 1), (5, 1), (1, 2), (0, 0), (3, 3), (2, 1)],
    [(3, 1), (2, 1), (1, 3), (0, 3), (5, 3), (4, 1)],
    [(5, 1), (4, 1), (1, 0), (0, 2), (2, 3), (3, 1)],
    [(1, 2), (0, 2), (3, 2), (2, 2), (4, 2), (5, 2)],
    [(1, 3), (0, 1), (5, 2), (4, 2), (3, 2), (2, 2)],
    [(1, 0), (0, 0), (2, 2), (3, 2), (5, 2), (4, 2)],
    [(1, 1), (0, 3), (4, 2), (5, 2), (2, 2), (3, 2)],
];

/// Which of the node's six tiles is shown on `face`, and how it is turned.
pub fn facedir_tile(f: &NodeFeatures, n: Node, face: Face) -> (Face, TileRotation) {
    if f.param2 != Param2Kind::Facedir {
        return (face, TileRotation::R0);
    }
    let (slot, rot) = FACEDIR_TILES[usize::from(n.facedir())][face.index()];
    (Face::from_index(usize::from(slot)), TileRotation::from_index(rot))
}

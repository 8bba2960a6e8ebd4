use tessera_blocks::{BlendMode, LayerId};
use tessera_geom::Vec3;

use crate::face::TileRotation;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub uv: [f32; 2],
    /// While assembling: `[day, night, light_source, alpha]`.
    /// In a finished mesh: the blended RGBA color.
    pub color: [u8; 4],
}

/// What a buffer is drawn with. Faces with equal keys share buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub layer: LayerId,
    pub blend: BlendMode,
    pub crack: bool,
    pub backface_culling: bool,
}

/// A resolved face tile: buffer key plus per-face texture orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSpec {
    pub key: TileKey,
    pub rotation: TileRotation,
    pub alpha: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreMeshBuffer {
    pub key: TileKey,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl PreMeshBuffer {
    pub fn new(key: TileKey) -> Self {
        Self {
            key,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.key.blend == BlendMode::Blend
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];
const QUAD_INDICES_ALT: [u16; 6] = [0, 1, 3, 2, 3, 1];

/// Splits a quad along the diagonal that keeps the day-light gradient smooth.
#[inline]
pub(crate) fn quad_indices(v: &[Vertex; 4]) -> &'static [u16; 6] {
    if v[0].color[0] != v[2].color[0] || v[1].color[0] == v[3].color[0] {
        &QUAD_INDICES_ALT
    } else {
        &QUAD_INDICES
    }
}

/// Builds four vertices, swapping corners 1 and 3 if the winding disagrees with `n`.
pub(crate) fn quad_vertices(
    corners: [Vec3; 4],
    n: Vec3,
    mut uvs: [[f32; 2]; 4],
    mut colors: [[u8; 4]; 4],
) -> [Vertex; 4] {
    let mut vs = corners;
    let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
    if cross.dot(n) < 0.0 {
        vs.swap(1, 3);
        uvs.swap(1, 3);
        colors.swap(1, 3);
    }
    [0, 1, 2, 3].map(|i| Vertex {
        pos: vs[i],
        normal: n,
        uv: uvs[i],
        color: colors[i],
    })
}

#[inline]
pub(crate) fn light_color(light: u16, light_source: u8, alpha: u8) -> [u8; 4] {
    [(light & 0xff) as u8, (light >> 8) as u8, light_source, alpha]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winding_is_fixed_up() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 0.0, 1.0);
        let c = Vec3::new(1.0, 0.0, 1.0);
        let d = Vec3::new(1.0, 0.0, 0.0);
        let uvs = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        let v = quad_vertices([a, d, c, b], n, uvs, [[0; 4]; 4]);
        let cross = (v[1].pos - v[0].pos).cross(v[2].pos - v[0].pos);
        assert!(cross.dot(n) > 0.0);
        assert_eq!(v[1].uv, [1.0, 0.0]);
    }

    #[test]
    fn diagonal_follows_day_light() {
        let mut v = [Vertex::default(); 4];
        assert_eq!(quad_indices(&v), &QUAD_INDICES_ALT);
        v[1].color[0] = 10;
        assert_eq!(quad_indices(&v), &QUAD_INDICES);
        v[2].color[0] = 10;
        assert_eq!(quad_indices(&v), &QUAD_INDICES_ALT);
    }
}

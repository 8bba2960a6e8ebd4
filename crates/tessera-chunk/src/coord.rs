use tessera_geom::NodePos;

/// Edge length of a chunk in nodes.
pub const CHUNK_SIZE: i32 = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dy * dy + dz * dz
    }

    /// Chebyshev distance in chunks.
    #[inline]
    pub fn range_to(self, other: ChunkCoord) -> u32 {
        let dx = (self.cx - other.cx).unsigned_abs();
        let dy = (self.cy - other.cy).unsigned_abs();
        let dz = (self.cz - other.cz).unsigned_abs();
        dx.max(dy).max(dz)
    }

    /// World position of the chunk's minimum corner node.
    #[inline]
    pub fn origin(self) -> NodePos {
        NodePos::new(self.cx, self.cy, self.cz) * CHUNK_SIZE
    }

    /// Chunk containing the world node `p`.
    #[inline]
    pub fn containing(p: NodePos) -> ChunkCoord {
        ChunkCoord::new(
            p.x.div_euclid(CHUNK_SIZE),
            p.y.div_euclid(CHUNK_SIZE),
            p.z.div_euclid(CHUNK_SIZE),
        )
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

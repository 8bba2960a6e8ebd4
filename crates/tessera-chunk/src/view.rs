use tessera_blocks::{CONTENT_AIR, CONTENT_IGNORE, Node};
use tessera_geom::NodePos;

use crate::coord::{CHUNK_SIZE, ChunkCoord};
use crate::store::VoxelSource;

/// Dig-progress overlay on one node, in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crack {
    pub pos: NodePos,
    pub level: i32,
}

/// Per-request inputs that shape how a chunk is meshed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildParams {
    pub smooth_lighting: bool,
    pub crack: Option<Crack>,
    /// Down-sample factor: 1, 2, 4, 8 or 16.
    pub step: u8,
    pub distance_rank: u32,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            smooth_lighting: true,
            crack: None,
            step: 1,
            distance_rank: 0,
        }
    }
}

impl BuildParams {
    /// Largest supported power of two not above `step`.
    pub fn normalize_step(step: u8) -> u8 {
        let s = step.clamp(1, 16);
        1 << (7 - s.leading_zeros())
    }

    pub fn with_step(mut self, step: u8) -> Self {
        self.step = Self::normalize_step(step);
        self
    }
}

/// Read-only copy of one chunk plus a halo of neighbor cells.
///
/// Positions are chunk-local; `(0,0,0)` is the chunk's minimum corner and the
/// halo extends `halo` nodes past every side. Reads outside the halo return
/// the ignore node.
#[derive(Clone, Debug)]
pub struct VoxelChunkView {
    coord: ChunkCoord,
    size: i32,
    halo: i32,
    dim: i32,
    nodes: Vec<Node>,
    params: BuildParams,
}

impl VoxelChunkView {
    fn layout(params: &mut BuildParams) -> (i32, i32, i32) {
        params.step = BuildParams::normalize_step(params.step);
        let size = CHUNK_SIZE;
        // One down-sampled cell of halo on each side.
        let halo = i32::from(params.step).max(1);
        (size, halo, size + 2 * halo)
    }

    /// Builds a view by evaluating `f` at every local position, halo included.
    pub fn from_fn(
        coord: ChunkCoord,
        mut params: BuildParams,
        mut f: impl FnMut(NodePos) -> Node,
    ) -> Self {
        let (size, halo, dim) = Self::layout(&mut params);
        let mut nodes = Vec::with_capacity((dim * dim * dim) as usize);
        for y in 0..dim {
            for z in 0..dim {
                for x in 0..dim {
                    nodes.push(f(NodePos::new(x - halo, y - halo, z - halo)));
                }
            }
        }
        Self {
            coord,
            size,
            halo,
            dim,
            nodes,
            params,
        }
    }

    /// `inside` for every node of the chunk, `outside` for the halo.
    pub fn filled(coord: ChunkCoord, params: BuildParams, inside: Node, outside: Node) -> Self {
        let size = CHUNK_SIZE;
        Self::from_fn(coord, params, |p| {
            let interior = (0..size).contains(&p.x)
                && (0..size).contains(&p.y)
                && (0..size).contains(&p.z);
            if interior { inside } else { outside }
        })
    }

    /// Copies the chunk and its halo out of `source`.
    pub fn snapshot<S: VoxelSource + ?Sized>(
        source: &S,
        coord: ChunkCoord,
        mut params: BuildParams,
    ) -> Self {
        let (size, halo, dim) = Self::layout(&mut params);
        let min = coord.origin() - NodePos::new(halo, halo, halo);
        let mut nodes = Vec::new();
        source.copy_region(min, NodePos::new(dim, dim, dim), &mut nodes);
        nodes.resize((dim * dim * dim) as usize, Node::IGNORE);
        Self {
            coord,
            size,
            halo,
            dim,
            nodes,
            params,
        }
    }

    #[inline]
    fn idx(&self, p: NodePos) -> Option<usize> {
        let x = p.x + self.halo;
        let y = p.y + self.halo;
        let z = p.z + self.halo;
        if x < 0 || y < 0 || z < 0 || x >= self.dim || y >= self.dim || z >= self.dim {
            return None;
        }
        Some(((y * self.dim + z) * self.dim + x) as usize)
    }

    #[inline]
    pub fn get(&self, p: NodePos) -> Node {
        match self.idx(p) {
            Some(i) => self.nodes[i],
            None => Node::IGNORE,
        }
    }

    /// Writes a node; returns false when `p` is outside the halo.
    pub fn set(&mut self, p: NodePos, n: Node) -> bool {
        match self.idx(p) {
            Some(i) => {
                self.nodes[i] = n;
                true
            }
            None => false,
        }
    }

    /// Node sampled for down-sampled cell `cell` (`cell * step`).
    #[inline]
    pub fn get_cell(&self, cell: NodePos) -> Node {
        self.get(cell * i32::from(self.params.step))
    }

    #[inline]
    pub fn contains_local(&self, p: NodePos) -> bool {
        (0..self.size).contains(&p.x) && (0..self.size).contains(&p.y) && (0..self.size).contains(&p.z)
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Cells per edge after down-sampling.
    #[inline]
    pub fn cells(&self) -> i32 {
        self.size / i32::from(self.params.step)
    }

    #[inline]
    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    #[inline]
    pub fn step(&self) -> u8 {
        self.params.step
    }

    #[inline]
    pub fn smooth_lighting(&self) -> bool {
        self.params.smooth_lighting
    }

    #[inline]
    pub fn distance_rank(&self) -> u32 {
        self.params.distance_rank
    }

    /// Crack position relative to this chunk, if it falls inside it.
    pub fn crack_pos_relative(&self) -> Option<NodePos> {
        let crack = self.params.crack?;
        let rel = crack.pos - self.coord.origin();
        self.contains_local(rel).then_some(rel)
    }

    #[inline]
    pub fn crack_level(&self) -> i32 {
        self.params.crack.map(|c| c.level).unwrap_or(-1)
    }

    /// True when no node inside the chunk (halo excluded) has content.
    pub fn is_all_air(&self) -> bool {
        for y in 0..self.size {
            for z in 0..self.size {
                for x in 0..self.size {
                    let c = self.get(NodePos::new(x, y, z)).content;
                    if c != CONTENT_AIR && c != CONTENT_IGNORE {
                        return false;
                    }
                }
            }
        }
        true
    }
}

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use tessera_blocks::types::{LIGHT_MAX, LIGHT_SUN};
use tessera_blocks::{ContentId, LightBank, Node, NodeRegistry};
use tessera_chunk::{ChunkCoord, ChunkStore};
use tessera_geom::NodePos;

#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    #[error("terrain needs node '{0}' but it is not defined")]
    MissingNode(&'static str),
}

/// Content ids the generator places. Decorations are skipped when the
/// registry does not define them.
#[derive(Clone, Copy, Debug)]
struct Palette {
    stone: ContentId,
    dirt: ContentId,
    grass: ContentId,
    sand: ContentId,
    water: ContentId,
    glass: Option<ContentId>,
    tallgrass: Option<ContentId>,
    torch: Option<ContentId>,
    fence: Option<ContentId>,
    slab: Option<ContentId>,
}

impl Palette {
    fn resolve(reg: &NodeRegistry) -> Result<Self, TerrainError> {
        let need = |name: &'static str| reg.id_by_name(name).ok_or(TerrainError::MissingNode(name));
        let stone = need("stone")?;
        Ok(Self {
            stone,
            dirt: need("dirt")?,
            grass: need("grass")?,
            sand: reg.id_by_name("sand").unwrap_or(stone),
            water: need("water")?,
            glass: reg.id_by_name("glass"),
            tallgrass: reg.id_by_name("tallgrass"),
            torch: reg.id_by_name("torch"),
            fence: reg.id_by_name("fence"),
            slab: reg.id_by_name("slab"),
        })
    }
}

/// Air or any other node that lets daylight through, lit by the sky.
pub fn sunlit(mut n: Node) -> Node {
    n.set_light(LightBank::Day, LIGHT_SUN);
    n
}

fn column_hash(x: i32, z: i32, seed: i32) -> u32 {
    // FNV-1a over the column coordinates
    let mut h: u32 = 0x811c_9dc5;
    for v in [x, z, seed] {
        for b in v.to_le_bytes() {
            h ^= u32::from(b);
            h = h.wrapping_mul(0x0100_0193);
        }
    }
    h
}

/// Heightmap world: stone under a few layers of dirt, grass or sand on top,
/// a water table at `sea_level`, and scattered special nodes.
pub struct DemoTerrain {
    noise: FastNoiseLite,
    palette: Palette,
    seed: i32,
    sea_level: i32,
}

impl DemoTerrain {
    pub fn new(reg: &NodeRegistry, seed: i32) -> Result<Self, TerrainError> {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(4));
        noise.set_frequency(Some(0.012));
        Ok(Self {
            noise,
            palette: Palette::resolve(reg)?,
            seed,
            sea_level: 2,
        })
    }

    #[inline]
    pub fn sea_level(&self) -> i32 {
        self.sea_level
    }

    /// Surface height of the column at `(x, z)`.
    pub fn height(&self, x: i32, z: i32) -> i32 {
        let n = self.noise.get_noise_2d(x as f32, z as f32);
        (6.0 + n * 14.0).floor() as i32
    }

    pub fn node_at(&self, p: NodePos) -> Node {
        let h = self.height(p.x, p.z);
        let pal = &self.palette;
        if p.y > h {
            if p.y <= self.sea_level {
                let depth = (self.sea_level - p.y) as u8;
                let mut n = Node::new(pal.water);
                n.set_light(LightBank::Day, LIGHT_MAX.saturating_sub(depth.saturating_mul(2)));
                return n;
            }
            if p.y == h + 1 && h >= self.sea_level {
                if let Some(id) = self.decoration(p.x, p.z) {
                    return sunlit(Node::with_params(id, 0, self.decoration_param2(id)));
                }
            }
            return sunlit(Node::AIR);
        }
        let id = if p.y == h {
            if h <= self.sea_level + 1 { pal.sand } else { pal.grass }
        } else if p.y > h - 3 {
            if h <= self.sea_level + 1 { pal.sand } else { pal.dirt }
        } else {
            pal.stone
        };
        Node::new(id)
    }

    fn decoration(&self, x: i32, z: i32) -> Option<ContentId> {
        let pal = &self.palette;
        match column_hash(x, z, self.seed) % 1000 {
            0..=79 => pal.tallgrass,
            80..=87 => pal.torch,
            88..=97 => pal.fence,
            98..=103 => pal.glass,
            104..=107 => pal.slab,
            _ => None,
        }
    }

    fn decoration_param2(&self, id: ContentId) -> u8 {
        // Torches stand on the floor.
        if Some(id) == self.palette.torch { 1 } else { 0 }
    }

    /// Generates `coord` into `store`, replacing anything already there.
    pub fn generate(&self, store: &ChunkStore, coord: ChunkCoord) {
        let origin = coord.origin();
        store.insert_with(coord, |local| self.node_at(origin + local));
    }
}

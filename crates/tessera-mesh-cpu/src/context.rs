use std::sync::{Arc, Mutex};

use fastnoise_lite::{FastNoiseLite, NoiseType};
use hashbrown::HashSet;
use tessera_blocks::{LayerId, NodeFeatures, NodeRegistry};
use tessera_chunk::ChunkCoord;
use tessera_lighting::LightCurve;

use crate::face::TileRotation;
use crate::mesh_build::{TileKey, TileSpec};

/// Shared, read-mostly services every mesh build needs.
///
/// Created once and handed to workers behind an `Arc`.
pub struct MeshContext {
    registry: Arc<NodeRegistry>,
    curve: LightCurve,
    noise: FastNoiseLite,
    desync_animation: bool,
    warned: Mutex<HashSet<String>>,
}

impl MeshContext {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        let mut noise = FastNoiseLite::with_seed(0);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.37));
        Self {
            registry,
            curve: LightCurve::default(),
            noise,
            desync_animation: true,
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_light_gamma(mut self, gamma: f32) -> Self {
        self.curve = LightCurve::new(gamma);
        self
    }

    pub fn with_desync_animation(mut self, on: bool) -> Self {
        self.desync_animation = on;
        self
    }

    #[inline]
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_arc(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    #[inline]
    pub fn curve(&self) -> &LightCurve {
        &self.curve
    }

    /// Frame offset for animated tiles of the chunk at `coord`.
    pub fn animation_offset(&self, coord: ChunkCoord) -> i64 {
        if !self.desync_animation {
            return 0;
        }
        let n = self
            .noise
            .get_noise_3d(coord.cx as f32, coord.cy as f32, coord.cz as f32);
        (100_000.0 * (2.0 + f64::from(n))) as i64
    }

    /// Logs `msg` the first time `key` is seen by this context.
    pub(crate) fn warn_once(&self, key: &str, msg: impl FnOnce() -> String) {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        if warned.contains(key) {
            return;
        }
        warned.insert(key.to_string());
        log::warn!(target: "mesh", "{}", msg());
    }

    /// Resolves a node's layer into a drawable tile; unresolved layers skip the face.
    ///
    /// `layer_name` is the configured tile key; warnings are keyed on it so a
    /// missing layer shared by many nodes is reported once.
    pub(crate) fn tile_spec(
        &self,
        f: &NodeFeatures,
        layer: Option<LayerId>,
        layer_name: &str,
        cracked: bool,
    ) -> Option<TileSpec> {
        let resolved = layer.and_then(|id| self.registry.layer(id).map(|l| (id, l)));
        let Some((id, mat)) = resolved else {
            if layer_name.is_empty() {
                self.warn_once(&format!("node:{}", f.name), || {
                    format!("node '{}' has no tiles; skipping its faces", f.name)
                });
            } else {
                self.warn_once(layer_name, || {
                    format!("layer '{layer_name}' is not available; skipping faces that use it")
                });
            }
            return None;
        };
        Some(TileSpec {
            key: TileKey {
                layer: id,
                blend: mat.blend,
                crack: cracked && mat.crackable,
                backface_culling: mat.backface_culling && f.backface_culling,
            },
            rotation: TileRotation::R0,
            alpha: f.alpha,
        })
    }

    #[cfg(test)]
    pub(crate) fn warned_count(&self) -> usize {
        self.warned.lock().map(|w| w.len()).unwrap_or(0)
    }
}

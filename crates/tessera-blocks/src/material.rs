use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RegistryError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u16);

impl LayerId {
    /// Built-in layer drawn for nodes without a definition.
    pub const UNKNOWN: LayerId = LayerId(0);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Alpha-tested; no ordering needed.
    Clip,
    /// Alpha-blended; goes through the transparency sorter.
    Blend,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileAnimation {
    pub frame_count: u16,
    pub frame_length_ms: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialLayer {
    pub id: LayerId,
    pub key: String,
    pub texture: PathBuf,
    pub blend: BlendMode,
    pub animation: Option<TileAnimation>,
    /// Whether dig-crack overlays may be drawn on this layer.
    pub crackable: bool,
    pub backface_culling: bool,
    pub tileable_horizontal: bool,
    pub tileable_vertical: bool,
    pub color: Option<[u8; 3]>,
}

impl MaterialLayer {
    fn unknown() -> Self {
        MaterialLayer {
            id: LayerId::UNKNOWN,
            key: String::new(),
            texture: PathBuf::from("unknown_node.png"),
            blend: BlendMode::Opaque,
            animation: None,
            crackable: true,
            backface_culling: true,
            tileable_horizontal: true,
            tileable_vertical: true,
            color: None,
        }
    }

    #[inline]
    pub fn is_translucent(&self) -> bool {
        self.blend == BlendMode::Blend
    }
}

#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    pub layers: Vec<MaterialLayer>,
    pub by_key: HashMap<String, LayerId>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self {
            layers: vec![MaterialLayer::unknown()],
            by_key: HashMap::new(),
        }
    }

    #[inline]
    pub fn get(&self, id: LayerId) -> Option<&MaterialLayer> {
        self.layers.get(id.0 as usize)
    }

    /// Looks up a layer by its configured key.
    pub fn resolve(&self, key: &str) -> Option<LayerId> {
        self.by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.len() <= 1
    }

    pub fn from_config(cfg: MaterialsConfig) -> Result<Self, RegistryError> {
        let mut catalog = MaterialCatalog::new();
        let mut entries: Vec<(String, MaterialEntry)> = cfg.materials.into_iter().collect();
        // Stable ids regardless of map iteration order.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, entry) in entries {
            let id = LayerId(catalog.layers.len() as u16);
            let layer = match entry {
                MaterialEntry::Texture(path) => MaterialLayer {
                    id,
                    key: key.clone(),
                    texture: PathBuf::from(path),
                    ..MaterialLayer::unknown()
                },
                MaterialEntry::Detail(d) => {
                    let animation = match d.animation {
                        Some(a) if a.frames == 0 || a.frame_ms == 0 => {
                            return Err(RegistryError::InvalidAnimation { key });
                        }
                        Some(a) => Some(TileAnimation {
                            frame_count: a.frames,
                            frame_length_ms: a.frame_ms,
                        }),
                        None => None,
                    };
                    MaterialLayer {
                        id,
                        key: key.clone(),
                        texture: PathBuf::from(d.texture),
                        blend: d.blend.unwrap_or_default(),
                        animation,
                        crackable: d.crackable.unwrap_or(true),
                        backface_culling: d.backface_culling.unwrap_or(true),
                        tileable_horizontal: d.tileable_horizontal.unwrap_or(true),
                        tileable_vertical: d.tileable_vertical.unwrap_or(true),
                        color: d.color,
                    }
                }
            };
            catalog.by_key.insert(key, id);
            catalog.layers.push(layer);
        }
        Ok(catalog)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: MaterialsConfig = toml::from_str(toml_str)?;
        Ok(Self::from_config(cfg)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

// --- Config ---

#[derive(Deserialize, Debug, Default)]
pub struct MaterialsConfig {
    #[serde(default)]
    pub materials: HashMap<String, MaterialEntry>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum MaterialEntry {
    // stone = "textures/stone.png"
    Texture(String),
    // water = { texture = "...", blend = "blend", animation = { frames = 8, frame_ms = 200 } }
    Detail(MaterialDetail),
}

#[derive(Deserialize, Debug, Clone)]
pub struct MaterialDetail {
    pub texture: String,
    #[serde(default)]
    pub blend: Option<BlendMode>,
    #[serde(default)]
    pub animation: Option<AnimationDef>,
    #[serde(default)]
    pub crackable: Option<bool>,
    #[serde(default)]
    pub backface_culling: Option<bool>,
    #[serde(default)]
    pub tileable_horizontal: Option<bool>,
    #[serde(default)]
    pub tileable_vertical: Option<bool>,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct AnimationDef {
    pub frames: u16,
    pub frame_ms: u32,
}

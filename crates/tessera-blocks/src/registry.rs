use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use tessera_geom::{Aabb, Vec3};

use crate::config::{NodeDef, NodesConfig};
use crate::error::RegistryError;
use crate::material::{LayerId, MaterialCatalog, MaterialLayer};
use crate::types::{
    CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN, ContentId, DrawType, Face, LightBank, LiquidKind,
    Node, Param2Kind,
};

/// Resolved, immutable per-content visual properties.
#[derive(Clone, Debug)]
pub struct NodeFeatures {
    pub name: String,
    pub drawtype: DrawType,
    pub solidness: u8,
    pub visual_solidness: u8,
    pub backface_culling: bool,
    pub light_propagates: bool,
    pub sunlight_propagates: bool,
    pub light_source: u8,
    /// `None` when the configured tile key did not resolve.
    pub tiles: [Option<LayerId>; 6],
    /// Configured tile keys, parallel to `tiles`; empty when none was given.
    pub tile_names: [String; 6],
    pub special_tiles: Vec<Option<LayerId>>,
    pub special_tile_names: Vec<String>,
    pub liquid: LiquidKind,
    pub liquid_group: Option<u16>,
    pub param2: Param2Kind,
    pub alpha: u8,
    pub visual_scale: f32,
    pub node_boxes: Vec<Aabb>,
}

impl NodeFeatures {
    fn airlike(name: &str, light_propagates: bool) -> Self {
        NodeFeatures {
            name: name.to_string(),
            drawtype: DrawType::Airlike,
            solidness: 0,
            visual_solidness: 0,
            backface_culling: true,
            light_propagates,
            sunlight_propagates: light_propagates,
            light_source: 0,
            tiles: [None; 6],
            tile_names: Default::default(),
            special_tiles: Vec::new(),
            special_tile_names: Vec::new(),
            liquid: LiquidKind::None,
            liquid_group: None,
            param2: Param2Kind::None,
            alpha: 255,
            visual_scale: 1.0,
            node_boxes: Vec::new(),
        }
    }

    fn unknown() -> Self {
        NodeFeatures {
            drawtype: DrawType::Normal,
            solidness: 2,
            light_propagates: false,
            sunlight_propagates: false,
            tiles: [Some(LayerId::UNKNOWN); 6],
            ..NodeFeatures::airlike("unknown", false)
        }
    }

    #[inline]
    pub fn is_liquid(&self) -> bool {
        self.liquid != LiquidKind::None
    }

    /// Source and flowing forms of the same liquid.
    #[inline]
    pub fn same_liquid(&self, other: &NodeFeatures) -> bool {
        self.is_liquid()
            && other.is_liquid()
            && self.liquid_group.is_some()
            && self.liquid_group == other.liquid_group
    }

    #[inline]
    pub fn tile(&self, face: Face) -> Option<LayerId> {
        self.tiles[face.index()]
    }

    #[inline]
    pub fn special_tile(&self, i: usize) -> Option<LayerId> {
        self.special_tiles.get(i).copied().flatten()
    }

    #[inline]
    pub fn tile_name(&self, face: Face) -> &str {
        &self.tile_names[face.index()]
    }

    pub fn special_tile_name(&self, i: usize) -> &str {
        self.special_tile_names.get(i).map_or("", String::as_str)
    }

    /// Brightest of the stored light and the node's own emission.
    #[inline]
    pub fn light(&self, n: Node, bank: LightBank) -> u8 {
        let stored = if self.light_propagates {
            n.raw_light(bank)
        } else {
            0
        };
        stored.max(self.light_source)
    }
}

#[derive(Clone, Debug)]
pub struct NodeRegistry {
    pub materials: MaterialCatalog,
    pub nodes: Vec<NodeFeatures>,
    pub by_name: HashMap<String, ContentId>,
    pub liquid_groups: Vec<String>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new(MaterialCatalog::new())
    }
}

impl NodeRegistry {
    /// Registry holding only the built-in air, ignore and unknown nodes.
    pub fn new(materials: MaterialCatalog) -> Self {
        let nodes = vec![
            NodeFeatures::airlike("air", true),
            NodeFeatures::airlike("ignore", false),
            NodeFeatures::unknown(),
        ];
        let by_name = nodes
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i as ContentId))
            .collect();
        debug_assert_eq!(nodes[CONTENT_AIR as usize].name, "air");
        debug_assert_eq!(nodes[CONTENT_IGNORE as usize].name, "ignore");
        debug_assert_eq!(nodes[CONTENT_UNKNOWN as usize].name, "unknown");
        Self {
            materials,
            nodes,
            by_name,
            liquid_groups: Vec::new(),
        }
    }

    /// Features for `content`; undefined ids resolve to the unknown node.
    #[inline]
    pub fn get(&self, content: ContentId) -> &NodeFeatures {
        self.nodes
            .get(content as usize)
            .unwrap_or(&self.nodes[CONTENT_UNKNOWN as usize])
    }

    #[inline]
    pub fn features(&self, n: Node) -> &NodeFeatures {
        self.get(n.content)
    }

    pub fn id_by_name(&self, name: &str) -> Option<ContentId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn layer(&self, id: LayerId) -> Option<&MaterialLayer> {
        self.materials.get(id)
    }

    pub fn load_from_paths(
        materials_path: impl AsRef<Path>,
        nodes_path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn Error>> {
        let materials = MaterialCatalog::from_path(materials_path)?;
        let nodes_toml = fs::read_to_string(nodes_path)?;
        let cfg: NodesConfig = toml::from_str(&nodes_toml)?;
        Ok(Self::from_configs(materials, cfg)?)
    }

    pub fn from_toml_strs(materials_toml: &str, nodes_toml: &str) -> Result<Self, Box<dyn Error>> {
        let materials = MaterialCatalog::from_toml_str(materials_toml)?;
        let cfg: NodesConfig = toml::from_str(nodes_toml)?;
        Ok(Self::from_configs(materials, cfg)?)
    }

    pub fn from_configs(
        materials: MaterialCatalog,
        cfg: NodesConfig,
    ) -> Result<Self, RegistryError> {
        let mut reg = NodeRegistry::new(materials);
        for def in cfg.nodes {
            reg.register(def)?;
        }
        Ok(reg)
    }

    /// Compiles and appends one definition, returning its content id.
    pub fn register(&mut self, def: NodeDef) -> Result<ContentId, RegistryError> {
        if matches!(def.name.as_str(), "air" | "ignore" | "unknown") {
            return Err(RegistryError::ReservedName(def.name));
        }
        if self.by_name.contains_key(&def.name) {
            return Err(RegistryError::DuplicateNode(def.name));
        }
        if self.nodes.len() > ContentId::MAX as usize {
            return Err(RegistryError::TooManyNodes {
                limit: ContentId::MAX as usize,
            });
        }
        let liquid = match (def.drawtype, def.liquid) {
            (DrawType::Liquid, None | Some(LiquidKind::Source)) => LiquidKind::Source,
            (DrawType::Liquid, Some(_)) => {
                return Err(RegistryError::LiquidMismatch {
                    node: def.name,
                    drawtype: "liquid",
                    expected: "source",
                });
            }
            (DrawType::FlowingLiquid, None | Some(LiquidKind::Flowing)) => LiquidKind::Flowing,
            (DrawType::FlowingLiquid, Some(_)) => {
                return Err(RegistryError::LiquidMismatch {
                    node: def.name,
                    drawtype: "flowing_liquid",
                    expected: "flowing",
                });
            }
            (_, kind) => kind.unwrap_or_default(),
        };
        if def.drawtype == DrawType::Nodebox && def.node_boxes.is_empty() {
            return Err(RegistryError::EmptyNodebox { node: def.name });
        }

        let liquid_group = match (&def.liquid_group, liquid) {
            (Some(group), kind) if kind != LiquidKind::None => Some(self.intern_liquid_group(group)),
            _ => None,
        };
        let (solidness, visual_solidness) = def.drawtype.solidness();
        let backface_culling = !matches!(
            def.drawtype,
            DrawType::Liquid | DrawType::Plantlike | DrawType::Fencelike
        );
        let tiles = self.resolve_tiles(&def.name, &def.tiles);
        let tile_names = std::array::from_fn(|i| {
            def.tiles
                .get(i)
                .or(def.tiles.last())
                .cloned()
                .unwrap_or_default()
        });
        let special_tiles = def
            .special_tiles
            .iter()
            .map(|k| self.resolve_tile(&def.name, k))
            .collect();
        let node_boxes = def
            .node_boxes
            .iter()
            .map(|b| {
                let a = Vec3::new(b[0], b[1], b[2]);
                let c = Vec3::new(b[3], b[4], b[5]);
                Aabb::new(a.min(c), a.max(c))
            })
            .collect();
        let param2 = def.param2.unwrap_or(match def.drawtype {
            DrawType::FlowingLiquid => Param2Kind::Level,
            DrawType::Torchlike | DrawType::Signlike => Param2Kind::Wallmounted,
            _ => Param2Kind::None,
        });

        let id = self.nodes.len() as ContentId;
        let features = NodeFeatures {
            name: def.name.clone(),
            drawtype: def.drawtype,
            solidness,
            visual_solidness,
            backface_culling,
            light_propagates: def
                .light_propagates
                .unwrap_or(def.drawtype != DrawType::Normal),
            sunlight_propagates: def
                .sunlight_propagates
                .unwrap_or(def.drawtype == DrawType::Airlike),
            light_source: def.light_source.unwrap_or(0).min(crate::types::LIGHT_MAX),
            tiles,
            tile_names,
            special_tiles,
            special_tile_names: def.special_tiles.clone(),
            liquid,
            liquid_group,
            param2,
            alpha: def.alpha.unwrap_or(255),
            visual_scale: def.visual_scale.unwrap_or(1.0),
            node_boxes,
        };
        self.nodes.push(features);
        self.by_name.insert(def.name, id);
        Ok(id)
    }

    fn intern_liquid_group(&mut self, group: &str) -> u16 {
        if let Some(i) = self.liquid_groups.iter().position(|g| g == group) {
            return i as u16;
        }
        self.liquid_groups.push(group.to_string());
        (self.liquid_groups.len() - 1) as u16
    }

    fn resolve_tile(&self, node: &str, key: &str) -> Option<LayerId> {
        let id = self.materials.resolve(key);
        if id.is_none() {
            log::warn!(target: "registry", "node {node}: unknown tile '{key}'");
        }
        id
    }

    fn resolve_tiles(&self, node: &str, keys: &[String]) -> [Option<LayerId>; 6] {
        let mut out = [None; 6];
        let resolved: Vec<Option<LayerId>> = keys
            .iter()
            .take(6)
            .map(|k| self.resolve_tile(node, k))
            .collect();
        let Some(last) = resolved.last().copied() else {
            return out;
        };
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = resolved.get(i).copied().unwrap_or(last);
        }
        out
    }
}

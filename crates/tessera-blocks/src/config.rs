use serde::Deserialize;

use crate::types::{DrawType, LiquidKind, Param2Kind};

// Top-level nodes config file
#[derive(Deserialize, Debug, Default)]
pub struct NodesConfig {
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NodeDef {
    pub name: String,
    #[serde(default = "default_drawtype")]
    pub drawtype: DrawType,
    // Tile keys in up, down, right, left, back, front order; missing entries
    // repeat the last one given.
    #[serde(default)]
    pub tiles: Vec<String>,
    // Extra surfaces, e.g. the flowing-liquid texture.
    #[serde(default)]
    pub special_tiles: Vec<String>,
    #[serde(default)]
    pub light_source: Option<u8>,
    #[serde(default)]
    pub light_propagates: Option<bool>,
    #[serde(default)]
    pub sunlight_propagates: Option<bool>,
    #[serde(default)]
    pub liquid: Option<LiquidKind>,
    // Source and flowing forms of one liquid share a group name.
    #[serde(default)]
    pub liquid_group: Option<String>,
    #[serde(default)]
    pub param2: Option<Param2Kind>,
    #[serde(default)]
    pub alpha: Option<u8>,
    #[serde(default)]
    pub visual_scale: Option<f32>,
    // Boxes as [min_x, min_y, min_z, max_x, max_y, max_z] in node units
    // centered on the node (-0.5..0.5).
    #[serde(default)]
    pub node_boxes: Vec<[f32; 6]>,
}

fn default_drawtype() -> DrawType {
    DrawType::Normal
}

impl NodeDef {
    /// Minimal definition used by tests and built-ins.
    pub fn simple(name: impl Into<String>, drawtype: DrawType, tiles: &[&str]) -> Self {
        NodeDef {
            name: name.into(),
            drawtype,
            tiles: tiles.iter().map(|s| s.to_string()).collect(),
            special_tiles: Vec::new(),
            light_source: None,
            light_propagates: None,
            sunlight_propagates: None,
            liquid: None,
            liquid_group: None,
            param2: None,
            alpha: None,
            visual_scale: None,
            node_boxes: Vec::new(),
        }
    }
}

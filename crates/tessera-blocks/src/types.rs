use serde::Deserialize;
use tessera_geom::{NodePos, Vec3};

pub type ContentId = u16;

pub const CONTENT_AIR: ContentId = 0;
/// Placeholder for cells whose data is not available (unloaded neighbors).
pub const CONTENT_IGNORE: ContentId = 1;
/// Stand-in for content ids with no definition.
pub const CONTENT_UNKNOWN: ContentId = 2;

pub const LIGHT_MAX: u8 = 14;
pub const LIGHT_SUN: u8 = 15;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LightBank {
    Day,
    Night,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Node {
    pub content: ContentId,
    /// Light nibbles (day low, night high) for light-carrying nodes.
    pub param1: u8,
    pub param2: u8,
}

impl Node {
    pub const AIR: Node = Node::new(CONTENT_AIR);
    pub const IGNORE: Node = Node::new(CONTENT_IGNORE);

    #[inline]
    pub const fn new(content: ContentId) -> Self {
        Self {
            content,
            param1: 0,
            param2: 0,
        }
    }

    #[inline]
    pub const fn with_params(content: ContentId, param1: u8, param2: u8) -> Self {
        Self {
            content,
            param1,
            param2,
        }
    }

    #[inline]
    pub fn raw_light(self, bank: LightBank) -> u8 {
        match bank {
            LightBank::Day => self.param1 & 0x0f,
            LightBank::Night => (self.param1 >> 4) & 0x0f,
        }
    }

    #[inline]
    pub fn set_light(&mut self, bank: LightBank, level: u8) {
        let level = level.min(LIGHT_SUN);
        self.param1 = match bank {
            LightBank::Day => (self.param1 & 0xf0) | level,
            LightBank::Night => (self.param1 & 0x0f) | (level << 4),
        };
    }

    /// Facedir rotation in `[0, 24)`; out-of-range values read as 0.
    #[inline]
    pub fn facedir(self) -> u8 {
        let d = self.param2 & 0x1f;
        if d > 23 { 0 } else { d }
    }

    /// Wallmounted direction index in `[0, 6)`: 0 = ceiling, 1 = floor, 2..=5 = walls.
    #[inline]
    pub fn wallmounted(self) -> u8 {
        let d = self.param2 & 0x07;
        if d > 5 { 1 } else { d }
    }

    /// Flowing liquid level in `[0, 7]`.
    #[inline]
    pub fn liquid_level(self) -> u8 {
        self.param2 & 0x07
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawType {
    Normal,
    Airlike,
    Liquid,
    FlowingLiquid,
    Glasslike,
    Allfaces,
    Plantlike,
    Torchlike,
    Signlike,
    Fencelike,
    Raillike,
    Nodebox,
}

impl DrawType {
    /// `(solidness, visual_solidness)` used by the face-exposure test.
    #[inline]
    pub fn solidness(self) -> (u8, u8) {
        match self {
            DrawType::Normal => (2, 0),
            DrawType::Liquid => (1, 0),
            DrawType::Glasslike | DrawType::Allfaces => (0, 1),
            _ => (0, 0),
        }
    }

    /// Drawtypes handled by per-node generators instead of the greedy mesher.
    #[inline]
    pub fn is_special(self) -> bool {
        !matches!(self, DrawType::Normal | DrawType::Liquid | DrawType::Airlike)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidKind {
    #[default]
    None,
    Source,
    Flowing,
}

/// Interpretation of `param2`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param2Kind {
    #[default]
    None,
    Facedir,
    Wallmounted,
    Level,
}

/// Cube face in tile order: up, down, right, left, back, front.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Falls back to `PosY` for out-of-range indices.
    #[inline]
    pub fn from_index(i: usize) -> Face {
        Face::ALL.get(i).copied().unwrap_or(Face::PosY)
    }

    #[inline]
    pub fn delta(self) -> NodePos {
        match self {
            Face::PosY => NodePos::new(0, 1, 0),
            Face::NegY => NodePos::new(0, -1, 0),
            Face::PosX => NodePos::new(1, 0, 0),
            Face::NegX => NodePos::new(-1, 0, 0),
            Face::PosZ => NodePos::new(0, 0, 1),
            Face::NegZ => NodePos::new(0, 0, -1),
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        Vec3::from(self.delta())
    }

    #[inline]
    pub fn opposite(self) -> Face {
        match self {
            Face::PosY => Face::NegY,
            Face::NegY => Face::PosY,
            Face::PosX => Face::NegX,
            Face::NegX => Face::PosX,
            Face::PosZ => Face::NegZ,
            Face::NegZ => Face::PosZ,
        }
    }

    /// Inverse of `delta` for the six unit directions.
    pub fn from_delta(d: NodePos) -> Option<Face> {
        Face::ALL.into_iter().find(|f| f.delta() == d)
    }
}

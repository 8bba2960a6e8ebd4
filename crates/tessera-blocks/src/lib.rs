//! Node features, material layers, and the registry that resolves them.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod material;
pub mod registry;
pub mod types;

pub use error::RegistryError;
pub use material::{BlendMode, LayerId, MaterialCatalog, MaterialLayer, TileAnimation};
pub use registry::{NodeFeatures, NodeRegistry};
pub use types::{
    CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN, ContentId, DrawType, Face, LightBank,
    LiquidKind, Node, Param2Kind,
};

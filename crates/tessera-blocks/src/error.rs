use thiserror::Error;

/// Errors raised while compiling node and material definitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("node name is reserved: {0}")]
    ReservedName(String),

    #[error("too many node definitions (limit {limit})")]
    TooManyNodes { limit: usize },

    #[error("node {node}: drawtype {drawtype} requires liquid = \"{expected}\"")]
    LiquidMismatch {
        node: String,
        drawtype: &'static str,
        expected: &'static str,
    },

    #[error("node {node}: nodebox drawtype needs at least one box")]
    EmptyNodebox { node: String },

    #[error("material {key}: animation needs at least one frame and a positive frame length")]
    InvalidAnimation { key: String },
}

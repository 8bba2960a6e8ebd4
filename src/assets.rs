use std::error::Error;
use std::fs;
use std::path::Path;

use tessera_blocks::NodeRegistry;

pub const DEFAULT_MATERIALS: &str = include_str!("../assets/materials.toml");
pub const DEFAULT_NODES: &str = include_str!("../assets/nodes.toml");

/// Loads the registry from the given files, falling back to the embedded
/// definitions for whichever is not given.
pub fn load_registry(
    materials: Option<&Path>,
    nodes: Option<&Path>,
) -> Result<NodeRegistry, Box<dyn Error>> {
    let materials_toml = match materials {
        Some(p) => read(p)?,
        None => DEFAULT_MATERIALS.to_string(),
    };
    let nodes_toml = match nodes {
        Some(p) => read(p)?,
        None => DEFAULT_NODES.to_string(),
    };
    let reg = NodeRegistry::from_toml_strs(&materials_toml, &nodes_toml)?;
    log::info!(
        target: "registry",
        "loaded nodes={} layers={} materials={} node_defs={}",
        reg.nodes.len(),
        reg.materials.len(),
        materials.map_or("<builtin>".into(), |p| p.display().to_string()),
        nodes.map_or("<builtin>".into(), |p| p.display().to_string()),
    );
    Ok(reg)
}

fn read(path: &Path) -> Result<String, Box<dyn Error>> {
    fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()).into())
}

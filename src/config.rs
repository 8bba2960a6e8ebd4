use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessera_chunk::CHUNK_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TesseraConfig {
    /// Node definitions file; the embedded set when absent.
    #[serde(default)]
    pub nodes: Option<PathBuf>,
    #[serde(default)]
    pub materials: Option<PathBuf>,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub mesh: MeshSection,
    #[serde(default)]
    pub demo: DemoSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    /// 0 picks a count from the machine's cores.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_drain_budget_ms")]
    pub drain_budget_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results_per_frame: usize,
    /// Chunk range where far meshes start; 0 disables them.
    #[serde(default)]
    pub farmesh: u32,
    #[serde(default = "default_farmesh_step")]
    pub farmesh_step: u32,
}
fn default_drain_budget_ms() -> u64 { 4 }
fn default_max_results() -> usize { 64 }
fn default_farmesh_step() -> u32 { 4 }
impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            workers: 0,
            drain_budget_ms: default_drain_budget_ms(),
            max_results_per_frame: default_max_results(),
            farmesh: 0,
            farmesh_step: default_farmesh_step(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshSection {
    #[serde(default = "default_true")]
    pub smooth_lighting: bool,
    #[serde(default = "default_light_gamma")]
    pub light_gamma: f32,
    #[serde(default = "default_true")]
    pub desync_animation: bool,
    /// Accepted for documentation; chunks are always 16 nodes wide.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i32,
}
fn default_true() -> bool { true }
fn default_light_gamma() -> f32 { 2.2 }
fn default_chunk_size() -> i32 { CHUNK_SIZE }
impl Default for MeshSection {
    fn default() -> Self {
        Self {
            smooth_lighting: true,
            light_gamma: default_light_gamma(),
            desync_animation: true,
            chunk_size: CHUNK_SIZE,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoSection {
    /// Horizontal chunk radius loaded around the camera.
    #[serde(default = "default_radius")]
    pub radius: u32,
    /// Chunk layers stacked from y = -1 upward.
    #[serde(default = "default_layers")]
    pub layers: u32,
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Simulated frame length.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_day_length")]
    pub day_length_s: f32,
    /// Frames between simulated digs next to the camera; 0 disables digging.
    #[serde(default = "default_dig_every")]
    pub dig_every: u32,
    /// Camera speed along its path, nodes per second.
    #[serde(default = "default_camera_speed")]
    pub camera_speed: f32,
}
fn default_radius() -> u32 { 3 }
fn default_layers() -> u32 { 3 }
fn default_frames() -> u32 { 300 }
fn default_frame_ms() -> u32 { 16 }
fn default_seed() -> i32 { 1337 }
fn default_day_length() -> f32 { 120.0 }
fn default_dig_every() -> u32 { 45 }
fn default_camera_speed() -> f32 { 6.0 }
impl Default for DemoSection {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            layers: default_layers(),
            frames: default_frames(),
            frame_ms: default_frame_ms(),
            seed: default_seed(),
            day_length_s: default_day_length(),
            dig_every: default_dig_every(),
            camera_speed: default_camera_speed(),
        }
    }
}

impl TesseraConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml_str(&s)?;
        // Relative asset paths are relative to the config file.
        if let Some(dir) = path.parent() {
            for p in [&mut cfg.nodes, &mut cfg.materials].into_iter().flatten() {
                if p.is_relative() {
                    *p = dir.join(&*p);
                }
            }
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mesh.chunk_size != CHUNK_SIZE {
            return Err(invalid(
                "mesh.chunk_size",
                format!("only {CHUNK_SIZE} is supported, got {}", self.mesh.chunk_size),
            ));
        }
        if !(self.mesh.light_gamma.is_finite() && self.mesh.light_gamma > 0.0) {
            return Err(invalid("mesh.light_gamma", "must be a positive number"));
        }
        if self.scheduler.max_results_per_frame == 0 {
            return Err(invalid("scheduler.max_results_per_frame", "must be at least 1"));
        }
        if self.scheduler.farmesh > 0 && self.scheduler.farmesh_step == 0 {
            return Err(invalid("scheduler.farmesh_step", "must be at least 1 when farmesh is on"));
        }
        if self.demo.frame_ms == 0 {
            return Err(invalid("demo.frame_ms", "must be at least 1"));
        }
        if self.demo.layers == 0 {
            return Err(invalid("demo.layers", "must be at least 1"));
        }
        if !(self.demo.day_length_s.is_finite() && self.demo.day_length_s > 0.0) {
            return Err(invalid("demo.day_length_s", "must be a positive number"));
        }
        Ok(())
    }
}

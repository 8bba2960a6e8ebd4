mod app;
mod assets;
mod config;
mod day_cycle;
mod scene;
mod terrain;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::app::App;
use crate::config::TesseraConfig;

/// Headless chunk meshing driver: streams a generated world through the
/// background mesher and animates the results.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about)]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Node definitions overriding the built-in set.
    #[arg(long)]
    nodes: Option<PathBuf>,
    /// Material layers overriding the built-in set.
    #[arg(long)]
    materials: Option<PathBuf>,
    /// Mesh worker threads (0 = pick from core count).
    #[arg(long)]
    workers: Option<usize>,
    /// Chunk radius around the camera to load and mesh.
    #[arg(long)]
    radius: Option<u32>,
    #[arg(long)]
    frames: Option<u32>,
    #[arg(long)]
    seed: Option<i32>,
    /// Chunk range where down-sampled far meshes start (0 = off).
    #[arg(long)]
    farmesh: Option<u32>,
    #[arg(long)]
    no_smooth_lighting: bool,
    /// Default log filter; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log: String,
}

impl Cli {
    fn apply(&self, cfg: &mut TesseraConfig) {
        if let Some(p) = &self.nodes {
            cfg.nodes = Some(p.clone());
        }
        if let Some(p) = &self.materials {
            cfg.materials = Some(p.clone());
        }
        if let Some(w) = self.workers {
            cfg.scheduler.workers = w;
        }
        if let Some(r) = self.radius {
            cfg.demo.radius = r;
        }
        if let Some(f) = self.frames {
            cfg.demo.frames = f;
        }
        if let Some(s) = self.seed {
            cfg.demo.seed = s;
        }
        if let Some(f) = self.farmesh {
            cfg.scheduler.farmesh = f;
        }
        if self.no_smooth_lighting {
            cfg.mesh.smooth_lighting = false;
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = match &cli.config {
        Some(path) => TesseraConfig::from_path(path)?,
        None => TesseraConfig::default(),
    };
    cli.apply(&mut cfg);
    cfg.validate()?;
    let mut app = App::new(cfg)?;
    let summary = app.run()?;
    log::info!(
        target: "frame",
        "done frames={} chunks={} meshes={} built={} failed={} stale={} quads={}",
        summary.frames,
        summary.chunks,
        summary.meshes,
        summary.built,
        summary.failed,
        summary.stale,
        summary.quads
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .parse_filters(&cli.log)
        .parse_env("RUST_LOG")
        .init();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("tessera: {e}");
            ExitCode::FAILURE
        }
    }
}

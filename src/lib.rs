#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Panorama
//!
//! Reads voxel map blocks as stored by Minetest-family engines and prepares them for
//! rendering.
//!
//! ## Key Modules
//!
//! * `spatial` - Block and node coordinates and the conversions between them
//! * `world` - The block codec, storage backends and the caching world accessor
//! * `render` - Neighborhood assembly, visible surface extraction and survey tasks
//! * `task_management` - Worker threads that run survey tasks in parallel
//! * `media` - Textures and models loaded from a media directory
//! * `config` - The JSON run configuration
//! * `core` - Shared state handles used across worker threads
//!
//! ## Architecture
//!
//! A block travels through the crate in four steps:
//! * A backend returns its raw bytes by block coordinate
//! * The codec validates the version and decompresses the payload into a `MapBlock`
//! * The `World` caches decoded blocks and hands them out behind `Arc`s
//! * A `BlockNeighborhood` combines 27 blocks so node queries can cross block borders
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use panorama::spatial::BlockPos;
//! use panorama::world::{DirectoryBackend, World};
//!
//! let backend = DirectoryBackend::open("world/blocks").unwrap();
//! let blocks = backend.list_blocks().unwrap();
//! let world = Arc::new(World::new(Box::new(backend), 1024));
//! let report = panorama::survey(world, blocks, 4).unwrap();
//! println!("{}", report.to_json().unwrap());
//! ```

pub mod config;
pub mod core;
pub mod media;
pub mod render;
pub mod spatial;
pub mod task_management;
pub mod world;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use thiserror::Error;

use config::{ConfigError, PanoramaConfig, Region};
use media::{MediaCache, MediaError};
use render::tasks::{MediaSummary, SurveyReport, SurveyTask};
use spatial::BlockPos;
use task_management::TaskManager;
use world::{BackendError, DirectoryBackend, World};

/// Command line arguments of the `panorama` binary.
#[derive(Debug, Parser)]
#[command(name = "panorama", version, about = "Survey the blocks of a voxel world")]
pub struct Cli {
    /// Path to the JSON run configuration
    pub config: PathBuf,

    /// Lower corner of the region to survey, as x,y,z in block coordinates
    #[arg(long, allow_hyphen_values = true, requires = "max")]
    pub min: Option<BlockPos>,

    /// Upper corner of the region to survey, as x,y,z in block coordinates
    #[arg(long, allow_hyphen_values = true, requires = "min")]
    pub max: Option<BlockPos>,

    /// Number of survey worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write the JSON report to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The world directory could not be opened or listed.
    #[error("world unavailable: {0}")]
    Backend(#[from] BackendError),

    /// The media directory could not be loaded.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Worker threads could not be started.
    #[error("failed to start survey workers: {0}")]
    Workers(#[source] std::io::Error),

    /// The report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    /// The report could not be written.
    #[error("failed to write report to {path}: {source}")]
    Output {
        /// The output file
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Initializes `env_logger` from `RUST_LOG`, writing to stderr so stdout only carries
/// the report.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stderr)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
}

/// Surveys `positions` with `workers` threads and returns the finished report.
pub fn survey(
    world: Arc<World>,
    positions: impl IntoIterator<Item = BlockPos>,
    workers: usize,
) -> Result<SurveyReport, RunError> {
    let mut task_manager = TaskManager::new(workers).map_err(RunError::Workers)?;
    let mut report = SurveyReport::new();

    let mut published = 0usize;
    for pos in positions {
        task_manager.publish_task(Box::new(SurveyTask::new(world.clone(), pos)));
        published += 1;
    }
    info!("Surveying {} blocks", published);

    task_manager.run_until_idle(&mut report);
    report.finish(world.stats());

    info!(
        "Survey finished: {} blocks, {} empty, {} visible faces",
        report.blocks.len(),
        report.empty_blocks.len(),
        report.total_visible_faces
    );
    Ok(report)
}

/// Runs the command line tool: loads the configuration, surveys the world and writes
/// the JSON report.
pub fn run(cli: Cli) -> Result<SurveyReport, RunError> {
    let mut config = PanoramaConfig::load(&cli.config)?;
    if let (Some(min), Some(max)) = (cli.min, cli.max) {
        config.region = Some(Region::new(min, max)?);
    }
    if cli.workers.is_some() {
        config.worker_count = cli.workers;
    }

    let backend = DirectoryBackend::open(&config.world_path)?;
    let positions = match config.region {
        Some(region) => region.positions().collect::<Vec<_>>(),
        None => backend.list_blocks()?,
    };
    if positions.is_empty() {
        warn!("No blocks to survey in {}", config.world_path.display());
    }

    let media = match &config.media_path {
        Some(path) => {
            let mut cache = MediaCache::new();
            cache.fetch_media(path)?;
            Some(MediaSummary {
                images: cache.image_count(),
                meshes: cache.mesh_count(),
            })
        }
        None => None,
    };

    let world = Arc::new(World::new(Box::new(backend), config.cache_capacity));
    let mut report = survey(world, positions, config.effective_worker_count())?;
    report.media = media;

    let json = report.to_json()?;
    match &cli.output {
        Some(path) => fs::write(path, json).map_err(|source| RunError::Output {
            path: path.clone(),
            source,
        })?,
        None => println!("{}", json),
    }

    Ok(report)
}

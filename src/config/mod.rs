//! # Run Configuration
//!
//! A survey run is described by a JSON file:
//!
//! ```json
//! {
//!     "world_path": "worlds/demo/blocks",
//!     "media_path": "games/minetest_game/mods",
//!     "cache_capacity": 4096,
//!     "worker_count": 8,
//!     "region": { "min": [-2, -1, -2], "max": [2, 1, 2] }
//! }
//! ```
//!
//! Only `world_path` is required. Without a region every stored block is surveyed;
//! without a worker count one worker per available core is started.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spatial::BlockPos;

/// Decoded blocks kept in memory when the file does not say otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// The config file
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A region's minimum exceeds its maximum on some axis.
    #[error("region minimum {min} exceeds maximum {max}")]
    InvalidRegion {
        /// Lower corner
        min: BlockPos,
        /// Upper corner
        max: BlockPos,
    },
}

/// An inclusive box of block positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Lower corner, inclusive
    pub min: BlockPos,
    /// Upper corner, inclusive
    pub max: BlockPos,
}

impl Region {
    /// Creates a region, rejecting inverted corners.
    pub fn new(min: BlockPos, max: BlockPos) -> Result<Self, ConfigError> {
        let region = Region { min, max };
        region.validate()?;
        Ok(region)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z {
            return Err(ConfigError::InvalidRegion {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Returns true if `pos` lies inside the region.
    pub fn contains(&self, pos: BlockPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// The number of blocks in the region.
    pub fn len(&self) -> usize {
        let extent = |min: i32, max: i32| (max as i64 - min as i64 + 1).max(0) as usize;
        extent(self.min.x, self.max.x) * extent(self.min.y, self.max.y) * extent(self.min.z, self.max.z)
    }

    /// Returns true if the region holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every position in the region, x fastest.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> {
        let Region { min, max } = *self;
        (min.z..=max.z).flat_map(move |z| {
            (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

/// Settings for one survey run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanoramaConfig {
    /// Directory holding `block_{x}_{y}_{z}.bin` files
    pub world_path: PathBuf,
    /// Directory tree with textures and models
    #[serde(default)]
    pub media_path: Option<PathBuf>,
    /// Decoded blocks kept in memory, `0` disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Survey worker threads, one per core when absent
    #[serde(default)]
    pub worker_count: Option<usize>,
    /// Blocks to survey, everything stored when absent
    #[serde(default)]
    pub region: Option<Region>,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl PanoramaConfig {
    /// A configuration for `world_path` with every other setting at its default.
    pub fn new(world_path: impl Into<PathBuf>) -> Self {
        PanoramaConfig {
            world_path: world_path.into(),
            media_path: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            worker_count: None,
            region: None,
        }
    }

    /// Reads and validates a configuration file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&contents)?;
        if let Some(base) = path.parent() {
            config.world_path = base.join(&config.world_path);
            config.media_path = config.media_path.map(|media| base.join(media));
        }
        Ok(config)
    }

    /// Parses and validates a configuration.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: PanoramaConfig = serde_json::from_str(contents)?;
        if let Some(region) = &config.region {
            region.validate()?;
        }
        Ok(config)
    }

    /// The number of workers to start.
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

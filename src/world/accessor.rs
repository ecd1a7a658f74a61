//! # World Accessor
//!
//! This module provides the `World` struct, the thin façade between block consumers and
//! the persistence backend. It turns a block coordinate into a decoded [`MapBlock`].
//!
//! ## Fetch Results
//!
//! Every fetch ends in one of three states, see [`BlockFetch`]:
//! - `Present`: the block exists and decoded cleanly
//! - `NotFound`: nothing is stored there (world edge, ungenerated area)
//! - `Failed`: the backend errored or the stored bytes are corrupt
//!
//! Missing blocks are expected in steady state and only logged at trace level. Corrupt
//! blocks are a real fault in the map data: they are logged as warnings and counted
//! separately in [`FetchStats`] so a run can report them.
//!
//! ## Caching
//!
//! Decoded blocks are kept in a bounded LRU cache keyed by block position, since
//! neighboring neighborhoods fetch the same blocks repeatedly. Present and not-found
//! results are cached; failures are not, so a transient backend error is retried.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, trace, warn};
use lru::LruCache;
use serde::Serialize;
use thiserror::Error;

use crate::core::MtResource;
use crate::spatial::BlockPos;

use super::backend::{Backend, BackendError};
use super::map_block::{DecodeError, MapBlock};

/// Why a block that may exist could not be provided.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend failed to produce the raw bytes.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The raw bytes could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The outcome of fetching one block.
#[derive(Debug)]
pub enum BlockFetch {
    /// The block exists and was decoded.
    Present(Arc<MapBlock>),
    /// The backend holds no block at this position.
    NotFound,
    /// The block could not be provided.
    Failed(FetchError),
}

impl BlockFetch {
    /// Collapses the result to the block, if one is available.
    pub fn into_block(self) -> Option<Arc<MapBlock>> {
        match self {
            BlockFetch::Present(block) => Some(block),
            BlockFetch::NotFound | BlockFetch::Failed(_) => None,
        }
    }

    /// Returns true for `Present`.
    pub fn is_present(&self) -> bool {
        matches!(self, BlockFetch::Present(_))
    }
}

/// A snapshot of the accessor's fetch counters.
///
/// `present`, `not_found`, `corrupt` and `backend_errors` count backend round trips;
/// requests answered from the cache only count as `cache_hits`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    /// Blocks fetched and decoded successfully
    pub present: u64,
    /// Fetches for positions with no stored block
    pub not_found: u64,
    /// Blocks whose stored bytes failed to decode
    pub corrupt: u64,
    /// Fetches the backend itself failed
    pub backend_errors: u64,
    /// Requests answered from the cache
    pub cache_hits: u64,
}

#[derive(Default)]
struct FetchCounters {
    present: AtomicU64,
    not_found: AtomicU64,
    corrupt: AtomicU64,
    backend_errors: AtomicU64,
    cache_hits: AtomicU64,
}

impl FetchCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> FetchStats {
        FetchStats {
            present: self.present.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            corrupt: self.corrupt.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// `None` records a position the backend reported as empty.
type BlockCache = LruCache<BlockPos, Option<Arc<MapBlock>>>;

/// Provides decoded blocks from a persistence backend.
///
/// `World` is `Send + Sync`; wrap it in an `Arc` to share it between survey workers.
///
/// # Examples
///
/// ```
/// use panorama::spatial::BlockPos;
/// use panorama::world::{BlockFetch, MemoryBackend, World};
///
/// let world = World::new(Box::new(MemoryBackend::new()), 64);
/// assert!(matches!(world.fetch_block(BlockPos::ZERO), BlockFetch::NotFound));
/// ```
pub struct World {
    backend: Box<dyn Backend>,
    cache: Option<MtResource<BlockCache>>,
    counters: FetchCounters,
}

impl World {
    /// Creates an accessor over `backend` caching up to `cache_capacity` blocks.
    ///
    /// A capacity of `0` disables caching.
    pub fn new(backend: Box<dyn Backend>, cache_capacity: usize) -> Self {
        World {
            backend,
            cache: NonZeroUsize::new(cache_capacity).map(|cap| MtResource::new(LruCache::new(cap))),
            counters: FetchCounters::default(),
        }
    }

    /// Fetches and decodes the block at `pos`.
    pub fn fetch_block(&self, pos: BlockPos) -> BlockFetch {
        if let Some(cache) = &self.cache {
            let cached = cache.get_mut().get(&pos).cloned();
            if let Some(cached) = cached {
                FetchCounters::bump(&self.counters.cache_hits);
                return match cached {
                    Some(block) => BlockFetch::Present(block),
                    None => BlockFetch::NotFound,
                };
            }
        }

        let fetch = self.load_block(pos);

        if let Some(cache) = &self.cache {
            match &fetch {
                BlockFetch::Present(block) => {
                    cache.get_mut().put(pos, Some(block.clone()));
                }
                BlockFetch::NotFound => {
                    cache.get_mut().put(pos, None);
                }
                BlockFetch::Failed(_) => {}
            }
        }

        fetch
    }

    /// Returns the block at `pos` if it is available, treating failures like absence.
    pub fn get_block(&self, pos: BlockPos) -> Option<Arc<MapBlock>> {
        self.fetch_block(pos).into_block()
    }

    /// Returns the current fetch counters.
    pub fn stats(&self) -> FetchStats {
        self.counters.snapshot()
    }

    /// The number of positions currently cached.
    pub fn cached_blocks(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.get().len())
    }

    /// Drops every cached block.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.get_mut().clear();
        }
    }

    fn load_block(&self, pos: BlockPos) -> BlockFetch {
        let data = match self.backend.fetch_raw_block(pos) {
            Ok(Some(data)) => data,
            Ok(None) => {
                trace!("No block stored at {}", pos);
                FetchCounters::bump(&self.counters.not_found);
                return BlockFetch::NotFound;
            }
            Err(err) => {
                error!("Failed to fetch block at {}: {}", pos, err);
                FetchCounters::bump(&self.counters.backend_errors);
                return BlockFetch::Failed(err.into());
            }
        };

        match MapBlock::decode(&data) {
            Ok(block) => {
                debug!(
                    "Decoded block at {} ({} bytes, {} mappings)",
                    pos,
                    data.len(),
                    block.mapping_count()
                );
                FetchCounters::bump(&self.counters.present);
                BlockFetch::Present(Arc::new(block))
            }
            Err(err) => {
                warn!("Corrupt block at {}: {}", pos, err);
                FetchCounters::bump(&self.counters.corrupt);
                BlockFetch::Failed(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::backend::MemoryBackend;
    use crate::world::map_block::{MapBlockEncoder, Node};
    use std::sync::atomic::AtomicUsize;

    /// Counts round trips and fails for one configured position.
    struct CountingBackend {
        inner: MemoryBackend,
        failing: BlockPos,
        calls: AtomicUsize,
    }

    impl Backend for CountingBackend {
        fn fetch_raw_block(&self, pos: BlockPos) -> Result<Option<Vec<u8>>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if pos == self.failing {
                return Err(BackendError::Unavailable("connection lost".to_string()));
            }
            self.inner.fetch_raw_block(pos)
        }
    }

    fn stone_bytes() -> Vec<u8> {
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(1, "default:stone").fill(Node {
            id: 1,
            param1: 0,
            param2: 0,
        });
        encoder.encode().unwrap()
    }

    fn memory_world(capacity: usize) -> World {
        let backend = MemoryBackend::new();
        backend.insert(BlockPos::ZERO, stone_bytes());
        backend.insert(BlockPos::new(1, 0, 0), vec![28, 0, 0]);
        backend.insert(BlockPos::new(2, 0, 0), vec![29, 1, 2, 3]);
        World::new(Box::new(backend), capacity)
    }

    #[test]
    fn distinguishes_present_missing_and_corrupt() {
        let world = memory_world(16);

        assert!(world.fetch_block(BlockPos::ZERO).is_present());
        assert!(matches!(
            world.fetch_block(BlockPos::new(0, 1, 0)),
            BlockFetch::NotFound
        ));
        assert!(matches!(
            world.fetch_block(BlockPos::new(1, 0, 0)),
            BlockFetch::Failed(FetchError::Decode(DecodeError::UnsupportedVersion(28)))
        ));
        assert!(matches!(
            world.fetch_block(BlockPos::new(2, 0, 0)),
            BlockFetch::Failed(FetchError::Decode(DecodeError::CorruptData(_)))
        ));

        assert_eq!(
            world.stats(),
            FetchStats {
                present: 1,
                not_found: 1,
                corrupt: 2,
                backend_errors: 0,
                cache_hits: 0,
            }
        );
    }

    #[test]
    fn caches_present_and_missing_blocks() {
        let inner = MemoryBackend::new();
        inner.insert(BlockPos::ZERO, stone_bytes());
        let backend = CountingBackend {
            inner,
            failing: BlockPos::new(5, 5, 5),
            calls: AtomicUsize::new(0),
        };
        let world = World::new(Box::new(backend), 8);

        let first = world.get_block(BlockPos::ZERO).unwrap();
        let second = world.get_block(BlockPos::ZERO).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(world.get_block(BlockPos::new(0, 0, 1)).is_none());
        assert!(world.get_block(BlockPos::new(0, 0, 1)).is_none());

        let stats = world.stats();
        assert_eq!(stats.present, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(world.cached_blocks(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let backend = CountingBackend {
            inner: MemoryBackend::new(),
            failing: BlockPos::ZERO,
            calls: AtomicUsize::new(0),
        };
        let world = World::new(Box::new(backend), 8);

        for _ in 0..3 {
            assert!(matches!(
                world.fetch_block(BlockPos::ZERO),
                BlockFetch::Failed(FetchError::Backend(_))
            ));
        }

        assert_eq!(world.stats().backend_errors, 3);
        assert_eq!(world.cached_blocks(), 0);
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let world = memory_world(0);
        world.get_block(BlockPos::ZERO);
        world.get_block(BlockPos::ZERO);

        assert_eq!(world.stats().present, 2);
        assert_eq!(world.stats().cache_hits, 0);
        assert_eq!(world.cached_blocks(), 0);
    }

    #[test]
    fn clear_cache_forces_refetch() {
        let world = memory_world(4);
        world.get_block(BlockPos::ZERO);
        world.clear_cache();
        world.get_block(BlockPos::ZERO);

        assert_eq!(world.stats().present, 2);
    }
}

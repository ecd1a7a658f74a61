//! # Backend Module
//!
//! The persistence backend is an opaque provider of raw block bytes keyed by block
//! coordinates. It knows nothing about the block format; decoding happens in the
//! [`World`](super::World) accessor.
//!
//! Two implementations are provided:
//! * [`MemoryBackend`]: blocks held in a map, for fixtures and tools
//! * [`DirectoryBackend`]: one file per block under a root directory

use thiserror::Error;

use crate::spatial::BlockPos;

mod directory;
mod memory;

pub use directory::DirectoryBackend;
pub use memory::MemoryBackend;

/// Failures raised by a backend while fetching raw block bytes.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Reading from the underlying storage failed.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot serve requests at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// A source of raw, still compressed block data.
///
/// Implementations must be shareable across worker threads.
pub trait Backend: Send + Sync {
    /// Fetches the stored bytes of the block at `pos`.
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` when the block exists
    /// * `Ok(None)` when nothing is stored at `pos`
    /// * `Err(_)` when the storage itself failed
    fn fetch_raw_block(&self, pos: BlockPos) -> Result<Option<Vec<u8>>, BackendError>;
}

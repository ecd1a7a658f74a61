use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::spatial::BlockPos;

use super::{Backend, BackendError};

/// A backend that keeps raw block bytes in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blocks: RwLock<HashMap<BlockPos, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes for a block, replacing anything already there.
    pub fn insert(&self, pos: BlockPos, data: Vec<u8>) {
        self.blocks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pos, data);
    }

    /// Removes a block, returning its bytes if it was present.
    pub fn remove(&self, pos: BlockPos) -> Option<Vec<u8>> {
        self.blocks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pos)
    }

    /// The number of stored blocks.
    pub fn len(&self) -> usize {
        self.blocks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no blocks are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Backend for MemoryBackend {
    fn fetch_raw_block(&self, pos: BlockPos) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self
            .blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pos)
            .cloned())
    }
}

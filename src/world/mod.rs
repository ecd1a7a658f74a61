//! # World Module
//!
//! Everything needed to go from a block coordinate to decoded node data.
//!
//! ## Architecture
//!
//! * **Backend**: opaque storage of raw block bytes keyed by block coordinates
//! * **Map Block**: the block codec, decoding raw bytes into addressable nodes
//! * **Accessor**: [`World`], composing a backend with the codec and caching results
//!
//! ## Data Flow
//!
//! 1. A consumer asks the `World` for a block position
//! 2. The `World` answers from its cache or asks the backend for raw bytes
//! 3. The bytes are decoded into an immutable [`MapBlock`]
//! 4. The block is shared with the consumer behind an `Arc`
//!
//! ## Thread Safety
//!
//! Decoded blocks are immutable and can be read from any number of threads. The
//! `World` synchronizes its cache internally and can be shared through an `Arc`.

pub mod accessor;
pub mod backend;
pub mod map_block;

pub use accessor::{BlockFetch, FetchError, FetchStats, World};
pub use backend::{Backend, BackendError, DirectoryBackend, MemoryBackend};
pub use map_block::{DecodeError, MapBlock, MapBlockEncoder, Node};

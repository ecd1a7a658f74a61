//! # Spatial Module
//!
//! Integer coordinate types used to address map data at two granularities:
//!
//! * [`BlockPos`]: a block in block-grid units (one unit is one block edge)
//! * [`NodePos`]: a single node (voxel) in world-wide node units
//! * [`LocalPos`]: a node inside one block, each axis in `0..BLOCK_SIZE`
//!
//! ## Negative Coordinates
//!
//! Conversions between granularities always use Euclidean division. Native `/` and `%`
//! truncate towards zero, which puts node `-1` into block `0` instead of block `-1`.
//! Use [`floor_div`] and [`floor_mod`] whenever a node coordinate is split.
//!
//! ## Layout
//!
//! Nodes inside a block are stored x-fastest, then y, then z:
//! `index = z * BLOCK_AREA + y * BLOCK_SIZE + x`.

mod block_pos;
mod node_pos;

pub use block_pos::BlockPos;
pub use block_pos::ParsePositionError;
pub use node_pos::{LocalPos, LocalPosIter, NodePos};

/// The edge length of a block in nodes.
pub const BLOCK_SIZE: i32 = 16;
/// The number of nodes in a single 2D plane of a block (BLOCK_SIZE²).
pub const BLOCK_AREA: i32 = BLOCK_SIZE * BLOCK_SIZE;
/// The total number of nodes in a block (BLOCK_SIZE³).
pub const BLOCK_VOLUME: usize = (BLOCK_AREA * BLOCK_SIZE) as usize;

/// Floor division: rounds towards negative infinity for a positive divisor.
///
/// # Examples
///
/// ```
/// use panorama::spatial::floor_div;
///
/// assert_eq!(floor_div(-1, 16), -1);
/// assert_eq!(floor_div(15, 16), 0);
/// assert_eq!(floor_div(-16, 16), -1);
/// assert_eq!(floor_div(-17, 16), -2);
/// ```
#[inline]
pub fn floor_div(value: i32, divisor: i32) -> i32 {
    value.div_euclid(divisor)
}

/// Euclidean modulo, always in `0..divisor` for a positive divisor.
///
/// Pairs with [`floor_div`] so that `floor_div(v, d) * d + floor_mod(v, d) == v`.
///
/// # Examples
///
/// ```
/// use panorama::spatial::floor_mod;
///
/// assert_eq!(floor_mod(-1, 16), 15);
/// assert_eq!(floor_mod(16, 16), 0);
/// ```
#[inline]
pub fn floor_mod(value: i32, divisor: i32) -> i32 {
    value.rem_euclid(divisor)
}

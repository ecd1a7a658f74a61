use std::fmt;
use std::ops::Add;

use cgmath::Point3;

use super::{floor_div, floor_mod, BlockPos, BLOCK_AREA, BLOCK_SIZE, BLOCK_VOLUME};

/// The coordinates of a single node in world-wide node units.
///
/// Inside a [`BlockNeighborhood`](crate::render::BlockNeighborhood) the same type is used
/// relative to the center block's origin node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePos {
    /// X coordinate in nodes
    pub x: i32,
    /// Y coordinate in nodes
    pub y: i32,
    /// Z coordinate in nodes
    pub z: i32,
}

impl NodePos {
    /// Creates a new node position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the position of the block containing this node.
    pub fn block_pos(self) -> BlockPos {
        BlockPos::new(
            floor_div(self.x, BLOCK_SIZE),
            floor_div(self.y, BLOCK_SIZE),
            floor_div(self.z, BLOCK_SIZE),
        )
    }

    /// Returns the position of this node inside its containing block.
    pub fn local_pos(self) -> LocalPos {
        // floor_mod keeps every axis in 0..BLOCK_SIZE, so the casts cannot truncate
        LocalPos {
            x: floor_mod(self.x, BLOCK_SIZE) as u8,
            y: floor_mod(self.y, BLOCK_SIZE) as u8,
            z: floor_mod(self.z, BLOCK_SIZE) as u8,
        }
    }

    /// Splits this position into its block position and the position inside that block.
    pub fn split(self) -> (BlockPos, LocalPos) {
        (self.block_pos(), self.local_pos())
    }
}

impl Add for NodePos {
    type Output = NodePos;

    fn add(self, rhs: NodePos) -> NodePos {
        NodePos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<BlockPos> for NodePos {
    fn from(pos: BlockPos) -> Self {
        pos.origin_node()
    }
}

impl From<Point3<i32>> for NodePos {
    fn from(point: Point3<i32>) -> Self {
        Self::new(point.x, point.y, point.z)
    }
}

impl From<NodePos> for Point3<i32> {
    fn from(pos: NodePos) -> Self {
        Point3::new(pos.x, pos.y, pos.z)
    }
}

impl fmt::Display for NodePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The position of a node inside one block, each axis in `0..BLOCK_SIZE`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    /// X coordinate within the block
    pub x: u8,
    /// Y coordinate within the block
    pub y: u8,
    /// Z coordinate within the block
    pub z: u8,
}

impl LocalPos {
    /// Creates a new local position.
    ///
    /// Components are expected to be below `BLOCK_SIZE`; callers derive them through
    /// [`NodePos::local_pos`] or [`LocalPos::from_index`].
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Returns the flat index of this node in a block's node array.
    ///
    /// # Examples
    ///
    /// ```
    /// use panorama::spatial::LocalPos;
    ///
    /// assert_eq!(LocalPos::new(0, 0, 1).index(), 256);
    /// assert_eq!(LocalPos::new(15, 15, 15).index(), 4095);
    /// ```
    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self.is_valid(), "local position out of range: {:?}", self);
        self.z as usize * BLOCK_AREA as usize + self.y as usize * BLOCK_SIZE as usize + self.x as usize
    }

    /// Converts a flat node array index back into a local position.
    ///
    /// The index wraps around `BLOCK_VOLUME`.
    pub fn from_index(index: usize) -> Self {
        let index = index % BLOCK_VOLUME;
        let size = BLOCK_SIZE as usize;
        Self {
            x: (index % size) as u8,
            y: ((index / size) % size) as u8,
            z: (index / (size * size)) as u8,
        }
    }

    /// Returns true if every component is below `BLOCK_SIZE`.
    pub fn is_valid(self) -> bool {
        let size = BLOCK_SIZE as u8;
        self.x < size && self.y < size && self.z < size
    }

    /// Returns the world position of this node inside the given block.
    pub fn to_node_pos(self, block: BlockPos) -> NodePos {
        block.origin_node() + NodePos::new(self.x as i32, self.y as i32, self.z as i32)
    }

    /// Iterates over every position in a block, in node array order.
    pub fn all() -> LocalPosIter {
        LocalPosIter { next: 0 }
    }
}

/// An iterator over all local positions of a block in node array order.
pub struct LocalPosIter {
    next: usize,
}

impl Iterator for LocalPosIter {
    type Item = LocalPos;

    fn next(&mut self) -> Option<LocalPos> {
        if self.next >= BLOCK_VOLUME {
            return None;
        }
        let pos = LocalPos::from_index(self.next);
        self.next += 1;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = BLOCK_VOLUME.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LocalPosIter {}

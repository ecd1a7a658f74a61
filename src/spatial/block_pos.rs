use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use cgmath::Point3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::{NodePos, BLOCK_SIZE};

/// The coordinates of a block in block-grid units.
///
/// Block `(1, 0, 0)` starts at node `(16, 0, 0)`. A block position carries no data of
/// its own; it is the key the persistence backend stores raw block bytes under.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    /// X coordinate in blocks
    pub x: i32,
    /// Y coordinate in blocks
    pub y: i32,
    /// Z coordinate in blocks
    pub z: i32,
}

/// Error returned when a `"x,y,z"` string cannot be parsed into a position.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePositionError {
    /// The string did not contain exactly three comma separated components.
    #[error("expected 3 comma separated coordinates, found {0}")]
    ComponentCount(usize),

    /// One of the components is not an integer.
    #[error("invalid coordinate {0:?}")]
    InvalidComponent(String),
}

impl BlockPos {
    /// The block at the world's center.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a new block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the position of the node with the lowest coordinates inside this block.
    pub fn origin_node(self) -> NodePos {
        NodePos::new(self.x * BLOCK_SIZE, self.y * BLOCK_SIZE, self.z * BLOCK_SIZE)
    }

    /// Returns all 27 offsets of a 3x3x3 neighborhood, including the center `(0, 0, 0)`.
    ///
    /// Offsets are ordered x-fastest, then y, then z, starting at `(-1, -1, -1)`.
    pub fn neighborhood_offsets() -> impl Iterator<Item = BlockPos> {
        (-1..=1).flat_map(|z| {
            (-1..=1).flat_map(move |y| (-1..=1).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    /// Returns true if every component lies in `-1..=1`.
    pub fn is_neighbor_offset(self) -> bool {
        (-1..=1).contains(&self.x) && (-1..=1).contains(&self.y) && (-1..=1).contains(&self.z)
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;

    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl FromStr for BlockPos {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ParsePositionError::ComponentCount(parts.len()));
        }

        let coords = parts
            .iter()
            .map(|part| {
                part.parse::<i32>()
                    .map_err(|_| ParsePositionError::InvalidComponent(part.to_string()))
            })
            .collect::<Result<Vec<i32>, _>>()?;

        Ok(Self::new(coords[0], coords[1], coords[2]))
    }
}

impl From<Point3<i32>> for BlockPos {
    fn from(point: Point3<i32>) -> Self {
        Self::new(point.x, point.y, point.z)
    }
}

impl From<BlockPos> for Point3<i32> {
    fn from(pos: BlockPos) -> Self {
        Point3::new(pos.x, pos.y, pos.z)
    }
}

impl Serialize for BlockPos {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.x, self.y, self.z).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockPos {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y, z) = <(i32, i32, i32)>::deserialize(deserializer)?;
        Ok(BlockPos::new(x, y, z))
    }
}

//! # Block Side Module
//!
//! This module defines the six faces of a node and the direction each one faces.
//! Surface extraction uses the normals to find the node a face is adjacent to.

use cgmath::Vector3;

use crate::spatial::NodePos;

/// Represents the six possible faces of a node.
///
/// Each variant is assigned a stable integer value so faces can be stored and
/// reported compactly.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six faces in a consistent order.
    ///
    /// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// The unit vector pointing out of this face.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// The face on the other side of the node.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::LEFT => BlockSide::RIGHT,
            BlockSide::RIGHT => BlockSide::LEFT,
        }
    }

    /// Returns the node this face of `pos` touches.
    pub fn adjacent(self, pos: NodePos) -> NodePos {
        let normal = self.normal();
        NodePos::new(pos.x + normal.x, pos.y + normal.y, pos.z + normal.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normals_are_unit_axis_vectors() {
        for side in BlockSide::all() {
            let n = side.normal();
            assert_eq!(n.x.abs() + n.y.abs() + n.z.abs(), 1);
            assert_eq!(side.opposite().normal(), -n);
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn adjacent_steps_one_node() {
        let pos = NodePos::new(0, 15, -3);
        assert_eq!(BlockSide::LEFT.adjacent(pos), NodePos::new(-1, 15, -3));
        assert_eq!(BlockSide::TOP.adjacent(pos), NodePos::new(0, 16, -3));
        assert_eq!(BlockSide::BACK.adjacent(pos), NodePos::new(0, 15, -4));
    }
}

//! # Block Neighborhood
//!
//! A 3x3x3 assembly of blocks around a center block that answers node queries across
//! block boundaries.
//!
//! Surface extraction has to look at a node's immediate neighbors to decide whether a
//! face is visible and how it is lit, and those neighbors may live in adjacent blocks.
//! Assembling the 27 blocks once per center block keeps every such query an array
//! lookup plus Euclidean division.
//!
//! ## Coordinates
//!
//! Node positions passed to the queries are relative to the center block's origin
//! node: `(0, 0, 0)..(15, 15, 15)` is the center block, `(-1, 5, 5)` is the last
//! column of the block at offset `(-1, 0, 0)`, and so on. Block offsets are in
//! `{-1, 0, 1}³` and are shifted by one per axis to index the cell array.
//!
//! ## Absent Cells
//!
//! A cell is absent when its block does not exist or could not be fetched. The
//! structure never invents data for it; queries that land in an absent cell (or
//! outside the 3x3x3 grid) answer with air instead.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::spatial::{BlockPos, NodePos};
use crate::world::{BlockFetch, MapBlock, World};

/// Cells along each axis.
const EDGE: i32 = 3;
/// Total number of cells.
const CELL_COUNT: usize = (EDGE * EDGE * EDGE) as usize;
/// Cell coordinates of the center block.
const CENTER: BlockPos = BlockPos::new(1, 1, 1);

/// Name reported for nodes in absent cells.
pub const AIR_NAME: &str = "air";

/// Errors raised when addressing a neighborhood cell.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NeighborhoodError {
    /// The offset has a component outside `-1..=1`.
    #[error("offset {0} is outside the 3x3x3 neighborhood")]
    OffsetOutOfRange(BlockPos),
}

/// A node resolved through a neighborhood: its global name and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedNode<'a> {
    /// Global node name, empty for IDs the owning block does not map
    pub name: &'a str,
    /// Auxiliary parameter 1, usually lighting
    pub param1: u8,
    /// Auxiliary parameter 2
    pub param2: u8,
}

impl ResolvedNode<'static> {
    /// The answer for nodes in absent cells.
    pub const AIR: Self = ResolvedNode {
        name: AIR_NAME,
        param1: 0,
        param2: 0,
    };
}

/// A center block and its 26 neighbors.
///
/// Built fresh for each center block and dropped after use. The blocks themselves
/// are shared, so assembling neighborhoods for adjacent centers reuses cached data.
///
/// Mutation happens only while assembling; a finished neighborhood is `Sync` and can
/// be queried from several threads.
#[derive(Clone, Default)]
pub struct BlockNeighborhood {
    blocks: [Option<Arc<MapBlock>>; CELL_COUNT],
}

impl BlockNeighborhood {
    /// Creates a neighborhood with every cell absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the center block at `origin` and all of its neighbors from `world`.
    pub fn assemble(world: &World, origin: BlockPos) -> Self {
        let mut neighborhood = Self::new();
        for (index, offset) in BlockPos::neighborhood_offsets().enumerate() {
            neighborhood.blocks[index] = world.fetch_block(origin + offset).into_block();
        }
        neighborhood
    }

    /// Fetches the block at `origin + offset` into the cell for `offset`.
    ///
    /// A block that is missing or fails to load leaves the cell absent; that is the
    /// normal situation at the edge of the generated world, so it is not an error.
    ///
    /// # Returns
    /// Whether a block is now present in the cell.
    pub fn fetch_block(
        &mut self,
        world: &World,
        offset: BlockPos,
        origin: BlockPos,
    ) -> Result<bool, NeighborhoodError> {
        let index = offset_index(offset)?;
        self.blocks[index] = match world.fetch_block(origin + offset) {
            BlockFetch::Present(block) => Some(block),
            BlockFetch::NotFound | BlockFetch::Failed(_) => None,
        };
        Ok(self.blocks[index].is_some())
    }

    /// Stores a decoded block in the cell for `offset`.
    pub fn set_block(
        &mut self,
        offset: BlockPos,
        block: Arc<MapBlock>,
    ) -> Result<(), NeighborhoodError> {
        let index = offset_index(offset)?;
        self.blocks[index] = Some(block);
        Ok(())
    }

    /// Marks the cell for `offset` absent.
    pub fn clear_block(&mut self, offset: BlockPos) -> Result<(), NeighborhoodError> {
        let index = offset_index(offset)?;
        self.blocks[index] = None;
        Ok(())
    }

    /// Returns the block in the cell for `offset`, if present.
    pub fn block(&self, offset: BlockPos) -> Option<&Arc<MapBlock>> {
        offset_index(offset)
            .ok()
            .and_then(|index| self.blocks[index].as_ref())
    }

    /// Returns the center block, if present.
    pub fn center(&self) -> Option<&Arc<MapBlock>> {
        self.block(BlockPos::ZERO)
    }

    /// The number of cells holding a block.
    pub fn present_count(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_some()).count()
    }

    /// Resolves the node at `pos`, relative to the center block's origin.
    ///
    /// Nodes in absent cells, or outside the 3x3x3 grid, resolve to
    /// [`ResolvedNode::AIR`].
    pub fn get_node(&self, pos: NodePos) -> ResolvedNode<'_> {
        match self.block_for_node(pos) {
            Some(block) => {
                let node = block.get_node(pos.local_pos());
                ResolvedNode {
                    name: block.resolve_name(node.id),
                    param1: node.param1,
                    param2: node.param2,
                }
            }
            None => ResolvedNode::AIR,
        }
    }

    /// Returns param1 of the node at `pos`, or `0` in absent cells.
    pub fn get_param1(&self, pos: NodePos) -> u8 {
        self.block_for_node(pos)
            .map_or(0, |block| block.get_node(pos.local_pos()).param1)
    }

    fn block_for_node(&self, pos: NodePos) -> Option<&MapBlock> {
        let cell = pos.block_pos() + CENTER;
        cell_index(cell).and_then(|index| self.blocks[index].as_deref())
    }
}

impl fmt::Debug for BlockNeighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<BlockPos> = BlockPos::neighborhood_offsets()
            .zip(self.blocks.iter())
            .filter(|(_, block)| block.is_some())
            .map(|(offset, _)| offset)
            .collect();
        f.debug_struct("BlockNeighborhood")
            .field("present", &present)
            .finish()
    }
}

/// Cell coordinates in `{0, 1, 2}³` to array index, x-fastest.
fn cell_index(cell: BlockPos) -> Option<usize> {
    let range = 0..EDGE;
    if range.contains(&cell.x) && range.contains(&cell.y) && range.contains(&cell.z) {
        Some((cell.z * EDGE * EDGE + cell.y * EDGE + cell.x) as usize)
    } else {
        None
    }
}

fn offset_index(offset: BlockPos) -> Result<usize, NeighborhoodError> {
    cell_index(offset + CENTER).ok_or(NeighborhoodError::OffsetOutOfRange(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::LocalPos;
    use crate::world::{MapBlockEncoder, MemoryBackend, Node};

    fn uniform_block(name: &str, param1: u8, param2: u8) -> Arc<MapBlock> {
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(5, name).fill(Node {
            id: 5,
            param1,
            param2,
        });
        Arc::new(MapBlock::decode(&encoder.encode().unwrap()).unwrap())
    }

    #[test]
    fn cell_order_matches_offset_order() {
        for (index, offset) in BlockPos::neighborhood_offsets().enumerate() {
            assert_eq!(offset_index(offset), Ok(index));
        }
        assert_eq!(offset_index(BlockPos::ZERO), Ok(13));
    }

    #[test]
    fn negative_positions_resolve_into_lower_neighbor() {
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(1, "default:dirt").set_mapping(2, "default:glass");
        encoder.fill(Node {
            id: 1,
            param1: 0,
            param2: 0,
        });
        encoder.set_node(
            LocalPos::new(15, 5, 5),
            Node {
                id: 2,
                param1: 9,
                param2: 3,
            },
        );
        let west = Arc::new(MapBlock::decode(&encoder.encode().unwrap()).unwrap());

        let mut neighborhood = BlockNeighborhood::new();
        neighborhood
            .set_block(BlockPos::ZERO, uniform_block("default:stone", 1, 1))
            .unwrap();
        neighborhood
            .set_block(BlockPos::new(-1, 0, 0), west)
            .unwrap();

        assert_eq!(
            neighborhood.get_node(NodePos::new(-1, 5, 5)),
            ResolvedNode {
                name: "default:glass",
                param1: 9,
                param2: 3
            }
        );
        assert_eq!(neighborhood.get_param1(NodePos::new(-1, 5, 5)), 9);
        assert_eq!(
            neighborhood.get_node(NodePos::new(0, 5, 5)).name,
            "default:stone"
        );
    }

    #[test]
    fn absent_cells_answer_air() {
        let mut neighborhood = BlockNeighborhood::new();
        neighborhood
            .set_block(BlockPos::ZERO, uniform_block("default:stone", 4, 4))
            .unwrap();

        for pos in [
            NodePos::new(16, 0, 0),
            NodePos::new(-1, -1, -1),
            NodePos::new(5, 31, 5),
        ] {
            assert_eq!(neighborhood.get_node(pos), ResolvedNode::AIR);
            assert_eq!(neighborhood.get_param1(pos), 0);
        }
    }

    #[test]
    fn positions_outside_the_grid_answer_air() {
        let mut neighborhood = BlockNeighborhood::new();
        for offset in BlockPos::neighborhood_offsets() {
            neighborhood
                .set_block(offset, uniform_block("default:stone", 2, 0))
                .unwrap();
        }

        assert_eq!(neighborhood.get_node(NodePos::new(31, 31, 31)).name, "default:stone");
        assert_eq!(neighborhood.get_node(NodePos::new(-16, -16, -16)).name, "default:stone");
        assert_eq!(neighborhood.get_node(NodePos::new(32, 0, 0)), ResolvedNode::AIR);
        assert_eq!(neighborhood.get_node(NodePos::new(0, -17, 0)), ResolvedNode::AIR);
        assert_eq!(neighborhood.get_param1(NodePos::new(0, 0, 48)), 0);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let mut neighborhood = BlockNeighborhood::new();
        neighborhood
            .set_block(BlockPos::ZERO, uniform_block("default:sand", 3, 7))
            .unwrap();

        let pos = NodePos::new(2, 3, 4);
        assert_eq!(neighborhood.get_node(pos), neighborhood.get_node(pos));
        assert_eq!(neighborhood.get_param1(pos), neighborhood.get_param1(pos));
    }

    #[test]
    fn rejects_offsets_outside_the_grid() {
        let mut neighborhood = BlockNeighborhood::new();
        let offset = BlockPos::new(2, 0, 0);
        assert_eq!(
            neighborhood.set_block(offset, uniform_block("default:stone", 0, 0)),
            Err(NeighborhoodError::OffsetOutOfRange(offset))
        );
        assert_eq!(neighborhood.present_count(), 0);
        assert!(neighborhood.block(offset).is_none());
    }

    #[test]
    fn assembles_from_world_and_tolerates_gaps() {
        let backend = MemoryBackend::new();
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(5, "default:stone").fill(Node {
            id: 5,
            param1: 0,
            param2: 0,
        });
        let stone = encoder.encode().unwrap();
        let origin = BlockPos::new(10, -2, 3);
        backend.insert(origin, stone.clone());
        backend.insert(origin + BlockPos::new(0, 1, 0), stone);
        backend.insert(origin + BlockPos::new(1, 0, 0), vec![29, 0xff]);
        let world = World::new(Box::new(backend), 32);

        let neighborhood = BlockNeighborhood::assemble(&world, origin);

        assert_eq!(neighborhood.present_count(), 2);
        assert!(neighborhood.center().is_some());
        assert!(neighborhood.block(BlockPos::new(0, 1, 0)).is_some());
        assert!(neighborhood.block(BlockPos::new(1, 0, 0)).is_none());
        assert_eq!(neighborhood.get_node(NodePos::new(5, 20, 5)).name, "default:stone");
        assert_eq!(neighborhood.get_node(NodePos::new(20, 5, 5)), ResolvedNode::AIR);
        assert_eq!(world.stats().corrupt, 1);
    }

    #[test]
    fn fetch_block_fills_and_clears_cells() {
        let backend = MemoryBackend::new();
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(0, "default:dirt");
        backend.insert(BlockPos::new(0, 0, -1), encoder.encode().unwrap());
        let world = World::new(Box::new(backend), 0);

        let mut neighborhood = BlockNeighborhood::new();
        assert_eq!(
            neighborhood.fetch_block(&world, BlockPos::new(0, 0, -1), BlockPos::ZERO),
            Ok(true)
        );
        assert_eq!(
            neighborhood.get_node(NodePos::new(0, 0, -1)).name,
            "default:dirt"
        );

        assert_eq!(
            neighborhood.fetch_block(&world, BlockPos::new(0, 0, -1), BlockPos::new(0, 0, 5)),
            Ok(false)
        );
        assert_eq!(neighborhood.present_count(), 0);

        neighborhood
            .set_block(BlockPos::ZERO, uniform_block("default:stone", 0, 0))
            .unwrap();
        neighborhood.clear_block(BlockPos::ZERO).unwrap();
        assert!(neighborhood.center().is_none());
    }
}

//! # Surface Extraction
//!
//! Finds the faces of the center block that border transparent nodes. This is the
//! first stage of meshing a block: only these faces can ever be seen, and the
//! adjacent node's param1 gives the light reaching them.
//!
//! Faces on the boundary of the center block look into the neighboring blocks, which
//! is why extraction works on a [`BlockNeighborhood`] rather than a single block.

use crate::spatial::{LocalPos, NodePos};

use super::block_side::BlockSide;
use super::neighborhood::{BlockNeighborhood, AIR_NAME};

/// One face of a node that borders a transparent node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleFace {
    /// Position of the node owning the face, relative to the center block's origin
    pub pos: NodePos,
    /// Which side of the node the face is on
    pub side: BlockSide,
    /// Global name of the node owning the face
    pub name: String,
    /// param1 of the transparent node in front of the face
    pub light: u8,
}

/// Returns true for names that do not occlude faces behind them.
///
/// Unmapped IDs resolve to the empty name and count as transparent.
pub fn is_transparent(name: &str) -> bool {
    name.is_empty() || name == AIR_NAME
}

/// Collects every visible face of the center block, in node array order.
///
/// Returns an empty list when the center block is absent.
pub fn visible_faces(neighborhood: &BlockNeighborhood) -> Vec<VisibleFace> {
    let mut faces = Vec::new();
    if neighborhood.center().is_none() {
        return faces;
    }

    for local in LocalPos::all() {
        let pos = local_to_node(local);
        let node = neighborhood.get_node(pos);
        if is_transparent(node.name) {
            continue;
        }

        for side in BlockSide::all() {
            let adjacent = side.adjacent(pos);
            let neighbor = neighborhood.get_node(adjacent);
            if is_transparent(neighbor.name) {
                faces.push(VisibleFace {
                    pos,
                    side,
                    name: node.name.to_string(),
                    light: neighbor.param1,
                });
            }
        }
    }

    faces
}

fn local_to_node(local: LocalPos) -> NodePos {
    NodePos::new(local.x as i32, local.y as i32, local.z as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::BlockPos;
    use crate::world::{MapBlock, MapBlockEncoder, Node};
    use std::sync::Arc;

    const STONE: Node = Node {
        id: 1,
        param1: 0,
        param2: 0,
    };

    fn block(encoder: &MapBlockEncoder) -> Arc<MapBlock> {
        Arc::new(MapBlock::decode(&encoder.encode().unwrap()).unwrap())
    }

    fn air_encoder(light: u8) -> MapBlockEncoder {
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(0, "air").set_mapping(1, "default:stone");
        encoder.fill(Node {
            id: 0,
            param1: light,
            param2: 0,
        });
        encoder
    }

    #[test]
    fn single_node_in_air_shows_six_faces() {
        let mut encoder = air_encoder(7);
        encoder.set_node(LocalPos::new(4, 4, 4), STONE);

        let mut neighborhood = BlockNeighborhood::new();
        neighborhood.set_block(BlockPos::ZERO, block(&encoder)).unwrap();

        let faces = visible_faces(&neighborhood);
        assert_eq!(faces.len(), 6);
        assert!(faces.iter().all(|face| face.pos == NodePos::new(4, 4, 4)));
        assert!(faces.iter().all(|face| face.name == "default:stone"));
        assert!(faces.iter().all(|face| face.light == 7));
    }

    #[test]
    fn buried_faces_are_hidden() {
        let mut encoder = air_encoder(0);
        encoder.set_node(LocalPos::new(4, 4, 4), STONE);
        encoder.set_node(LocalPos::new(5, 4, 4), STONE);

        let mut neighborhood = BlockNeighborhood::new();
        neighborhood.set_block(BlockPos::ZERO, block(&encoder)).unwrap();

        let faces = visible_faces(&neighborhood);
        assert_eq!(faces.len(), 10);
        assert!(!faces
            .iter()
            .any(|face| face.pos == NodePos::new(4, 4, 4) && face.side == BlockSide::RIGHT));
    }

    #[test]
    fn boundary_faces_look_into_neighbors() {
        let mut center = MapBlockEncoder::new();
        center.set_mapping(1, "default:stone").fill(STONE);

        let mut neighborhood = BlockNeighborhood::new();
        neighborhood.set_block(BlockPos::ZERO, block(&center)).unwrap();

        // every neighbor absent: only the outer shell is visible
        assert_eq!(visible_faces(&neighborhood).len(), 6 * 256);

        for offset in BlockPos::neighborhood_offsets() {
            neighborhood.set_block(offset, block(&center)).unwrap();
        }
        assert!(visible_faces(&neighborhood).is_empty());

        neighborhood
            .set_block(BlockPos::new(0, 1, 0), block(&air_encoder(15)))
            .unwrap();
        let faces = visible_faces(&neighborhood);
        assert_eq!(faces.len(), 256);
        assert!(faces
            .iter()
            .all(|face| face.side == BlockSide::TOP && face.pos.y == 15 && face.light == 15));
    }

    #[test]
    fn unmapped_ids_are_transparent() {
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(1, "default:stone");
        encoder.set_node(LocalPos::new(0, 0, 0), STONE);

        let mut neighborhood = BlockNeighborhood::new();
        neighborhood.set_block(BlockPos::ZERO, block(&encoder)).unwrap();

        assert_eq!(visible_faces(&neighborhood).len(), 6);
        assert!(is_transparent(""));
        assert!(is_transparent("air"));
        assert!(!is_transparent("default:glass"));
    }

    #[test]
    fn absent_center_has_no_faces() {
        assert!(visible_faces(&BlockNeighborhood::new()).is_empty());
    }
}

//! # Map Block Module
//!
//! Decodes the persisted binary form of a block into a [`MapBlock`]: a table mapping
//! block-local node IDs to global node names, plus the per-node `(id, param1, param2)`
//! data for all `BLOCK_VOLUME` nodes.
//!
//! ## Binary Layout
//!
//! All integers are big-endian.
//!
//! | Part                | Size                | Notes                                 |
//! |---------------------|---------------------|---------------------------------------|
//! | version             | 1                   | must be [`SERIALIZATION_VERSION`]     |
//! | *zstd stream*       | rest                | everything below is compressed        |
//! | flags               | 1                   | skipped                               |
//! | lighting complete   | 2                   | skipped                               |
//! | timestamp           | 4                   | skipped                               |
//! | mapping version     | 1                   | skipped                               |
//! | mapping count `N`   | 2                   |                                       |
//! | `N` mappings        | 2 + 2 + len each    | id, name length, name bytes           |
//! | content width       | 1                   | skipped                               |
//! | params width        | 1                   | skipped                               |
//! | node IDs            | 2 x BLOCK_VOLUME    | one big-endian u16 per node           |
//! | param1              | BLOCK_VOLUME        |                                       |
//! | param2              | BLOCK_VOLUME        |                                       |
//!
//! Anything after the node data (metadata, static objects, timers) is ignored.
//!
//! ## Ownership
//!
//! A decoded `MapBlock` is immutable and knows nothing about where it lives in the
//! world. Callers share it behind an `Arc` and supply coordinates themselves.

use std::collections::HashMap;

use thiserror::Error;

use crate::spatial::{LocalPos, BLOCK_VOLUME};

mod encoder;
mod reader;

pub use encoder::MapBlockEncoder;
use reader::PayloadReader;

/// The only block serialization version this codec understands.
pub const SERIALIZATION_VERSION: u8 = 29;

const VERSION_LEN: usize = 1;
const FLAGS_LEN: usize = 1;
const LIGHTING_COMPLETE_LEN: usize = 2;
const TIMESTAMP_LEN: usize = 4;
const MAPPING_VERSION_LEN: usize = 1;
const CONTENT_WIDTH_LEN: usize = 1;
const PARAMS_WIDTH_LEN: usize = 1;

/// Bytes of block metadata before the mapping table that rendering does not need.
pub(crate) const HEADER_LEN: usize =
    FLAGS_LEN + LIGHTING_COMPLETE_LEN + TIMESTAMP_LEN + MAPPING_VERSION_LEN;
/// Bytes between the mapping table and the node data.
pub(crate) const NODE_FORMAT_LEN: usize = CONTENT_WIDTH_LEN + PARAMS_WIDTH_LEN;

/// The number of bytes each node occupies across all planes.
pub const NODE_SIZE_IN_BYTES: usize = 4;
/// The total size of the node data section.
pub const NODE_DATA_LEN: usize = BLOCK_VOLUME * NODE_SIZE_IN_BYTES;

const ID_PLANE_OFFSET: usize = 0;
const PARAM1_PLANE_OFFSET: usize = 2 * BLOCK_VOLUME;
const PARAM2_PLANE_OFFSET: usize = 3 * BLOCK_VOLUME;

/// A single node with its block-local content ID and parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    /// Index into the owning block's name mapping; not meaningful across blocks.
    pub id: u16,
    /// Auxiliary parameter 1, usually lighting.
    pub param1: u8,
    /// Auxiliary parameter 2, interpreted according to the node's name.
    pub param2: u8,
}

/// Reasons a block byte stream could not be decoded.
///
/// All of them are terminal for that one block only.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The version byte is not [`SERIALIZATION_VERSION`].
    #[error("unsupported block version: {0}")]
    UnsupportedVersion(u8),

    /// The compressed stream could not be decompressed.
    #[error("corrupt block data: {0}")]
    CorruptData(#[source] std::io::Error),

    /// A field or the node data is shorter than the layout requires.
    #[error("truncated block data: {field} needs {needed} bytes but only {available} remain")]
    TruncatedData {
        /// The layout field being read
        field: &'static str,
        /// Bytes the field requires
        needed: usize,
        /// Bytes that were left in the stream
        available: usize,
    },
}

/// A decoded block of `BLOCK_VOLUME` nodes and its ID to name mapping.
#[derive(Debug, Clone)]
pub struct MapBlock {
    mappings: HashMap<u16, String>,
    node_data: Box<[u8]>,
}

impl MapBlock {
    /// Decodes a raw block as stored by the persistence backend.
    ///
    /// # Errors
    /// * [`DecodeError::UnsupportedVersion`] if the version byte is not 29
    /// * [`DecodeError::CorruptData`] if decompression fails
    /// * [`DecodeError::TruncatedData`] if any field is cut short
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = PayloadReader::new(data);
        let version = reader.read_u8("version")?;
        if version != SERIALIZATION_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let payload = zstd::stream::decode_all(&data[VERSION_LEN..])
            .map_err(DecodeError::CorruptData)?;

        Self::decode_payload(&payload)
    }

    /// Decodes an already decompressed payload (everything after the version byte).
    pub fn decode_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = PayloadReader::new(payload);

        reader.skip(HEADER_LEN, "block header")?;

        let mapping_count = reader.read_u16("mapping count")?;
        let mut mappings = HashMap::with_capacity(mapping_count as usize);
        for _ in 0..mapping_count {
            let id = reader.read_u16("mapping id")?;
            let name = reader.read_string("mapping name")?;
            // a repeated id replaces the earlier name
            mappings.insert(id, name);
        }

        reader.skip(NODE_FORMAT_LEN, "node format")?;

        let node_data = reader.take(NODE_DATA_LEN, "node data")?;

        Ok(MapBlock {
            mappings,
            node_data: node_data.into(),
        })
    }

    /// Returns the global node name for a block-local ID.
    ///
    /// IDs without a mapping resolve to an empty string.
    pub fn resolve_name(&self, id: u16) -> &str {
        self.mappings.get(&id).map(String::as_str).unwrap_or("")
    }

    /// Returns the node at a position inside this block.
    ///
    /// `pos` must be a valid local position; every caller derives it with a
    /// Euclidean modulo so it always is.
    pub fn get_node(&self, pos: LocalPos) -> Node {
        let index = pos.index();
        let id_hi = self.node_data[ID_PLANE_OFFSET + 2 * index] as u16;
        let id_lo = self.node_data[ID_PLANE_OFFSET + 2 * index + 1] as u16;
        Node {
            id: (id_hi << 8) | id_lo,
            param1: self.node_data[PARAM1_PLANE_OFFSET + index],
            param2: self.node_data[PARAM2_PLANE_OFFSET + index],
        }
    }

    /// Iterates over the `(id, name)` pairs of the mapping table in no particular order.
    pub fn mappings(&self) -> impl Iterator<Item = (u16, &str)> {
        self.mappings.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// The number of distinct IDs in the mapping table.
    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    /// Iterates over every node of the block in node array order.
    pub fn nodes(&self) -> impl Iterator<Item = (LocalPos, Node)> + '_ {
        LocalPos::all().map(move |pos| (pos, self.get_node(pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone_block() -> MapBlockEncoder {
        let mut encoder = MapBlockEncoder::new();
        encoder.set_mapping(0, "air");
        encoder.set_mapping(5, "default:stone");
        encoder
    }

    #[test]
    fn decodes_encoded_block() {
        let mut encoder = stone_block();
        encoder.fill(Node {
            id: 5,
            param1: 7,
            param2: 2,
        });
        encoder.set_node(
            LocalPos::new(3, 4, 5),
            Node {
                id: 0,
                param1: 15,
                param2: 0,
            },
        );

        let block = MapBlock::decode(&encoder.encode().unwrap()).unwrap();

        assert_eq!(block.mapping_count(), 2);
        assert_eq!(block.resolve_name(5), "default:stone");
        assert_eq!(block.resolve_name(0), "air");
        assert_eq!(
            block.get_node(LocalPos::new(0, 0, 0)),
            Node {
                id: 5,
                param1: 7,
                param2: 2
            }
        );
        assert_eq!(
            block.get_node(LocalPos::new(3, 4, 5)),
            Node {
                id: 0,
                param1: 15,
                param2: 0
            }
        );
    }

    #[test]
    fn every_node_survives_decoding() {
        let mut encoder = MapBlockEncoder::new();
        for name_id in 0..4u16 {
            encoder.set_mapping(name_id * 300, &format!("test:node_{}", name_id));
        }
        for pos in LocalPos::all() {
            let index = pos.index();
            encoder.set_node(
                pos,
                Node {
                    id: (index % 4) as u16 * 300,
                    param1: (index % 251) as u8,
                    param2: (index / 16) as u8,
                },
            );
        }

        let block = MapBlock::decode(&encoder.encode().unwrap()).unwrap();

        for (pos, node) in block.nodes() {
            assert_eq!(node, encoder.node(pos));
            let expected = format!("test:node_{}", node.id / 300);
            assert_eq!(block.resolve_name(node.id), expected);
        }
    }

    #[test]
    fn rejects_other_versions() {
        let mut data = stone_block().encode().unwrap();
        for version in [0u8, 28, 30, 255] {
            data[0] = version;
            match MapBlock::decode(&data) {
                Err(DecodeError::UnsupportedVersion(v)) => assert_eq!(v, version),
                other => panic!("expected unsupported version, got {:?}", other),
            }
        }
    }

    #[test]
    fn last_duplicate_mapping_wins() {
        let mut encoder = MapBlockEncoder::new();
        encoder.push_mapping(1, "default:dirt");
        encoder.push_mapping(1, "default:grass");

        let block = MapBlock::decode(&encoder.encode().unwrap()).unwrap();

        assert_eq!(block.mapping_count(), 1);
        assert_eq!(block.resolve_name(1), "default:grass");
    }

    #[test]
    fn unmapped_ids_resolve_to_empty_name() {
        let block = MapBlock::decode(&stone_block().encode().unwrap()).unwrap();
        assert_eq!(block.resolve_name(42), "");
    }

    #[test]
    fn id_is_read_from_interleaved_plane() {
        let mut payload = stone_block().encode_payload().unwrap();
        let node_start = payload.len() - NODE_DATA_LEN;
        payload[node_start + 2 * 256] = 0x12;
        payload[node_start + 2 * 256 + 1] = 0x34;

        let block = MapBlock::decode_payload(&payload).unwrap();

        assert_eq!(LocalPos::new(0, 0, 1).index(), 256);
        assert_eq!(block.get_node(LocalPos::new(0, 0, 1)).id, 0x1234);
    }

    #[test]
    fn empty_input_is_truncated() {
        assert!(matches!(
            MapBlock::decode(&[]),
            Err(DecodeError::TruncatedData {
                field: "version",
                ..
            })
        ));
    }

    #[test]
    fn garbage_stream_is_corrupt() {
        let data = [SERIALIZATION_VERSION, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        assert!(matches!(
            MapBlock::decode(&data),
            Err(DecodeError::CorruptData(_))
        ));
    }

    #[test]
    fn short_node_data_is_truncated() {
        let mut payload = stone_block().encode_payload().unwrap();
        payload.truncate(payload.len() - 1);

        match MapBlock::decode_payload(&payload) {
            Err(DecodeError::TruncatedData {
                field,
                needed,
                available,
            }) => {
                assert_eq!(field, "node data");
                assert_eq!(needed, NODE_DATA_LEN);
                assert_eq!(available, NODE_DATA_LEN - 1);
            }
            other => panic!("expected truncated node data, got {:?}", other),
        }
    }

    #[test]
    fn short_mapping_table_is_truncated() {
        let payload = stone_block().encode_payload().unwrap();
        let cut = HEADER_LEN + 2 + 3;

        assert!(matches!(
            MapBlock::decode_payload(&payload[..cut]),
            Err(DecodeError::TruncatedData { .. })
        ));
    }

    #[test]
    fn trailing_sections_are_ignored() {
        let mut payload = stone_block().encode_payload().unwrap();
        payload.extend_from_slice(&[0xff; 64]);
        assert!(MapBlock::decode_payload(&payload).is_ok());
    }
}

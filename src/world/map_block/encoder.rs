//! Writes blocks in the layout [`MapBlock::decode`](super::MapBlock::decode) reads.
//!
//! Used to build fixtures and to store blocks through a backend.

use std::io;

use crate::spatial::{LocalPos, BLOCK_VOLUME};

use super::{
    Node, HEADER_LEN, NODE_DATA_LEN, PARAM1_PLANE_OFFSET, PARAM2_PLANE_OFFSET,
    SERIALIZATION_VERSION,
};

/// Width in bytes of a stored content ID.
const CONTENT_WIDTH: u8 = 2;
/// Width in bytes of the stored node parameters.
const PARAMS_WIDTH: u8 = 2;
/// zstd level 0 selects the library default.
const COMPRESSION_LEVEL: i32 = 0;

/// Builder for a serialized block.
///
/// Starts with every node set to `Node::default()` (ID 0, no params) and an empty
/// mapping table.
#[derive(Debug, Clone)]
pub struct MapBlockEncoder {
    mappings: Vec<(u16, String)>,
    nodes: Vec<Node>,
}

impl Default for MapBlockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MapBlockEncoder {
    /// Creates an encoder with all nodes zeroed and no mappings.
    pub fn new() -> Self {
        MapBlockEncoder {
            mappings: Vec::new(),
            nodes: vec![Node::default(); BLOCK_VOLUME],
        }
    }

    /// Maps `id` to `name`, replacing any previous mapping of `id`.
    pub fn set_mapping(&mut self, id: u16, name: &str) -> &mut Self {
        match self.mappings.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = name.to_string(),
            None => self.mappings.push((id, name.to_string())),
        }
        self
    }

    /// Appends a mapping entry even if `id` is already present.
    ///
    /// Produces tables with duplicate IDs, which readers resolve to the last entry.
    pub fn push_mapping(&mut self, id: u16, name: &str) -> &mut Self {
        self.mappings.push((id, name.to_string()));
        self
    }

    /// Sets one node.
    pub fn set_node(&mut self, pos: LocalPos, node: Node) -> &mut Self {
        self.nodes[pos.index()] = node;
        self
    }

    /// Sets every node of the block.
    pub fn fill(&mut self, node: Node) -> &mut Self {
        self.nodes.iter_mut().for_each(|slot| *slot = node);
        self
    }

    /// Returns the node currently stored at `pos`.
    pub fn node(&self, pos: LocalPos) -> Node {
        self.nodes[pos.index()]
    }

    /// Builds the uncompressed payload, i.e. everything after the version byte.
    ///
    /// # Errors
    /// Returns `io::ErrorKind::InvalidInput` if the mapping table has more than
    /// 65535 entries or a name is longer than 65535 bytes.
    pub fn encode_payload(&self) -> io::Result<Vec<u8>> {
        let mapping_len: usize = self
            .mappings
            .iter()
            .map(|(_, name)| 4 + name.len())
            .sum();
        let mut payload = Vec::with_capacity(HEADER_LEN + 2 + mapping_len + 2 + NODE_DATA_LEN);

        // flags, lighting_complete, timestamp and mapping version are zero
        payload.resize(HEADER_LEN, 0);

        let count = u16::try_from(self.mappings.len()).map_err(|_| {
            invalid_input(format!("{} mappings exceed the table limit", self.mappings.len()))
        })?;
        payload.extend_from_slice(&count.to_be_bytes());
        for (id, name) in &self.mappings {
            let bytes = name.as_bytes();
            let name_len = u16::try_from(bytes.len()).map_err(|_| {
                invalid_input(format!("name of ID {} is {} bytes long", id, bytes.len()))
            })?;
            payload.extend_from_slice(&id.to_be_bytes());
            payload.extend_from_slice(&name_len.to_be_bytes());
            payload.extend_from_slice(bytes);
        }

        payload.push(CONTENT_WIDTH);
        payload.push(PARAMS_WIDTH);

        let node_start = payload.len();
        payload.resize(node_start + NODE_DATA_LEN, 0);
        let node_data = &mut payload[node_start..];
        for (index, node) in self.nodes.iter().enumerate() {
            let [hi, lo] = node.id.to_be_bytes();
            node_data[2 * index] = hi;
            node_data[2 * index + 1] = lo;
            node_data[PARAM1_PLANE_OFFSET + index] = node.param1;
            node_data[PARAM2_PLANE_OFFSET + index] = node.param2;
        }

        Ok(payload)
    }

    /// Builds the complete stored form: the version byte followed by the zstd
    /// compressed payload.
    ///
    /// # Errors
    /// Fails if the payload cannot be built (see [`Self::encode_payload`]) or
    /// compression fails.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let payload = self.encode_payload()?;
        let compressed = zstd::stream::encode_all(payload.as_slice(), COMPRESSION_LEVEL)?;

        let mut data = Vec::with_capacity(1 + compressed.len());
        data.push(SERIALIZATION_VERSION);
        data.extend_from_slice(&compressed);
        Ok(data)
    }
}

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::spatial::BlockPos;

use super::{Backend, BackendError};

const FILE_PREFIX: &str = "block_";
const FILE_SUFFIX: &str = ".bin";

/// A backend storing each block as `block_{x}_{y}_{z}.bin` under a root directory.
///
/// Files hold the block bytes exactly as a database backend would return them.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    root: PathBuf,
}

impl DirectoryBackend {
    /// Opens a block directory.
    ///
    /// # Errors
    /// Returns `BackendError::Unavailable` if `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BackendError::Unavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(DirectoryBackend { root })
    }

    /// The directory blocks are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file a block is stored in.
    pub fn block_path(&self, pos: BlockPos) -> PathBuf {
        self.root.join(file_name(pos))
    }

    /// Writes raw block bytes, replacing any existing file.
    pub fn store(&self, pos: BlockPos, data: &[u8]) -> Result<(), BackendError> {
        fs::write(self.block_path(pos), data)?;
        Ok(())
    }

    /// Lists every stored block, sorted by coordinate.
    ///
    /// Files whose names do not follow the block naming scheme are skipped.
    pub fn list_blocks(&self) -> Result<Vec<BlockPos>, BackendError> {
        let mut blocks = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().to_str().and_then(parse_file_name) {
                Some(pos) => blocks.push(pos),
                None => debug!("Skipping non-block file {:?}", entry.path()),
            }
        }
        blocks.sort();
        Ok(blocks)
    }
}

impl Backend for DirectoryBackend {
    fn fetch_raw_block(&self, pos: BlockPos) -> Result<Option<Vec<u8>>, BackendError> {
        match fs::read(self.block_path(pos)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(BackendError::Io(err)),
        }
    }
}

fn file_name(pos: BlockPos) -> String {
    format!("{}{}_{}_{}{}", FILE_PREFIX, pos.x, pos.y, pos.z, FILE_SUFFIX)
}

fn parse_file_name(name: &str) -> Option<BlockPos> {
    let coords = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    let coords = coords
        .split('_')
        .map(|s| s.parse::<i32>().ok())
        .collect::<Option<Vec<i32>>>()?;

    let pos = match coords.as_slice() {
        [x, y, z] => BlockPos::new(*x, *y, *z),
        _ => return None,
    };
    // accept only the name `file_name` produces for the parsed position
    (file_name(pos) == name).then_some(pos)
}

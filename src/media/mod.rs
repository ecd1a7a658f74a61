//! # Media Cache
//!
//! Textures and node models loaded by file name from a media directory tree.
//!
//! Lookups never fail: a name that was not loaded yields a placeholder, so a render
//! with missing media still completes and the gaps are visible (a magenta and black
//! checkerboard for images, an empty mesh for models).

pub mod obj;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use log::{debug, info, warn};
use thiserror::Error;

pub use obj::{parse_obj, Mesh, MeshVertex, ObjParseError};

const PLACEHOLDER_MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
const PLACEHOLDER_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Errors raised while loading media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A directory or file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path being read
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A model file is malformed.
    #[error("invalid mesh {path}: {source}")]
    Obj {
        /// The model file
        path: PathBuf,
        /// What is wrong with it
        #[source]
        source: ObjParseError,
    },
}

/// Images and meshes keyed by file name, e.g. `default_stone.png`.
#[derive(Debug, Clone)]
pub struct MediaCache {
    images: HashMap<String, RgbaImage>,
    meshes: HashMap<String, Mesh>,
    placeholder_image: RgbaImage,
    placeholder_mesh: Mesh,
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        let mut placeholder_image = RgbaImage::new(2, 2);
        placeholder_image.put_pixel(0, 0, PLACEHOLDER_MAGENTA);
        placeholder_image.put_pixel(0, 1, PLACEHOLDER_BLACK);
        placeholder_image.put_pixel(1, 0, PLACEHOLDER_BLACK);
        placeholder_image.put_pixel(1, 1, PLACEHOLDER_MAGENTA);

        MediaCache {
            images: HashMap::new(),
            meshes: HashMap::new(),
            placeholder_image,
            placeholder_mesh: Mesh::default(),
        }
    }

    /// Loads every `.png` and `.obj` file below `root`, recursively.
    ///
    /// Images that fail to decode are logged and skipped. A malformed model aborts
    /// the load. Files with the same name in different directories replace each
    /// other in path order.
    pub fn fetch_media(&mut self, root: impl AsRef<Path>) -> Result<(), MediaError> {
        let root = root.as_ref();
        self.fetch_dir(root)?;
        info!(
            "Loaded {} images and {} meshes from {}",
            self.images.len(),
            self.meshes.len(),
            root.display()
        );
        Ok(())
    }

    fn fetch_dir(&mut self, dir: &Path) -> Result<(), MediaError> {
        let io_error = |source| MediaError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = fs::read_dir(dir)
            .map_err(io_error)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<PathBuf>, _>>()
            .map_err(io_error)?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.fetch_dir(&path)?;
            } else if path.is_file() {
                self.fetch_file(&path)?;
            }
        }
        Ok(())
    }

    fn fetch_file(&mut self, path: &Path) -> Result<(), MediaError> {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("png") => match image::open(path) {
                Ok(img) => {
                    debug!("Loaded image {}", path.display());
                    self.images.insert(name.to_string(), img.to_rgba8());
                }
                Err(err) => warn!("Skipping unreadable image {}: {}", path.display(), err),
            },
            Some("obj") => {
                let source = fs::read_to_string(path).map_err(|source| MediaError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let mesh = parse_obj(&source).map_err(|source| MediaError::Obj {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(
                    "Loaded mesh {} ({} triangles)",
                    path.display(),
                    mesh.triangle_count()
                );
                self.meshes.insert(name.to_string(), mesh);
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns the image called `name`, or the placeholder.
    pub fn image(&self, name: &str) -> &RgbaImage {
        self.images.get(name).unwrap_or_else(|| {
            warn!("Unknown image: {}", name);
            &self.placeholder_image
        })
    }

    /// Returns the mesh called `name`, or an empty mesh.
    pub fn mesh(&self, name: &str) -> &Mesh {
        self.meshes.get(name).unwrap_or_else(|| {
            warn!("Unknown mesh: {}", name);
            &self.placeholder_mesh
        })
    }

    /// Returns true if an image called `name` was loaded.
    pub fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// The number of loaded images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// The number of loaded meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, color: [u8; 4]) {
        RgbaImage::from_pixel(4, 4, Rgba(color)).save(path).unwrap();
    }

    #[test]
    fn placeholder_is_a_checkerboard() {
        let cache = MediaCache::new();
        let img = cache.image("missing.png");

        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(*img.get_pixel(0, 0), PLACEHOLDER_MAGENTA);
        assert_eq!(*img.get_pixel(1, 1), PLACEHOLDER_MAGENTA);
        assert_eq!(*img.get_pixel(0, 1), PLACEHOLDER_BLACK);
        assert_eq!(*img.get_pixel(1, 0), PLACEHOLDER_BLACK);
        assert!(cache.mesh("missing.obj").is_empty());
    }

    #[test]
    fn loads_tree_recursively_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("mods").join("default").join("textures");
        fs::create_dir_all(&nested).unwrap();
        write_png(&nested.join("default_stone.png"), [128, 128, 128, 255]);
        fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        fs::write(
            dir.path().join("slab.obj"),
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n",
        )
        .unwrap();
        fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();

        let mut cache = MediaCache::new();
        cache.fetch_media(dir.path()).unwrap();

        assert_eq!(cache.image_count(), 1);
        assert_eq!(cache.mesh_count(), 1);
        assert!(cache.has_image("default_stone.png"));
        assert!(!cache.has_image("broken.png"));
        assert_eq!(
            *cache.image("default_stone.png").get_pixel(3, 3),
            Rgba([128, 128, 128, 255])
        );
        assert_eq!(cache.mesh("slab.obj").triangle_count(), 1);
    }

    #[test]
    fn malformed_mesh_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.obj"), "f 1 2 3\n").unwrap();

        let err = MediaCache::new().fetch_media(dir.path()).unwrap_err();
        assert!(matches!(err, MediaError::Obj { ref source, .. } if source.line == 1));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MediaCache::new()
            .fetch_media(dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, MediaError::Io { .. }));
    }
}

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::errors::{Result, TavernError};

/// Asset byte source.
///
/// Loaders are pure functions over the returned bytes, so the same cache
/// logic runs against the file system or an in-memory table.
pub trait AssetSource {
    /// Reads the whole asset at `path` (relative to the source root).
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Local file system reader rooted at a directory.
pub struct FileAssetSource {
    root_path: PathBuf,
}

impl FileAssetSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetSource for FileAssetSource {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root_path.join(path);
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TavernError::AssetNotFound(full.display().to_string()),
            _ => TavernError::IoError(e),
        })
    }
}

/// In-memory asset table.
#[derive(Default)]
pub struct MemoryAssetSource {
    files: FxHashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl AssetSource for MemoryAssetSource {
    fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| TavernError::AssetNotFound(path.to_string()))
    }
}

//! Archive entry records.

use distpatch_core::{ContentDigest, path};

use crate::hasher;

/// One entry read from a distribution archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry name, including the top-level directory.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Uncompressed size in bytes (zero for directories).
    pub size: u64,
    /// Content digest, when the entry was hashed.
    pub digest: Option<ContentDigest>,
}

impl ArchiveEntry {
    /// Create a hashed file entry from in-memory contents.
    pub fn file(path: impl Into<String>, contents: impl AsRef<[u8]>) -> Self {
        let contents = contents.as_ref();
        Self {
            path: path.into(),
            is_dir: false,
            size: contents.len() as u64,
            digest: Some(hasher::digest(contents)),
        }
    }

    /// Create a file entry whose contents were not hashed.
    pub fn unhashed(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            size,
            digest: None,
        }
    }

    /// Create a directory entry.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            size: 0,
            digest: None,
        }
    }

    /// Path inside the distribution, without the top-level directory.
    pub fn relative_path(&self) -> &str {
        path::relative_path(&self.path)
    }

    /// Name of the top-level directory this entry lives in.
    pub fn top_level(&self) -> &str {
        path::split_top_level(&self.path).0
    }
}

//! Zip-backed distribution reader.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::trace;
use zip::ZipArchive;
use zip::result::ZipError;

use distpatch_core::DistError;

use crate::entry::ArchiveEntry;
use crate::hasher;

/// Listing information for a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Index of the entry inside the archive.
    pub index: usize,
    /// Full entry name, including the top-level directory.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// A distribution archive on disk.
///
/// Entries are read one at a time. Every content stream is fully drained
/// and dropped before the next entry is opened, so at most one entry
/// stream is open at any moment.
pub struct ZipDistribution {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ZipDistribution {
    /// Open a distribution archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DistError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| DistError::io(&path, e))?;
        let metadata = file.metadata().map_err(|e| DistError::io(&path, e))?;
        if metadata.is_dir() {
            return Err(DistError::NotAnArchive { path });
        }

        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| match e {
            ZipError::InvalidArchive(_) => DistError::NotAnArchive { path: path.clone() },
            ZipError::Io(source) => DistError::io(&path, source),
            other => DistError::archive(&path, other),
        })?;

        Ok(Self { path, archive })
    }

    /// Path of the archive on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive file name without the `.zip` extension.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Check if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// List all entries without reading their contents.
    pub fn list(&mut self) -> Result<Vec<EntryInfo>, DistError> {
        (0..self.len()).map(|index| self.entry_info(index)).collect()
    }

    /// Listing information for one entry.
    pub fn entry_info(&mut self, index: usize) -> Result<EntryInfo, DistError> {
        let file = self
            .archive
            .by_index_raw(index)
            .map_err(|e| zip_error(&self.path, e))?;
        Ok(EntryInfo {
            index,
            name: file.name().to_string(),
            is_dir: file.is_dir(),
            size: file.size(),
        })
    }

    /// Read one entry's contents into memory.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>, DistError> {
        let mut contents = Vec::new();
        self.copy_entry(index, &mut contents)?;
        Ok(contents)
    }

    /// Stream one entry's contents into a writer.
    pub fn copy_entry<W: Write>(&mut self, index: usize, writer: &mut W) -> Result<u64, DistError> {
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|e| zip_error(&self.path, e))?;
        let name = file.name().to_string();
        io::copy(&mut file, writer).map_err(|source| DistError::EntryRead {
            archive: self.path.clone(),
            entry: name,
            source,
        })
    }

    /// Iterate over every entry in archive order.
    ///
    /// With `hash` set, each file stream is hashed while it is drained and
    /// the entry carries the decompressed size. Otherwise file streams are
    /// never opened for decompression and sizes come from the entry headers.
    pub fn entries(&mut self, hash: bool) -> ZipEntries<'_> {
        ZipEntries {
            dist: self,
            next: 0,
            hash,
        }
    }

    fn read_archive_entry(&mut self, index: usize, hash: bool) -> Result<ArchiveEntry, DistError> {
        if !hash {
            let info = self.entry_info(index)?;
            trace!(entry = %info.name, is_dir = info.is_dir, "Listing archive entry");
            return Ok(if info.is_dir {
                ArchiveEntry::directory(info.name)
            } else {
                ArchiveEntry::unhashed(info.name, info.size)
            });
        }

        let mut file = self
            .archive
            .by_index(index)
            .map_err(|e| zip_error(&self.path, e))?;
        let name = file.name().to_string();
        trace!(entry = %name, is_dir = file.is_dir(), "Reading archive entry");
        if file.is_dir() {
            return Ok(ArchiveEntry::directory(name));
        }

        let (digest, size) =
            hasher::digest_reader(&mut file).map_err(|source| DistError::EntryRead {
                archive: self.path.clone(),
                entry: name.clone(),
                source,
            })?;
        Ok(ArchiveEntry {
            path: name,
            is_dir: false,
            size,
            digest: Some(digest),
        })
    }
}

impl std::fmt::Debug for ZipDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipDistribution")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

/// Iterator over the entries of a [`ZipDistribution`].
pub struct ZipEntries<'a> {
    dist: &'a mut ZipDistribution,
    next: usize,
    hash: bool,
}

impl Iterator for ZipEntries<'_> {
    type Item = Result<ArchiveEntry, DistError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dist.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.dist.read_archive_entry(index, self.hash))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dist.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

fn zip_error(path: &Path, err: ZipError) -> DistError {
    match err {
        ZipError::Io(source) => DistError::io(path, source),
        other => DistError::archive(path, other),
    }
}

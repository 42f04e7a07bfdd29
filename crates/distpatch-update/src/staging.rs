//! Staging directory and update archive assembly.
//!
//! Layout of a staged update:
//!
//! ```text
//! <staging_root>/<update_name>/
//!     update-descriptor.yaml
//!     LICENSE.txt
//!     carbon.home/<relative paths of added and modified files>
//! ```
//!
//! The staged tree is zipped with `<update_name>/` as its top-level
//! directory.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, info, trace, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use distpatch_core::path;
use distpatch_diff::Classification;
use distpatch_scan::ZipDistribution;

use crate::config::PackagingConfig;
use crate::descriptor::UpdateDescriptor;
use crate::error::UpdateError;

/// Directory inside an update that mirrors the product home.
pub const CARBON_HOME: &str = "carbon.home";

/// Files copied into the staging area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Number of files written.
    pub files: usize,
    /// Bytes written.
    pub bytes: u64,
}

/// A packaged update archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedUpdate {
    /// Path of the written archive.
    pub path: PathBuf,
    /// Number of archive entries, directories included.
    pub entries: usize,
    /// Size of the archive on disk.
    pub size: u64,
}

/// Working directory in which an update is assembled.
///
/// The directory is removed when the staging area is dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: PathBuf,
    carbon_home: PathBuf,
    update_name: String,
    cleaned: bool,
}

impl StagingArea {
    /// Create `<staging_root>/<update_name>/carbon.home/`.
    ///
    /// A leftover directory from an earlier run is removed first.
    pub fn create(staging_root: impl AsRef<Path>, update_name: &str) -> Result<Self, UpdateError> {
        let dir = staging_root.as_ref().join(update_name);
        if dir.exists() {
            debug!(path = %dir.display(), "Removing stale staging directory");
            fs::remove_dir_all(&dir).map_err(|e| UpdateError::io(&dir, e))?;
        }

        let carbon_home = dir.join(CARBON_HOME);
        fs::create_dir_all(&carbon_home).map_err(|e| UpdateError::io(&carbon_home, e))?;
        debug!(path = %dir.display(), "Staging directory created");

        Ok(Self {
            dir,
            carbon_home,
            update_name: update_name.to_string(),
            cleaned: false,
        })
    }

    /// The `<staging_root>/<update_name>` directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// The `carbon.home` directory inside the staging area.
    pub fn carbon_home(&self) -> &Path {
        &self.carbon_home
    }

    /// Name of the update being staged.
    pub fn update_name(&self) -> &str {
        &self.update_name
    }

    /// Copy every added and modified file out of the updated distribution.
    ///
    /// This is a second, sequential read of the archive. Only the entries
    /// that ship with the update are decompressed.
    pub fn stage_changes(
        &self,
        dist: &mut ZipDistribution,
        classification: &Classification,
    ) -> Result<StageSummary, UpdateError> {
        let mut pending: BTreeSet<&str> = classification.changed_files().collect();
        let mut summary = StageSummary::default();
        info!(files = pending.len(), archive = %dist.path().display(), "Staging changed files");

        for index in 0..dist.len() {
            if pending.is_empty() {
                break;
            }
            let info = dist.entry_info(index)?;
            if info.is_dir {
                continue;
            }
            let relative = path::relative_path(&info.name);
            if !pending.remove(relative) {
                continue;
            }

            let destination = self.carbon_home_path(relative);
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| UpdateError::io(parent, e))?;
            }
            let mut out = File::create(&destination).map_err(|e| UpdateError::io(&destination, e))?;
            let bytes = dist.copy_entry(index, &mut out)?;
            trace!(path = %relative, bytes, "Staged file");

            summary.files += 1;
            summary.bytes += bytes;
        }

        if let Some(missing) = pending.into_iter().next() {
            return Err(UpdateError::NotInArchive {
                path: missing.to_string(),
                archive: dist.path().display().to_string(),
            });
        }

        debug!(files = summary.files, bytes = summary.bytes, "Changed files staged");
        Ok(summary)
    }

    /// Copy resource files from the update directory.
    ///
    /// A missing mandatory resource is an error, a missing optional one is
    /// only logged. Returns the names of the copied files.
    pub fn stage_resources(
        &self,
        update_dir: impl AsRef<Path>,
        config: &PackagingConfig,
    ) -> Result<Vec<String>, UpdateError> {
        let update_dir = update_dir.as_ref();
        let mut copied = Vec::new();

        for name in &config.mandatory_resources {
            let source = update_dir.join(name);
            if !source.is_file() {
                return Err(UpdateError::MissingResource {
                    name: name.clone(),
                    directory: update_dir.to_path_buf(),
                });
            }
            self.copy_resource(&source, name)?;
            copied.push(name.clone());
        }

        for name in &config.optional_resources {
            let source = update_dir.join(name);
            if !source.is_file() {
                info!(resource = %name, "Optional resource not found, skipping");
                continue;
            }
            self.copy_resource(&source, name)?;
            copied.push(name.clone());
        }

        debug!(count = copied.len(), "Resource files staged");
        Ok(copied)
    }

    /// Write the descriptor into the staging area.
    pub fn write_descriptor(&self, descriptor: &UpdateDescriptor) -> Result<PathBuf, UpdateError> {
        descriptor.save(&self.dir)
    }

    /// Zip the staging area into `<output_dir>/<update_name>.zip`.
    pub fn package(&self, output_dir: impl AsRef<Path>) -> Result<PackagedUpdate, UpdateError> {
        let output = output_dir.as_ref().join(format!("{}.zip", self.update_name));
        info!(path = %output.display(), "Creating update archive");

        let file = File::create(&output).map_err(|e| UpdateError::io(&output, e))?;
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut entries = 0;

        let walker = WalkDir::new(&self.dir)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false);

        for entry in walker {
            let entry = entry.map_err(|e| UpdateError::zip(&output, e))?;
            let entry_path = entry.path();
            let Ok(relative) = entry_path.strip_prefix(&self.dir) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            let name = archive_name(&self.update_name, relative);

            if entry.file_type().is_dir() {
                writer
                    .add_directory(format!("{name}/"), options)
                    .map_err(|e| UpdateError::zip(&output, e))?;
            } else {
                writer
                    .start_file(name.as_str(), options)
                    .map_err(|e| UpdateError::zip(&output, e))?;
                let mut source =
                    File::open(&entry_path).map_err(|e| UpdateError::io(&entry_path, e))?;
                io::copy(&mut source, &mut writer).map_err(|e| UpdateError::io(&output, e))?;
            }
            trace!(entry = %name, "Added to update archive");
            entries += 1;
        }

        writer.finish().map_err(|e| UpdateError::zip(&output, e))?;
        let size = fs::metadata(&output)
            .map_err(|e| UpdateError::io(&output, e))?
            .len();

        info!(path = %output.display(), entries, size, "Update archive created");
        Ok(PackagedUpdate {
            path: output,
            entries,
            size,
        })
    }

    /// Remove the staging directory, reporting failures.
    pub fn close(mut self) -> Result<(), UpdateError> {
        self.cleaned = true;
        fs::remove_dir_all(&self.dir).map_err(|e| UpdateError::io(&self.dir, e))
    }

    fn carbon_home_path(&self, relative: &str) -> PathBuf {
        path::segments(relative).fold(self.carbon_home.clone(), |acc, segment| acc.join(segment))
    }

    fn copy_resource(&self, source: &Path, name: &str) -> Result<(), UpdateError> {
        let destination = self.dir.join(name);
        fs::copy(source, &destination).map_err(|e| UpdateError::io(source, e))?;
        trace!(resource = %name, "Copied resource");
        Ok(())
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.cleaned || !self.dir.exists() {
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.dir) {
            warn!(path = %self.dir.display(), error = %err, "Failed to remove staging directory");
        }
    }
}

/// Archive entry name for a path relative to the staging directory.
fn archive_name(update_name: &str, relative: &Path) -> String {
    let mut name = update_name.to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_layout() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::create(temp.path(), "UPDATE-1.0-0001").unwrap();

        assert!(staging.carbon_home().is_dir());
        assert_eq!(staging.path(), temp.path().join("UPDATE-1.0-0001"));
        assert_eq!(
            staging.carbon_home_path("lib/a.jar"),
            temp.path().join("UPDATE-1.0-0001").join("carbon.home").join("lib").join("a.jar")
        );
    }

    #[test]
    fn test_drop_removes_directory() {
        let temp = TempDir::new().unwrap();
        let dir = {
            let staging = StagingArea::create(temp.path(), "U").unwrap();
            staging.path().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[test]
    fn test_create_replaces_stale_directory() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("U").join("leftover.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        let staging = StagingArea::create(temp.path(), "U").unwrap();
        assert!(!stale.exists());
        staging.close().unwrap();
    }

    #[test]
    fn test_missing_mandatory_resource() {
        let temp = TempDir::new().unwrap();
        let update_dir = temp.path().join("update");
        fs::create_dir_all(&update_dir).unwrap();
        let staging = StagingArea::create(temp.path().join("staging"), "U").unwrap();

        let err = staging
            .stage_resources(&update_dir, &PackagingConfig::default())
            .unwrap_err();
        assert!(matches!(err, UpdateError::MissingResource { ref name, .. } if name == "LICENSE.txt"));
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(
            archive_name("U", Path::new("carbon.home").join("lib").as_path()),
            "U/carbon.home/lib"
        );
    }
}

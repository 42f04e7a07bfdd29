//! Consistency checks for a packaged update.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use distpatch_core::{DiffConfig, DistributionTree, NodeKind, path};
use distpatch_scan::{TreeBuilder, ZipDistribution};

use crate::descriptor::{DESCRIPTOR_FILE, UpdateDescriptor};
use crate::error::UpdateError;
use crate::staging::CARBON_HOME;

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Update name, taken from the archive file name.
    pub update_name: String,
    /// Added files found in the update archive.
    pub added_files: usize,
    /// Modified files found in the update archive.
    pub modified_files: usize,
    /// Removed paths found in the previous distribution.
    pub removed_files: usize,
}

/// Check an update archive against the distribution it applies to.
///
/// The archive must contain `<update_name>/update-descriptor.yaml`, every
/// added and modified file must be present under `carbon.home/`, and
/// every removed path must exist in the previous distribution. A removed
/// path with a trailing `/` must be a directory there. The first missing
/// path fails the validation.
pub fn validate_update(
    update_zip: impl AsRef<Path>,
    previous_distribution: impl AsRef<Path>,
) -> Result<ValidationReport, UpdateError> {
    let mut update = ZipDistribution::open(update_zip.as_ref())?;
    let update_name = update.name();
    info!(update = %update_name, "Validating update archive");

    let descriptor = read_descriptor(&mut update, &update_name)?;
    descriptor.validate()?;

    // Only presence matters here.
    let builder = TreeBuilder::new(DiffConfig {
        check_digests: false,
        ..DiffConfig::default()
    });

    let update_tree = builder.build_from_archive(&mut update)?;
    let changes = &descriptor.file_changes;
    let update_label = update.path().display().to_string();
    for relative in changes.added_files.iter().chain(changes.modified_files.iter()) {
        let staged = path::join(CARBON_HOME, path::normalize(relative));
        require(&update_tree, &staged, Some(NodeKind::File), relative, &update_label)?;
    }
    debug!(
        added = changes.added_files.len(),
        modified = changes.modified_files.len(),
        "Added and modified files present in update archive"
    );

    let mut previous = ZipDistribution::open(previous_distribution.as_ref())?;
    let previous_tree = builder.build_from_archive(&mut previous)?;
    let previous_label = previous.path().display().to_string();
    for relative in &changes.removed_files {
        let kind = relative.ends_with('/').then_some(NodeKind::Directory);
        require(&previous_tree, relative, kind, relative, &previous_label)?;
    }
    debug!(removed = changes.removed_files.len(), "Removed paths present in previous distribution");

    info!(update = %update_name, "Update archive is valid");
    Ok(ValidationReport {
        update_name,
        added_files: changes.added_files.len(),
        modified_files: changes.modified_files.len(),
        removed_files: changes.removed_files.len(),
    })
}

fn read_descriptor(
    update: &mut ZipDistribution,
    update_name: &str,
) -> Result<UpdateDescriptor, UpdateError> {
    let entry = format!("{update_name}/{DESCRIPTOR_FILE}");
    let index = update
        .list()?
        .into_iter()
        .find(|info| !info.is_dir && info.name == entry)
        .map(|info| info.index)
        .ok_or_else(|| UpdateError::MissingDescriptor {
            entry: entry.clone(),
            archive: update.path().to_path_buf(),
        })?;

    let bytes = update.read_entry(index)?;
    let contents = String::from_utf8_lossy(&bytes);
    UpdateDescriptor::from_yaml(&contents, update.path().join(&entry))
}

/// Fail unless `lookup_path` exists in the tree, of `kind` when given.
fn require(
    tree: &DistributionTree,
    lookup_path: &str,
    kind: Option<NodeKind>,
    listed_path: &str,
    archive: &str,
) -> Result<(), UpdateError> {
    let found = match kind {
        Some(kind) => tree.exists(lookup_path, kind),
        None => tree.find(lookup_path).is_some(),
    };
    if !found {
        return Err(UpdateError::NotInArchive {
            path: listed_path.to_string(),
            archive: archive.to_string(),
        });
    }
    trace!(path = %listed_path, archive, "Path present");
    Ok(())
}

//! Folds a classification into a descriptor's file-change lists.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use distpatch_diff::Classification;

use crate::descriptor::UpdateDescriptor;

/// Number of paths appended to each list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationSummary {
    pub modified_files: usize,
    pub removed_files: usize,
    pub added_files: usize,
}

impl MutationSummary {
    /// Total number of appended paths.
    pub fn total(&self) -> usize {
        self.modified_files + self.removed_files + self.added_files
    }
}

/// Append the classification sets to the descriptor's `file_changes`.
///
/// Modified paths go to `modified_files`. Removed directories, then
/// removed files, go to `removed_files`. Added paths go to `added_files`.
/// Existing list contents are kept and nothing is deduplicated against
/// them, so this is meant to run once per descriptor.
pub fn apply(descriptor: &mut UpdateDescriptor, classification: &Classification) -> MutationSummary {
    let changes = &mut descriptor.file_changes;

    for path in &classification.modified {
        trace!(path = %path, "Modified file");
        changes.modified_files.push(path.clone());
    }
    for path in &classification.removed_directories {
        trace!(path = %path, "Removed directory");
        changes.removed_files.push(path.clone());
    }
    for path in &classification.removed_files {
        trace!(path = %path, "Removed file");
        changes.removed_files.push(path.clone());
    }
    for path in &classification.added {
        trace!(path = %path, "Added file");
        changes.added_files.push(path.clone());
    }

    let summary = MutationSummary {
        modified_files: classification.modified.len(),
        removed_files: classification.removed_count(),
        added_files: classification.added.len(),
    };
    debug!(
        modified = summary.modified_files,
        removed = summary.removed_files,
        added = summary.added_files,
        "Descriptor file changes updated"
    );
    summary
}

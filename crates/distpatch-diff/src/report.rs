//! Diff reports for display and JSON output.

use serde::{Deserialize, Serialize};

use distpatch_core::DistributionTree;

use crate::classify::Classification;

/// Counts per classification set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub modified: usize,
    pub removed_files: usize,
    pub removed_directories: usize,
    pub added: usize,
}

impl DiffSummary {
    /// Summarize a classification.
    pub fn from_classification(classification: &Classification) -> Self {
        Self {
            modified: classification.modified.len(),
            removed_files: classification.removed_files.len(),
            removed_directories: classification.removed_directories.len(),
            added: classification.added.len(),
        }
    }

    /// Total number of entries.
    pub fn total(&self) -> usize {
        self.modified + self.removed_files + self.removed_directories + self.added
    }
}

/// Full result of diffing two distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffReport {
    /// Display name of the previous distribution.
    pub previous: String,
    /// Display name of the updated distribution.
    pub updated: String,
    /// Files in the previous distribution.
    pub previous_files: u64,
    /// Files in the updated distribution.
    pub updated_files: u64,
    /// Per-set counts.
    pub summary: DiffSummary,
    /// The classification itself.
    pub changes: Classification,
    /// Warnings raised while reading either distribution.
    pub warnings: Vec<String>,
}

impl DiffReport {
    /// Create a report for a classification of two trees.
    pub fn new(
        previous: &DistributionTree,
        updated: &DistributionTree,
        changes: Classification,
    ) -> Self {
        let warnings = previous
            .warnings
            .iter()
            .chain(updated.warnings.iter())
            .map(|w| w.message.clone())
            .collect();

        Self {
            previous: previous.display_name(),
            updated: updated.display_name(),
            previous_files: previous.total_files(),
            updated_files: updated.total_files(),
            summary: DiffSummary::from_classification(&changes),
            changes,
            warnings,
        }
    }

    /// Check if the distributions differ at all.
    pub fn has_changes(&self) -> bool {
        self.summary.total() > 0
    }
}

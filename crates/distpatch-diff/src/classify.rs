//! Three-way classification of two distribution trees.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use distpatch_core::{DiffConfig, DistributionNode, DistributionTree, NodeKind, path};

use crate::features::FeatureRootPolicy;

/// Result of classifying an updated distribution against a previous one.
///
/// All sets hold relative paths without a trailing slash. `modified` shares
/// no path with the removal sets or with `added`. A path whose type changed
/// (a file became a directory or the other way round) is reported as
/// removed and, for the new file, as added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Files present on both sides with different contents.
    pub modified: BTreeSet<String>,
    /// Files present only in the previous distribution.
    pub removed_files: BTreeSet<String>,
    /// Directories present only in the previous distribution. Nothing
    /// below a listed directory is listed again.
    pub removed_directories: BTreeSet<String>,
    /// Files present only in the updated distribution.
    pub added: BTreeSet<String>,
}

impl Classification {
    /// Create an empty classification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the two distributions were identical.
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
            && self.removed_files.is_empty()
            && self.removed_directories.is_empty()
            && self.added.is_empty()
    }

    /// Number of removal entries (directories and files).
    pub fn removed_count(&self) -> usize {
        self.removed_files.len() + self.removed_directories.len()
    }

    /// Total number of entries across all sets.
    pub fn total_changes(&self) -> usize {
        self.modified.len() + self.removed_count() + self.added.len()
    }

    /// Files whose updated contents must ship with the update.
    pub fn changed_files(&self) -> impl Iterator<Item = &str> {
        self.added
            .iter()
            .chain(self.modified.iter())
            .map(String::as_str)
    }

    /// Check whether a path is removed, directly or through a removed
    /// ancestor directory.
    pub fn is_removed(&self, relative_path: &str) -> bool {
        let relative_path = path::normalize(relative_path);
        self.removed_files.contains(relative_path)
            || self.removed_directories.contains(relative_path)
            || self
                .removed_directories
                .iter()
                .any(|dir| path::is_ancestor(dir, relative_path))
    }
}

/// Classifies changes between two pre-built distribution trees.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: DiffConfig,
    policy: FeatureRootPolicy,
}

impl Classifier {
    /// Create a new classifier.
    pub fn new(config: DiffConfig) -> Self {
        let policy = FeatureRootPolicy::from_config(&config);
        Self { config, policy }
    }

    /// Configuration used by this classifier.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Classify every path of both trees.
    pub fn classify(
        &self,
        previous: &DistributionTree,
        updated: &DistributionTree,
    ) -> Classification {
        let start = Instant::now();
        let mut classification = Classification::new();

        info!(
            previous = %previous.display_name(),
            updated = %updated.display_name(),
            "Classifying changes"
        );

        for child in previous.root.children.values() {
            self.classify_previous(child, updated, &mut classification);
        }
        debug!(
            modified = classification.modified.len(),
            removed_files = classification.removed_files.len(),
            removed_directories = classification.removed_directories.len(),
            "Previous distribution walked"
        );

        updated.root.for_each_descendant(&mut |node: &DistributionNode| {
            if node.is_file() && !previous.exists(&node.relative_path, NodeKind::File) {
                trace!(path = %node.relative_path, "Added");
                classification.added.insert(node.relative_path.clone());
            }
        });
        debug!(added = classification.added.len(), "Updated distribution walked");

        self.policy.collapse(
            &mut classification.removed_files,
            &mut classification.removed_directories,
            updated,
        );

        info!(
            modified = classification.modified.len(),
            removed = classification.removed_count(),
            added = classification.added.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Classification complete"
        );
        classification
    }

    fn classify_previous(
        &self,
        node: &DistributionNode,
        updated: &DistributionTree,
        classification: &mut Classification,
    ) {
        let relative_path = node.relative_path.as_str();
        match node.kind {
            NodeKind::File => match updated.lookup(relative_path, NodeKind::File) {
                Some(counterpart) => {
                    if self.config.check_digests && counterpart.digest != node.digest {
                        trace!(path = %relative_path, "Modified");
                        classification.modified.insert(relative_path.to_string());
                    }
                }
                None => {
                    trace!(path = %relative_path, "Removed file");
                    classification.removed_files.insert(relative_path.to_string());
                }
            },
            NodeKind::Directory => {
                if updated.exists(relative_path, NodeKind::Directory) {
                    for child in node.children.values() {
                        self.classify_previous(child, updated, classification);
                    }
                } else {
                    // Everything below is implied by the directory removal.
                    trace!(path = %relative_path, "Removed directory");
                    classification
                        .removed_directories
                        .insert(relative_path.to_string());
                }
            }
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DiffConfig::default())
    }
}

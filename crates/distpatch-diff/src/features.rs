//! Feature-root collapsing.
//!
//! Feature directories under the features root are versioned
//! (`<root>/org.example.feature_1.2.0/...`) and replaced as a unit by the
//! installer. A removal below a feature directory that is gone from the
//! updated distribution is recorded as the removal of the feature
//! directory itself. Features that survive keep their per-file removals.

use std::collections::BTreeSet;

use tracing::trace;

use distpatch_core::{DiffConfig, DistributionTree, NodeKind, path};

/// Removal collapsing policy for a configured features root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRootPolicy {
    root: Option<String>,
}

impl FeatureRootPolicy {
    /// Create a policy for the given features root.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let root = path::normalize(&root).to_string();
        Self {
            root: (!root.is_empty()).then_some(root),
        }
    }

    /// A policy that never collapses anything.
    pub fn disabled() -> Self {
        Self { root: None }
    }

    /// Policy described by a diff configuration.
    pub fn from_config(config: &DiffConfig) -> Self {
        config
            .features_root()
            .map(Self::new)
            .unwrap_or_else(Self::disabled)
    }

    /// The configured features root.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Feature directory that a path lies strictly below, if any.
    ///
    /// `features/foo/plugins/a.jar` maps to `features/foo`. The feature
    /// directory itself, the features root and paths outside it map to
    /// `None`.
    pub fn feature_dir<'a>(&self, relative_path: &'a str) -> Option<&'a str> {
        let root = self.root.as_deref()?;
        if !path::is_ancestor(root, relative_path) {
            return None;
        }

        let rest = &relative_path[root.len() + 1..];
        let (feature, below) = rest.split_once('/')?;
        if feature.is_empty() || below.is_empty() {
            return None;
        }
        Some(&relative_path[..root.len() + 1 + feature.len()])
    }

    /// Collapse removals below feature directories that no longer exist.
    ///
    /// Files and directories below `<root>/<feature>/` are replaced by the
    /// single directory `<root>/<feature>` when `updated` has no directory
    /// at that path. Anything left below a removed directory afterwards is
    /// pruned, so every removal is listed once.
    pub fn collapse(
        &self,
        removed_files: &mut BTreeSet<String>,
        removed_directories: &mut BTreeSet<String>,
        updated: &DistributionTree,
    ) {
        if self.root.is_none() {
            return;
        }

        let mut collapsed = BTreeSet::new();
        for removed in removed_files.iter().chain(removed_directories.iter()) {
            if let Some(feature) = self.removed_feature(removed, updated) {
                trace!(path = %removed, feature, "Collapsing removal to feature directory");
                collapsed.insert(feature.to_string());
            }
        }
        if collapsed.is_empty() {
            return;
        }

        removed_directories.retain(|dir| self.removed_feature(dir, updated).is_none());
        removed_directories.extend(collapsed);

        let directories: Vec<String> = removed_directories.iter().cloned().collect();
        let covered = |p: &String| directories.iter().any(|dir| path::is_ancestor(dir, p));
        removed_directories.retain(|dir| !covered(dir));
        removed_files.retain(|file| !covered(file));
    }

    /// Feature directory of a path when `updated` no longer has it.
    fn removed_feature<'a>(&self, relative_path: &'a str, updated: &DistributionTree) -> Option<&'a str> {
        self.feature_dir(relative_path)
            .filter(|feature| !updated.exists(feature, NodeKind::Directory))
    }
}

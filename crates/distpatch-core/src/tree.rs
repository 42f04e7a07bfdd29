//! Distribution tree container, lookups and statistics.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BuildWarning;
use crate::node::{DistributionNode, NodeKind};

/// Summary statistics for a built tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeStats {
    /// Number of archive entries read.
    pub entries_read: u64,
    /// Total number of file entries.
    pub total_files: u64,
    /// Total number of directory entries.
    pub total_dirs: u64,
    /// Total uncompressed bytes of file entries.
    pub total_bytes: u64,
    /// Maximum depth reached.
    pub max_depth: u32,
}

impl TreeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a file entry.
    pub fn record_file(&mut self, size: u64, depth: u32) {
        self.entries_read += 1;
        self.total_files += 1;
        self.total_bytes += size;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a directory entry.
    pub fn record_dir(&mut self, depth: u32) {
        self.entries_read += 1;
        self.total_dirs += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record an entry that did not contribute a node.
    pub fn record_skipped(&mut self) {
        self.entries_read += 1;
    }
}

/// A fully built, read-only distribution tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionTree {
    /// Root node (the inside of the top-level directory).
    pub root: DistributionNode,

    /// Name of the top-level directory, if any entry was seen.
    pub root_name: Option<String>,

    /// Archive the tree was built from, if it came from disk.
    pub source: Option<PathBuf>,

    /// Summary statistics.
    pub stats: TreeStats,

    /// Time taken to read and hash the entries.
    pub build_duration: Duration,

    /// Warnings encountered while building.
    pub warnings: Vec<BuildWarning>,
}

impl DistributionTree {
    /// Create a new distribution tree.
    pub fn new(
        root: DistributionNode,
        root_name: Option<String>,
        stats: TreeStats,
        build_duration: Duration,
        warnings: Vec<BuildWarning>,
    ) -> Self {
        Self {
            root,
            root_name,
            source: None,
            stats,
            build_duration,
            warnings,
        }
    }

    /// Attach the archive path the tree was read from.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Look up a node by relative path, requiring the given kind.
    ///
    /// A node of the other kind at the same path counts as not found: a
    /// directory never satisfies a file lookup and vice versa.
    pub fn lookup(&self, relative_path: &str, kind: NodeKind) -> Option<&DistributionNode> {
        self.root.find(relative_path).filter(|node| node.kind == kind)
    }

    /// Check whether a node of the given kind exists at a relative path.
    pub fn exists(&self, relative_path: &str, kind: NodeKind) -> bool {
        self.lookup(relative_path, kind).is_some()
    }

    /// Look up a node by relative path, whatever its kind.
    pub fn find(&self, relative_path: &str) -> Option<&DistributionNode> {
        self.root.find(relative_path)
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.stats.total_files
    }

    /// Get the total number of directories.
    pub fn total_dirs(&self) -> u64 {
        self.stats.total_dirs
    }

    /// Check if there were any warnings while building.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Display name for logs: the top-level directory or the archive path.
    pub fn display_name(&self) -> String {
        match (&self.root_name, &self.source) {
            (Some(name), _) => name.clone(),
            (None, Some(source)) => source.display().to_string(),
            (None, None) => "<empty distribution>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ContentDigest;

    fn sample_tree() -> DistributionTree {
        let mut root = DistributionNode::new_root();
        root.insert(&["bin"], NodeKind::Directory, None);
        root.insert(
            &["bin", "run.sh"],
            NodeKind::File,
            Some(ContentDigest::new([7; 32])),
        );
        root.insert(&["lib", "a.jar"], NodeKind::File, None);
        DistributionTree::new(
            root,
            Some("dist-1.0".to_string()),
            TreeStats::default(),
            Duration::ZERO,
            Vec::new(),
        )
    }

    #[test]
    fn test_tree_stats_record() {
        let mut stats = TreeStats::new();
        stats.record_file(1024, 3);
        stats.record_dir(1);
        stats.record_skipped();

        assert_eq!(stats.entries_read, 3);
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.total_dirs, 1);
        assert_eq!(stats.total_bytes, 1024);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_lookup_matches_kind() {
        let tree = sample_tree();

        let node = tree.lookup("bin/run.sh", NodeKind::File).unwrap();
        assert_eq!(node.digest, Some(ContentDigest::new([7; 32])));
        assert!(tree.lookup("bin/run.sh", NodeKind::Directory).is_none());

        assert!(tree.exists("bin", NodeKind::Directory));
        assert!(!tree.exists("bin", NodeKind::File));
    }

    #[test]
    fn test_lookup_intermediate_directory() {
        let tree = sample_tree();
        // "lib" was never an explicit entry but is implied by lib/a.jar.
        assert!(tree.exists("lib", NodeKind::Directory));
        assert!(tree.exists("lib/", NodeKind::Directory));
    }

    #[test]
    fn test_lookup_missing_paths() {
        let tree = sample_tree();
        assert!(tree.lookup("", NodeKind::Directory).is_none());
        assert!(tree.lookup("bin/missing.sh", NodeKind::File).is_none());
        assert!(tree.lookup("bin/run.sh/deeper", NodeKind::File).is_none());
        assert!(tree.lookup("bi", NodeKind::Directory).is_none());
    }

    #[test]
    fn test_display_name() {
        let tree = sample_tree();
        assert_eq!(tree.display_name(), "dist-1.0");
    }
}

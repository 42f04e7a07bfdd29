//! Distribution node types.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::path;

/// BLAKE3 content digest used to detect changed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Create a new ContentDigest from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Type of distribution node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl NodeKind {
    /// Kind matching an archive entry's directory flag.
    pub fn from_is_dir(is_dir: bool) -> Self {
        if is_dir { Self::Directory } else { Self::File }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }
}

/// A single file or directory inside a distribution.
///
/// Nodes own their children exclusively and carry their full relative path,
/// so traversals never need to walk back up the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionNode {
    /// Final path segment (empty for the distribution root).
    pub name: CompactString,

    /// Node type.
    pub kind: NodeKind,

    /// Path inside the distribution, without the top-level directory.
    pub relative_path: String,

    /// Content digest (files only, absent when digests are disabled).
    pub digest: Option<ContentDigest>,

    /// Children keyed by path segment.
    pub children: BTreeMap<CompactString, DistributionNode>,
}

impl DistributionNode {
    /// Create the root node of a distribution.
    pub fn new_root() -> Self {
        Self::new_directory("", "")
    }

    /// Create a new directory node.
    pub fn new_directory(name: impl Into<CompactString>, relative_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            relative_path: relative_path.into(),
            digest: None,
            children: BTreeMap::new(),
        }
    }

    /// Create a new file node.
    pub fn new_file(
        name: impl Into<CompactString>,
        relative_path: impl Into<String>,
        digest: Option<ContentDigest>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            relative_path: relative_path.into(),
            digest,
            children: BTreeMap::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Get a direct child by name.
    pub fn child(&self, name: &str) -> Option<&DistributionNode> {
        self.children.get(name)
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Insert a node at the given segments below this node.
    ///
    /// Missing intermediate nodes are created as directories. The leaf takes
    /// the given kind and digest, overwriting whatever was there before; a
    /// directory overwritten by a file loses its children.
    /// Returns `true` when an existing node changed type on the way, which
    /// only happens for malformed archives.
    pub fn insert(
        &mut self,
        segments: &[&str],
        kind: NodeKind,
        digest: Option<ContentDigest>,
    ) -> bool {
        let Some((leaf, parents)) = segments.split_last() else {
            return false;
        };

        let mut conflict = false;
        let mut current = self;
        for segment in parents {
            let child_path = path::join(&current.relative_path, segment);
            let child = current
                .children
                .entry(CompactString::from(*segment))
                .or_insert_with(|| DistributionNode::new_directory(*segment, child_path));
            if child.is_file() {
                // A later entry lives below this path, so it is a directory now.
                conflict = true;
                child.kind = NodeKind::Directory;
                child.digest = None;
            }
            current = child;
        }

        let leaf_path = path::join(&current.relative_path, leaf);
        match current.children.entry(CompactString::from(*leaf)) {
            Entry::Occupied(mut occupied) => {
                let node = occupied.get_mut();
                conflict |= node.kind != kind;
                node.kind = kind;
                node.digest = digest;
                if kind.is_file() {
                    node.children.clear();
                }
            }
            Entry::Vacant(vacant) => {
                let node = match kind {
                    NodeKind::File => DistributionNode::new_file(*leaf, leaf_path, digest),
                    NodeKind::Directory => DistributionNode::new_directory(*leaf, leaf_path),
                };
                vacant.insert(node);
            }
        }
        conflict
    }

    /// Find the node at a relative path below this node, regardless of kind.
    pub fn find(&self, relative_path: &str) -> Option<&DistributionNode> {
        let mut current = self;
        let mut walked = false;
        for segment in path::segments(relative_path) {
            current = current.children.get(segment)?;
            walked = true;
        }
        walked.then_some(current)
    }

    /// Visit every node below this one, parents before children.
    pub fn for_each_descendant<F>(&self, f: &mut F)
    where
        F: FnMut(&DistributionNode),
    {
        for child in self.children.values() {
            f(child);
            child.for_each_descendant(f);
        }
    }

    /// Count files in this subtree (1 for a file node).
    pub fn file_count(&self) -> u64 {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.values().map(|c| c.file_count()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest_hex() {
        let digest = ContentDigest::new([0xab; 32]);
        assert_eq!(digest.to_hex().len(), 64);
        assert!(digest.to_hex().starts_with("abab"));
        assert_eq!(digest.to_string(), digest.to_hex());
    }

    #[test]
    fn test_insert_creates_intermediate_directories() {
        let mut root = DistributionNode::new_root();
        let conflict = root.insert(&["lib", "ext", "a.jar"], NodeKind::File, None);
        assert!(!conflict);

        let lib = root.child("lib").unwrap();
        assert!(lib.is_dir());
        assert_eq!(lib.relative_path, "lib");

        let jar = root.find("lib/ext/a.jar").unwrap();
        assert!(jar.is_file());
        assert_eq!(jar.relative_path, "lib/ext/a.jar");
        assert_eq!(jar.name.as_str(), "a.jar");
    }

    #[test]
    fn test_insert_last_write_wins() {
        let mut root = DistributionNode::new_root();
        let digest = ContentDigest::new([1; 32]);
        root.insert(&["conf", "a.xml"], NodeKind::File, None);
        let conflict = root.insert(&["conf"], NodeKind::File, Some(digest));

        assert!(conflict);
        let conf = root.find("conf").unwrap();
        assert!(conf.is_file());
        assert_eq!(conf.digest, Some(digest));
        assert_eq!(conf.child_count(), 0);
        assert!(root.find("conf/a.xml").is_none());
    }

    #[test]
    fn test_repeated_directory_keeps_children() {
        let mut root = DistributionNode::new_root();
        root.insert(&["bin", "run.sh"], NodeKind::File, None);
        let conflict = root.insert(&["bin"], NodeKind::Directory, None);

        assert!(!conflict);
        assert_eq!(root.child("bin").unwrap().child_count(), 1);
    }

    #[test]
    fn test_find_empty_path() {
        let root = DistributionNode::new_root();
        assert!(root.find("").is_none());
    }

    #[test]
    fn test_file_count() {
        let mut root = DistributionNode::new_root();
        root.insert(&["a", "1.txt"], NodeKind::File, None);
        root.insert(&["a", "b", "2.txt"], NodeKind::File, None);
        root.insert(&["c"], NodeKind::Directory, None);
        assert_eq!(root.file_count(), 2);

        let mut visited = Vec::new();
        root.for_each_descendant(&mut |n| visited.push(n.relative_path.clone()));
        assert_eq!(visited, vec!["a", "a/1.txt", "a/b", "a/b/2.txt", "c"]);
    }
}

//! Distribution tree builder.

use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use distpatch_core::{
    BuildWarning, DiffConfig, DistError, DistributionNode, DistributionTree, NodeKind, TreeStats,
    path,
};

use crate::archive::ZipDistribution;
use crate::entry::ArchiveEntry;
use crate::progress::ReadProgress;

/// Entries between two progress snapshots.
const PROGRESS_INTERVAL: u64 = 1000;

/// Builds a [`DistributionTree`] from a stream of archive entries.
pub struct TreeBuilder {
    config: DiffConfig,
    progress_tx: broadcast::Sender<ReadProgress>,
}

impl TreeBuilder {
    /// Create a new builder.
    pub fn new(config: DiffConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            progress_tx,
        }
    }

    /// Subscribe to read progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ReadProgress> {
        self.progress_tx.subscribe()
    }

    /// Configuration used by this builder.
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Read every entry of a distribution archive and build its tree.
    pub fn build_from_archive(
        &self,
        dist: &mut ZipDistribution,
    ) -> Result<DistributionTree, DistError> {
        info!(archive = %dist.path().display(), entries = dist.len(), "Reading distribution");
        let source = dist.path().to_path_buf();
        let tree = self.build(dist.entries(self.config.check_digests))?;
        Ok(tree.with_source(source))
    }

    /// Build a tree from archive entries.
    ///
    /// The first failing entry aborts the build.
    pub fn build<I>(&self, entries: I) -> Result<DistributionTree, DistError>
    where
        I: IntoIterator<Item = Result<ArchiveEntry, DistError>>,
    {
        let start = Instant::now();
        let mut root = DistributionNode::new_root();
        let mut root_name: Option<String> = None;
        let mut stats = TreeStats::new();
        let mut warnings = Vec::new();
        let mut progress = ReadProgress::new();

        for entry in entries {
            let entry = entry?;
            self.insert_entry(&mut root, &mut root_name, &mut stats, &mut warnings, &entry);

            progress.entries_read = stats.entries_read;
            if stats.entries_read % PROGRESS_INTERVAL == 0 {
                progress.files_read = stats.total_files;
                progress.dirs_read = stats.total_dirs;
                progress.bytes_read = stats.total_bytes;
                progress.current_entry = entry.path;
                progress.elapsed = start.elapsed();
                let _ = self.progress_tx.send(progress.clone());
            }
        }

        let build_duration = start.elapsed();
        progress.entries_read = stats.entries_read;
        progress.files_read = stats.total_files;
        progress.dirs_read = stats.total_dirs;
        progress.bytes_read = stats.total_bytes;
        progress.current_entry.clear();
        progress.elapsed = build_duration;
        let _ = self.progress_tx.send(progress);

        info!(
            root = root_name.as_deref().unwrap_or(""),
            files = stats.total_files,
            dirs = stats.total_dirs,
            warnings = warnings.len(),
            duration_ms = build_duration.as_millis() as u64,
            "Distribution tree built"
        );

        Ok(DistributionTree::new(
            root,
            root_name,
            stats,
            build_duration,
            warnings,
        ))
    }

    fn insert_entry(
        &self,
        root: &mut DistributionNode,
        root_name: &mut Option<String>,
        stats: &mut TreeStats,
        warnings: &mut Vec<BuildWarning>,
        entry: &ArchiveEntry,
    ) {
        let (top_level, relative) = path::split_top_level(&entry.path);

        match root_name {
            None => *root_name = Some(top_level.to_string()),
            Some(expected) if expected != top_level => {
                let warning = BuildWarning::multiple_roots(&entry.path, expected);
                warn!(entry = %entry.path, expected = %expected, "{}", warning.message);
                warnings.push(warning);
            }
            Some(_) => {}
        }

        if relative.is_empty() {
            stats.record_skipped();
            if !entry.is_dir {
                let warning = BuildWarning::root_file(&entry.path);
                warn!(entry = %entry.path, "{}", warning.message);
                warnings.push(warning);
            }
            return;
        }

        let segments: Vec<&str> = path::segments(relative).collect();
        let depth = segments.len() as u32;
        let kind = NodeKind::from_is_dir(entry.is_dir);

        let digest = match kind {
            NodeKind::Directory => {
                stats.record_dir(depth);
                None
            }
            NodeKind::File => {
                stats.record_file(entry.size, depth);
                entry.digest.filter(|_| self.config.check_digests)
            }
        };

        trace!(entry = %relative, ?kind, "Inserting node");
        if root.insert(&segments, kind, digest) {
            let warning = BuildWarning::type_conflict(&entry.path);
            debug!(entry = %entry.path, "Type conflict, last entry wins");
            warn!("{}", warning.message);
            warnings.push(warning);
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(DiffConfig::default())
    }
}

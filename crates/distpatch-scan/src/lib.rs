//! Distribution archive reading for distpatch.
//!
//! This crate turns a distribution archive into an in-memory
//! [`DistributionTree`].
//!
//! # Overview
//!
//! - **Archive reading** via the `zip` crate, one entry at a time: each
//!   content stream is drained and closed before the next one is opened.
//! - **Content digests** via BLAKE3.
//! - **Progress updates** via broadcast channels.
//!
//! # Example
//!
//! ```rust,no_run
//! use distpatch_scan::{DiffConfig, TreeBuilder, ZipDistribution};
//!
//! let mut dist = ZipDistribution::open("wso2am-2.1.0.zip").unwrap();
//! let builder = TreeBuilder::new(DiffConfig::default());
//! let tree = builder.build_from_archive(&mut dist).unwrap();
//!
//! println!("Files: {}", tree.total_files());
//! println!("Directories: {}", tree.total_dirs());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use distpatch_scan::{DiffConfig, TreeBuilder};
//!
//! let builder = TreeBuilder::new(DiffConfig::default());
//! let mut progress_rx = builder.subscribe();
//!
//! // Poll from another thread while the build runs.
//! while let Ok(progress) = progress_rx.try_recv() {
//!     println!("Read {} entries", progress.entries_read);
//! }
//! ```

mod archive;
mod builder;
mod entry;
pub mod hasher;
mod progress;

pub use archive::{EntryInfo, ZipDistribution, ZipEntries};
pub use builder::TreeBuilder;
pub use entry::ArchiveEntry;
pub use progress::ReadProgress;

// Re-export core types for convenience
pub use distpatch_core::{
    BuildWarning, ContentDigest, DiffConfig, DistError, DistributionNode, DistributionTree,
    NodeKind, TreeStats, WarningKind,
};

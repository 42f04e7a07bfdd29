//! Change classification for distpatch.
//!
//! Compares two pre-built distribution trees and sorts every path into
//! one of four sets:
//!
//! - **modified** - files on both sides whose content digests differ
//! - **removed files** - files only in the previous distribution
//! - **removed directories** - directories only in the previous
//!   distribution, collapsed to the shallowest removed ancestor
//! - **added** - files only in the updated distribution
//!
//! Removals below a configured features root are then collapsed to their
//! feature directory, see [`FeatureRootPolicy`].
//!
//! ```rust,no_run
//! use distpatch_diff::Classifier;
//! use distpatch_scan::{DiffConfig, TreeBuilder, ZipDistribution};
//!
//! let config = DiffConfig::default();
//! let builder = TreeBuilder::new(config.clone());
//! let previous = builder
//!     .build_from_archive(&mut ZipDistribution::open("product-1.0.0.zip").unwrap())
//!     .unwrap();
//! let updated = builder
//!     .build_from_archive(&mut ZipDistribution::open("product-1.0.1.zip").unwrap())
//!     .unwrap();
//!
//! let changes = Classifier::new(config).classify(&previous, &updated);
//! println!("{} modified, {} added", changes.modified.len(), changes.added.len());
//! ```

mod classify;
mod features;
mod report;

pub use classify::{Classification, Classifier};
pub use features::FeatureRootPolicy;
pub use report::{DiffReport, DiffSummary};

// Re-export core types
pub use distpatch_core::{DiffConfig, DistributionTree};

//! Core types for distpatch.
//!
//! This crate provides the data structures shared by the rest of the
//! workspace: distribution nodes and trees, content digests, the
//! diff configuration and the error types.

mod config;
mod error;
mod node;
pub mod path;
mod tree;

pub use config::{DEFAULT_FEATURES_ROOT, DiffConfig, DiffConfigBuilder};
pub use error::{BuildWarning, DistError, WarningKind};
pub use node::{ContentDigest, DistributionNode, NodeKind};
pub use tree::{DistributionTree, TreeStats};

//! Diff configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Conventional location of versioned feature directories in a distribution.
pub const DEFAULT_FEATURES_ROOT: &str = "repository/components/features";

/// Configuration for building trees and classifying changes.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DiffConfig {
    /// Prefix under which whole feature directories are replaced as a unit.
    /// Removals below `<features_root>/<feature>/` collapse to the feature
    /// directory. `None` disables the policy.
    #[builder(default = "Some(DEFAULT_FEATURES_ROOT.to_string())")]
    #[serde(default = "default_features_root")]
    pub features_root: Option<String>,

    /// Hash file contents and report modified files.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub check_digests: bool,
}

fn default_true() -> bool {
    true
}

fn default_features_root() -> Option<String> {
    Some(DEFAULT_FEATURES_ROOT.to_string())
}

impl DiffConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(root)) = &self.features_root {
            if root.is_empty() {
                return Err("Features root cannot be empty".to_string());
            }
            if root.starts_with('/') || root.ends_with('/') {
                return Err(format!(
                    "Features root must be a relative path without surrounding slashes: {root}"
                ));
            }
        }
        Ok(())
    }
}

impl DiffConfig {
    /// Create a new diff config builder.
    pub fn builder() -> DiffConfigBuilder {
        DiffConfigBuilder::default()
    }

    /// Create a config with the default policy.
    pub fn new() -> Self {
        Self {
            features_root: default_features_root(),
            check_digests: true,
        }
    }

    /// The configured features root, if the policy is enabled.
    pub fn features_root(&self) -> Option<&str> {
        self.features_root.as_deref()
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self::new()
    }
}

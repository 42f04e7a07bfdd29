//! Packaging configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default prefix of update names.
pub const DEFAULT_UPDATE_NAME_PREFIX: &str = "WSO2-CARBON-UPDATE";

/// Configuration for staging and packaging an update.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PackagingConfig {
    /// Prefix of the update name (`<prefix>-<platform_version>-<number>`).
    #[builder(default = "DEFAULT_UPDATE_NAME_PREFIX.to_string()")]
    #[serde(default = "default_prefix")]
    pub update_name_prefix: String,

    /// Resource files that must exist in the update directory.
    #[builder(default = "default_mandatory_resources()")]
    #[serde(default = "default_mandatory_resources")]
    pub mandatory_resources: Vec<String>,

    /// Resource files copied only when present.
    #[builder(default = "default_optional_resources()")]
    #[serde(default = "default_optional_resources")]
    pub optional_resources: Vec<String>,

    /// Directory in which the staging tree is created.
    #[builder(default = "std::env::temp_dir()")]
    #[serde(default = "std::env::temp_dir")]
    pub staging_root: PathBuf,
}

fn default_prefix() -> String {
    DEFAULT_UPDATE_NAME_PREFIX.to_string()
}

fn default_mandatory_resources() -> Vec<String> {
    vec!["LICENSE.txt".to_string()]
}

fn default_optional_resources() -> Vec<String> {
    vec![
        "NOT_A_CONTRIBUTION.txt".to_string(),
        "instructions.txt".to_string(),
    ]
}

impl PackagingConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref prefix) = self.update_name_prefix {
            if prefix.trim().is_empty() {
                return Err("Update name prefix cannot be empty".to_string());
            }
        }
        let resources = self
            .mandatory_resources
            .iter()
            .chain(self.optional_resources.iter())
            .flatten();
        for name in resources {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(format!("Resource must be a plain file name: '{name}'"));
            }
        }
        Ok(())
    }
}

impl PackagingConfig {
    /// Create a new packaging config builder.
    pub fn builder() -> PackagingConfigBuilder {
        PackagingConfigBuilder::default()
    }

    /// Create a config with the default resources and prefix.
    pub fn new() -> Self {
        Self {
            update_name_prefix: default_prefix(),
            mandatory_resources: default_mandatory_resources(),
            optional_resources: default_optional_resources(),
            staging_root: std::env::temp_dir(),
        }
    }
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self::new()
    }
}

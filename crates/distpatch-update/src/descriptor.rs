//! The `update-descriptor.yaml` manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::UpdateError;

/// File name of the descriptor, both in the update directory and inside
/// the update archive.
pub const DESCRIPTOR_FILE: &str = "update-descriptor.yaml";

/// File-change lists of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanges {
    #[serde(default)]
    pub added_files: Vec<String>,
    #[serde(default)]
    pub removed_files: Vec<String>,
    #[serde(default)]
    pub modified_files: Vec<String>,
}

impl FileChanges {
    /// Check if no changes are listed.
    pub fn is_empty(&self) -> bool {
        self.added_files.is_empty() && self.removed_files.is_empty() && self.modified_files.is_empty()
    }

    /// Total number of listed paths.
    pub fn total(&self) -> usize {
        self.added_files.len() + self.removed_files.len() + self.modified_files.len()
    }
}

/// Metadata and file changes of one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    pub update_number: String,
    pub platform_version: String,
    pub platform_name: String,
    pub applies_to: String,
    /// Issue id to summary.
    #[serde(default)]
    pub bug_fixes: BTreeMap<String, String>,
    pub description: String,
    #[serde(default)]
    pub file_changes: FileChanges,
}

impl UpdateDescriptor {
    /// Load `update-descriptor.yaml` from an update directory.
    pub fn load(update_dir: impl AsRef<Path>) -> Result<Self, UpdateError> {
        let update_dir = update_dir.as_ref();
        let path = update_dir.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            return Err(UpdateError::MissingResource {
                name: DESCRIPTOR_FILE.to_string(),
                directory: update_dir.to_path_buf(),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|e| UpdateError::io(&path, e))?;
        let descriptor = Self::from_yaml(&contents, &path)?;
        debug!(path = %path.display(), update_number = %descriptor.update_number, "Descriptor loaded");
        Ok(descriptor)
    }

    /// Parse a descriptor. `source` names the origin in errors.
    pub fn from_yaml(contents: &str, source: impl Into<PathBuf>) -> Result<Self, UpdateError> {
        serde_yaml::from_str(contents).map_err(|e| UpdateError::yaml(source, e))
    }

    /// Check that every required field is present and well formed.
    pub fn validate(&self) -> Result<(), UpdateError> {
        let number = self.update_number.trim();
        if number.is_empty() {
            return Err(UpdateError::invalid("update_number", "must not be empty"));
        }
        if !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(UpdateError::invalid(
                "update_number",
                format!("must contain only digits, found '{number}'"),
            ));
        }

        let required = [
            ("platform_version", &self.platform_version),
            ("platform_name", &self.platform_name),
            ("applies_to", &self.applies_to),
            ("description", &self.description),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(UpdateError::invalid(field, "must not be empty"));
            }
        }

        if self.bug_fixes.is_empty() {
            return Err(UpdateError::invalid("bug_fixes", "at least one entry is required"));
        }
        Ok(())
    }

    /// Name of the update: `<prefix>-<platform_version>-<update_number>`.
    pub fn update_name(&self, prefix: &str) -> String {
        format!(
            "{prefix}-{}-{}",
            self.platform_version.trim(),
            self.update_number.trim()
        )
    }

    /// Serialize the descriptor to YAML.
    ///
    /// A numeric update number is written unquoted (`update_number: 0001`).
    pub fn to_yaml(&self) -> Result<String, UpdateError> {
        let yaml =
            serde_yaml::to_string(self).map_err(|e| UpdateError::yaml(DESCRIPTOR_FILE, e))?;

        let number = &self.update_number;
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Ok(yaml);
        }
        let quoted = format!("update_number: '{number}'\n");
        Ok(yaml.replacen(&quoted, &format!("update_number: {number}\n"), 1))
    }

    /// Write the descriptor as `update-descriptor.yaml` into a directory.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, UpdateError> {
        let path = dir.as_ref().join(DESCRIPTOR_FILE);
        let yaml = self.to_yaml()?;
        fs::write(&path, yaml).map_err(|e| UpdateError::io(&path, e))?;
        debug!(path = %path.display(), "Descriptor saved");
        Ok(path)
    }

    /// A sample descriptor with placeholder values to edit.
    pub fn template() -> Self {
        let mut bug_fixes = BTreeMap::new();
        bug_fixes.insert(
            "CARBON-15395".to_string(),
            "Upgrade Hazelcast version to 3.5.2".to_string(),
        );

        Self {
            update_number: "0001".to_string(),
            platform_version: "4.4.0".to_string(),
            platform_name: "wilkes".to_string(),
            applies_to: "All the products based on carbon 4.4.1".to_string(),
            bug_fixes,
            description: "This update contains the relevant fixes for upgrading Hazelcast to\n\
                          version 3.5.2.\n"
                .to_string(),
            file_changes: FileChanges::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
update_number: 0001
platform_version: 4.4.0
platform_name: wilkes
applies_to: All the products based on carbon 4.4.1
bug_fixes:
  CARBON-15395: Upgrade Hazelcast version to 3.5.2
description: |
  Upgrades Hazelcast.
file_changes:
  added_files: []
  removed_files: []
  modified_files: []
"#;

    #[test]
    fn test_parse_sample() {
        let descriptor = UpdateDescriptor::from_yaml(SAMPLE, DESCRIPTOR_FILE).unwrap();
        assert_eq!(descriptor.update_number, "0001");
        assert_eq!(descriptor.platform_version, "4.4.0");
        assert_eq!(descriptor.bug_fixes.len(), 1);
        assert!(descriptor.file_changes.is_empty());
        descriptor.validate().unwrap();
    }

    #[test]
    fn test_update_name() {
        let descriptor = UpdateDescriptor::from_yaml(SAMPLE, DESCRIPTOR_FILE).unwrap();
        assert_eq!(
            descriptor.update_name("WSO2-CARBON-UPDATE"),
            "WSO2-CARBON-UPDATE-4.4.0-0001"
        );
    }

    #[test]
    fn test_validate_rejects() {
        let mut descriptor = UpdateDescriptor::template();
        descriptor.update_number = "12a".to_string();
        assert!(matches!(
            descriptor.validate(),
            Err(UpdateError::InvalidDescriptor { field: "update_number", .. })
        ));

        let mut descriptor = UpdateDescriptor::template();
        descriptor.applies_to = "  ".to_string();
        assert!(matches!(
            descriptor.validate(),
            Err(UpdateError::InvalidDescriptor { field: "applies_to", .. })
        ));

        let mut descriptor = UpdateDescriptor::template();
        descriptor.bug_fixes.clear();
        assert!(matches!(
            descriptor.validate(),
            Err(UpdateError::InvalidDescriptor { field: "bug_fixes", .. })
        ));
    }

    #[test]
    fn test_missing_file_changes_default() {
        let yaml = "update_number: '7'\nplatform_version: '5.0'\nplatform_name: p\n\
                    applies_to: all\ndescription: d\n";
        let descriptor = UpdateDescriptor::from_yaml(yaml, DESCRIPTOR_FILE).unwrap();
        assert!(descriptor.file_changes.is_empty());
        assert!(descriptor.bug_fixes.is_empty());
    }

    #[test]
    fn test_yaml_keeps_update_number_text() {
        let descriptor = UpdateDescriptor::template();
        let yaml = descriptor.to_yaml().unwrap();
        assert!(yaml.starts_with("update_number: 0001\n"), "{yaml}");
        assert!(!yaml.contains("'0001'"));

        let parsed = UpdateDescriptor::from_yaml(&yaml, DESCRIPTOR_FILE).unwrap();
        assert_eq!(parsed.update_number, "0001");
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn test_yaml_quotes_empty_update_number() {
        let mut descriptor = UpdateDescriptor::template();
        descriptor.update_number = String::new();
        let yaml = descriptor.to_yaml().unwrap();
        assert!(yaml.starts_with("update_number: ''\n"), "{yaml}");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = UpdateDescriptor::from_yaml("update_number: [", "broken.yaml").unwrap_err();
        assert!(matches!(err, UpdateError::Yaml { .. }));
    }
}

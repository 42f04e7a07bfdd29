//! Error types for update packaging.

use std::path::PathBuf;

use thiserror::Error;

use distpatch_core::DistError;

/// Errors that can occur while preparing, packaging or validating an update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor could not be parsed or serialized.
    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Writing the update archive failed.
    #[error("Failed to write archive {path}: {message}")]
    Zip { path: PathBuf, message: String },

    /// Reading a distribution failed.
    #[error(transparent)]
    Dist(#[from] DistError),

    /// A required descriptor field is missing or malformed.
    #[error("Invalid value for '{field}' in update-descriptor.yaml: {reason}")]
    InvalidDescriptor { field: &'static str, reason: String },

    /// A mandatory resource file is missing from the update directory.
    #[error("Mandatory resource '{name}' not found in {directory}")]
    MissingResource { name: String, directory: PathBuf },

    /// The update archive carries no descriptor.
    #[error("'{entry}' not found in {archive}")]
    MissingDescriptor { entry: String, archive: PathBuf },

    /// A path listed in the descriptor does not exist where it should.
    #[error("'{path}' does not exist in {archive}")]
    NotInArchive { path: String, archive: String },
}

impl UpdateError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a YAML error with path context.
    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    /// Create an archive writing error with path context.
    pub fn zip(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Zip {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a descriptor validation error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            field,
            reason: reason.into(),
        }
    }
}

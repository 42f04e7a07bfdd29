//! Error types for reading distributions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading a distribution.
///
/// All of these are fatal: a patch manifest is only ever produced from a
/// complete read of both distributions.
#[derive(Debug, Error)]
pub enum DistError {
    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a zip archive.
    #[error("Not a zip archive: {path}")]
    NotAnArchive { path: PathBuf },

    /// The archive could not be parsed.
    #[error("Corrupt archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// An entry's content stream could not be read.
    #[error("Failed to read entry '{entry}' in {archive}: {source}")]
    EntryRead {
        archive: PathBuf,
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

impl DistError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an archive error with path context.
    pub fn archive(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Kind of build warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Entries live under more than one top-level directory.
    MultipleRoots,
    /// A path was inserted with both file and directory type.
    TypeConflict,
    /// A file sits next to the top-level directory and was skipped.
    RootFile,
}

/// Non-fatal warning encountered while building a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildWarning {
    /// Archive entry name the warning is about.
    pub entry: String,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl BuildWarning {
    /// Create a new build warning.
    pub fn new(entry: impl Into<String>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            entry: entry.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a multiple-roots warning.
    pub fn multiple_roots(entry: impl Into<String>, expected: &str) -> Self {
        let entry = entry.into();
        Self {
            message: format!("Entry {entry} is outside the top-level directory '{expected}'"),
            entry,
            kind: WarningKind::MultipleRoots,
        }
    }

    /// Create a type conflict warning.
    pub fn type_conflict(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self {
            message: format!("Entry {entry} changes the type of an existing path"),
            entry,
            kind: WarningKind::TypeConflict,
        }
    }

    /// Create a root file warning.
    pub fn root_file(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        Self {
            message: format!("File {entry} is not inside a top-level directory, skipped"),
            entry,
            kind: WarningKind::RootFile,
        }
    }
}

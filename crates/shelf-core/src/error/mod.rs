//! Error types and result aliases for shelf operations.
//!
//! Provides a unified error type covering checksum computation, canonical path
//! resolution, repository publishing and configuration, with enough context
//! (paths, digests, tool output) to diagnose a failure without re-running it.

use thiserror::Error;

/// Unified error type for all shelf operations
#[derive(Error, Debug)]
pub enum ShelfError {
    // Checksum errors
    #[error("No checksum source given: supply exactly one of a file name, handle or descriptor")]
    InvalidSource,

    #[error("Ambiguous checksum source: {given} sources supplied, expected exactly one")]
    AmbiguousSource { given: usize },

    #[error("Unsupported checksum algorithm '{name}'")]
    UnsupportedAlgorithm { name: String },

    #[error("Cannot choose a digest from checksums [{available}]")]
    AmbiguousChecksum { available: String },

    #[error("Invalid checksum digest '{digest}': {reason}")]
    InvalidChecksum { digest: String, reason: String },

    // Identity errors
    #[error("Package {field} '{value}' is not a valid path component")]
    InvalidPackageIdentity { field: &'static str, value: String },

    // Publish errors
    #[error("Failed to create directory {path}")]
    DirectoryCreateError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to link {link} -> {target}")]
    LinkCreateError {
        link: String,
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path '{path}' escapes its base directory")]
    PathTraversal { path: String },

    // Metadata errors
    #[error("{tool} on {dir} failed with status {status}:\n{output}")]
    MetadataGenerationError {
        tool: String,
        dir: String,
        status: i32,
        output: String,
    },

    #[error("No package with file name {package} found in repository {repository}")]
    PackageNotFoundInRepository { package: String, repository: String },

    // Config errors
    #[error("Failed to parse shelf.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for shelf operations
pub type ShelfResult<T> = Result<T, ShelfError>;

impl ShelfError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a directory creation error for `path`
    pub fn directory_create(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::DirectoryCreateError {
            path: path.to_string(),
            source,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShelfError::Io { .. }
                | ShelfError::DirectoryCreateError { .. }
                | ShelfError::LinkCreateError { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ShelfError::UnsupportedAlgorithm { .. } => {
                Some("Use one of md5, sha1 (or sha), sha224, sha256, sha384, sha512")
            },
            ShelfError::AmbiguousChecksum { .. } => {
                Some("Provide a sha256 checksum or one for the configured fallback algorithm")
            },
            ShelfError::DirectoryCreateError { .. } | ShelfError::LinkCreateError { .. } => {
                Some("Check permissions on the storage root and repository directories")
            },
            ShelfError::MetadataGenerationError { .. } => {
                Some("Make sure createrepo/modifyrepo are installed and the repository is readable")
            },
            ShelfError::PathTraversal { .. } => {
                Some("Repository paths must stay inside the repositories directory")
            },
            _ => None,
        }
    }
}

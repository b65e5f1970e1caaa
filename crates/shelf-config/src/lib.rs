//! Configuration loading for shelf
//!
//! This crate parses and validates shelf.toml, finds the file that applies
//! to the current invocation and layers environment and command line
//! overrides on top of it.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use self::toml::{MetadataSection, ShelfToml, StorageSection};

use shelf_core::error::ShelfError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ShelfError>;

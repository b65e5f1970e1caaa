//! # shelf-core
//!
//! Core types and utilities shared across all shelf crates.
//!
//! This crate provides:
//! - PackageIdentity, the immutable identity of one package build
//! - HashAlgorithm, ChecksumRecord and ChecksumSpec for package digests
//! - ShelfError enum for unified error handling
//! - Path helpers guarding against directory traversal
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (PackageIdentity, ChecksumRecord, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{ShelfError, ShelfResult};
pub use types::{ChecksumRecord, ChecksumSpec, HashAlgorithm, PackageIdentity};

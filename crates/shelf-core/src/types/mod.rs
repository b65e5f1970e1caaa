//! Core data types for the shelf package store.
//!
//! This module provides the fundamental types used throughout shelf:
//! - Package identity (name, version, release, arch, filename)
//! - Hash algorithms and checksum records

pub mod checksum;
pub mod package;

// Re-export all public types
pub use checksum::{ChecksumRecord, ChecksumSpec, HashAlgorithm};
pub use package::PackageIdentity;

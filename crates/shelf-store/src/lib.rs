//! Content-addressed package storage for shelf
//!
//! This crate computes package checksums, maps package identities to their
//! canonical location in the shared store, verifies stored content and
//! publishes packages into repository trees as symbolic links. Repository
//! metadata generation and package enumeration are delegated to external
//! collaborators behind traits.

pub mod cas;
pub mod introspect;
pub mod link;
pub mod metadata;

// Re-export main types
pub use cas::{
    checksum_bytes, checksum_file, checksum_files_parallel, checksum_reader, file_timestamp,
    CanonicalPath, CanonicalPathResolver, ChecksumRequest, ContentStore, StorageLayout,
    DEFAULT_CHUNK_SIZE,
};
pub use introspect::{PackageCatalog, RepoPackage, RepositoryIntrospector, TreeCatalog};
pub use link::{LinkPolicy, PublishOutcome, RepoLocks, RepositoryEntry, RepositoryPublisher};
pub use metadata::{CreateRepoTool, MetadataGenerator, RepomdQuery, ToolOutput};

use shelf_core::error::ShelfError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ShelfError>;

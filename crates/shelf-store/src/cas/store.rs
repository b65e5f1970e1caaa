//! Content store existence checks
//!
//! The store never writes: it answers whether a package payload already sits
//! at its canonical path with the expected digest.

use camino::Utf8Path;
use shelf_core::types::{ChecksumRecord, ChecksumSpec, PackageIdentity};
use tracing::debug;

use super::hash::{checksum_file, DEFAULT_CHUNK_SIZE};
use super::layout::{CanonicalPath, CanonicalPathResolver};
use crate::StoreResult;

/// Read-only view of the canonical package store
#[derive(Debug, Clone)]
pub struct ContentStore {
    resolver: CanonicalPathResolver,
    chunk_size: usize,
}

impl ContentStore {
    /// Create a store view over `resolver`'s root
    pub fn new(resolver: CanonicalPathResolver) -> Self {
        Self {
            resolver,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read size used when recomputing digests
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn resolver(&self) -> &CanonicalPathResolver {
        &self.resolver
    }

    /// Get the root path of the store
    pub fn root_path(&self) -> &Utf8Path {
        self.resolver.store_root()
    }

    /// Canonical path for a package
    pub fn canonical_path(&self, identity: &PackageIdentity, checksum: &ChecksumSpec) -> StoreResult<CanonicalPath> {
        self.resolver.resolve(identity, checksum)
    }

    /// Check whether `path` holds content matching `expected`.
    ///
    /// Returns `false` when nothing exists at `path`. With `force_recompute`
    /// the answer is always `false`, even for matching content: callers use
    /// this to force re-ingestion of a package.
    pub fn exists<P: AsRef<Utf8Path>>(
        &self,
        path: P,
        expected: &ChecksumRecord,
        force_recompute: bool,
    ) -> StoreResult<bool> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(false);
        }

        if force_recompute {
            debug!("Forced recompute requested for {}, reporting absent", path);
            return Ok(false);
        }

        let actual = checksum_file(path, expected.algorithm, self.chunk_size)?;
        let matches = expected.matches(&actual);
        if !matches {
            debug!(
                "Checksum mismatch for {}: expected {}, got {}",
                path, expected.digest, actual
            );
        }

        Ok(matches)
    }

    /// Resolve a package's canonical path and check it
    pub fn contains(
        &self,
        identity: &PackageIdentity,
        checksum: &ChecksumSpec,
        expected: &ChecksumRecord,
        force_recompute: bool,
    ) -> StoreResult<bool> {
        let path = self.canonical_path(identity, checksum)?;
        self.exists(&path, expected, force_recompute)
    }
}

//! Canonical store layout
//!
//! Every package lives exactly once at
//! `<store_root>/<digest[0..3]>/<name>/<version>/<release>/<arch>/<filename>`.
//! The three-character digest prefix bounds the fan-out of the top level
//! independently of package names. Other tools read this layout directly, so
//! it must not change.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use shelf_core::error::ShelfError;
use shelf_core::types::{ChecksumSpec, HashAlgorithm, PackageIdentity};
use std::fmt;

use crate::StoreResult;

/// Number of digest characters used as the sharding directory
const PREFIX_LEN: usize = 3;

/// Location of a package inside the canonical store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalPath(Utf8PathBuf);

impl CanonicalPath {
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    pub fn into_inner(self) -> Utf8PathBuf {
        self.0
    }
}

impl AsRef<Utf8Path> for CanonicalPath {
    fn as_ref(&self) -> &Utf8Path {
        &self.0
    }
}

impl AsRef<std::path::Path> for CanonicalPath {
    fn as_ref(&self) -> &std::path::Path {
        self.0.as_std_path()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Maps package identity and checksum to a canonical path. Performs no I/O.
#[derive(Debug, Clone)]
pub struct CanonicalPathResolver {
    store_root: Utf8PathBuf,
    fallback: HashAlgorithm,
}

impl CanonicalPathResolver {
    /// Create a resolver rooted at `store_root`, falling back to sha1
    pub fn new<P: AsRef<Utf8Path>>(store_root: P) -> Self {
        Self {
            store_root: store_root.as_ref().to_path_buf(),
            fallback: HashAlgorithm::Sha1,
        }
    }

    /// Use `fallback` when a checksum mapping has no sha256 entry
    pub fn with_fallback(mut self, fallback: HashAlgorithm) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn store_root(&self) -> &Utf8Path {
        &self.store_root
    }

    pub fn fallback(&self) -> HashAlgorithm {
        self.fallback
    }

    /// Resolve the canonical path of a package
    pub fn resolve(&self, identity: &PackageIdentity, checksum: &ChecksumSpec) -> StoreResult<CanonicalPath> {
        let digest = checksum.select_digest(self.fallback)?;
        let digest = validate_digest(digest)?;

        let mut path = self.store_root.join(&digest[..PREFIX_LEN]);
        for (_, component) in identity.fields() {
            path.push(component);
        }

        Ok(CanonicalPath(path))
    }
}

fn validate_digest(digest: &str) -> StoreResult<String> {
    let digest = digest.trim();

    if digest.len() < PREFIX_LEN {
        return Err(ShelfError::InvalidChecksum {
            digest: digest.to_string(),
            reason: format!("shorter than {} characters", PREFIX_LEN),
        });
    }

    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ShelfError::InvalidChecksum {
            digest: digest.to_string(),
            reason: "not a hex string".to_string(),
        });
    }

    Ok(digest.to_ascii_lowercase())
}

/// Directory layout below the storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: Utf8PathBuf,
}

impl StorageLayout {
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Root of the canonical package store
    pub fn packages_dir(&self) -> Utf8PathBuf {
        self.root.join("packages")
    }

    /// Root under which repository trees are published
    pub fn repos_dir(&self) -> Utf8PathBuf {
        self.root.join("repos")
    }

    /// Directory of published GPG keys
    pub fn gpg_dir(&self) -> Utf8PathBuf {
        self.root.join("published").join("gpg")
    }

    /// Resolver rooted at the package store
    pub fn resolver(&self) -> CanonicalPathResolver {
        CanonicalPathResolver::new(self.packages_dir())
    }

    /// Strip the repositories directory and any leading `/` from `path`
    pub fn relative_repo_path<'a>(&self, path: &'a str) -> &'a str {
        let repos = self.repos_dir();
        let relative = Utf8Path::new(path)
            .strip_prefix(&repos)
            .map(Utf8Path::as_str)
            .unwrap_or(path);
        relative.trim_start_matches('/')
    }

    /// Location of a package inside a repository, usually a link into the store
    pub fn repo_package_path(&self, repo_relpath: &str, filename: &str) -> Utf8PathBuf {
        self.repos_dir().join(repo_relpath).join(filename)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;

    fn component() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_+~-][a-zA-Z0-9._+~-]{0,15}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        /// Identical inputs give identical paths; a different filename or digest never collides
        #[test]
        fn resolve_determinism(
            name in component(),
            version in component(),
            filename in component(),
            other_filename in component(),
            digest in "[0-9a-f]{3,64}",
            other_digest in "[0-9a-f]{3,64}",
        ) {
            let resolver = CanonicalPathResolver::new("/store");
            let id = PackageIdentity::new(&name, &version, "1", "noarch", &filename).unwrap();

            let first = resolver.resolve(&id, &ChecksumSpec::from(digest.as_str())).unwrap();
            let second = resolver.resolve(&id, &ChecksumSpec::from(digest.as_str())).unwrap();
            prop_assert_eq!(&first, &second);

            if other_filename != filename {
                let other = PackageIdentity::new(&name, &version, "1", "noarch", &other_filename).unwrap();
                let moved = resolver.resolve(&other, &ChecksumSpec::from(digest.as_str())).unwrap();
                prop_assert_ne!(&first, &moved);
            }

            if other_digest[..3] != digest[..3] {
                let moved = resolver.resolve(&id, &ChecksumSpec::from(other_digest.as_str())).unwrap();
                prop_assert_ne!(&first, &moved);
            }
        }
    }
}

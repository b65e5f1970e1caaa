//! Repository package enumeration
//!
//! Listing the packages of a repository is the job of a `PackageCatalog`.
//! `RepositoryIntrospector` gives each listing a private scratch directory
//! and looks packages up by their repository-relative path.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use shelf_core::error::ShelfError;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::StoreResult;

/// Prefix of the scratch directories handed to catalogs
const SCRATCH_PREFIX: &str = "shelf_repo";

/// A package file as seen from inside a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoPackage {
    /// Path relative to the repository directory, `/`-separated
    pub relative_path: Utf8PathBuf,
    /// Size in bytes of the file the entry resolves to
    pub size: u64,
}

/// Lists the packages of a repository
pub trait PackageCatalog: Send + Sync {
    /// Enumerate packages under `repo_dir`. `scratch_dir` is an empty
    /// directory the catalog may use freely; it is removed afterwards.
    fn packages(&self, repo_dir: &Path, scratch_dir: &Path) -> StoreResult<Vec<RepoPackage>>;
}

/// Catalog that walks the repository tree looking for package files
#[derive(Debug, Clone)]
pub struct TreeCatalog {
    extension: String,
}

impl TreeCatalog {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for TreeCatalog {
    fn default() -> Self {
        Self::new("rpm")
    }
}

impl PackageCatalog for TreeCatalog {
    fn packages(&self, repo_dir: &Path, _scratch_dir: &Path) -> StoreResult<Vec<RepoPackage>> {
        if !repo_dir.is_dir() {
            return Err(ShelfError::io(
                format!("Repository directory {} not found", repo_dir.display()),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let mut packages = Vec::new();
        let walker = WalkDir::new(repo_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", repo_dir.display(), e);
                    continue;
                },
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .map_or(false, |ext| ext == self.extension.as_str());
            if !matches {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(repo_dir) else {
                continue;
            };
            let Some(relative) = Utf8Path::from_path(relative) else {
                warn!("Skipping non UTF-8 path {}", entry.path().display());
                continue;
            };

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Could not stat {}: {}", entry.path().display(), e);
                    continue;
                },
            };

            packages.push(RepoPackage {
                relative_path: relative_slash_path(relative),
                size,
            });
        }

        Ok(packages)
    }
}

fn relative_slash_path(path: &Utf8Path) -> Utf8PathBuf {
    let parts: Vec<&str> = path.components().map(|c| c.as_str()).collect();
    Utf8PathBuf::from(parts.join("/"))
}

/// Looks packages up in repositories through a catalog
#[derive(Debug, Clone, Default)]
pub struct RepositoryIntrospector<C> {
    catalog: C,
}

impl<C: PackageCatalog> RepositoryIntrospector<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// All packages of the repository at `repo_dir`
    pub fn repo_packages(&self, repo_dir: &Path) -> StoreResult<Vec<RepoPackage>> {
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| ShelfError::io("Failed to create scratch directory".to_string(), e))?;
        debug!("Listing {} with scratch dir {}", repo_dir.display(), scratch.path().display());

        let result = self.catalog.packages(repo_dir, scratch.path());

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Unable to remove temporary directory {}: {}", scratch_path.display(), e);
        }

        result
    }

    /// The package at `relative_path` inside the repository.
    ///
    /// When a catalog reports the same path more than once the last entry wins.
    pub fn find_package(&self, repo_dir: &Path, relative_path: &str) -> StoreResult<RepoPackage> {
        let wanted = relative_path.trim_start_matches('/');

        self.repo_packages(repo_dir)?
            .into_iter()
            .filter(|p| p.relative_path.as_str() == wanted)
            .last()
            .ok_or_else(|| ShelfError::PackageNotFoundInRepository {
                package: relative_path.to_string(),
                repository: repo_dir.display().to_string(),
            })
    }
}

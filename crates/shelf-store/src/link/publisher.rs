//! Repository publisher
//!
//! Links are never created in place. A link is first made under a unique
//! temporary name next to its destination and then renamed over it, so a
//! concurrent publisher of the same path sees either the old entry or a
//! complete new link.

use camino::{Utf8Path, Utf8PathBuf};
use shelf_core::error::ShelfError;
use shelf_core::types::{ChecksumSpec, PackageIdentity};
use shelf_core::utils::path::safe_join;
use std::fs;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{LinkPolicy, PublishOutcome, RepoLocks, RepositoryEntry};
use crate::cas::ContentStore;
use crate::metadata::{MetadataGenerator, ToolOutput};
use crate::StoreResult;

static TEMP_LINK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Publishes canonical store content into repository trees
pub struct RepositoryPublisher {
    store: Arc<ContentStore>,
    repos_root: Utf8PathBuf,
    generator: Arc<dyn MetadataGenerator>,
    pub(super) locks: RepoLocks,
    policy: LinkPolicy,
}

impl RepositoryPublisher {
    pub fn new(
        store: Arc<ContentStore>,
        repos_root: impl Into<Utf8PathBuf>,
        generator: Arc<dyn MetadataGenerator>,
    ) -> Self {
        Self {
            store,
            repos_root: repos_root.into(),
            generator,
            locks: RepoLocks::new(),
            policy: LinkPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn repos_root(&self) -> &Utf8Path {
        &self.repos_root
    }

    /// Link `link` to `source`, creating parent directories as needed.
    ///
    /// Relative link paths are taken below the repositories root. A relative
    /// source is taken from the current directory and linked by absolute path.
    pub fn publish<S, L>(&self, source: S, link: L) -> StoreResult<PublishOutcome>
    where
        S: AsRef<Utf8Path>,
        L: AsRef<Utf8Path>,
    {
        let source = absolute(source.as_ref())?;
        let link = self.under_repos_root(link.as_ref())?;
        self.publish_paths(&source, &link)
    }

    #[tracing::instrument(skip(self))]
    fn publish_paths(&self, source: &Utf8Path, link: &Utf8Path) -> StoreResult<PublishOutcome> {
        create_parent(source)?;
        create_parent(link)?;

        if link.exists() {
            return self.check_existing(source, link);
        }

        // rename replaces a dangling link in one step
        let outcome = if is_symlink(link) {
            debug!("Replacing broken symlink {}", link);
            PublishOutcome::ReplacedBroken
        } else {
            PublishOutcome::Created
        };

        replace_link(source, link)?;
        info!("Linked {} -> {}", link, source);
        Ok(outcome)
    }

    fn check_existing(&self, source: &Utf8Path, link: &Utf8Path) -> StoreResult<PublishOutcome> {
        if !self.policy.verify_targets {
            debug!("{} already exists, target not verified", link);
            return Ok(PublishOutcome::AlreadyLinked);
        }

        if !is_symlink(link) {
            warn!("{} exists and is not a symlink, leaving it in place", link);
            return Ok(PublishOutcome::Occupied);
        }

        if points_to(link, source) {
            debug!("{} already links to {}", link, source);
            return Ok(PublishOutcome::AlreadyLinked);
        }

        replace_link(source, link)?;
        info!("Repointed {} -> {}", link, source);
        Ok(PublishOutcome::Repaired)
    }

    /// Publish a package from the canonical store at `<repo_relpath>/<filename>`
    pub fn publish_package(
        &self,
        identity: &PackageIdentity,
        checksum: &ChecksumSpec,
        repo_relpath: &str,
    ) -> StoreResult<RepositoryEntry> {
        let canonical_target = self.store.canonical_path(identity, checksum)?;
        let repo_relative_path = Utf8Path::new(repo_relpath).join(identity.filename());
        let outcome = self.publish(&canonical_target, &repo_relative_path)?;

        Ok(RepositoryEntry {
            repo_relative_path,
            canonical_target,
            outcome,
        })
    }

    /// Publish several packages into one repository, stopping at the first failure
    pub fn publish_all<'a, I>(&self, repo_relpath: &str, packages: I) -> StoreResult<Vec<RepositoryEntry>>
    where
        I: IntoIterator<Item = (&'a PackageIdentity, &'a ChecksumSpec)>,
    {
        packages
            .into_iter()
            .map(|(identity, checksum)| self.publish_package(identity, checksum, repo_relpath))
            .collect()
    }

    /// Regenerate repository metadata, one run at a time per directory
    #[tracing::instrument(skip(self))]
    pub fn refresh_metadata(&self, repo_dir: &Utf8Path, groups: Option<&Utf8Path>) -> StoreResult<ToolOutput> {
        let dir = self.under_repos_root(repo_dir)?;
        let output = self.with_repo_lock(&dir, || {
            self.generator
                .generate(dir.as_std_path(), groups.map(Utf8Path::as_std_path))
        })?;
        check_tool_output(&dir, output)
    }

    /// Add a metadata file to a repository's repodata
    #[tracing::instrument(skip(self))]
    pub fn add_metadata(&self, repo_dir: &Utf8Path, new_file: &Utf8Path) -> StoreResult<ToolOutput> {
        let dir = self.under_repos_root(repo_dir)?;
        let output = self.with_repo_lock(&dir, || self.generator.modify(dir.as_std_path(), new_file.as_std_path()))?;
        check_tool_output(&dir, output)
    }

    fn with_repo_lock<T>(&self, dir: &Utf8Path, f: impl FnOnce() -> T) -> T {
        let lock = self.locks.lock_for(dir);
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.locks.release(dir);
        result
    }

    fn under_repos_root(&self, path: &Utf8Path) -> StoreResult<Utf8PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        let joined = safe_join(self.repos_root.as_std_path(), path.as_std_path())?;
        Utf8PathBuf::from_path_buf(joined).map_err(|p| ShelfError::PathTraversal {
            path: p.display().to_string(),
        })
    }
}

fn check_tool_output(dir: &Utf8Path, output: ToolOutput) -> StoreResult<ToolOutput> {
    if output.success() {
        info!("[{}] on {} finished", output.command, dir);
        return Ok(output);
    }

    error!("{} on {} failed", output.tool, dir);
    Err(ShelfError::MetadataGenerationError {
        tool: output.tool,
        dir: dir.to_string(),
        status: output.status.unwrap_or(-1),
        output: output.output,
    })
}

fn absolute(path: &Utf8Path) -> StoreResult<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir()
        .map_err(|e| ShelfError::io("Failed to get current directory".to_string(), e))?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| {
        ShelfError::io(
            format!("Current directory {} is not valid UTF-8", p.display()),
            io::Error::from(io::ErrorKind::InvalidData),
        )
    })?;
    Ok(cwd.join(path))
}

fn create_parent(path: &Utf8Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ShelfError::directory_create(parent, e))
        },
        _ => Ok(()),
    }
}

fn is_symlink(path: &Utf8Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Whether the link at `link` already resolves to `source`
fn points_to(link: &Utf8Path, source: &Utf8Path) -> bool {
    let Ok(target) = fs::read_link(link) else {
        return false;
    };

    if target == source.as_std_path() {
        return true;
    }

    match (fs::canonicalize(link), fs::canonicalize(source)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn temp_link_path(link: &Utf8Path) -> Utf8PathBuf {
    let unique = format!(
        ".shelf-tmp-{}-{}",
        std::process::id(),
        TEMP_LINK_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    link.with_file_name(unique)
}

/// Create a symlink at a temporary name and rename it onto `link`
fn replace_link(source: &Utf8Path, link: &Utf8Path) -> StoreResult<()> {
    let temp = temp_link_path(link);

    make_symlink(source, &temp).map_err(|e| link_error(link, source, e))?;

    if let Err(e) = fs::rename(&temp, link) {
        if let Err(cleanup) = fs::remove_file(&temp) {
            debug!("Could not remove temporary link {}: {}", temp, cleanup);
        }
        return Err(link_error(link, source, e));
    }

    Ok(())
}

#[cfg(unix)]
fn make_symlink(source: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn make_symlink(source: &Utf8Path, link: &Utf8Path) -> io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, link)
    } else {
        std::os::windows::fs::symlink_file(source, link)
    }
}

fn link_error(link: &Utf8Path, source: &Utf8Path, e: io::Error) -> ShelfError {
    ShelfError::LinkCreateError {
        link: link.to_string(),
        target: source.to_string(),
        source: e,
    }
}

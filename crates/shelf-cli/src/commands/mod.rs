//! Command implementations and dispatch logic.
//!
//! Every handler takes the shared `CommandContext`, which carries the
//! layered configuration and builds the store objects on demand.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use shelf_config::{ConfigLayering, ConfigLoader, ConfigSource, ShelfToml};
use shelf_core::error::{ShelfError, ShelfResult};
use shelf_core::types::{ChecksumSpec, PackageIdentity};
use shelf_store::{
    ContentStore, CreateRepoTool, LinkPolicy, RepositoryIntrospector, RepositoryPublisher, StorageLayout,
    TreeCatalog,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod checksum;
pub mod config;
pub mod find;
pub mod metadata;
pub mod path;
pub mod publish;

#[cfg(test)]
mod tests;

use crate::output::OutputHandler;
use crate::{Commands, GlobalArgs, PackageArgs};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub config: ShelfToml,
    pub source: ConfigSource,
}

impl CommandContext {
    /// Load configuration for the current directory and apply overrides
    pub async fn new(global: &GlobalArgs) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| ShelfError::Io {
            message: "Failed to get current directory".to_string(),
            source: e,
        })?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|p| anyhow::anyhow!("Current directory {} is not valid UTF-8", p.display()))?;

        let (base, source) = ConfigLoader::new(cwd.clone())
            .load(global.config.as_deref())
            .await?;

        let mut layering = ConfigLayering::from_env();
        if let Some(root) = &global.storage_root {
            layering = layering.with_cli_override("storage-root", root.as_str());
        }
        let config = layering
            .merge(base)
            .with_context(|| format!("Invalid configuration from {}", source))?;

        Ok(Self::from_config(cwd, config, source, OutputHandler::new(global.json)))
    }

    pub fn from_config(cwd: Utf8PathBuf, config: ShelfToml, source: ConfigSource, output: OutputHandler) -> Self {
        Self {
            cwd,
            output,
            config,
            source,
        }
    }

    /// Resolve a command line path against the working directory
    pub fn absolute(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.cwd.join(path)
    }

    /// Directory layout below the configured storage root
    pub fn layout(&self) -> ShelfResult<StorageLayout> {
        let root = self.config.storage_root()?;
        Ok(StorageLayout::new(self.absolute(root)))
    }

    /// The canonical package store
    pub fn content_store(&self) -> ShelfResult<ContentStore> {
        let resolver = self
            .layout()?
            .resolver()
            .with_fallback(self.config.fallback_algorithm()?);
        Ok(ContentStore::new(resolver).with_chunk_size(self.config.storage.chunk_size))
    }

    /// Publisher for the configured repositories root
    pub fn publisher(&self) -> ShelfResult<RepositoryPublisher> {
        let layout = self.layout()?;
        let tool = CreateRepoTool::new(&self.config.metadata.createrepo, &self.config.metadata.modifyrepo);
        let policy = if self.config.storage.verify_existing_links {
            LinkPolicy::default()
        } else {
            LinkPolicy::trusting()
        };

        Ok(
            RepositoryPublisher::new(Arc::new(self.content_store()?), layout.repos_dir(), Arc::new(tool))
                .with_policy(policy),
        )
    }

    /// Package lookup using the configured package extension
    pub fn introspector(&self) -> RepositoryIntrospector<TreeCatalog> {
        RepositoryIntrospector::new(TreeCatalog::new(&self.config.metadata.package_extension))
    }

    /// Caller-side bound for one metadata tool run
    pub fn metadata_timeout(&self) -> Option<Duration> {
        self.config.metadata.timeout_secs.map(Duration::from_secs)
    }
}

impl PackageArgs {
    /// Validated identity of the package
    pub fn identity(&self) -> ShelfResult<PackageIdentity> {
        PackageIdentity::new(
            self.name.as_str(),
            self.version.as_str(),
            self.release.as_str(),
            self.arch.as_str(),
            self.filename.as_str(),
        )
    }

    /// Checksum from `--digest` or the `--checksum ALG=DIGEST` list
    pub fn checksum_spec(&self) -> anyhow::Result<ChecksumSpec> {
        if let Some(digest) = &self.digest {
            return Ok(ChecksumSpec::Single(digest.clone()));
        }

        let mut digests = BTreeMap::new();
        for entry in &self.checksum {
            let (algorithm, digest) = entry
                .split_once('=')
                .with_context(|| format!("Checksum '{}' is not of the form ALG=DIGEST", entry))?;
            digests.insert(algorithm.trim().to_ascii_lowercase(), digest.trim().to_string());
        }
        Ok(ChecksumSpec::Multi(digests))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Checksum { files, hashtype } => {
            info!("Computing {} checksums of {} files", hashtype, files.len());
            checksum::execute(files, &hashtype, ctx).await
        },
        Commands::Path { package } => path::execute_path(&package, ctx).await,
        Commands::Exists {
            path,
            digest,
            hashtype,
            force,
        } => path::execute_exists(&path, &digest, &hashtype, force, ctx).await,
        Commands::Publish { source, link } => publish::execute_publish(&source, &link, ctx).await,
        Commands::Link { package, repo } => publish::execute_link(&package, &repo, ctx).await,
        Commands::Createrepo { dir, groups } => metadata::execute_createrepo(&dir, groups.as_deref(), ctx).await,
        Commands::Modifyrepo { dir, file } => metadata::execute_modifyrepo(&dir, &file, ctx).await,
        Commands::Find {
            repo_dir,
            relative_path,
        } => find::execute(&repo_dir, &relative_path, ctx).await,
        Commands::Config => config::execute(ctx).await,
    }
}

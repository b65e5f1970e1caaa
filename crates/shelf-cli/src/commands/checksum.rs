//! `shelf checksum` command implementation.
//!
//! Hashes each file on rayon's pool and prints results in input order,
//! `sha256sum` style or as JSON.

use serde::Serialize;
use shelf_core::types::HashAlgorithm;
use shelf_store::{checksum_files_parallel, file_timestamp};
use std::path::PathBuf;

use super::CommandContext;

/// One computed file digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChecksum {
    pub path: PathBuf,
    pub algorithm: HashAlgorithm,
    pub digest: String,
    /// Modification time, Unix seconds
    pub modified: i64,
}

/// Execute the `shelf checksum` command
pub async fn execute(files: Vec<PathBuf>, hashtype: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    let results = compute(files, hashtype, ctx).await?;

    if ctx.output.is_json() {
        return ctx.output.json(&results);
    }

    for entry in &results {
        ctx.output.result(&format!("{}  {}", entry.digest, entry.path.display()));
    }
    Ok(())
}

/// Hash `files` with the named algorithm
pub async fn compute(files: Vec<PathBuf>, hashtype: &str, ctx: &CommandContext) -> anyhow::Result<Vec<FileChecksum>> {
    let algorithm: HashAlgorithm = hashtype.parse()?;
    let chunk_size = ctx.config.storage.chunk_size;
    let files: Vec<PathBuf> = files
        .into_iter()
        .map(|f| ctx.cwd.as_std_path().join(f))
        .collect();

    let digests =
        tokio::task::spawn_blocking(move || checksum_files_parallel(&files, algorithm, chunk_size)).await??;

    digests
        .into_iter()
        .map(|(path, digest)| {
            let modified = file_timestamp(&path)?;
            Ok(FileChecksum {
                path,
                algorithm,
                digest,
                modified,
            })
        })
        .collect()
}

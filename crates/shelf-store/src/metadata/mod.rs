//! Repository metadata collaborators
//!
//! Metadata is produced by external tools. The store only needs a directory
//! in, an exit status and captured text out; `RepositoryPublisher` turns a
//! failed run into `MetadataGenerationError`.

use serde::Serialize;
use std::path::Path;

use crate::StoreResult;

pub mod createrepo;

pub use createrepo::CreateRepoTool;

/// Result of one external tool run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    /// Short tool name, e.g. `createrepo`
    pub tool: String,
    /// Full command line as run
    pub command: String,
    /// Exit code; `None` when the process was killed by a signal
    pub status: Option<i32>,
    /// Captured stdout followed by stderr
    pub output: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Produces or refreshes repository metadata for a directory
pub trait MetadataGenerator: Send + Sync {
    /// Generate metadata for `repo_dir`, optionally with a comps/group file.
    /// A non-zero exit is reported through `ToolOutput`, not as `Err`.
    fn generate(&self, repo_dir: &Path, groups: Option<&Path>) -> StoreResult<ToolOutput>;

    /// Add `new_file` to the metadata of `repo_dir`
    fn modify(&self, repo_dir: &Path, new_file: &Path) -> StoreResult<ToolOutput>;
}

/// Reads the index of an existing `repomd.xml`
pub trait RepomdQuery: Send + Sync {
    /// Metadata types listed in the index (`primary`, `group`, ...)
    fn filetypes(&self, repomd: &Path) -> StoreResult<Vec<String>>;

    /// Location of one metadata type, relative to the repository directory
    fn location(&self, repomd: &Path, filetype: &str) -> StoreResult<Option<String>>;
}

//! `createrepo` / `modifyrepo` command runner

use shelf_core::error::ShelfError;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{MetadataGenerator, RepomdQuery, ToolOutput};
use crate::StoreResult;

/// Metadata type of comps/group files in `repomd.xml`
const GROUP_FILETYPE: &str = "group";

/// Runs the createrepo tool family as plain argument vectors (no shell)
#[derive(Clone)]
pub struct CreateRepoTool {
    createrepo: PathBuf,
    modifyrepo: PathBuf,
    repomd: Option<Arc<dyn RepomdQuery>>,
}

impl CreateRepoTool {
    pub fn new(createrepo: impl Into<PathBuf>, modifyrepo: impl Into<PathBuf>) -> Self {
        Self {
            createrepo: createrepo.into(),
            modifyrepo: modifyrepo.into(),
            repomd: None,
        }
    }

    /// Reuse the group file of existing metadata when no groups file is given
    pub fn with_repomd_query(mut self, query: Arc<dyn RepomdQuery>) -> Self {
        self.repomd = Some(query);
        self
    }

    /// Find the group file referenced by `<repo_dir>/repodata/repomd.xml`
    fn detect_groups(&self, repo_dir: &Path) -> Option<PathBuf> {
        let query = self.repomd.as_ref()?;
        let repomd = repo_dir.join("repodata").join("repomd.xml");
        if !repomd.is_file() {
            return None;
        }

        let filetypes = match query.filetypes(&repomd) {
            Ok(types) => types,
            Err(e) => {
                warn!("Could not read {}: {}", repomd.display(), e);
                return None;
            },
        };
        info!("Checking what metadata types are available: {:?}", filetypes);

        if !filetypes.iter().any(|t| t == GROUP_FILETYPE) {
            return None;
        }

        let location = match query.location(&repomd, GROUP_FILETYPE) {
            Ok(location) => location?,
            Err(e) => {
                warn!("Could not locate group metadata in {}: {}", repomd.display(), e);
                return None;
            },
        };

        let comps = repo_dir.join(location);
        comps.is_file().then_some(comps)
    }
}

impl std::fmt::Debug for CreateRepoTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateRepoTool")
            .field("createrepo", &self.createrepo)
            .field("modifyrepo", &self.modifyrepo)
            .field("repomd", &self.repomd.is_some())
            .finish()
    }
}

impl MetadataGenerator for CreateRepoTool {
    fn generate(&self, repo_dir: &Path, groups: Option<&Path>) -> StoreResult<ToolOutput> {
        let groups = match groups {
            Some(groups) => Some(groups.to_path_buf()),
            None => self.detect_groups(repo_dir),
        };

        let mut cmd = Command::new(&self.createrepo);
        if let Some(groups) = &groups {
            cmd.arg("-g").arg(groups);
        }
        cmd.arg("--update").arg(repo_dir);

        run("createrepo", cmd)
    }

    fn modify(&self, repo_dir: &Path, new_file: &Path) -> StoreResult<ToolOutput> {
        let mut cmd = Command::new(&self.modifyrepo);
        cmd.arg(new_file).arg(repo_dir);

        run("modifyrepo", cmd)
    }
}

fn run(tool: &str, mut cmd: Command) -> StoreResult<ToolOutput> {
    let command = format!("{:?}", cmd);
    debug!("Running {}", command);

    let output = cmd
        .output()
        .map_err(|e| ShelfError::io(format!("Failed to run {}", command), e))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let text = text.trim_end_matches('\n').to_string();

    Ok(ToolOutput {
        tool: tool.to_string(),
        command,
        status: output.status.code(),
        output: text,
    })
}

//! Repository publishing through symbolic links
//!
//! This module links repository trees into the canonical store and
//! serializes metadata regeneration per repository directory.

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::cas::CanonicalPath;

pub mod locks;
pub mod publisher;


// Re-export main types
pub use locks::RepoLocks;
pub use publisher::RepositoryPublisher;

/// What `publish` did to the link path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishOutcome {
    /// No entry existed; a new link was created
    Created,
    /// The link already pointed at the canonical source (or was not checked)
    AlreadyLinked,
    /// A broken link was removed and recreated
    ReplacedBroken,
    /// A link to a different target was atomically replaced
    Repaired,
    /// A regular file or directory occupies the path; left untouched
    Occupied,
}

/// How existing entries at a link path are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Compare an existing link's target with the canonical source and repair mismatches.
    /// When false, any existing entry counts as already published.
    pub verify_targets: bool,
}

impl LinkPolicy {
    /// Treat any existing entry as published without looking at it
    pub fn trusting() -> Self {
        Self {
            verify_targets: false,
        }
    }
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            verify_targets: true,
        }
    }
}

/// One symbolic link inside a published repository tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryEntry {
    pub repo_relative_path: Utf8PathBuf,
    pub canonical_target: CanonicalPath,
    pub outcome: PublishOutcome,
}

//! shelf.toml configuration parsing and serialization

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use shelf_core::error::ShelfError;
use shelf_core::types::HashAlgorithm;
use std::ops::Range;

use crate::ConfigResult;

/// Default read size for checksum computation
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Complete shelf.toml configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShelfToml {
    /// Store location and checksum behaviour
    #[serde(default)]
    pub storage: StorageSection,

    /// External metadata tools
    #[serde(default)]
    pub metadata: MetadataSection,
}

/// `[storage]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StorageSection {
    /// Storage root holding `packages/`, `repos/` and `published/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<Utf8PathBuf>,

    /// Read size used when hashing files
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Digest used when a checksum mapping has no sha256 entry
    #[serde(default = "default_fallback_algorithm")]
    pub fallback_algorithm: String,

    /// Check and repair the target of links that already exist
    #[serde(default = "default_true")]
    pub verify_existing_links: bool,
}

/// `[metadata]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MetadataSection {
    /// createrepo executable
    #[serde(default = "default_createrepo")]
    pub createrepo: String,

    /// modifyrepo executable
    #[serde(default = "default_modifyrepo")]
    pub modifyrepo: String,

    /// Upper bound for one tool run, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// File extension of packages inside repositories
    #[serde(default = "default_package_extension")]
    pub package_extension: String,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_fallback_algorithm() -> String {
    HashAlgorithm::Sha1.name().to_string()
}

fn default_true() -> bool {
    true
}

fn default_createrepo() -> String {
    "createrepo".to_string()
}

fn default_modifyrepo() -> String {
    "modifyrepo".to_string()
}

fn default_package_extension() -> String {
    "rpm".to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            root: None,
            chunk_size: default_chunk_size(),
            fallback_algorithm: default_fallback_algorithm(),
            verify_existing_links: true,
        }
    }
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            createrepo: default_createrepo(),
            modifyrepo: default_modifyrepo(),
            timeout_secs: None,
            package_extension: default_package_extension(),
        }
    }
}

impl ShelfToml {
    /// The configured storage root; required by every store operation
    pub fn storage_root(&self) -> ConfigResult<&Utf8Path> {
        self.storage
            .root
            .as_deref()
            .ok_or_else(|| ShelfError::ConfigValidation {
                field: "storage.root".to_string(),
                reason: "no storage root configured (set [storage] root, SHELF_STORAGE_ROOT or --storage-root)"
                    .to_string(),
            })
    }

    /// Parsed fallback digest algorithm
    pub fn fallback_algorithm(&self) -> ConfigResult<HashAlgorithm> {
        self.storage
            .fallback_algorithm
            .parse()
            .map_err(|_| ShelfError::ConfigValidation {
                field: "storage.fallback-algorithm".to_string(),
                reason: format!("unknown algorithm '{}'", self.storage.fallback_algorithm),
            })
    }
}

/// Parse TOML string to ShelfToml configuration
pub fn parse_shelf_toml(content: &str) -> ConfigResult<ShelfToml> {
    // Syntax first, for precise locations
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    let config: ShelfToml =
        ::toml::from_str(content).map_err(|e| located_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize ShelfToml to TOML string
pub fn serialize_shelf_toml(config: &ShelfToml) -> ConfigResult<String> {
    ::toml::to_string_pretty(config).map_err(|e| ShelfError::TomlParse {
        message: format!("TOML serialization error: {}", e),
        line: 0,
        column: 0,
    })
}

/// Validate configuration values
pub fn validate_config(config: &ShelfToml) -> ConfigResult<()> {
    if config.storage.chunk_size == 0 {
        return Err(ShelfError::ConfigValidation {
            field: "storage.chunk-size".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    config.fallback_algorithm()?;

    if let Some(root) = &config.storage.root {
        if root.as_str().trim().is_empty() {
            return Err(ShelfError::ConfigValidation {
                field: "storage.root".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    if config.metadata.timeout_secs == Some(0) {
        return Err(ShelfError::ConfigValidation {
            field: "metadata.timeout-secs".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    for (field, value) in [
        ("metadata.createrepo", &config.metadata.createrepo),
        ("metadata.modifyrepo", &config.metadata.modifyrepo),
        ("metadata.package-extension", &config.metadata.package_extension),
    ] {
        if value.trim().is_empty() {
            return Err(ShelfError::ConfigValidation {
                field: field.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

/// Load and parse shelf.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<ShelfToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ShelfError::io(format!("Failed to read {}", path), e))?;

    parse_shelf_toml(&content).map_err(|e| match e {
        ShelfError::TomlParse { message, line, column } => ShelfError::TomlParse {
            message: format!("in file {}: {}", path, message),
            line,
            column,
        },
        other => other,
    })
}

fn located_error(content: &str, message: &str, span: Option<Range<usize>>) -> ShelfError {
    let (line, column) = span
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));

    ShelfError::TomlParse {
        message: message.trim_end().to_string(),
        line,
        column,
    }
}

/// One-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

//! Configuration discovery, layering and environment overrides

use camino::{Utf8Path, Utf8PathBuf};
use shelf_core::error::ShelfError;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::toml::{load_from_file, validate_config, ShelfToml};
use crate::ConfigResult;

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "shelf.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SHELF_";

/// Finds and loads the configuration file that applies to a directory
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Home directory, for the per-user config
    home: Option<Utf8PathBuf>,
}

/// Where the base configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// File named on the command line
    Explicit(Utf8PathBuf),
    /// shelf.toml found from the working directory upwards
    Project(Utf8PathBuf),
    /// ~/.shelf/config.toml
    Global(Utf8PathBuf),
    /// No file found
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Project(path) | ConfigSource::Global(path) => {
                write!(f, "{}", path)
            },
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        let home = dirs::home_dir().and_then(|home| Utf8PathBuf::from_path_buf(home).ok());
        Self { cwd, home }
    }

    /// Use `home` instead of the user's home directory
    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Load the base configuration.
    ///
    /// An explicit path must exist. Otherwise the first of project file and
    /// per-user file that exists is used, falling back to defaults.
    pub async fn load(&self, explicit: Option<&Utf8Path>) -> ConfigResult<(ShelfToml, ConfigSource)> {
        if let Some(path) = explicit {
            let path = self.cwd.join(path);
            let config = load_from_file(&path).await?;
            return Ok((config, ConfigSource::Explicit(path)));
        }

        if let Some(path) = self.resolve_config_path(CONFIG_FILE_NAME) {
            debug!("Using project configuration {}", path);
            let config = load_from_file(&path).await?;
            return Ok((config, ConfigSource::Project(path)));
        }

        if let Some(path) = self.global_config_path().filter(|p| p.is_file()) {
            debug!("Using global configuration {}", path);
            let config = load_from_file(&path).await?;
            return Ok((config, ConfigSource::Global(path)));
        }

        debug!("No configuration file found, using defaults");
        Ok((ShelfToml::default(), ConfigSource::Defaults))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(filename))
            .find(|path| path.is_file())
    }

    /// Location of the per-user configuration file
    pub fn global_config_path(&self) -> Option<Utf8PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(".shelf").join("config.toml"))
    }
}

/// Configuration layering: file < environment < command line
#[derive(Debug, Clone, Default)]
pub struct ConfigLayering {
    /// Environment overrides, keyed by variable name
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides, keyed by config key
    cli_overrides: HashMap<String, String>,
}

impl ConfigLayering {
    /// Create a new configuration layering system
    pub fn new() -> Self {
        Self::default()
    }

    /// Layering with overrides taken from the process environment
    pub fn from_env() -> Self {
        Self {
            env_overrides: Self::collect_env_overrides(),
            cli_overrides: HashMap::new(),
        }
    }

    pub fn with_env_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    /// Add a command line override; keys use the config file names (`storage-root`, `chunk-size`)
    pub fn with_cli_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli_overrides.insert(key.into(), value.into());
        self
    }

    /// Apply all overrides to `base` and validate the result
    pub fn merge(&self, base: ShelfToml) -> ConfigResult<ShelfToml> {
        Self::merge_configs(base, &self.env_overrides, &self.cli_overrides)
    }

    /// Merge configuration layers
    pub fn merge_configs(
        base: ShelfToml,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<ShelfToml> {
        let mut merged = base;

        Self::apply_env_overrides(&mut merged, env_overrides)?;

        // Highest priority
        Self::apply_cli_overrides(&mut merged, cli_overrides)?;

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut ShelfToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let setting = match name {
                "STORAGE_ROOT" => "storage-root",
                "CHUNK_SIZE" => "chunk-size",
                "FALLBACK_ALGORITHM" => "fallback-algorithm",
                "VERIFY_LINKS" => "verify-existing-links",
                "CREATEREPO" => "createrepo",
                "MODIFYREPO" => "modifyrepo",
                "METADATA_TIMEOUT" => "timeout-secs",
                _ => {
                    // Unknown environment variable, ignore
                    continue;
                },
            };
            apply_setting(config, setting, value, key)?;
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut ShelfToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            apply_setting(config, key, value, &format!("--{}", key))?;
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

/// Set one configuration value; `origin` names the override in errors
fn apply_setting(config: &mut ShelfToml, setting: &str, value: &str, origin: &str) -> ConfigResult<()> {
    match setting {
        "storage-root" => config.storage.root = Some(Utf8PathBuf::from(value)),
        "chunk-size" => config.storage.chunk_size = parse_value(value, origin)?,
        "fallback-algorithm" => config.storage.fallback_algorithm = value.to_string(),
        "verify-existing-links" => config.storage.verify_existing_links = parse_bool(value, origin)?,
        "createrepo" => config.metadata.createrepo = value.to_string(),
        "modifyrepo" => config.metadata.modifyrepo = value.to_string(),
        "timeout-secs" => config.metadata.timeout_secs = Some(parse_value(value, origin)?),
        "package-extension" => config.metadata.package_extension = value.to_string(),
        _ => {
            return Err(ShelfError::ConfigValidation {
                field: origin.to_string(),
                reason: format!("unknown setting '{}'", setting),
            })
        },
    }

    Ok(())
}

fn parse_value<T>(value: &str, origin: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e| ShelfError::ConfigValidation {
        field: origin.to_string(),
        reason: format!("invalid value '{}': {}", value, e),
    })
}

fn parse_bool(value: &str, origin: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ShelfError::ConfigValidation {
            field: origin.to_string(),
            reason: format!("expected a boolean, got '{}'", value),
        }),
    }
}

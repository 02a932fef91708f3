//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a small TOML file. Everything else is either
//! passed on the command line or has a compiled default.
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `PTRACK_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PTRACK_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Database file name, relative to the root folder
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Event CSV used to bootstrap an empty attendance log
    ///
    /// Relative paths are resolved against the root folder.
    #[serde(default)]
    pub default_events: Option<PathBuf>,

    /// Upper bound on retrying a locked database write
    #[serde(default = "default_max_lock_wait_ms")]
    pub max_lock_wait_ms: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_database_file() -> String {
    "ptrack.db".to_string()
}

fn default_max_lock_wait_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_file: default_database_file(),
            default_events: None,
            max_lock_wait_ms: default_max_lock_wait_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Absolute path of the SQLite database under `root_folder`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.database_file)
    }

    /// Bootstrap event source, resolved against `root_folder`
    pub fn default_events_path(&self, root_folder: &Path) -> Option<PathBuf> {
        self.default_events.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                root_folder.join(p)
            }
        })
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the active configuration came from
///
/// Config is loaded before the tracing subscriber exists, so the loader
/// reports its origin and the caller logs it once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// Default location checked, nothing there
    MissingFile(PathBuf),
    /// Platform config directory could not be determined
    NoConfigDir,
}

impl ConfigOrigin {
    pub fn is_default(&self) -> bool {
        !matches!(self, ConfigOrigin::File(_))
    }

    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!(path = %path.display(), "Loaded config file"),
            ConfigOrigin::MissingFile(path) => warn!(
                path = %path.display(),
                "Config file not found, using built-in defaults"
            ),
            ConfigOrigin::NoConfigDir => {
                warn!("Could not determine config directory, using built-in defaults")
            }
        }
    }
}

/// Load the config file if present, otherwise fall back to defaults
///
/// A missing file at the default location is not an error; a missing
/// explicit file is. A file that exists but does not parse is always an error.
pub fn load_or_default(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok((load_toml_config(path)?, ConfigOrigin::File(path.to_path_buf())));
    }

    match default_config_path() {
        Some(path) => load_optional(&path),
        None => Ok((TomlConfig::default(), ConfigOrigin::NoConfigDir)),
    }
}

/// Load `path` if it exists, defaults otherwise
pub fn load_optional(path: &Path) -> Result<(TomlConfig, ConfigOrigin)> {
    if !path.exists() {
        return Ok((TomlConfig::default(), ConfigOrigin::MissingFile(path.to_path_buf())));
    }
    Ok((load_toml_config(path)?, ConfigOrigin::File(path.to_path_buf())))
}

/// Platform config file location: `<config_dir>/ptrack/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ptrack").join("config.toml"))
}

/// Resolves the root folder following the documented priority order
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    pub fn resolve(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &config.root_folder {
            return path.clone();
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
///
/// `~/.local/share/ptrack` on Linux, the platform equivalent elsewhere.
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ptrack"))
        .unwrap_or_else(|| PathBuf::from("./ptrack_data"))
}

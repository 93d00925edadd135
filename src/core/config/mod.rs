//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$DIMMETA_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/dimmeta/config.toml`
//! 3. `~/.dimmeta/config.toml` (canonical)
//! 4. `~/.dimmeta.toml` (compatibility, warns)
//!
//! Missing config files are not an error; built-in defaults apply.
//!
//! # Example
//!
//! ```no_run
//! use dimmeta::core::config::Config;
//!
//! let result = Config::load().unwrap();
//! let policy = result.config.naming_policy();
//! println!("Default name: {}", policy.default_name);
//! ```

pub mod schema;

pub use schema::{ConfigFile, NamingConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::naming::NamingPolicy;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents (defaults if no file was found)
    pub file: ConfigFile,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

/// Directories consulted during lookup.
#[derive(Debug, Clone, Default)]
struct SearchRoots {
    explicit: Option<PathBuf>,
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl SearchRoots {
    fn from_env() -> Self {
        Self {
            explicit: std::env::var_os("DIMMETA_CONFIG").map(PathBuf::from),
            xdg_config_home: std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with(&SearchRoots::from_env())
    }

    /// Load configuration from an explicit file.
    pub fn from_path(path: &Path) -> Result<Config, ConfigError> {
        let file = Self::read_config(path)?;
        file.validate()?;
        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn load_with(roots: &SearchRoots) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let Some(path) = Self::locate(roots, &mut warnings) else {
            debug!("no config file found, using defaults");
            return Ok(ConfigLoadResult {
                config: Config::default(),
                warnings,
            });
        };

        debug!(path = %path.display(), "loading config");
        let config = Self::from_path(&path)?;
        Ok(ConfigLoadResult { config, warnings })
    }

    fn locate(roots: &SearchRoots, warnings: &mut Vec<ConfigWarning>) -> Option<PathBuf> {
        // 1. $DIMMETA_CONFIG
        if let Some(path) = roots.explicit.as_ref().filter(|p| p.exists()) {
            return Some(path.clone());
        }

        // 2. $XDG_CONFIG_HOME/dimmeta/config.toml
        if let Some(xdg_home) = &roots.xdg_config_home {
            let path = xdg_home.join("dimmeta/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let home = roots.home.as_ref()?;

        // 3. ~/.dimmeta/config.toml
        let canonical = home.join(".dimmeta/config.toml");
        if canonical.exists() {
            return Some(canonical);
        }

        // 4. ~/.dimmeta.toml (compatibility)
        let compat = home.join(".dimmeta.toml");
        if compat.exists() {
            warn!(path = %compat.display(), "using deprecated config location");
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            return Some(compat);
        }

        None
    }

    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the effective naming policy.
    ///
    /// Unset values fall back to the built-in defaults.
    pub fn naming_policy(&self) -> NamingPolicy {
        self.file
            .naming
            .as_ref()
            .map(NamingConfig::policy)
            .unwrap_or_default()
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

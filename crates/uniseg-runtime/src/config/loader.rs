//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file (`uniseg.toml`), searched in the current directory and the
//!    user config directory, or given explicitly
//! 3. Environment variables (`UNISEG_*`)
//! 4. Programmatic overrides
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `UNISEG_` prefix with `__` as separator:
//!
//! - `UNISEG_FALLBACK=rollback` → `fallback = "rollback"`
//! - `UNISEG_REPLY_CACHE_SIZE=50` → `reply_cache_size = 50`
//! - `UNISEG_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use uniseg_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./config/uniseg.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::schema::UnisegConfig;
use super::validation::validate_config;
use crate::error::{ConfigError, ConfigResult};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "uniseg.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "UNISEG_";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    overrides: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for `uniseg.toml`.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    ///
    /// A missing file is an error, unlike a missing searched file.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, above every other source.
    pub fn merge(mut self, config: UnisegConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<UnisegConfig> {
        let config: UnisegConfig = self.build_figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            fallback = ?config.fallback,
            reply_cache_size = config.reply_cache_size,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(UnisegConfig::default()));

        match &self.config_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_config_file(figment, path)?;
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => {
                if let Some(path) = self.find_config_file() {
                    info!(path = %path.display(), "Loading configuration file");
                    figment = merge_config_file(figment, &path)?;
                } else {
                    debug!("No configuration file found, using defaults");
                }
            }
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        let defaults;
        let search_paths = if self.search_paths.is_empty() {
            defaults = default_search_paths();
            &defaults
        } else {
            &self.search_paths
        };
        search_paths
            .iter()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|path| path.exists())
    }
}

fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("uniseg"));
    }
    paths
}

fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<UnisegConfig> {
    ConfigLoader::new().load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use figment::Jail;
    use uniseg_core::FallbackPolicy;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config, UnisegConfig::default());
            assert_eq!(config.reply_cache_size, 20);
            assert_eq!(config.fallback, FallbackPolicy::Ignore);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                    fallback = "text"
                    reply_cache_size = 5

                    [logging]
                    level = "warn"
                "#,
            )?;
            jail.set_env("UNISEG_FALLBACK", "rollback");
            jail.set_env("UNISEG_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();
            assert_eq!(config.fallback, FallbackPolicy::Rollback);
            assert_eq!(config.reply_cache_size, 5);
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = ConfigLoader::new()
            .file("/nonexistent/uniseg.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("UNISEG_REPLY_CACHE_SIZE", "0");
            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));
            Ok(())
        });
    }
}

//! Configuration validation utilities.

use super::schema::{LogOutput, LoggingConfig, UnisegConfig};
use crate::error::{ConfigError, ConfigResult};

/// Validates the entire configuration.
pub fn validate_config(config: &UnisegConfig) -> ConfigResult<()> {
    if config.reply_cache_size == 0 {
        return Err(ConfigError::validation(
            "reply_cache_size must be greater than 0",
        ));
    }
    validate_logging_config(&config.logging)
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }
    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid logging filter target: {module:?}"
        )));
    }
    Ok(())
}

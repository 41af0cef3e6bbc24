//! Configuration for the uniseg runtime.
//!
//! Loaded with figment from defaults, an optional `uniseg.toml` and
//! `UNISEG_*` environment variables.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{CONFIG_FILE, ConfigLoader, ENV_PREFIX, load_config};
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, UnisegConfig};
pub use validation::validate_config;

//! # Uniseg Runtime
//!
//! Host-side layer over `uniseg-core`:
//!
//! - [`config`]: figment-based configuration (`uniseg.toml`, `UNISEG_*`)
//! - [`logging`]: `tracing-subscriber` setup driven by the configuration
//! - [`Uniseg`]: a service handle bundling configuration, adapters and the
//!   reply record
//! - [`extensions`]: [`ReplyRecord`] and [`ReplyMerge`]
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: reads `uniseg.toml`
//! - `json-log`: enables the `json` log format

pub mod config;
pub mod error;
pub mod extensions;
pub mod logging;
pub mod service;

pub use config::{ConfigLoader, LogFormat, LogLevel, LogOutput, LoggingConfig, UnisegConfig};
pub use error::{ConfigError, ConfigResult};
pub use extensions::{ReplyMerge, ReplyRecord};
pub use logging::LoggingBuilder;
pub use service::Uniseg;

//! Error types for the uniseg conversion engine.
//!
//! Per-segment failures ([`BuildError`], [`SerializeFailed`]) are handled at the
//! builder/exporter boundary. Only whole-message failures ([`ExportError`],
//! [`UnisegError`]) reach the caller.

use thiserror::Error;

use crate::segment::SegmentType;

// =============================================================================
// API Errors
// =============================================================================

/// Error type for calls made through a bot connection.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot is not connected.
    #[error("bot is not connected")]
    NotConnected,
    /// The API returned an error.
    #[error("API error ({retcode}): {message}")]
    ApiError { retcode: i64, message: String },
    /// Other error.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Build Errors
// =============================================================================

/// Errors raised by a single builder conversion.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// A required field was missing from the native segment.
    #[error("native segment '{tag}' is missing field '{field}'")]
    MissingField {
        /// Native tag of the segment.
        tag: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The native segment carried data the builder could not interpret.
    #[error("invalid native segment '{tag}': {reason}")]
    Invalid {
        /// Native tag of the segment.
        tag: String,
        /// Reason for failure.
        reason: String,
    },

    /// A lookup against the bot connection failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BuildError {
    /// Creates a missing field error.
    pub fn missing(tag: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            tag: tag.into(),
            field,
        }
    }

    /// Creates an invalid data error.
    pub fn invalid(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// A segment cannot be represented on the target platform.
#[derive(Debug, Clone, Error)]
#[error("cannot serialize {segment} segment: {reason}")]
pub struct SerializeFailed {
    /// The variant that failed.
    pub segment: SegmentType,
    /// Reason for failure.
    pub reason: String,
}

impl SerializeFailed {
    /// Creates a new serialize failure for the given variant.
    pub fn new(segment: SegmentType, reason: impl Into<String>) -> Self {
        Self {
            segment,
            reason: reason.into(),
        }
    }

    /// The platform has no rule for this variant at all.
    pub fn unsupported(segment: SegmentType, platform: &str) -> Self {
        Self::new(segment, format!("not supported by {platform}"))
    }
}

/// Whole-message export failures.
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    /// A segment failed under the `rollback` policy; nothing was produced.
    #[error("export rolled back at segment {index}: {source}")]
    Rollback {
        /// Position of the failing segment in the container.
        index: usize,
        /// The underlying failure.
        #[source]
        source: SerializeFailed,
    },

    /// The exported payload was handed to a bot of another platform.
    #[error("exporter for '{expected}' cannot serve bot of platform '{actual}'")]
    PlatformMismatch {
        /// Platform of the exporter.
        expected: String,
        /// Platform reported by the bot.
        actual: String,
    },
}

// =============================================================================
// Top-level Errors
// =============================================================================

/// Errors surfaced to the host framework.
#[derive(Debug, Clone, Error)]
pub enum UnisegError {
    /// No adapter is registered under this platform identifier.
    #[error("adapter '{platform}' is not supported")]
    AdapterNotSupported {
        /// The requested platform identifier.
        platform: String,
    },

    /// The event carried no message the builder could read.
    #[error("event of platform '{platform}' carries no message")]
    NoMessage {
        /// Platform of the event.
        platform: String,
    },

    /// Export failed as a whole.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Sending the exported message failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl UnisegError {
    /// Creates an adapter-not-supported error.
    pub fn not_supported(platform: impl Into<String>) -> Self {
        Self::AdapterNotSupported {
            platform: platform.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for bot API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for builder conversions.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for single-segment export rules.
pub type SerializeResult<T> = Result<T, SerializeFailed>;

/// Result type for whole-message export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for top-level operations.
pub type UnisegResult<T> = Result<T, UnisegError>;

//! Process-wide adapter registry.
//!
//! An [`Adapter`] pairs a platform's builder and exporter. Adapter crates
//! contribute a constructor to the [`ADAPTERS`] distributed slice; the global
//! registry is seeded from it on first access. [`register`] adds or replaces
//! adapters at runtime; re-registering a platform overwrites it.
//!
//! ```rust,ignore
//! #[distributed_slice(uniseg_core::ADAPTERS)]
//! #[linkme(crate = uniseg_core::linkme)]
//! static SATORI: fn() -> Adapter = adapter;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use linkme::distributed_slice;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::bot::{Bot, Event, NativePayload};
use crate::builder::{DynBuilder, MessageBuilder};
use crate::error::{ExportError, UnisegError, UnisegResult};
use crate::exporter::{DynExporter, FallbackPolicy, MessageExporter};
use crate::message::UniMessage;
use crate::native::NativeSegment;

// =============================================================================
// Adapter
// =============================================================================

/// A platform's builder/exporter pair.
pub struct Adapter {
    platform: String,
    builder: Arc<dyn DynBuilder>,
    exporter: Arc<dyn DynExporter>,
}

impl Adapter {
    /// Pairs a builder and an exporter of the same native segment type.
    ///
    /// The adapter is registered under the builder's platform identifier.
    pub fn new<S: NativeSegment>(builder: MessageBuilder<S>, exporter: MessageExporter<S>) -> Self {
        if builder.platform() != exporter.platform() {
            debug!(
                builder = builder.platform(),
                exporter = exporter.platform(),
                "Builder and exporter declare different platforms"
            );
        }
        Self {
            platform: builder.platform().to_string(),
            builder: Arc::new(builder),
            exporter: Arc::new(exporter),
        }
    }

    /// Returns the platform identifier.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Returns the builder.
    pub fn builder(&self) -> &dyn DynBuilder {
        self.builder.as_ref()
    }

    /// Returns the exporter.
    pub fn exporter(&self) -> &dyn DynExporter {
        self.exporter.as_ref()
    }

    /// Converts the message of an event.
    pub async fn build(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        self.builder.build(event, bot).await
    }

    /// Converts a message for the bot's platform.
    pub async fn export(
        &self,
        msg: &UniMessage,
        bot: &dyn Bot,
        policy: FallbackPolicy,
    ) -> UnisegResult<NativePayload> {
        if bot.platform() != self.platform {
            return Err(ExportError::PlatformMismatch {
                expected: self.platform.clone(),
                actual: bot.platform().to_string(),
            }
            .into());
        }
        Ok(self.exporter.export(msg, bot, policy).await?)
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Adapter Registry
// =============================================================================

/// Adapter constructors linked into the binary.
/// Each adapter crate contributes one entry.
#[distributed_slice]
pub static ADAPTERS: [fn() -> Adapter];

/// Map of platform identifier to adapter.
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<Adapter>>>,
}

static GLOBAL: LazyLock<AdapterRegistry> = LazyLock::new(AdapterRegistry::linked);

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry holding every adapter in [`ADAPTERS`].
    pub fn linked() -> Self {
        let registry = Self::new();
        for ctor in ADAPTERS {
            registry.register(ctor());
        }
        registry
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Registers an adapter, replacing any adapter of the same platform.
    ///
    /// Returns the replaced adapter.
    pub fn register(&self, adapter: Adapter) -> Option<Arc<Adapter>> {
        let platform = adapter.platform().to_string();
        let previous = self
            .adapters
            .write()
            .insert(platform.clone(), Arc::new(adapter));
        if previous.is_some() {
            debug!(adapter = %platform, "Replaced adapter");
        } else {
            info!(adapter = %platform, "Registered adapter");
        }
        previous
    }

    /// Gets the adapter of a platform.
    ///
    /// Fails with [`UnisegError::AdapterNotSupported`] for unknown platforms.
    pub fn resolve(&self, platform: &str) -> UnisegResult<Arc<Adapter>> {
        self.adapters
            .read()
            .get(platform)
            .cloned()
            .ok_or_else(|| UnisegError::not_supported(platform))
    }

    /// Returns all registered platform identifiers.
    pub fn platforms(&self) -> Vec<String> {
        self.adapters.read().keys().cloned().collect()
    }

    /// Returns the number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.read().len()
    }

    /// Returns true if no adapter is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Global entry points
// =============================================================================

/// Registers an adapter in the global registry.
pub fn register(adapter: Adapter) -> Option<Arc<Adapter>> {
    AdapterRegistry::global().register(adapter)
}

/// Resolves an adapter from the global registry.
pub fn resolve(platform: &str) -> UnisegResult<Arc<Adapter>> {
    AdapterRegistry::global().resolve(platform)
}

/// Converts the message of an event, using the adapter of the bot's platform.
pub async fn build(event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
    resolve(bot.platform())?.build(event, bot).await
}

/// Converts a message for the bot's platform.
pub async fn export(
    msg: &UniMessage,
    bot: &dyn Bot,
    policy: FallbackPolicy,
) -> UnisegResult<NativePayload> {
    resolve(bot.platform())?.export(msg, bot, policy).await
}

impl UniMessage {
    /// Exports the message for the bot's platform and sends it in response to `event`.
    ///
    /// Nothing is sent if the export is rolled back.
    pub async fn send(
        &self,
        event: &dyn Event,
        bot: &dyn Bot,
        policy: FallbackPolicy,
    ) -> UnisegResult<Value> {
        let native = export(self, bot, policy).await?;
        Ok(bot.send(event, native).await?)
    }
}

// =============================================================================
// Tests
// =============================================================================

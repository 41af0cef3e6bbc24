//! The [`Uniseg`] service.
//!
//! Bundles the configuration, an adapter registry and the reply record so a
//! host can convert messages with one handle:
//!
//! ```rust,ignore
//! let uniseg = Uniseg::load()?;
//! uniseg.init_logging();
//!
//! let msg = uniseg.provide(&event, &bot).await?;
//! uniseg.send(&event, &bot, &UniMessage::from("pong")).await?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use uniseg_core::{
    Adapter, AdapterRegistry, Bot, Event, FallbackPolicy, NativePayload, SegmentType, UniMessage,
    UnisegResult,
};

use crate::config::{ConfigLoader, UnisegConfig};
use crate::error::ConfigResult;
use crate::extensions::ReplyRecord;
use crate::logging;

/// Message conversion service.
pub struct Uniseg {
    config: UnisegConfig,
    registry: Arc<AdapterRegistry>,
    replies: ReplyRecord,
}

impl Uniseg {
    /// Creates a service with every linked adapter registered.
    pub fn new(config: UnisegConfig) -> Self {
        Self::with_registry(config, Arc::new(AdapterRegistry::linked()))
    }

    /// Creates a service on an existing registry.
    pub fn with_registry(config: UnisegConfig, registry: Arc<AdapterRegistry>) -> Self {
        let replies = ReplyRecord::new(config.reply_cache_size);
        debug!(
            adapters = registry.len(),
            fallback = ?config.fallback,
            "Created uniseg service"
        );
        Self {
            config,
            registry,
            replies,
        }
    }

    /// Creates a service from the configuration in the default locations.
    pub fn load() -> ConfigResult<Self> {
        Ok(Self::new(ConfigLoader::new().load()?))
    }

    /// Installs the configured logging subscriber.
    pub fn init_logging(&self) {
        logging::init_from_config(&self.config.logging);
    }

    pub fn config(&self) -> &UnisegConfig {
        &self.config
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn replies(&self) -> &ReplyRecord {
        &self.replies
    }

    /// Registers an adapter, replacing any adapter of the same platform.
    pub fn register(&self, adapter: Adapter) {
        self.registry.register(adapter);
    }

    /// Returns true if the platform's exporter has a rule for `ty`.
    ///
    /// Unknown platforms support nothing.
    pub fn supports(&self, platform: &str, ty: SegmentType) -> bool {
        self.registry
            .resolve(platform)
            .is_ok_and(|adapter| adapter.exporter().supports(ty))
    }

    /// Converts the message of an event, including its reply.
    pub async fn build(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        self.registry
            .resolve(bot.platform())?
            .build(event, bot)
            .await
    }

    /// Converts the message of an event, records its reply and returns the
    /// message without it.
    pub async fn provide(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        let msg = self.build(event, bot).await?;
        Ok(self.replies.take_reply(event, msg))
    }

    /// Converts a message for the bot's platform under the configured
    /// fallback policy.
    pub async fn export(&self, msg: &UniMessage, bot: &dyn Bot) -> UnisegResult<NativePayload> {
        self.export_with(msg, bot, self.config.fallback).await
    }

    /// Converts a message for the bot's platform under an explicit policy.
    pub async fn export_with(
        &self,
        msg: &UniMessage,
        bot: &dyn Bot,
        policy: FallbackPolicy,
    ) -> UnisegResult<NativePayload> {
        self.registry
            .resolve(bot.platform())?
            .export(msg, bot, policy)
            .await
    }

    /// Exports a message and sends it in response to `event`.
    pub async fn send(
        &self,
        event: &dyn Event,
        bot: &dyn Bot,
        msg: &UniMessage,
    ) -> UnisegResult<Value> {
        let native = self.export(msg, bot).await?;
        Ok(bot.send(event, native).await?)
    }
}

impl Default for Uniseg {
    fn default() -> Self {
        Self::new(UnisegConfig::default())
    }
}

impl std::fmt::Debug for Uniseg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uniseg")
            .field("config", &self.config)
            .field("platforms", &self.registry.platforms())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniseg_core::UnisegError;
    use uniseg_core::testing::RecordingBot;

    struct Nothing;

    impl Event for Nothing {
        fn platform(&self) -> &str {
            "nowhere"
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[tokio::test]
    async fn test_unknown_platform_is_reported() {
        let uniseg = Uniseg::with_registry(
            UnisegConfig::default(),
            Arc::new(AdapterRegistry::new()),
        );
        let bot = RecordingBot::new("nowhere");

        let err = uniseg.build(&Nothing, &bot).await.unwrap_err();
        assert!(matches!(err, UnisegError::AdapterNotSupported { platform } if platform == "nowhere"));

        let err = uniseg
            .send(&Nothing, &bot, &UniMessage::from("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, UnisegError::AdapterNotSupported { .. }));
        assert!(!uniseg.supports("nowhere", SegmentType::Text));
        assert!(bot.calls().is_empty());
    }

    #[test]
    fn test_reply_cache_follows_config() {
        let config = UnisegConfig {
            reply_cache_size: 3,
            ..UnisegConfig::default()
        };
        let uniseg = Uniseg::with_registry(config, Arc::new(AdapterRegistry::new()));
        assert_eq!(uniseg.replies().capacity(), 3);
        assert!(uniseg.registry().is_empty());
    }
}

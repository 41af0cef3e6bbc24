//! # Uniseg
//!
//! Unified message segments across chat platforms.
//!
//! Each platform adapter parses native messages into a [`UniMessage`] and
//! serializes it back. Handlers written against `UniMessage` work on every
//! platform with an adapter:
//!
//! ```text
//! native message ──▶ Builder ──▶ UniMessage ──▶ Exporter ──▶ native message ──▶ Bot::send
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uniseg::prelude::*;
//!
//! async fn on_message(event: &dyn Event, bot: &dyn Bot) -> uniseg::UnisegResult<()> {
//!     let msg = uniseg::build(event, bot).await?;
//!     if msg.extract_plain_text() == "ping" {
//!         let reply = UniMessage::from(Segment::at_user(event.user_id().unwrap_or_default()))
//!             .text(" pong");
//!         reply.send(event, bot, FallbackPolicy::Text).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `adapter-onebot`, `adapter-qq`, `adapter-satori`, `adapter-feishu`:
//!   link the platform adapter; linked adapters register themselves
//!   (all enabled by default)
//! - `toml-config` *(default)*: read `uniseg.toml`
//! - `json-log`: enable the `json` log format

pub use uniseg_core as core;
pub use uniseg_runtime as runtime;

#[cfg(feature = "adapter-feishu")]
pub use uniseg_adapter_feishu as feishu;
#[cfg(feature = "adapter-onebot")]
pub use uniseg_adapter_onebot as onebot;
#[cfg(feature = "adapter-qq")]
pub use uniseg_adapter_qq as qq;
#[cfg(feature = "adapter-satori")]
pub use uniseg_adapter_satori as satori;

pub use uniseg_core::{
    Adapter, AdapterRegistry, At, AtAll, AtFlag, Bot, BuildError, Built, Custom, Emoji, Event,
    ExportError, FallbackPolicy, Media, MediaSource, MessageBuilder, MessageExporter,
    NativeMessage, NativeSegment, Reference, ReferenceNode, Reply, Segment, SegmentGroup,
    SegmentKind, SegmentType, SerializeFailed, SourceKind, Style, Text, UniMessage, UnisegError,
    UnisegResult, build, export, register, resolve,
};
pub use uniseg_runtime::{ReplyMerge, ReplyRecord, Uniseg, UnisegConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use uniseg_core::prelude::*;
    pub use uniseg_core::{Reply, SegmentKind};
    pub use uniseg_runtime::{ReplyMerge, ReplyRecord, Uniseg};
}

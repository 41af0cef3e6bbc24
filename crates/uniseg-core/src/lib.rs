//! # Uniseg Core
//!
//! The unified message segment model and its conversion engine.
//!
//! Chat platforms each define their own message format. This crate provides a
//! platform-agnostic [`UniMessage`] made of typed [`Segment`]s, plus the two
//! halves of every platform adapter:
//!
//! - **Builders** ([`MessageBuilder`]) turn a native message into a
//!   [`UniMessage`], keyed by native segment tag.
//! - **Exporters** ([`MessageExporter`]) turn a [`UniMessage`] back into a
//!   native message, keyed by [`SegmentType`], with a [`FallbackPolicy`] for
//!   segments the platform cannot represent.
//!
//! Adapters register into a process-wide [`AdapterRegistry`] keyed by platform
//! identifier; each adapter crate links itself in through [`ADAPTERS`].
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────────┐  build   ┌────────────┐  export  ┌──────────────┐
//! │ Native event │────────▶│ UniMessage │────────▶│ Native message│
//! │  (platform A)│          │            │          │  (platform B) │
//! └──────────────┘          └────────────┘          └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use uniseg_core::{FallbackPolicy, Segment, UniMessage};
//!
//! let msg = uniseg_core::build(&event, &bot).await?;
//! if msg.has(SegmentType::Image) {
//!     UniMessage::from("nice picture")
//!         .with(Segment::emoji("76"))
//!         .send(&event, &bot, FallbackPolicy::Text)
//!         .await?;
//! }
//! ```

pub mod bot;
pub mod builder;
pub mod error;
pub mod exporter;
pub mod message;
pub mod native;
pub mod registry;
pub mod segment;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

#[cfg(test)]
mod test_util;

pub use linkme;

pub use bot::{Bot, Event, NativePayload, downcast_event};
pub use builder::{
    BuildFn, Built, DynBuilder, MessageBuilder, MessageFn, ReplyFn, UnknownTagPolicy,
};
pub use error::{
    ApiError, ApiResult, BuildError, BuildResult, ExportError, ExportResult, SerializeFailed,
    SerializeResult, UnisegError, UnisegResult,
};
pub use exporter::{
    AltTextFn, AsyncExportFn, DynExporter, ExportFn, FallbackPolicy, MessageExporter,
    SegmentGroup,
};
pub use message::UniMessage;
pub use native::{NativeMessage, NativeSegment};
pub use registry::{ADAPTERS, Adapter, AdapterRegistry, build, export, register, resolve};
pub use segment::{
    At, AtAll, AtFlag, Custom, DEFAULT_SOURCE_PRIORITY, Emoji, Media, MediaSource, Origin,
    Reference, ReferenceNode, Reply, Segment, SegmentKind, SegmentType, SourceKind, Style, Text,
};

pub use futures::future::BoxFuture;

/// Prelude for common imports.
pub mod prelude {
    pub use super::bot::{Bot, Event};
    pub use super::exporter::FallbackPolicy;
    pub use super::message::UniMessage;
    pub use super::segment::{AtFlag, Media, Segment, SegmentType, Style};
}

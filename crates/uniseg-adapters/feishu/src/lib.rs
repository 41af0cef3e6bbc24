//! # Uniseg Adapter for Feishu
//!
//! Converts Feishu (Lark) messages to and from
//! [`UniMessage`](uniseg_core::UniMessage). Registered under [`PLATFORM`].
//!
//! Rich text `post` messages are flattened into segments on the way in.
//! Outgoing images without a key are uploaded through the bot.

pub mod builder;
pub mod exporter;
pub mod model;

use uniseg_core::linkme::distributed_slice;
use uniseg_core::{ADAPTERS, Adapter};

pub use builder::builder;
pub use exporter::{UPLOAD_IMAGE, exporter};
pub use model::{FeishuMessage, MessageEvent, QuotedMessage, Segment};

/// Platform identifier of Feishu bots.
pub const PLATFORM: &str = "feishu";

/// Creates the Feishu adapter.
pub fn adapter() -> Adapter {
    Adapter::new(builder(), exporter())
}

#[distributed_slice(ADAPTERS)]
#[linkme(crate = uniseg_core::linkme)]
static FEISHU: fn() -> Adapter = adapter;

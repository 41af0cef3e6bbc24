//! # Uniseg Adapter for QQ
//!
//! Converts QQ official bot messages to and from
//! [`UniMessage`](uniseg_core::UniMessage). Registered under [`PLATFORM`].
//!
//! QQ supports text, user and channel mentions, `@everyone`, emoji, images
//! and quotes. Images are sent by URL or uploaded inline as `file_image`.

pub mod builder;
pub mod exporter;
pub mod model;

use uniseg_core::linkme::distributed_slice;
use uniseg_core::{ADAPTERS, Adapter};

pub use builder::builder;
pub use exporter::exporter;
pub use model::{Author, MessageEvent, MessageReference, QQMessage, Segment};

/// Platform identifier of QQ bots.
pub const PLATFORM: &str = "qq";

/// Creates the QQ adapter.
pub fn adapter() -> Adapter {
    Adapter::new(builder(), exporter())
}

#[distributed_slice(ADAPTERS)]
#[linkme(crate = uniseg_core::linkme)]
static QQ: fn() -> Adapter = adapter;

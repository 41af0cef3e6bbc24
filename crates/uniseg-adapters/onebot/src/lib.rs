//! # Uniseg Adapter for OneBot v11
//!
//! Converts OneBot v11 message arrays to and from [`UniMessage`](uniseg_core::UniMessage).
//!
//! Linking this crate registers the adapter under the platform identifier
//! [`PLATFORM`]; no explicit setup is needed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uniseg_adapter_onebot::MessageEvent;
//!
//! let event: MessageEvent = serde_json::from_str(&payload)?;
//! let msg = uniseg_core::build(&event, &bot).await?;
//! println!("{}", msg.extract_plain_text());
//! ```

pub mod builder;
pub mod exporter;
pub mod model;

use uniseg_core::linkme::distributed_slice;
use uniseg_core::{ADAPTERS, Adapter};

pub use builder::{builder, parse_file};
pub use exporter::{exporter, file_value};
pub use model::{
    AtData, FaceData, ForwardData, GetMsgResponse, MediaData, MessageEvent, NodeData,
    OneBotMessage, RawSegment, ReplyData, Segment, Sender, TextData,
};

/// Platform identifier of OneBot v11 bots.
pub const PLATFORM: &str = "onebot11";

/// Creates the OneBot v11 adapter.
pub fn adapter() -> Adapter {
    Adapter::new(builder(), exporter())
}

#[distributed_slice(ADAPTERS)]
#[linkme(crate = uniseg_core::linkme)]
static ONEBOT: fn() -> Adapter = adapter;

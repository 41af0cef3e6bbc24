//! # Uniseg Adapter for Satori
//!
//! Converts Satori message elements to and from
//! [`UniMessage`](uniseg_core::UniMessage). Registered under [`PLATFORM`].
//!
//! Satori is the richest of the bundled protocols: it carries text styles,
//! role and channel mentions, and quotes with their content.

pub mod builder;
pub mod element;
pub mod event;
pub mod exporter;

use uniseg_core::linkme::distributed_slice;
use uniseg_core::{ADAPTERS, Adapter};

pub use builder::builder;
pub use element::{Element, SatoriMessage};
pub use event::{Channel, MessageEvent, MessageObject, User};
pub use exporter::exporter;

/// Platform identifier of Satori bots.
pub const PLATFORM: &str = "satori";

/// Creates the Satori adapter.
pub fn adapter() -> Adapter {
    Adapter::new(builder(), exporter())
}

#[distributed_slice(ADAPTERS)]
#[linkme(crate = uniseg_core::linkme)]
static SATORI: fn() -> Adapter = adapter;

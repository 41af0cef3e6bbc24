//! Traits describing a platform's native message types.
//!
//! Each adapter defines its own segment and message types and implements
//! these traits so the generic builder and exporter can work with them.
//!
//! # Example
//!
//! ```rust,ignore
//! use uniseg_core::{NativeMessage, NativeSegment};
//!
//! fn describe<S: NativeSegment>(msg: &S::Message) {
//!     for segment in msg.segments() {
//!         println!("- {}", segment.tag());
//!     }
//! }
//! ```

use std::fmt::Debug;

use serde_json::Value;

/// A single segment of a platform's native message.
pub trait NativeSegment: Debug + Clone + Send + Sync + 'static {
    /// The native message type wrapping these segments.
    type Message: NativeMessage<Segment = Self>;

    /// Returns the discriminator tag of this segment (e.g., "text", "image").
    fn tag(&self) -> &str;

    /// Creates a plain text segment.
    fn text(text: impl Into<String>) -> Self;

    /// Returns the native data as JSON, used for opaque passthrough.
    fn data(&self) -> Value;
}

/// A complete native message.
pub trait NativeMessage: Debug + Clone + Send + Sync + 'static {
    /// The segment type used by this message.
    type Segment: NativeSegment<Message = Self>;

    /// Wraps exported segments into a message.
    fn from_segments(segments: Vec<Self::Segment>) -> Self;

    /// Returns the segments as a slice.
    fn segments(&self) -> &[Self::Segment];

    /// Returns the number of segments in the message.
    fn len(&self) -> usize {
        self.segments().len()
    }

    /// Returns true if the message has no segments.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

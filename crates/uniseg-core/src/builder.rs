//! Native message → [`UniMessage`] conversion.
//!
//! A [`MessageBuilder`] owns a table from native tag to conversion function.
//! Each native segment is looked up by [`NativeSegment::tag`]; the function
//! may yield one segment, several (spliced in place), or nothing. Tags without
//! a rule are handled by the builder's [`UnknownTagPolicy`].
//!
//! Quoted replies are resolved once per message by an optional async reply
//! extractor, since that usually needs a round trip to the bot connection.
//!
//! # Example
//!
//! ```rust,ignore
//! let builder = MessageBuilder::<Segment>::new("onebot")
//!     .rule(&["text"], |_, seg| Ok(Segment::text(seg.as_text()?).into()))
//!     .rule(&["image"], image)
//!     .message_from(|event| Some(event_message(event)?.segments().to_vec()));
//!
//! let msg = builder.build(&event, &bot).await?;
//! ```

use std::any::Any;
use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::bot::{Bot, Event};
use crate::error::{BuildResult, UnisegError, UnisegResult};
use crate::message::UniMessage;
use crate::native::{NativeMessage, NativeSegment};
use crate::segment::{Origin, Reply, Segment, SegmentKind};

// =============================================================================
// Rule Types
// =============================================================================

/// Output of a single conversion rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    /// The native segment maps to exactly one segment.
    One(Segment),
    /// The native segment expands into several segments, in order.
    Many(Vec<Segment>),
    /// The native segment carries nothing worth keeping.
    Skip,
}

impl Built {
    /// Keeps a native segment as an opaque [`Custom`](SegmentKind::Custom)
    /// segment.
    ///
    /// For segments whose tag has a rule but whose payload does not match
    /// the platform model.
    pub fn passthrough<S: NativeSegment>(native: &S) -> Self {
        Self::One(Segment::custom(native.tag(), native.data()))
    }
}

impl From<Segment> for Built {
    fn from(segment: Segment) -> Self {
        Self::One(segment)
    }
}

impl From<Vec<Segment>> for Built {
    fn from(segments: Vec<Segment>) -> Self {
        Self::Many(segments)
    }
}

/// What to do with a native segment whose tag has no rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTagPolicy {
    /// Keep it as an opaque [`Custom`](crate::segment::Custom) segment.
    #[default]
    Passthrough,
    /// Drop it.
    Drop,
}

/// Converts one native segment. Receives the builder so composite segments
/// can convert their children through the same table.
pub type BuildFn<S> = fn(&MessageBuilder<S>, &S) -> BuildResult<Built>;

/// Reads the native segments out of an event.
pub type MessageFn<S> = fn(&dyn Event) -> Option<Vec<S>>;

/// Resolves the quoted message of an event, possibly via the bot connection.
pub type ReplyFn<S> = for<'a> fn(
    &'a MessageBuilder<S>,
    &'a dyn Event,
    &'a dyn Bot,
) -> BoxFuture<'a, BuildResult<Option<Reply>>>;

// =============================================================================
// MessageBuilder
// =============================================================================

/// Per-platform native → unified converter.
pub struct MessageBuilder<S: NativeSegment> {
    platform: &'static str,
    rules: HashMap<String, BuildFn<S>>,
    unknown: UnknownTagPolicy,
    message_fn: Option<MessageFn<S>>,
    reply_fn: Option<ReplyFn<S>>,
}

impl<S: NativeSegment> MessageBuilder<S> {
    /// Creates an empty builder for a platform.
    pub fn new(platform: &'static str) -> Self {
        Self {
            platform,
            rules: HashMap::new(),
            unknown: UnknownTagPolicy::default(),
            message_fn: None,
            reply_fn: None,
        }
    }

    /// Registers a rule for one or more native tags.
    ///
    /// Registering a tag again replaces the earlier rule.
    pub fn rule(mut self, tags: &[&str], f: BuildFn<S>) -> Self {
        for tag in tags {
            if self.rules.insert((*tag).to_string(), f).is_some() {
                debug!(platform = self.platform, tag, "Overriding build rule");
            }
        }
        self
    }

    /// Sets the policy for tags without a rule.
    pub fn on_unknown(mut self, policy: UnknownTagPolicy) -> Self {
        self.unknown = policy;
        self
    }

    /// Sets how native segments are read out of an event.
    pub fn message_from(mut self, f: MessageFn<S>) -> Self {
        self.message_fn = Some(f);
        self
    }

    /// Sets the reply extractor.
    pub fn reply_from(mut self, f: ReplyFn<S>) -> Self {
        self.reply_fn = Some(f);
        self
    }

    /// Returns the platform identifier.
    pub fn platform(&self) -> &'static str {
        self.platform
    }

    /// Returns true if a rule is registered for `tag`.
    pub fn handles(&self, tag: &str) -> bool {
        self.rules.contains_key(tag)
    }

    // --------------------------------
    // Conversion
    // --------------------------------

    /// Converts one native segment.
    ///
    /// Never fails: rule errors are logged and yield nothing. A single
    /// converted segment is tagged with the native segment as its origin.
    pub fn convert(&self, native: &S) -> Vec<Segment> {
        let tag = native.tag();
        let Some(rule) = self.rules.get(tag) else {
            return match self.unknown {
                UnknownTagPolicy::Passthrough => {
                    trace!(platform = self.platform, tag, "Passing through unknown segment");
                    vec![Segment::custom(tag, native.data()).with_origin(Origin::new(native.clone()))]
                }
                UnknownTagPolicy::Drop => {
                    debug!(platform = self.platform, tag, "Dropping unknown segment");
                    Vec::new()
                }
            };
        };

        match rule(self, native) {
            Ok(Built::One(segment)) => {
                let segment = if segment.origin().is_none() {
                    segment.with_origin(Origin::new(native.clone()))
                } else {
                    segment
                };
                vec![segment]
            }
            Ok(Built::Many(segments)) => segments,
            Ok(Built::Skip) => Vec::new(),
            Err(e) => {
                warn!(platform = self.platform, tag, error = %e, "Failed to convert segment");
                Vec::new()
            }
        }
    }

    /// Converts a sequence of native segments, preserving order.
    pub fn generate(&self, segments: &[S]) -> UniMessage {
        segments.iter().flat_map(|seg| self.convert(seg)).collect()
    }

    /// Converts a native message.
    pub fn generate_message(&self, message: &S::Message) -> UniMessage {
        self.generate(message.segments())
    }

    /// Reads the native segments carried by an event.
    pub fn native_segments(&self, event: &dyn Event) -> Option<Vec<S>> {
        self.message_fn.and_then(|f| f(event))
    }

    /// Resolves the quoted message of an event.
    ///
    /// Failures degrade to `None`.
    pub async fn extract_reply(&self, event: &dyn Event, bot: &dyn Bot) -> Option<Reply> {
        let f = self.reply_fn?;
        match f(self, event, bot).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(platform = self.platform, error = %e, "Failed to extract reply");
                None
            }
        }
    }

    /// Converts the message of an event without resolving its reply.
    pub fn build_without_reply(&self, event: &dyn Event) -> UnisegResult<UniMessage> {
        self.native_segments(event)
            .map(|segments| self.generate(&segments))
            .ok_or_else(|| UnisegError::NoMessage {
                platform: self.platform.to_string(),
            })
    }

    /// Converts the message of an event, prepending its resolved reply.
    pub async fn build(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        let mut msg = self.build_without_reply(event)?;
        if let Some(reply) = self.extract_reply(event, bot).await {
            msg.retain(|seg| !seg.is_reply());
            msg.prepend(Segment::new(SegmentKind::Reply(reply)));
        }
        debug!(platform = self.platform, segments = msg.len(), "Built message");
        Ok(msg)
    }
}

// =============================================================================
// Type-erased builder
// =============================================================================

/// Object-safe view of a [`MessageBuilder`], stored in the adapter registry.
#[async_trait]
pub trait DynBuilder: Send + Sync {
    /// Returns the platform identifier.
    fn platform(&self) -> &str;

    /// See [`MessageBuilder::build`].
    async fn build(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage>;

    /// See [`MessageBuilder::build_without_reply`].
    fn build_without_reply(&self, event: &dyn Event) -> UnisegResult<UniMessage>;

    /// See [`MessageBuilder::extract_reply`].
    async fn extract_reply(&self, event: &dyn Event, bot: &dyn Bot) -> Option<Reply>;

    /// Converts a native message given as `&dyn Any`.
    ///
    /// Returns `None` if it is not this platform's message type.
    fn generate_any(&self, message: &dyn Any) -> Option<UniMessage>;
}

#[async_trait]
impl<S: NativeSegment> DynBuilder for MessageBuilder<S> {
    fn platform(&self) -> &str {
        self.platform
    }

    async fn build(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        MessageBuilder::build(self, event, bot).await
    }

    fn build_without_reply(&self, event: &dyn Event) -> UnisegResult<UniMessage> {
        MessageBuilder::build_without_reply(self, event)
    }

    async fn extract_reply(&self, event: &dyn Event, bot: &dyn Bot) -> Option<Reply> {
        MessageBuilder::extract_reply(self, event, bot).await
    }

    fn generate_any(&self, message: &dyn Any) -> Option<UniMessage> {
        message
            .downcast_ref::<S::Message>()
            .map(|msg| self.generate_message(msg))
    }
}

// =============================================================================
// Tests
// =============================================================================

//! [`UniMessage`] → native message conversion.
//!
//! A [`MessageExporter`] resolves a rule for each segment in this order:
//!
//! 1. the segment's [`Origin`](crate::segment::Origin), if it is already a
//!    native segment of this platform, is reused as-is;
//! 2. a rule registered for the exact [`SegmentType`];
//! 3. a rule registered for a [`SegmentGroup`] containing the type.
//!
//! Segments with no rule, or whose rule returns [`SerializeFailed`], are
//! handled by the caller's [`FallbackPolicy`].
//!
//! # Example
//!
//! ```rust,ignore
//! let exporter = MessageExporter::<Segment>::new("satori")
//!     .rule(SegmentType::Text, text)
//!     .group(SegmentGroup::Media, media)
//!     .rule_async(SegmentType::Image, upload_image);
//!
//! let native = exporter.export(&msg, &bot, FallbackPolicy::Text).await?;
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bot::{Bot, NativePayload};
use crate::error::{ExportError, ExportResult, SerializeFailed, SerializeResult};
use crate::message::UniMessage;
use crate::native::{NativeMessage, NativeSegment};
use crate::segment::{DEFAULT_SOURCE_PRIORITY, Media, MediaSource, Segment, SegmentType, SourceKind};

// =============================================================================
// Fallback Policy
// =============================================================================

/// What the exporter does with a segment the platform cannot represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Drop the segment.
    #[default]
    Ignore,
    /// Substitute the segment's alt text.
    Text,
    /// Abort the whole export.
    Rollback,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "text" => Ok(Self::Text),
            "rollback" => Ok(Self::Rollback),
            other => Err(format!("unknown fallback policy: {other}")),
        }
    }
}

// =============================================================================
// Segment Groups
// =============================================================================

/// A named set of related variants served by one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentGroup {
    /// Image, voice, video, audio and file.
    Media,
    /// At and at-all.
    Mention,
}

impl SegmentGroup {
    /// Returns the variants in this group.
    pub const fn members(self) -> &'static [SegmentType] {
        match self {
            Self::Media => &[
                SegmentType::Image,
                SegmentType::Voice,
                SegmentType::Video,
                SegmentType::Audio,
                SegmentType::File,
            ],
            Self::Mention => &[SegmentType::At, SegmentType::AtAll],
        }
    }

    /// Returns true if `ty` belongs to this group.
    pub fn contains(self, ty: SegmentType) -> bool {
        self.members().contains(&ty)
    }
}

// =============================================================================
// Rule Types
// =============================================================================

/// Synchronous export rule.
pub type ExportFn<S> = fn(&MessageExporter<S>, &Segment) -> SerializeResult<S>;

/// Asynchronous export rule, for conversions that call the bot (e.g. uploads).
pub type AsyncExportFn<S> = for<'a> fn(
    &'a MessageExporter<S>,
    &'a Segment,
    &'a dyn Bot,
) -> BoxFuture<'a, SerializeResult<S>>;

/// Renders a segment as text for the `text` fallback policy.
pub type AltTextFn = fn(&Segment) -> String;

enum ExportRule<S: NativeSegment> {
    Sync(ExportFn<S>),
    Async(AsyncExportFn<S>),
}

impl<S: NativeSegment> Clone for ExportRule<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: NativeSegment> Copy for ExportRule<S> {}

// =============================================================================
// MessageExporter
// =============================================================================

/// Per-platform unified → native converter.
pub struct MessageExporter<S: NativeSegment> {
    platform: &'static str,
    rules: HashMap<SegmentType, ExportRule<S>>,
    groups: Vec<(SegmentGroup, ExportRule<S>)>,
    alt_text: AltTextFn,
    priority: &'static [SourceKind],
}

impl<S: NativeSegment> MessageExporter<S> {
    /// Creates an empty exporter for a platform.
    pub fn new(platform: &'static str) -> Self {
        Self {
            platform,
            rules: HashMap::new(),
            groups: Vec::new(),
            alt_text: Segment::alt_text,
            priority: DEFAULT_SOURCE_PRIORITY,
        }
    }

    fn insert(&mut self, ty: SegmentType, rule: ExportRule<S>) {
        if self.rules.insert(ty, rule).is_some() {
            debug!(platform = self.platform, segment = %ty, "Overriding export rule");
        }
    }

    fn insert_group(&mut self, group: SegmentGroup, rule: ExportRule<S>) {
        if let Some(slot) = self.groups.iter_mut().find(|(g, _)| *g == group) {
            debug!(platform = self.platform, ?group, "Overriding export group");
            slot.1 = rule;
        } else {
            self.groups.push((group, rule));
        }
    }

    /// Registers a rule for one variant. A later registration replaces it.
    pub fn rule(mut self, ty: SegmentType, f: ExportFn<S>) -> Self {
        self.insert(ty, ExportRule::Sync(f));
        self
    }

    /// Registers an async rule for one variant.
    pub fn rule_async(mut self, ty: SegmentType, f: AsyncExportFn<S>) -> Self {
        self.insert(ty, ExportRule::Async(f));
        self
    }

    /// Registers a rule for a group of variants.
    pub fn group(mut self, group: SegmentGroup, f: ExportFn<S>) -> Self {
        self.insert_group(group, ExportRule::Sync(f));
        self
    }

    /// Registers an async rule for a group of variants.
    pub fn group_async(mut self, group: SegmentGroup, f: AsyncExportFn<S>) -> Self {
        self.insert_group(group, ExportRule::Async(f));
        self
    }

    /// Overrides the alt-text rendering.
    pub fn alt_text(mut self, f: AltTextFn) -> Self {
        self.alt_text = f;
        self
    }

    /// Overrides the media source priority.
    pub fn source_priority(mut self, priority: &'static [SourceKind]) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the platform identifier.
    pub fn platform(&self) -> &'static str {
        self.platform
    }

    fn resolve(&self, ty: SegmentType) -> Option<ExportRule<S>> {
        self.rules.get(&ty).copied().or_else(|| {
            self.groups
                .iter()
                .find(|(group, _)| group.contains(ty))
                .map(|(_, rule)| *rule)
        })
    }

    /// Returns true if some rule covers `ty`.
    ///
    /// A covered variant may still fail for a particular instance.
    pub fn supports(&self, ty: SegmentType) -> bool {
        self.resolve(ty).is_some()
    }

    /// Picks the media source this platform accepts.
    ///
    /// Fails with [`SerializeFailed`] when the media has no usable source.
    pub fn pick<'m>(&self, ty: SegmentType, media: &'m Media) -> SerializeResult<&'m MediaSource> {
        media
            .pick(self.priority)
            .ok_or_else(|| SerializeFailed::new(ty, "no usable media source"))
    }

    // --------------------------------
    // Conversion
    // --------------------------------

    /// Converts one segment.
    pub async fn export_segment(&self, segment: &Segment, bot: &dyn Bot) -> SerializeResult<S> {
        if let Some(native) = segment.origin_as::<S>() {
            return Ok(native.clone());
        }
        let ty = segment.segment_type();
        match self.resolve(ty) {
            Some(ExportRule::Sync(f)) => f(self, segment),
            Some(ExportRule::Async(f)) => f(self, segment, bot).await,
            None => Err(SerializeFailed::unsupported(ty, self.platform)),
        }
    }

    /// Converts a whole message under the given fallback policy.
    ///
    /// Only [`FallbackPolicy::Rollback`] can fail; no partial message is
    /// returned in that case.
    pub async fn export(
        &self,
        msg: &UniMessage,
        bot: &dyn Bot,
        policy: FallbackPolicy,
    ) -> ExportResult<S::Message> {
        let mut out = Vec::with_capacity(msg.len());
        for (index, segment) in msg.iter().enumerate() {
            match self.export_segment(segment, bot).await {
                Ok(native) => out.push(native),
                Err(e) => match policy {
                    FallbackPolicy::Ignore => {
                        warn!(platform = self.platform, index, error = %e, "Dropping segment");
                    }
                    FallbackPolicy::Text => {
                        debug!(platform = self.platform, index, error = %e, "Substituting alt text");
                        out.push(S::text((self.alt_text)(segment)));
                    }
                    FallbackPolicy::Rollback => {
                        warn!(platform = self.platform, index, error = %e, "Rolling back export");
                        return Err(ExportError::Rollback { index, source: e });
                    }
                },
            }
        }
        debug!(platform = self.platform, segments = out.len(), "Exported message");
        Ok(S::Message::from_segments(out))
    }
}

// =============================================================================
// Type-erased exporter
// =============================================================================

/// Object-safe view of a [`MessageExporter`], stored in the adapter registry.
#[async_trait]
pub trait DynExporter: Send + Sync {
    /// Returns the platform identifier.
    fn platform(&self) -> &str;

    /// See [`MessageExporter::supports`].
    fn supports(&self, ty: SegmentType) -> bool;

    /// See [`MessageExporter::export`]. The native message is boxed.
    async fn export(
        &self,
        msg: &UniMessage,
        bot: &dyn Bot,
        policy: FallbackPolicy,
    ) -> ExportResult<NativePayload>;
}

#[async_trait]
impl<S: NativeSegment> DynExporter for MessageExporter<S> {
    fn platform(&self) -> &str {
        self.platform
    }

    fn supports(&self, ty: SegmentType) -> bool {
        MessageExporter::supports(self, ty)
    }

    async fn export(
        &self,
        msg: &UniMessage,
        bot: &dyn Bot,
        policy: FallbackPolicy,
    ) -> ExportResult<NativePayload> {
        let native = MessageExporter::export(self, msg, bot, policy).await?;
        Ok(Box::new(native))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{AtFlag, Origin, SegmentKind};
    use crate::test_util::{MockBot, TestSegment};
    use serde_json::json;

    fn text(_: &MessageExporter<TestSegment>, seg: &Segment) -> SerializeResult<TestSegment> {
        Ok(TestSegment::text(seg.as_text().unwrap_or_default()))
    }

    fn media(ex: &MessageExporter<TestSegment>, seg: &Segment) -> SerializeResult<TestSegment> {
        let ty = seg.segment_type();
        let media = seg
            .as_media()
            .ok_or_else(|| SerializeFailed::new(ty, "not media"))?;
        match ex.pick(ty, media)? {
            MediaSource::Url(url) => Ok(TestSegment::new(ty.as_str(), json!({ "url": url }))),
            _ => Err(SerializeFailed::new(ty, "only urls")),
        }
    }

    fn exporter() -> MessageExporter<TestSegment> {
        MessageExporter::new("test")
            .rule(SegmentType::Text, text)
            .group(SegmentGroup::Media, media)
    }

    fn sample() -> UniMessage {
        UniMessage::new()
            .text("hello ")
            .with(Segment::at(AtFlag::User, "123"))
            .with(Segment::image(Media::url("http://x/y.png")))
    }

    #[tokio::test]
    async fn test_ignore_drops_unsupported() {
        let out = exporter()
            .export(&sample(), &MockBot::default(), FallbackPolicy::Ignore)
            .await
            .unwrap();
        let tags: Vec<_> = out.segments.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, ["text", "image"]);
    }

    #[tokio::test]
    async fn test_text_substitutes_alt_text() {
        let out = exporter()
            .export(&sample(), &MockBot::default(), FallbackPolicy::Text)
            .await
            .unwrap();
        assert_eq!(out.segments.len(), 3);
        assert_eq!(out.segments[1], TestSegment::text("@123"));
    }

    #[tokio::test]
    async fn test_rollback_aborts() {
        let msg = UniMessage::new()
            .text("a")
            .with(Segment::image(Media::unresolved()));
        let err = exporter()
            .export(&msg, &MockBot::default(), FallbackPolicy::Rollback)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Rollback { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_fallback_is_deterministic() {
        let ex = exporter();
        let bot = MockBot::default();
        for _ in 0..3 {
            let out = ex.export(&sample(), &bot, FallbackPolicy::Ignore).await.unwrap();
            assert_eq!(out.segments.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_exact_rule_beats_group() {
        let ex = exporter().rule(SegmentType::Video, |_, _| {
            Ok(TestSegment::new("special_video", json!({})))
        });
        let msg = UniMessage::new()
            .with(Segment::video(Media::url("v")))
            .with(Segment::audio(Media::url("a")));
        let out = ex.export(&msg, &MockBot::default(), FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(out.segments[0].tag, "special_video");
        assert_eq!(out.segments[1].tag, "audio");
    }

    #[tokio::test]
    async fn test_origin_is_reused() {
        let native = TestSegment::new("sticker", json!({"id": 1}));
        let seg = Segment::new(SegmentKind::Custom(crate::segment::Custom {
            tag: "sticker".into(),
            data: json!({"id": 1}),
        }))
        .with_origin(Origin::new(native.clone()));
        let out = exporter()
            .export(&UniMessage::from(seg), &MockBot::default(), FallbackPolicy::Rollback)
            .await
            .unwrap();
        assert_eq!(out.segments, vec![native]);
    }

    #[tokio::test]
    async fn test_async_rule_calls_bot() {
        let ex = exporter().rule_async(SegmentType::File, |_, _, bot| {
            Box::pin(async move {
                let resp = bot
                    .call_api("upload", json!({}))
                    .await
                    .map_err(|e| SerializeFailed::new(SegmentType::File, e.to_string()))?;
                Ok::<_, SerializeFailed>(TestSegment::new("file", resp))
            })
        });
        let msg = UniMessage::from(Segment::file(Media::raw(vec![1, 2], None)));

        let out = ex.export(&msg, &MockBot::default(), FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(out.segments[0].tag, "file");

        let err = ex
            .export(&msg, &MockBot::disconnected(), FallbackPolicy::Rollback)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Rollback { index: 0, .. }));
    }

    #[test]
    fn test_supports_reports_capabilities() {
        let ex = exporter();
        assert!(ex.supports(SegmentType::Voice));
        assert!(!ex.supports(SegmentType::At));
        assert!(SegmentGroup::Mention.contains(SegmentType::AtAll));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Rollback".parse::<FallbackPolicy>(), Ok(FallbackPolicy::Rollback));
        assert!("explode".parse::<FallbackPolicy>().is_err());
    }
}

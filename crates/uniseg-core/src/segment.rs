//! Platform-agnostic message segments.
//!
//! A [`Segment`] is the smallest unit of content in a [`UniMessage`]: a run of
//! text, a mention, a media reference, a quoted reply and so on. Every segment
//! may carry an [`Origin`], the native segment it was built from, so that an
//! unchanged segment can be exported back to its own platform without loss.
//!
//! # Example
//!
//! ```rust,ignore
//! use uniseg_core::{Media, Segment, UniMessage};
//!
//! let msg = UniMessage::new()
//!     .with(Segment::text("hello ").bold())
//!     .with(Segment::at_user("123"))
//!     .with(Segment::image(Media::url("http://x/y.png")));
//! ```

use std::any::Any;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::UniMessage;

// ============================================================================
// Segment Type
// ============================================================================

/// Discriminator of a [`SegmentKind`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Text,
    At,
    AtAll,
    Emoji,
    Image,
    Audio,
    Voice,
    Video,
    File,
    Reply,
    Reference,
    Custom,
}

impl SegmentType {
    /// Returns the type identifier (e.g., "text", "image", "at_all").
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::At => "at",
            Self::AtAll => "at_all",
            Self::Emoji => "emoji",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::File => "file",
            Self::Reply => "reply",
            Self::Reference => "reference",
            Self::Custom => "custom",
        }
    }

    /// Returns true for the resource variants sharing the [`Media`] payload.
    pub const fn is_media(self) -> bool {
        matches!(
            self,
            Self::Image | Self::Audio | Self::Voice | Self::Video | Self::File
        )
    }
}

impl Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Segment Data Types
// ============================================================================

/// Text decoration attached to a [`Text`] segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    CodeBlock,
    Link,
    Superscript,
    Subscript,
    /// A line break. The text is usually `"\n"`.
    Br,
}

impl Style {
    /// Returns the style identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Spoiler => "spoiler",
            Self::Code => "code",
            Self::CodeBlock => "code_block",
            Self::Link => "link",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
            Self::Br => "br",
        }
    }
}

/// Plain or styled text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// The text content.
    pub text: String,
    /// Optional decoration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

/// Scope of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtFlag {
    User,
    Role,
    Channel,
}

/// A mention of a user, role or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct At {
    /// What kind of entity is mentioned.
    pub flag: AtFlag,
    /// Identifier of the mentioned entity.
    pub target: String,
    /// Display name, when the platform provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A mention of everyone (or everyone online, when `here` is set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtAll {
    /// Only mention members currently online.
    #[serde(default)]
    pub here: bool,
}

/// A platform emoji / face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    /// Platform emoji identifier.
    pub id: String,
    /// Emoji name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Kind of a [`MediaSource`], used to express source priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Id,
    Url,
    Path,
    Raw,
}

/// Default order in which exporters consider media sources.
pub const DEFAULT_SOURCE_PRIORITY: &[SourceKind] = &[
    SourceKind::Id,
    SourceKind::Url,
    SourceKind::Path,
    SourceKind::Raw,
];

/// Where the content of a media segment comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// A platform resource identifier.
    Id(String),
    /// A remote URL.
    Url(String),
    /// A local file path.
    Path(PathBuf),
    /// Raw bytes.
    Raw {
        data: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mimetype: Option<String>,
    },
}

impl MediaSource {
    /// Returns the kind of this source.
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Id(_) => SourceKind::Id,
            Self::Url(_) => SourceKind::Url,
            Self::Path(_) => SourceKind::Path,
            Self::Raw { .. } => SourceKind::Raw,
        }
    }
}

/// Payload shared by the image, audio, voice, video and file variants.
///
/// At most one source is ever set. A media with no source is unresolved and
/// every exporter rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// The content source, if resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MediaSource>,
    /// File name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Media {
    /// Media referenced by platform resource id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::from_source(MediaSource::Id(id.into()))
    }

    /// Media referenced by URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self::from_source(MediaSource::Url(url.into()))
    }

    /// Media read from a local path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::from_source(MediaSource::Path(path.into()))
    }

    /// Media carried as raw bytes.
    pub fn raw(data: impl Into<Vec<u8>>, mimetype: Option<String>) -> Self {
        Self::from_source(MediaSource::Raw {
            data: data.into(),
            mimetype,
        })
    }

    /// Media with no source.
    pub fn unresolved() -> Self {
        Self::default()
    }

    fn from_source(source: MediaSource) -> Self {
        Self {
            source: Some(source),
            name: None,
        }
    }

    /// Sets the file name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the source if its kind appears in `priority`.
    ///
    /// Exporters pass the kinds their platform accepts, most preferred first;
    /// [`DEFAULT_SOURCE_PRIORITY`] accepts everything.
    pub fn pick(&self, priority: &[SourceKind]) -> Option<&MediaSource> {
        let source = self.source.as_ref()?;
        priority
            .iter()
            .any(|kind| *kind == source.kind())
            .then_some(source)
    }
}

/// A quoted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Id of the quoted message.
    pub id: String,
    /// Content of the quoted message, when it could be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<UniMessage>,
}

/// One node of a forwarded message bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    /// Id of an existing message this node refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sender id of a custom node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Sender name of a custom node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Content of a custom node.
    #[serde(default)]
    pub content: UniMessage,
}

/// A bundle of forwarded messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Platform id of the whole bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The forwarded nodes.
    #[serde(default)]
    pub nodes: Vec<ReferenceNode>,
}

/// A native segment with no unified counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Custom {
    /// Native tag of the segment.
    pub tag: String,
    /// Native data, as JSON.
    #[serde(default)]
    pub data: Value,
}

// ============================================================================
// Segment Kind
// ============================================================================

/// The content of a [`Segment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SegmentKind {
    Text(Text),
    At(At),
    AtAll(AtAll),
    Emoji(Emoji),
    Image(Media),
    Audio(Media),
    Voice(Media),
    Video(Media),
    File(Media),
    Reply(Reply),
    Reference(Reference),
    Custom(Custom),
}

impl SegmentKind {
    /// Returns the discriminator of this variant.
    pub const fn segment_type(&self) -> SegmentType {
        match self {
            Self::Text(_) => SegmentType::Text,
            Self::At(_) => SegmentType::At,
            Self::AtAll(_) => SegmentType::AtAll,
            Self::Emoji(_) => SegmentType::Emoji,
            Self::Image(_) => SegmentType::Image,
            Self::Audio(_) => SegmentType::Audio,
            Self::Voice(_) => SegmentType::Voice,
            Self::Video(_) => SegmentType::Video,
            Self::File(_) => SegmentType::File,
            Self::Reply(_) => SegmentType::Reply,
            Self::Reference(_) => SegmentType::Reference,
            Self::Custom(_) => SegmentType::Custom,
        }
    }
}

// ============================================================================
// Origin
// ============================================================================

/// The native segment a [`Segment`] was built from.
///
/// Opaque to everything but the exporter of the same platform, which can
/// recover the native value with [`Origin::downcast_ref`].
#[derive(Clone)]
pub struct Origin(Arc<dyn Any + Send + Sync>);

impl Origin {
    /// Wraps a native value.
    pub fn new<T: Any + Send + Sync>(native: T) -> Self {
        Self(Arc::new(native))
    }

    /// Returns the native value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Origin(..)")
    }
}

// ============================================================================
// Segment
// ============================================================================

/// A platform-agnostic message segment.
///
/// Equality compares content only; the [`Origin`] is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment {
    kind: SegmentKind,
    #[serde(skip)]
    origin: Option<Origin>,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Segment {
    /// Creates a segment without origin.
    pub const fn new(kind: SegmentKind) -> Self {
        Self { kind, origin: None }
    }

    // --------------------------------
    // Constructors
    // --------------------------------

    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(SegmentKind::Text(Text {
            text: text.into(),
            style: None,
        }))
    }

    /// Creates a mention.
    pub fn at(flag: AtFlag, target: impl Into<String>) -> Self {
        Self::new(SegmentKind::At(At {
            flag,
            target: target.into(),
            display: None,
        }))
    }

    /// Creates a user mention.
    pub fn at_user(target: impl Into<String>) -> Self {
        Self::at(AtFlag::User, target)
    }

    /// Creates a mention of everyone.
    pub fn at_all(here: bool) -> Self {
        Self::new(SegmentKind::AtAll(AtAll { here }))
    }

    /// Creates an emoji segment.
    pub fn emoji(id: impl Into<String>) -> Self {
        Self::new(SegmentKind::Emoji(Emoji {
            id: id.into(),
            name: None,
        }))
    }

    /// Creates an image segment.
    pub fn image(media: Media) -> Self {
        Self::new(SegmentKind::Image(media))
    }

    /// Creates an audio segment.
    pub fn audio(media: Media) -> Self {
        Self::new(SegmentKind::Audio(media))
    }

    /// Creates a voice segment.
    pub fn voice(media: Media) -> Self {
        Self::new(SegmentKind::Voice(media))
    }

    /// Creates a video segment.
    pub fn video(media: Media) -> Self {
        Self::new(SegmentKind::Video(media))
    }

    /// Creates a file segment.
    pub fn file(media: Media) -> Self {
        Self::new(SegmentKind::File(media))
    }

    /// Creates a reply segment without resolved content.
    pub fn reply(id: impl Into<String>) -> Self {
        Self::new(SegmentKind::Reply(Reply {
            id: id.into(),
            msg: None,
        }))
    }

    /// Creates a forwarded bundle.
    pub fn reference(reference: Reference) -> Self {
        Self::new(SegmentKind::Reference(reference))
    }

    /// Creates an opaque passthrough segment.
    pub fn custom(tag: impl Into<String>, data: Value) -> Self {
        Self::new(SegmentKind::Custom(Custom {
            tag: tag.into(),
            data,
        }))
    }

    // --------------------------------
    // Origin
    // --------------------------------

    /// Attaches the native segment this segment was built from.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns the origin, if any.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Returns the origin as a native value of type `T`.
    pub fn origin_as<T: Any>(&self) -> Option<&T> {
        self.origin.as_ref()?.downcast_ref::<T>()
    }

    // --------------------------------
    // Accessors
    // --------------------------------

    /// Returns the content of this segment.
    pub const fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    /// Consumes the segment and returns its content.
    pub fn into_kind(self) -> SegmentKind {
        self.kind
    }

    /// Returns the discriminator of this segment.
    pub const fn segment_type(&self) -> SegmentType {
        self.kind.segment_type()
    }

    /// Returns true if this is a text segment.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, SegmentKind::Text(_))
    }

    /// Returns true if this is a user/role/channel mention.
    pub fn is_at(&self) -> bool {
        matches!(self.kind, SegmentKind::At(_))
    }

    /// Returns true if this is a mention of everyone.
    pub fn is_at_all(&self) -> bool {
        matches!(self.kind, SegmentKind::AtAll(_))
    }

    /// Returns true if this is an emoji.
    pub fn is_emoji(&self) -> bool {
        matches!(self.kind, SegmentKind::Emoji(_))
    }

    /// Returns true for image, audio, voice, video and file segments.
    pub const fn is_media(&self) -> bool {
        self.segment_type().is_media()
    }

    /// Returns true if this is a reply.
    pub fn is_reply(&self) -> bool {
        matches!(self.kind, SegmentKind::Reply(_))
    }

    /// Returns true if this is a forwarded bundle.
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, SegmentKind::Reference(_))
    }

    /// Returns true if this is an opaque passthrough segment.
    pub fn is_custom(&self) -> bool {
        matches!(self.kind, SegmentKind::Custom(_))
    }

    /// Returns the text content if this is a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Returns the media payload of resource segments.
    pub fn as_media(&self) -> Option<&Media> {
        match &self.kind {
            SegmentKind::Image(m)
            | SegmentKind::Audio(m)
            | SegmentKind::Voice(m)
            | SegmentKind::Video(m)
            | SegmentKind::File(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the reply payload if this is a reply.
    pub fn as_reply(&self) -> Option<&Reply> {
        match &self.kind {
            SegmentKind::Reply(r) => Some(r),
            _ => None,
        }
    }

    // --------------------------------
    // Styles
    // --------------------------------

    /// Returns a copy of this text segment carrying `style`.
    ///
    /// Non-text segments are returned unchanged. The result has no origin,
    /// since it no longer matches the native segment.
    pub fn styled(self, style: Style) -> Self {
        match self.kind {
            SegmentKind::Text(t) => Self::new(SegmentKind::Text(Text {
                text: t.text,
                style: Some(style),
            })),
            _ => self,
        }
    }

    pub fn bold(self) -> Self {
        self.styled(Style::Bold)
    }

    pub fn italic(self) -> Self {
        self.styled(Style::Italic)
    }

    pub fn underline(self) -> Self {
        self.styled(Style::Underline)
    }

    pub fn strikethrough(self) -> Self {
        self.styled(Style::Strikethrough)
    }

    pub fn spoiler(self) -> Self {
        self.styled(Style::Spoiler)
    }

    pub fn code(self) -> Self {
        self.styled(Style::Code)
    }

    pub fn link(self) -> Self {
        self.styled(Style::Link)
    }

    pub fn superscript(self) -> Self {
        self.styled(Style::Superscript)
    }

    pub fn subscript(self) -> Self {
        self.styled(Style::Subscript)
    }

    // --------------------------------
    // Rendering
    // --------------------------------

    /// Renders the segment as text, using placeholders for non-text content.
    ///
    /// Exporters substitute this under the `text` fallback policy.
    pub fn alt_text(&self) -> String {
        match &self.kind {
            SegmentKind::Text(t) => t.text.clone(),
            SegmentKind::At(at) => match &at.display {
                Some(name) => format!("@{name}"),
                None => match at.flag {
                    AtFlag::User => format!("@{}", at.target),
                    AtFlag::Role => format!("@role:{}", at.target),
                    AtFlag::Channel => format!("#{}", at.target),
                },
            },
            SegmentKind::AtAll(all) => {
                if all.here {
                    "@here".to_string()
                } else {
                    "@all".to_string()
                }
            }
            SegmentKind::Emoji(e) => format!("[emoji:{}]", e.name.as_deref().unwrap_or(&e.id)),
            SegmentKind::Image(m)
            | SegmentKind::Audio(m)
            | SegmentKind::Voice(m)
            | SegmentKind::Video(m)
            | SegmentKind::File(m) => match &m.name {
                Some(name) => format!("[{}:{name}]", self.segment_type()),
                None => format!("[{}]", self.segment_type()),
            },
            SegmentKind::Reply(r) => format!("[reply:{}]", r.id),
            SegmentKind::Reference(r) => format!("[forward:{} messages]", r.nodes.len()),
            SegmentKind::Custom(c) => format!("[{}]", c.tag),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alt_text())
    }
}

impl From<SegmentKind> for Segment {
    fn from(kind: SegmentKind) -> Self {
        Self::new(kind)
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_origin() {
        let plain = Segment::at_user("123");
        let traced = Segment::at_user("123").with_origin(Origin::new(String::from("native")));
        assert_eq!(plain, traced);
        assert_eq!(
            traced.origin_as::<String>().map(String::as_str),
            Some("native")
        );
        assert!(plain.origin().is_none());
    }

    #[test]
    fn test_style_chaining_produces_new_segment() {
        let base = Segment::text("docs").with_origin(Origin::new(1u8));
        let linked = base.clone().link();
        assert_eq!(base.as_text(), Some("docs"));
        assert_ne!(base, linked);
        assert!(linked.origin().is_none());
        assert!(matches!(
            linked.kind(),
            SegmentKind::Text(Text { style: Some(Style::Link), .. })
        ));

        let image = Segment::image(Media::url("http://x/y.png"));
        assert_eq!(image.clone().bold(), image);
    }

    #[test]
    fn test_predicates() {
        let voice = Segment::voice(Media::id("v1"));
        assert!(voice.is_media());
        assert_eq!(voice.segment_type(), SegmentType::Voice);
        assert!(!voice.is_text());
        assert!(Segment::reply("1").is_reply());
        assert!(Segment::at_all(false).is_at_all());
        assert_eq!(Segment::text("hi").as_text(), Some("hi"));
    }

    #[test]
    fn test_media_pick_respects_priority() {
        let media = Media::path("/tmp/a.png");
        assert!(media.pick(DEFAULT_SOURCE_PRIORITY).is_some());
        assert!(media.pick(&[SourceKind::Url, SourceKind::Raw]).is_none());
        assert!(Media::unresolved().pick(DEFAULT_SOURCE_PRIORITY).is_none());
    }

    #[test]
    fn test_alt_text() {
        assert_eq!(Segment::at(AtFlag::Channel, "general").alt_text(), "#general");
        assert_eq!(Segment::at_all(true).alt_text(), "@here");
        assert_eq!(
            Segment::file(Media::id("f").with_name("a.txt")).alt_text(),
            "[file:a.txt]"
        );
        assert_eq!(Segment::image(Media::url("u")).to_string(), "[image]");
    }

    #[test]
    fn test_segment_serialize() {
        let json = serde_json::to_string(&Segment::text("Hello")).unwrap();
        assert_eq!(json, r#"{"type":"text","data":{"text":"Hello"}}"#);

        let seg: Segment =
            serde_json::from_str(r#"{"type":"at","data":{"flag":"role","target":"7"}}"#).unwrap();
        assert_eq!(seg, Segment::at(AtFlag::Role, "7"));
    }
}

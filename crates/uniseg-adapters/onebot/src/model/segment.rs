//! OneBot v11 message segment types.
//!
//! Only the segment types uniseg converts are modelled; any other segment
//! deserializes into [`Segment::Other`] and round-trips unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use uniseg_adapter_onebot::Segment;
//!
//! let text = Segment::text("Hello, ");
//! let at = Segment::at("10001000");
//! let face = Segment::face("178");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use uniseg_core::NativeSegment;

use super::message::OneBotMessage;

// ============================================================================
// Segment Enum
// ============================================================================

/// A OneBot v11 message segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text content.
    Text(TextData),
    /// QQ emoji/face.
    Face(FaceData),
    /// Image.
    Image(MediaData),
    /// Voice record.
    Record(MediaData),
    /// Video.
    Video(MediaData),
    /// Group file (implementation extension).
    File(MediaData),
    /// @mention someone, or everyone with `qq = "all"`.
    At(AtData),
    /// Reply to a message.
    Reply(ReplyData),
    /// Forward message reference (receive only).
    Forward(ForwardData),
    /// Forward node (for constructing forward messages).
    Node(NodeData),
    /// Any other segment type, kept verbatim.
    #[serde(untagged)]
    Other(RawSegment),
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Text(data) => write!(f, "{}", data.text),
            Segment::Face(data) => write!(f, "[face:{}]", data.id),
            Segment::Image(data) => write!(f, "[image:{}]", data.file),
            Segment::Record(data) => write!(f, "[record:{}]", data.file),
            Segment::Video(data) => write!(f, "[video:{}]", data.file),
            Segment::File(data) => write!(f, "[file:{}]", data.file),
            Segment::At(data) => write!(f, "@{}", data.qq),
            Segment::Reply(data) => write!(f, "[reply:{}]", data.id),
            Segment::Forward(data) => write!(f, "[forward:{}]", data.id),
            Segment::Node(_) => write!(f, "[node]"),
            Segment::Other(raw) => write!(f, "[{}]", raw.kind),
        }
    }
}

impl NativeSegment for Segment {
    type Message = OneBotMessage;

    fn tag(&self) -> &str {
        match self {
            Segment::Text(_) => "text",
            Segment::Face(_) => "face",
            Segment::Image(_) => "image",
            Segment::Record(_) => "record",
            Segment::Video(_) => "video",
            Segment::File(_) => "file",
            Segment::At(_) => "at",
            Segment::Reply(_) => "reply",
            Segment::Forward(_) => "forward",
            Segment::Node(_) => "node",
            Segment::Other(raw) => &raw.kind,
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Segment::Text(TextData { text: text.into() })
    }

    fn data(&self) -> Value {
        match self {
            Segment::Other(raw) => raw.data.clone(),
            _ => serde_json::to_value(self)
                .ok()
                .and_then(|mut v| v.get_mut("data").map(Value::take))
                .unwrap_or(Value::Null),
        }
    }
}

// ============================================================================
// Segment Builder Methods
// ============================================================================

impl Segment {
    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        <Self as NativeSegment>::text(text)
    }

    /// Creates a QQ face/emoji segment.
    pub fn face(id: impl Into<String>) -> Self {
        Segment::Face(FaceData { id: id.into() })
    }

    /// Creates an image segment from a file name, URL, `file://` path or `base64://` data.
    pub fn image(file: impl Into<String>) -> Self {
        Segment::Image(MediaData::new(file))
    }

    /// Creates a voice record segment.
    pub fn record(file: impl Into<String>) -> Self {
        Segment::Record(MediaData::new(file))
    }

    /// Creates a video segment.
    pub fn video(file: impl Into<String>) -> Self {
        Segment::Video(MediaData::new(file))
    }

    /// Creates an @mention segment for a specific user.
    pub fn at(qq: impl Into<String>) -> Self {
        Segment::At(AtData {
            qq: qq.into(),
            name: None,
        })
    }

    /// Creates an @all segment to mention everyone.
    pub fn at_all() -> Self {
        Self::at("all")
    }

    /// Creates a reply segment referencing another message.
    pub fn reply(id: impl Into<String>) -> Self {
        Segment::Reply(ReplyData { id: id.into() })
    }

    /// Creates a forward node segment referencing an existing message.
    pub fn node(id: impl Into<String>) -> Self {
        Segment::Node(NodeData {
            id: Some(id.into()),
            user_id: None,
            nickname: None,
            content: None,
        })
    }
}

// ============================================================================
// Segment Data Types
// ============================================================================

/// Plain text segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    /// The text content.
    pub text: String,
}

/// QQ face/emoji segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceData {
    /// The face ID. See QQ face ID table.
    pub id: String,
}

/// Image, record, video and file segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaData {
    /// File name, path, URL, or base64.
    pub file: String,
    /// Download URL (receive only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Display name of a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MediaData {
    /// Creates media data from a `file` value.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            url: None,
            name: None,
        }
    }
}

/// @mention segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtData {
    /// QQ number or "all" for @everyone.
    pub qq: String,
    /// Display name, sent by some implementations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Reply segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyData {
    /// Message ID to reply to.
    pub id: String,
}

/// Forward reference segment data (receive only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardData {
    /// Forward message ID.
    pub id: String,
}

/// Forward node segment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Reference an existing message by ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Custom node: sender user ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Custom node: sender nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Custom node: message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<OneBotMessage>,
}

/// A segment of a type this crate does not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    /// The segment type.
    #[serde(rename = "type")]
    pub kind: String,
    /// The segment data.
    #[serde(default)]
    pub data: Value,
}

// ============================================================================
// Tests
// ============================================================================

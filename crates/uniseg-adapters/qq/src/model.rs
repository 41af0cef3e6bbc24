//! QQ official bot message model.
//!
//! The QQ open platform sends `content` text with embedded mention markup plus
//! separate attachments; the host adapter normalizes both into a
//! [`QQMessage`] of typed segments, which is what this crate consumes.

use std::any::Any;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use uniseg_core::{Event, NativeMessage, NativeSegment};

use crate::PLATFORM;

// ============================================================================
// Segment
// ============================================================================

/// A QQ message segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text.
    Text { text: String },
    /// `<@user_id>`.
    MentionUser { user_id: String },
    /// `<#channel_id>`.
    MentionChannel { channel_id: String },
    /// `@everyone`.
    MentionEveryone {},
    /// `<emoji:id>`.
    Emoji { id: String },
    /// Image attachment by URL.
    Image { url: String },
    /// Image uploaded with the message, base64 encoded.
    FileImage { content: String },
    /// Quote of an earlier message.
    Reference {
        message_id: String,
        #[serde(default)]
        ignore_get_message_error: bool,
    },
    /// Any other segment type, kept verbatim.
    #[serde(untagged)]
    Other {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        data: Value,
    },
}

impl Segment {
    /// Creates a user mention.
    pub fn mention_user(user_id: impl Into<String>) -> Self {
        Segment::MentionUser {
            user_id: user_id.into(),
        }
    }

    /// Creates a channel mention.
    pub fn mention_channel(channel_id: impl Into<String>) -> Self {
        Segment::MentionChannel {
            channel_id: channel_id.into(),
        }
    }

    /// Creates an `@everyone` mention.
    pub fn mention_everyone() -> Self {
        Segment::MentionEveryone {}
    }

    /// Creates an emoji segment.
    pub fn emoji(id: impl Into<String>) -> Self {
        Segment::Emoji { id: id.into() }
    }

    /// Creates an image segment from a URL.
    pub fn image(url: impl Into<String>) -> Self {
        Segment::Image { url: url.into() }
    }

    /// Creates a quote of an earlier message.
    pub fn reference(message_id: impl Into<String>) -> Self {
        Segment::Reference {
            message_id: message_id.into(),
            ignore_get_message_error: false,
        }
    }
}

impl NativeSegment for Segment {
    type Message = QQMessage;

    fn tag(&self) -> &str {
        match self {
            Segment::Text { .. } => "text",
            Segment::MentionUser { .. } => "mention_user",
            Segment::MentionChannel { .. } => "mention_channel",
            Segment::MentionEveryone {} => "mention_everyone",
            Segment::Emoji { .. } => "emoji",
            Segment::Image { .. } => "image",
            Segment::FileImage { .. } => "file_image",
            Segment::Reference { .. } => "reference",
            Segment::Other { kind, .. } => kind,
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    fn data(&self) -> Value {
        match self {
            Segment::Other { data, .. } => data.clone(),
            _ => serde_json::to_value(self)
                .ok()
                .and_then(|mut v| v.get_mut("data").map(Value::take))
                .unwrap_or(Value::Null),
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// A QQ message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QQMessage(Vec<Segment>);

impl NativeMessage for QQMessage {
    type Segment = Segment;

    fn from_segments(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl Deref for QQMessage {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Segment>> for QQMessage {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

// ============================================================================
// Event
// ============================================================================

/// Author of a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    /// User id (or member openid in groups).
    pub id: String,
    /// Username, when provided.
    #[serde(default)]
    pub username: Option<String>,
}

/// Quote information attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReference {
    /// Id of the quoted message.
    pub message_id: String,
}

/// A message event from a guild channel, group or direct chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Message id.
    pub id: String,
    /// Channel id, for guild messages.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Group openid, for group messages.
    #[serde(default)]
    pub group_openid: Option<String>,
    /// Message author.
    #[serde(default)]
    pub author: Author,
    /// Normalized message content.
    pub message: QQMessage,
    /// Quoted message, if any.
    #[serde(default)]
    pub message_reference: Option<MessageReference>,
}

impl Event for MessageEvent {
    fn platform(&self) -> &str {
        PLATFORM
    }

    fn message_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn user_id(&self) -> Option<String> {
        Some(self.author.id.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segment_serde() {
        assert_eq!(
            serde_json::to_value(Segment::mention_everyone()).unwrap(),
            json!({"type": "mention_everyone", "data": {}})
        );
        let seg: Segment =
            serde_json::from_value(json!({"type": "ark", "data": {"template_id": 23}})).unwrap();
        assert_eq!(seg.tag(), "ark");
        assert_eq!(seg.data(), json!({"template_id": 23}));

        let seg: Segment = serde_json::from_value(json!({"type": "mention_everyone"})).unwrap();
        assert_eq!(seg.tag(), "mention_everyone");
    }
}

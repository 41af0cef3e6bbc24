//! Feishu message model.
//!
//! Feishu sends each message as a `msg_type` plus a JSON `content` string.
//! The host adapter decodes the content into [`FeishuMessage`] segments; rich
//! text arrives as a single [`Segment::Post`] whose lines hold the same
//! segment types. [`FeishuMessage::to_content`] encodes a message back into
//! the `(msg_type, content)` pair the send API expects.

use std::any::Any;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use uniseg_core::{Event, NativeMessage, NativeSegment};

use crate::PLATFORM;

// ============================================================================
// Segment
// ============================================================================

/// A Feishu message segment or post node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
    },
    /// `user_id` is `all` for everyone.
    At {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
    Image {
        image_key: String,
    },
    /// Image node inside a post.
    Img {
        image_key: String,
    },
    /// Video.
    Media {
        file_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
    Audio {
        file_key: String,
    },
    File {
        file_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
    Folder {
        file_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
    /// Hyperlink node inside a post.
    A {
        href: String,
        #[serde(default)]
        text: String,
    },
    Emotion {
        emoji_type: String,
    },
    /// Rich text: a title and lines of nodes.
    Post {
        #[serde(default)]
        title: String,
        content: Vec<Vec<Segment>>,
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
    pub fn at(user_id: impl Into<String>) -> Self {
        Segment::At {
            user_id: user_id.into(),
            user_name: None,
        }
    }

    /// Creates an image segment.
    pub fn image(image_key: impl Into<String>) -> Self {
        Segment::Image {
            image_key: image_key.into(),
        }
    }

    /// Creates an emotion segment.
    pub fn emotion(emoji_type: impl Into<String>) -> Self {
        Segment::Emotion {
            emoji_type: emoji_type.into(),
        }
    }

    /// Encodes this segment as a post node.
    fn post_node(&self) -> Value {
        match self {
            Segment::Text { text } => json!({"tag": "text", "text": text}),
            Segment::At { user_id, .. } => json!({"tag": "at", "user_id": user_id}),
            Segment::Image { image_key } | Segment::Img { image_key } => {
                json!({"tag": "img", "image_key": image_key})
            }
            Segment::Media { file_key, .. } => json!({"tag": "media", "file_key": file_key}),
            Segment::A { href, text } => json!({"tag": "a", "href": href, "text": text}),
            Segment::Emotion { emoji_type } => json!({"tag": "emotion", "emoji_type": emoji_type}),
            other => json!({"tag": "text", "text": other.to_string()}),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Text { text } => f.write_str(text),
            Segment::At { user_id, .. } => write!(f, "<at user_id=\"{user_id}\"></at>"),
            Segment::A { href, text } if text.is_empty() => f.write_str(href),
            Segment::A { text, .. } => f.write_str(text),
            other => write!(f, "[{}]", other.tag()),
        }
    }
}

impl NativeSegment for Segment {
    type Message = FeishuMessage;

    fn tag(&self) -> &str {
        match self {
            Segment::Text { .. } => "text",
            Segment::At { .. } => "at",
            Segment::Image { .. } => "image",
            Segment::Img { .. } => "img",
            Segment::Media { .. } => "media",
            Segment::Audio { .. } => "audio",
            Segment::File { .. } => "file",
            Segment::Folder { .. } => "folder",
            Segment::A { .. } => "a",
            Segment::Emotion { .. } => "emotion",
            Segment::Post { .. } => "post",
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

/// A Feishu message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeishuMessage(Vec<Segment>);

impl FeishuMessage {
    /// Encodes the message as a `(msg_type, content)` pair.
    ///
    /// A lone image, file, audio or video is sent as that message type. Text
    /// and mentions alone are sent as `text`; anything else becomes a `post`
    /// split into lines at `\n`.
    pub fn to_content(&self) -> (&'static str, Value) {
        match self.0.as_slice() {
            [Segment::Image { image_key }] => return ("image", json!({"image_key": image_key})),
            [Segment::File { file_key, .. }] => return ("file", json!({"file_key": file_key})),
            [Segment::Audio { file_key }] => return ("audio", json!({"file_key": file_key})),
            [Segment::Media { file_key, .. }] => return ("media", json!({"file_key": file_key})),
            _ => {}
        }
        if self
            .0
            .iter()
            .all(|seg| matches!(seg, Segment::Text { .. } | Segment::At { .. }))
        {
            return ("text", json!({"text": self.to_string()}));
        }

        let mut lines: Vec<Vec<Value>> = vec![Vec::new()];
        for seg in &self.0 {
            match seg {
                Segment::Text { text } => {
                    let mut parts = text.split('\n');
                    if let Some(first) = parts.next().filter(|s| !s.is_empty()) {
                        push_node(&mut lines, json!({"tag": "text", "text": first}));
                    }
                    for part in parts {
                        lines.push(Vec::new());
                        if !part.is_empty() {
                            push_node(&mut lines, json!({"tag": "text", "text": part}));
                        }
                    }
                }
                other => push_node(&mut lines, other.post_node()),
            }
        }
        ("post", json!({"zh_cn": {"title": "", "content": lines}}))
    }
}

fn push_node(lines: &mut Vec<Vec<Value>>, node: Value) {
    if let Some(line) = lines.last_mut() {
        line.push(node);
    }
}

impl std::fmt::Display for FeishuMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|seg| write!(f, "{seg}"))
    }
}

impl NativeMessage for FeishuMessage {
    type Segment = Segment;

    fn from_segments(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl Deref for FeishuMessage {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Segment>> for FeishuMessage {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

// ============================================================================
// Event
// ============================================================================

/// A message fetched or embedded alongside an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub message_id: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    pub content: FeishuMessage,
}

/// An `im.message.receive_v1` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: String,
    pub chat_id: String,
    /// `p2p` or `group`.
    pub chat_type: String,
    pub sender_id: String,
    /// Id of the quoted message, if any.
    #[serde(default)]
    pub parent_id: Option<String>,
    pub message: FeishuMessage,
    /// The quoted message, resolved by the host adapter.
    #[serde(default)]
    pub reply: Option<QuotedMessage>,
}

impl Event for MessageEvent {
    fn platform(&self) -> &str {
        PLATFORM
    }

    fn message_id(&self) -> Option<String> {
        Some(self.message_id.clone())
    }

    fn user_id(&self) -> Option<String> {
        Some(self.sender_id.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content() {
        let msg = FeishuMessage::from(vec![Segment::text("hi "), Segment::at("ou_1")]);
        assert_eq!(
            msg.to_content(),
            ("text", json!({"text": "hi <at user_id=\"ou_1\"></at>"}))
        );
    }

    #[test]
    fn test_post_content_splits_lines() {
        let msg = FeishuMessage::from(vec![
            Segment::text("look\nhere "),
            Segment::image("img_1"),
        ]);
        let (msg_type, content) = msg.to_content();
        assert_eq!(msg_type, "post");
        assert_eq!(
            content["zh_cn"]["content"],
            json!([
                [{"tag": "text", "text": "look"}],
                [{"tag": "text", "text": "here "}, {"tag": "img", "image_key": "img_1"}],
            ])
        );
    }

    #[test]
    fn test_lone_image_content() {
        let msg = FeishuMessage::from(vec![Segment::image("img_1")]);
        assert_eq!(msg.to_content(), ("image", json!({"image_key": "img_1"})));
    }
}

//! OneBot v11 message type.
//!
//! OneBot v11 carries messages either as a JSON array of segments or as a
//! CQ-coded string. Arrays are always produced; a string is accepted on input
//! and kept as a single text segment.

use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use uniseg_core::NativeMessage;

use super::segment::Segment;

// ============================================================================
// OneBotMessage
// ============================================================================

/// A OneBot v11 message composed of multiple segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OneBotMessage {
    segments: Vec<Segment>,
}

impl NativeMessage for OneBotMessage {
    type Segment = Segment;

    fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl Serialize for OneBotMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.segments.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OneBotMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MessageFormat {
            Array(Vec<Segment>),
            String(String),
        }

        match MessageFormat::deserialize(deserializer)? {
            MessageFormat::Array(segments) => Ok(Self { segments }),
            MessageFormat::String(text) => Ok(Self::from_text(text)),
        }
    }
}

impl OneBotMessage {
    /// Creates a new empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message containing only plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::text(text)],
        }
    }

    /// Appends a segment (builder pattern).
    pub fn with(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Appends a text segment (builder pattern).
    pub fn text(self, text: impl Into<String>) -> Self {
        self.with(Segment::text(text))
    }

    /// Consumes the message and returns its segments.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }
}

impl Deref for OneBotMessage {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

impl FromIterator<Segment> for OneBotMessage {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for OneBotMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_both_formats() {
        let array: OneBotMessage =
            serde_json::from_value(json!([{"type": "text", "data": {"text": "hi"}}])).unwrap();
        let string: OneBotMessage = serde_json::from_value(json!("hi")).unwrap();
        assert_eq!(array, string);
        assert_eq!(serde_json::to_value(&array).unwrap(), json!([{"type": "text", "data": {"text": "hi"}}]));
    }
}

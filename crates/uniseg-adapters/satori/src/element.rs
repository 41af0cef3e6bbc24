//! Satori message elements.
//!
//! A Satori message is a tree of elements. Plain text is a `text` element
//! with a `content` attribute; everything else is a tagged element with
//! attributes and optional children. [`SatoriMessage::to_content`] renders the
//! tree in the XML-like encoding the Satori HTTP API accepts.

use std::fmt::Write;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use uniseg_core::{NativeMessage, NativeSegment};

// ============================================================================
// Element
// ============================================================================

/// A Satori message element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    /// Element type, e.g. `text`, `at`, `img`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Element attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    /// Child elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an element with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Creates a text element.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new("text").attr("content", content.into())
    }

    /// Sets an attribute (builder pattern).
    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Sets an attribute when the value is present.
    pub fn attr_opt(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    /// Appends a child (builder pattern).
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Returns a string attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Concatenates the text content of this element and its descendants.
    pub fn inner_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if self.kind == "text" {
            out.push_str(self.get_str("content").unwrap_or_default());
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    fn render(&self, out: &mut String) {
        if self.kind == "text" {
            out.push_str(&escape(self.get_str("content").unwrap_or_default(), false));
            return;
        }
        out.push('<');
        out.push_str(&self.kind);
        for (key, value) in &self.attrs {
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) => {
                    let _ = write!(out, " {key}");
                }
                Value::String(s) => {
                    let _ = write!(out, " {key}=\"{}\"", escape(s, true));
                }
                other => {
                    let _ = write!(out, " {key}=\"{}\"", escape(&other.to_string(), true));
                }
            }
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.render(out);
        }
        let _ = write!(out, "</{}>", self.kind);
    }
}

/// Escapes text for the Satori encoding.
pub fn escape(text: &str, inline: bool) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    if inline {
        escaped.replace('"', "&quot;")
    } else {
        escaped
    }
}

impl NativeSegment for Element {
    type Message = SatoriMessage;

    fn tag(&self) -> &str {
        &self.kind
    }

    fn text(text: impl Into<String>) -> Self {
        Element::text(text)
    }

    fn data(&self) -> Value {
        let mut data = Map::new();
        data.insert("attrs".to_string(), Value::Object(self.attrs.clone()));
        if !self.children.is_empty() {
            data.insert(
                "children".to_string(),
                serde_json::to_value(&self.children).unwrap_or_default(),
            );
        }
        Value::Object(data)
    }
}

// ============================================================================
// Message
// ============================================================================

/// A Satori message: a sequence of top-level elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SatoriMessage(Vec<Element>);

impl SatoriMessage {
    /// Renders the message in the Satori encoding.
    pub fn to_content(&self) -> String {
        let mut out = String::new();
        for element in &self.0 {
            element.render(&mut out);
        }
        out
    }
}

impl NativeMessage for SatoriMessage {
    type Segment = Element;

    fn from_segments(segments: Vec<Element>) -> Self {
        Self(segments)
    }

    fn segments(&self) -> &[Element] {
        &self.0
    }
}

impl Deref for SatoriMessage {
    type Target = [Element];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Element>> for SatoriMessage {
    fn from(elements: Vec<Element>) -> Self {
        Self(elements)
    }
}

impl FromIterator<Element> for SatoriMessage {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

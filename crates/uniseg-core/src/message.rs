//! The unified message container.
//!
//! [`UniMessage`] is an ordered sequence of [`Segment`]s and the unit of
//! exchange between builders, application code and exporters. Insertion order
//! is render order.

use std::fmt::{self, Display};
use std::ops::{Add, AddAssign, Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::segment::{Reply, Segment, SegmentKind, SegmentType};

/// A platform-agnostic message composed of [`Segment`]s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniMessage {
    segments: Vec<Segment>,
}

impl UniMessage {
    /// Creates a new empty message.
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a message from a vector of segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Adds a segment to the end of the message.
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.segments.push(segment.into());
    }

    /// Consumes the message and adds a segment (builder pattern).
    pub fn with(mut self, segment: impl Into<Segment>) -> Self {
        self.push(segment);
        self
    }

    /// Adds a text segment (builder pattern).
    pub fn text(self, text: impl Into<String>) -> Self {
        self.with(Segment::text(text))
    }

    /// Inserts a segment at the front of the message.
    pub fn prepend(&mut self, segment: impl Into<Segment>) {
        self.segments.insert(0, segment.into());
    }

    /// Keeps only the segments matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&Segment) -> bool) {
        self.segments.retain(f);
    }

    /// Consumes the message and returns the inner segments vector.
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    // --------------------------------
    // Queries by type
    // --------------------------------

    /// Returns true if any segment has the given type.
    pub fn has(&self, ty: SegmentType) -> bool {
        self.iter().any(|seg| seg.segment_type() == ty)
    }

    /// Counts the segments of the given type.
    pub fn count(&self, ty: SegmentType) -> usize {
        self.iter().filter(|seg| seg.segment_type() == ty).count()
    }

    /// Returns the `n`-th segment of the given type.
    pub fn get(&self, ty: SegmentType, n: usize) -> Option<&Segment> {
        self.iter().filter(|seg| seg.segment_type() == ty).nth(n)
    }

    /// Returns true if the message is non-empty and every segment has the given type.
    pub fn only(&self, ty: SegmentType) -> bool {
        !self.is_empty() && self.iter().all(|seg| seg.segment_type() == ty)
    }

    /// Returns a new message with only the segments of the given type.
    pub fn select(&self, ty: SegmentType) -> Self {
        self.include(&[ty])
    }

    /// Returns a new message keeping the segments whose type is in `types`.
    pub fn include(&self, types: &[SegmentType]) -> Self {
        self.iter()
            .filter(|seg| types.contains(&seg.segment_type()))
            .cloned()
            .collect()
    }

    /// Returns a new message dropping the segments whose type is in `types`.
    pub fn exclude(&self, types: &[SegmentType]) -> Self {
        self.iter()
            .filter(|seg| !types.contains(&seg.segment_type()))
            .cloned()
            .collect()
    }

    // --------------------------------
    // Text
    // --------------------------------

    /// Extracts all plain text content from the message.
    ///
    /// This concatenates the text content of all text segments,
    /// ignoring non-text segments like images or mentions.
    pub fn extract_plain_text(&self) -> String {
        self.iter().filter_map(Segment::as_text).collect()
    }

    /// Splits off a leading reply segment.
    ///
    /// Platforms put the quote first; anything after the first non-reply
    /// segment is left untouched.
    pub fn split_reply(mut self) -> (Option<Reply>, Self) {
        match self.segments.first().map(Segment::kind) {
            Some(SegmentKind::Reply(_)) => {
                let first = self.segments.remove(0);
                let reply = match first.into_kind() {
                    SegmentKind::Reply(reply) => Some(reply),
                    _ => None,
                };
                (reply, self)
            }
            _ => (None, self),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Deref implementations
// ══════════════════════════════════════════════════════════════════════════════

impl Deref for UniMessage {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

impl DerefMut for UniMessage {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.segments
    }
}

impl Display for UniMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Conversions and concatenation
// ══════════════════════════════════════════════════════════════════════════════

impl From<Vec<Segment>> for UniMessage {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl From<Segment> for UniMessage {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<&str> for UniMessage {
    fn from(text: &str) -> Self {
        Self::from(Segment::text(text))
    }
}

impl FromIterator<Segment> for UniMessage {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Extend<Segment> for UniMessage {
    fn extend<T: IntoIterator<Item = Segment>>(&mut self, iter: T) {
        self.segments.extend(iter);
    }
}

impl IntoIterator for UniMessage {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a UniMessage {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl<T: Into<UniMessage>> Add<T> for UniMessage {
    type Output = Self;

    fn add(mut self, rhs: T) -> Self::Output {
        self += rhs;
        self
    }
}

impl<T: Into<UniMessage>> AddAssign<T> for UniMessage {
    fn add_assign(&mut self, rhs: T) {
        self.segments.extend(rhs.into().segments);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Media;

    fn sample() -> UniMessage {
        UniMessage::new()
            .text("hello ")
            .with(Segment::at_user("123"))
            .with(Segment::image(Media::url("http://x/y.png")))
            .text("!")
    }

    #[test]
    fn test_queries_by_type() {
        let msg = sample();
        assert_eq!(msg.len(), 4);
        assert!(msg.has(SegmentType::At));
        assert_eq!(msg.count(SegmentType::Text), 2);
        assert_eq!(msg.get(SegmentType::Text, 1).and_then(Segment::as_text), Some("!"));
        assert!(!msg.only(SegmentType::Text));
        assert!(msg.select(SegmentType::Text).only(SegmentType::Text));
        assert_eq!(msg.exclude(&[SegmentType::Text]).len(), 2);
        assert!(!UniMessage::new().only(SegmentType::Text));
    }

    #[test]
    fn test_plain_text_and_display() {
        let msg = sample();
        assert_eq!(msg.extract_plain_text(), "hello !");
        assert_eq!(msg.to_string(), "hello @123[image]!");
    }

    #[test]
    fn test_concatenation_and_slicing() {
        let mut msg = UniMessage::from("a") + Segment::text("b");
        msg += "c";
        assert_eq!(msg.extract_plain_text(), "abc");
        assert_eq!(msg[1..].len(), 2);
        assert_eq!(msg[0].as_text(), Some("a"));
    }

    #[test]
    fn test_split_reply() {
        let msg = UniMessage::from(Segment::reply("42")).text("hi");
        let (reply, rest) = msg.split_reply();
        assert_eq!(reply.map(|r| r.id), Some("42".to_string()));
        assert_eq!(rest.extract_plain_text(), "hi");

        let (reply, rest) = sample().split_reply();
        assert!(reply.is_none());
        assert_eq!(rest.len(), 4);
    }
}

//! Reply extensions.
//!
//! [`ReplyRecord`] strips the quote off incoming messages and remembers it
//! by message id, for handlers that want the bare text but may later need
//! to know what was quoted. [`ReplyMerge`] folds the quoted content into
//! the message instead.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::trace;

use uniseg_core::{Bot, Event, Reply, UniMessage, UnisegResult};

/// Default capacity of a [`ReplyRecord`].
pub const DEFAULT_REPLY_CACHE_SIZE: usize = 20;

// =============================================================================
// ReplyRecord
// =============================================================================

/// A bounded cache of message id → quoted reply.
///
/// The oldest entry is evicted once `capacity` is reached.
#[derive(Debug)]
pub struct ReplyRecord {
    capacity: usize,
    inner: Mutex<ReplyCache>,
}

#[derive(Debug, Default)]
struct ReplyCache {
    order: VecDeque<String>,
    replies: HashMap<String, Reply>,
}

impl ReplyRecord {
    /// Creates a cache holding at most `capacity` replies.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(ReplyCache::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Builds the message of `event`, records its reply and returns the
    /// message without it.
    ///
    /// Uses the adapter registered globally for the bot's platform.
    pub async fn provide(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        let msg = uniseg_core::build(event, bot).await?;
        Ok(self.take_reply(event, msg))
    }

    /// Records the leading reply of an already built message and returns
    /// the message without it.
    ///
    /// Events without a message id are not recorded.
    pub fn take_reply(&self, event: &dyn Event, msg: UniMessage) -> UniMessage {
        let (reply, rest) = msg.split_reply();
        if let (Some(reply), Some(id)) = (reply, event.message_id()) {
            self.record(id, reply);
        }
        rest
    }

    /// Stores the reply of a message, replacing any previous one.
    pub fn record(&self, message_id: impl Into<String>, reply: Reply) {
        let message_id = message_id.into();
        let mut cache = self.inner.lock();
        if cache.replies.insert(message_id.clone(), reply).is_none() {
            cache.order.push_back(message_id);
        }
        while cache.order.len() > self.capacity {
            if let Some(evicted) = cache.order.pop_front() {
                trace!(message_id = %evicted, "Evicting recorded reply");
                cache.replies.remove(&evicted);
            }
        }
    }

    /// Returns the recorded reply of a message.
    pub fn get(&self, message_id: &str) -> Option<Reply> {
        self.inner.lock().replies.get(message_id).cloned()
    }

    /// Removes and returns the recorded reply of a message.
    pub fn remove(&self, message_id: &str) -> Option<Reply> {
        let mut cache = self.inner.lock();
        let reply = cache.replies.remove(message_id)?;
        cache.order.retain(|id| id != message_id);
        Some(reply)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplyRecord {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_CACHE_SIZE)
    }
}

// =============================================================================
// ReplyMerge
// =============================================================================

/// Merges the content of a quoted message into the message quoting it.
#[derive(Debug, Clone)]
pub struct ReplyMerge {
    /// Put the quoted content before the message instead of after it.
    pub add_left: bool,
    /// Text inserted between the two parts. Empty inserts nothing.
    pub sep: String,
}

impl Default for ReplyMerge {
    fn default() -> Self {
        Self {
            add_left: false,
            sep: " ".to_string(),
        }
    }
}

impl ReplyMerge {
    pub fn new(add_left: bool, sep: impl Into<String>) -> Self {
        Self {
            add_left,
            sep: sep.into(),
        }
    }

    /// Builds the message of `event` and merges its quoted content.
    pub async fn provide(&self, event: &dyn Event, bot: &dyn Bot) -> UnisegResult<UniMessage> {
        Ok(self.merge(uniseg_core::build(event, bot).await?))
    }

    /// Replaces a leading reply with its content.
    ///
    /// The reply segment is always removed. A reply without resolved
    /// content contributes nothing.
    pub fn merge(&self, msg: UniMessage) -> UniMessage {
        let (reply, rest) = msg.split_reply();
        let Some(Reply {
            id,
            msg: Some(quoted),
        }) = reply
        else {
            return rest;
        };
        trace!(reply = %id, add_left = self.add_left, "Merging quoted content");

        let (_, quoted) = quoted.split_reply();
        let (mut merged, tail) = if self.add_left {
            (quoted, rest)
        } else {
            (rest, quoted)
        };
        if !self.sep.is_empty() {
            merged = merged.text(self.sep.as_str());
        }
        merged + tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniseg_core::{Segment, SegmentKind};

    struct Received(Option<&'static str>);

    impl Event for Received {
        fn platform(&self) -> &str {
            "test"
        }

        fn message_id(&self) -> Option<String> {
            self.0.map(str::to_string)
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn quoting(content: Option<&str>, text: &str) -> UniMessage {
        let reply = Reply {
            id: "r1".into(),
            msg: content.map(UniMessage::from),
        };
        UniMessage::from(Segment::new(SegmentKind::Reply(reply))).text(text)
    }

    #[test]
    fn test_take_reply_records_and_strips() {
        let record = ReplyRecord::default();
        let msg = record.take_reply(&Received(Some("m1")), quoting(Some("earlier"), "hi"));
        assert_eq!(msg.extract_plain_text(), "hi");
        assert!(!msg.iter().any(Segment::is_reply));
        assert_eq!(record.get("m1").map(|r| r.id), Some("r1".to_string()));

        let msg = record.take_reply(&Received(None), quoting(None, "hi"));
        assert_eq!(msg.len(), 1);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_record_evicts_oldest() {
        let record = ReplyRecord::new(2);
        for id in ["a", "b", "c"] {
            record.record(
                id,
                Reply {
                    id: format!("r-{id}"),
                    msg: None,
                },
            );
        }
        assert_eq!(record.len(), 2);
        assert!(record.get("a").is_none());
        assert!(record.get("c").is_some());
        assert!(record.remove("b").is_some());
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_merge_right_and_left() {
        let right = ReplyMerge::default().merge(quoting(Some("earlier"), "me too"));
        assert_eq!(right.extract_plain_text(), "me too earlier");

        let left = ReplyMerge::new(true, " | ").merge(quoting(Some("earlier"), "me too"));
        assert_eq!(left.extract_plain_text(), "earlier | me too");
    }

    #[test]
    fn test_merge_without_content_drops_reply() {
        let msg = ReplyMerge::default().merge(quoting(None, "hi"));
        assert_eq!(msg.len(), 1);
        assert!(!msg.iter().any(Segment::is_reply));
        assert_eq!(msg.extract_plain_text(), "hi");
    }
}

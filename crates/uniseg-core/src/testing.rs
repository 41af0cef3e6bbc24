//! Test doubles for adapter crates.
//!
//! Enabled with the `test-util` feature.
//!
//! ```rust,ignore
//! let bot = RecordingBot::new("onebot11").respond("get_msg", json!({ ... }));
//! let msg = builder().build(&event, &bot).await?;
//! assert_eq!(bot.calls()[0].0, "get_msg");
//! ```

use std::any::Any;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::bot::{Bot, Event, NativePayload};
use crate::error::{ApiError, ApiResult};

/// A [`Bot`] that answers API calls from canned responses and records
/// everything it is asked to do.
pub struct RecordingBot {
    platform: String,
    connected: bool,
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<(String, Value)>>,
    sent: Mutex<Vec<NativePayload>>,
}

impl RecordingBot {
    /// Creates a connected bot for a platform.
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            connected: true,
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Creates a bot whose every call fails with [`ApiError::NotConnected`].
    pub fn disconnected(platform: impl Into<String>) -> Self {
        Self {
            connected: false,
            ..Self::new(platform)
        }
    }

    /// Sets the response of an API action (builder pattern).
    pub fn respond(mut self, action: impl Into<String>, response: Value) -> Self {
        self.responses.insert(action.into(), response);
        self
    }

    /// Returns the API calls made so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Returns the sent payloads that are of type `T`.
    pub fn sent<T: Any + Clone>(&self) -> Vec<T> {
        self.sent
            .lock()
            .iter()
            .filter_map(|payload| payload.downcast_ref::<T>().cloned())
            .collect()
    }
}

#[async_trait]
impl Bot for RecordingBot {
    fn id(&self) -> &str {
        "recording"
    }

    fn platform(&self) -> &str {
        &self.platform
    }

    async fn call_api(&self, action: &str, params: Value) -> ApiResult<Value> {
        self.calls.lock().push((action.to_string(), params));
        if !self.connected {
            return Err(ApiError::NotConnected);
        }
        self.responses
            .get(action)
            .cloned()
            .ok_or_else(|| ApiError::ApiError {
                retcode: 1404,
                message: format!("unsupported action: {action}"),
            })
    }

    async fn send(&self, _event: &dyn Event, message: NativePayload) -> ApiResult<Value> {
        if !self.connected {
            return Err(ApiError::NotConnected);
        }
        let mut sent = self.sent.lock();
        sent.push(message);
        Ok(json!({ "message_id": sent.len() }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockEvent, TestMessage};

    #[tokio::test]
    async fn test_send_receipts_count_up() {
        let bot = RecordingBot::new("test");
        let event = MockEvent::new(TestMessage::default());

        let first = bot.send(&event, Box::new("a".to_string())).await.unwrap();
        let second = bot.send(&event, Box::new("b".to_string())).await.unwrap();
        assert_eq!(first, json!({"message_id": 1}));
        assert_eq!(second["message_id"].as_u64(), Some(2));
        assert_eq!(bot.sent::<String>(), vec!["a", "b"]);
    }
}

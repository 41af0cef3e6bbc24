//! Mock native types and connections shared by the unit tests.

use std::any::Any;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::bot::{Bot, Event, NativePayload};
use crate::error::{ApiError, ApiResult, BuildError, BuildResult};
use crate::native::{NativeMessage, NativeSegment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSegment {
    pub tag: String,
    pub data: Value,
}

impl TestSegment {
    pub fn new(tag: impl Into<String>, data: Value) -> Self {
        Self {
            tag: tag.into(),
            data,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new("text", json!({ "text": text.into() }))
    }

    pub fn str_field(&self, key: &'static str) -> BuildResult<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| BuildError::missing(self.tag.clone(), key))
    }
}

impl NativeSegment for TestSegment {
    type Message = TestMessage;

    fn tag(&self) -> &str {
        &self.tag
    }

    fn text(text: impl Into<String>) -> Self {
        TestSegment::text(text)
    }

    fn data(&self) -> Value {
        self.data.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMessage {
    pub segments: Vec<TestSegment>,
}

impl NativeMessage for TestMessage {
    type Segment = TestSegment;

    fn from_segments(segments: Vec<TestSegment>) -> Self {
        Self { segments }
    }

    fn segments(&self) -> &[TestSegment] {
        &self.segments
    }
}

pub struct MockEvent {
    pub message: TestMessage,
    pub id: Option<String>,
}

impl MockEvent {
    pub fn new(message: TestMessage) -> Self {
        Self { message, id: None }
    }
}

impl Event for MockEvent {
    fn platform(&self) -> &str {
        "test"
    }

    fn message_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockBot {
    platform: &'static str,
    connected: bool,
    sent: Mutex<Vec<Vec<TestSegment>>>,
}

impl MockBot {
    pub fn for_platform(platform: &'static str) -> Self {
        Self {
            platform,
            connected: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Vec<TestSegment>> {
        self.sent.lock().clone()
    }
}

impl Default for MockBot {
    fn default() -> Self {
        Self::for_platform("test")
    }
}

#[async_trait]
impl Bot for MockBot {
    fn id(&self) -> &str {
        "mock"
    }

    fn platform(&self) -> &str {
        self.platform
    }

    async fn call_api(&self, _action: &str, _params: Value) -> ApiResult<Value> {
        if self.connected {
            Ok(json!({}))
        } else {
            Err(ApiError::NotConnected)
        }
    }

    async fn send(&self, _event: &dyn Event, message: NativePayload) -> ApiResult<Value> {
        if !self.connected {
            return Err(ApiError::NotConnected);
        }
        let message = message
            .downcast::<TestMessage>()
            .map_err(|_| ApiError::Other("unexpected payload".into()))?;
        self.sent.lock().push(message.segments);
        Ok(json!({ "message_id": "1" }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

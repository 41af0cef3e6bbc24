//! Satori event payloads consumed by the builder.

use std::any::Any;

use serde::{Deserialize, Serialize};

use uniseg_core::Event;

use crate::PLATFORM;
use crate::element::SatoriMessage;

/// A Satori user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A Satori channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A message object with its content already parsed into elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageObject {
    pub id: String,
    #[serde(default)]
    pub content: SatoriMessage,
    /// The quoted message, when the platform resolved it.
    #[serde(default)]
    pub quote: Option<Box<MessageObject>>,
}

/// A `message-created` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Login platform reported by the Satori server, e.g. `discord`.
    #[serde(default)]
    pub login_platform: Option<String>,
    #[serde(default)]
    pub channel: Channel,
    #[serde(default)]
    pub user: User,
    pub message: MessageObject,
}

impl Event for MessageEvent {
    fn platform(&self) -> &str {
        PLATFORM
    }

    fn message_id(&self) -> Option<String> {
        Some(self.message.id.clone())
    }

    fn user_id(&self) -> Option<String> {
        Some(self.user.id.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

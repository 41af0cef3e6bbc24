//! OneBot v11 message events and API payloads.

use std::any::Any;

use serde::{Deserialize, Serialize};

use uniseg_core::Event;

use super::message::OneBotMessage;
use crate::PLATFORM;

/// Message sender information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sender {
    /// User ID.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Group card (group nickname).
    #[serde(default)]
    pub card: Option<String>,
}

/// A private or group message event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Bot account that received the message.
    #[serde(default)]
    pub self_id: i64,
    /// "private" or "group".
    #[serde(default)]
    pub message_type: String,
    /// Message ID.
    pub message_id: i64,
    /// Sender's user ID.
    pub user_id: i64,
    /// Group ID, for group messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    /// Message content.
    pub message: OneBotMessage,
    /// Sender information.
    #[serde(default)]
    pub sender: Sender,
}

impl Event for MessageEvent {
    fn platform(&self) -> &str {
        PLATFORM
    }

    fn message_id(&self) -> Option<String> {
        Some(self.message_id.to_string())
    }

    fn user_id(&self) -> Option<String> {
        Some(self.user_id.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Response data of the `get_msg` API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMsgResponse {
    /// The message ID.
    pub message_id: i64,
    /// The sender information.
    #[serde(default)]
    pub sender: Sender,
    /// The message content.
    pub message: OneBotMessage,
}

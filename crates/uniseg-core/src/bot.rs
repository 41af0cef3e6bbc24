//! Interfaces consumed from the host bot framework.
//!
//! The host owns the event loop and the platform connections. Uniseg only
//! needs to read the native message out of an [`Event`] and, for a few
//! conversions, call back into the [`Bot`] connection (fetching a quoted
//! message, uploading media, delivering the exported message).

use std::any::Any;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiResult;

/// An exported native message, type-erased for [`Bot::send`].
///
/// Concrete bots downcast it to their platform's native message type.
pub type NativePayload = Box<dyn Any + Send + Sync>;

/// An inbound event from the host framework.
///
/// Builders downcast the event to their platform's concrete event type via
/// [`Event::as_any`] to reach the native message.
pub trait Event: Send + Sync + 'static {
    /// Returns the platform identifier this event came from.
    fn platform(&self) -> &str;

    /// Returns the id of the message carried by this event, if any.
    fn message_id(&self) -> Option<String> {
        None
    }

    /// Returns the id of the sender, if any.
    fn user_id(&self) -> Option<String> {
        None
    }

    /// Returns self as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Attempts to downcast an event to a concrete type.
pub fn downcast_event<T: Event>(event: &dyn Event) -> Option<&T> {
    event.as_any().downcast_ref::<T>()
}

/// An active bot connection.
///
/// # API Design
///
/// - `call_api`: Raw API call with action name and JSON parameters
/// - `send`: Delivers an exported native message in response to an event
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns the bot's unique identifier.
    fn id(&self) -> &str;

    /// Returns the platform identifier of this connection.
    ///
    /// This is the key used to resolve the adapter in the registry.
    fn platform(&self) -> &str;

    /// Calls a raw API with the given action name and parameters.
    async fn call_api(&self, action: &str, params: Value) -> ApiResult<Value>;

    /// Sends an exported native message in response to an event.
    ///
    /// Returns the platform's receipt as raw JSON.
    async fn send(&self, event: &dyn Event, message: NativePayload) -> ApiResult<Value>;

    /// Returns self as `&dyn Any` for downcasting to the concrete bot.
    fn as_any(&self) -> &dyn Any;
}

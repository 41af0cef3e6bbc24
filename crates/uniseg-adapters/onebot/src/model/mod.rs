//! Data models for the OneBot v11 protocol.

pub mod event;
pub mod message;
pub mod segment;

pub use event::{GetMsgResponse, MessageEvent, Sender};
pub use message::OneBotMessage;
pub use segment::{
    AtData, FaceData, ForwardData, MediaData, NodeData, RawSegment, ReplyData, Segment, TextData,
};

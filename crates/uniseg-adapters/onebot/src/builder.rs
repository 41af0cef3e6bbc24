//! OneBot v11 → uniseg conversion.
//!
//! | native                 | unified                         |
//! |------------------------|---------------------------------|
//! | `text`                 | `Text`                          |
//! | `face`                 | `Emoji`                         |
//! | `image`/`record`/`video`/`file` | `Image`/`Voice`/`Video`/`File` |
//! | `at`                   | `At`, or `AtAll` for `qq=all`   |
//! | `reply`                | `Reply`, resolved via `get_msg` |
//! | `forward`/`node`       | `Reference`                     |

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tracing::debug;

use uniseg_core::segment::At;
use uniseg_core::{
    AtFlag, Bot, BuildError, BuildResult, Built, Event, Media, MessageBuilder,
    Reference, ReferenceNode, Reply, Segment as UniSegment, SegmentKind, downcast_event,
};

use crate::PLATFORM;
use crate::model::{GetMsgResponse, MediaData, MessageEvent, Segment};

type OneBotBuilder = MessageBuilder<Segment>;

/// Creates the OneBot v11 builder.
pub fn builder() -> OneBotBuilder {
    MessageBuilder::new(PLATFORM)
        .rule(&["text"], text)
        .rule(&["face"], face)
        .rule(&["image", "record", "video", "file"], media)
        .rule(&["at"], at)
        .rule(&["reply"], reply)
        .rule(&["forward"], forward)
        .rule(&["node"], node)
        .message_from(event_message)
        .reply_from(fetch_reply)
}

fn text(_: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Text(data) => Ok(UniSegment::text(&data.text).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn face(_: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Face(data) => Ok(UniSegment::emoji(&data.id).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

/// Parses a OneBot `file` value into a media source.
///
/// `base64://` carries raw data, `file://` a local path, `http(s)://` a URL;
/// anything else is a resource id of the implementation.
pub fn parse_file(file: &str) -> BuildResult<Media> {
    if let Some(encoded) = file.strip_prefix("base64://") {
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| BuildError::invalid("file", e.to_string()))?;
        Ok(Media::raw(data, None))
    } else if let Some(path) = file.strip_prefix("file://") {
        Ok(Media::path(path))
    } else if file.starts_with("http://") || file.starts_with("https://") {
        Ok(Media::url(file))
    } else {
        Ok(Media::id(file))
    }
}

fn to_media(data: &MediaData) -> BuildResult<Media> {
    let media = match &data.url {
        Some(url) => Media::url(url),
        None => parse_file(&data.file)?,
    };
    Ok(match &data.name {
        Some(name) => media.with_name(name),
        None => media,
    })
}

fn media(_: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    let built = match seg {
        Segment::Image(data) => UniSegment::image(to_media(data)?),
        Segment::Record(data) => UniSegment::voice(to_media(data)?),
        Segment::Video(data) => UniSegment::video(to_media(data)?),
        Segment::File(data) => UniSegment::file(to_media(data)?),
        _ => return Ok(Built::passthrough(seg)),
    };
    Ok(built.into())
}

fn at(_: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::At(data) if data.qq == "all" => Ok(UniSegment::at_all(false).into()),
        Segment::At(data) => Ok(UniSegment::new(SegmentKind::At(At {
            flag: AtFlag::User,
            target: data.qq.clone(),
            display: data.name.clone(),
        }))
        .into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn reply(_: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Reply(data) => Ok(UniSegment::reply(&data.id).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn forward(_: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Forward(data) => Ok(UniSegment::reference(Reference {
            id: Some(data.id.clone()),
            nodes: Vec::new(),
        })
        .into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn node(b: &OneBotBuilder, seg: &Segment) -> BuildResult<Built> {
    let Segment::Node(data) = seg else {
        return Ok(Built::passthrough(seg));
    };
    let node = ReferenceNode {
        id: data.id.clone(),
        uid: data.user_id.clone(),
        name: data.nickname.clone(),
        content: data
            .content
            .as_ref()
            .map(|content| b.generate_message(content))
            .unwrap_or_default(),
    };
    Ok(UniSegment::reference(Reference {
        id: None,
        nodes: vec![node],
    })
    .into())
}

fn event_message(event: &dyn Event) -> Option<Vec<Segment>> {
    downcast_event::<MessageEvent>(event).map(|e| e.message.to_vec())
}

// =============================================================================
// Reply resolution
// =============================================================================

fn fetch_reply<'a>(
    b: &'a OneBotBuilder,
    event: &'a dyn Event,
    bot: &'a dyn Bot,
) -> BoxFuture<'a, BuildResult<Option<Reply>>> {
    Box::pin(resolve_reply(b, event, bot))
}

async fn resolve_reply(
    b: &OneBotBuilder,
    event: &dyn Event,
    bot: &dyn Bot,
) -> BuildResult<Option<Reply>> {
    let Some(event) = downcast_event::<MessageEvent>(event) else {
        return Ok(None);
    };
    let Some(id) = event.message.iter().find_map(|seg| match seg {
        Segment::Reply(data) => Some(data.id.clone()),
        _ => None,
    }) else {
        return Ok(None);
    };

    let message_id = id
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(id.as_str()));
    let response = bot
        .call_api("get_msg", json!({ "message_id": message_id }))
        .await?;
    let response: GetMsgResponse =
        serde_json::from_value(response).map_err(|e| BuildError::invalid("reply", e.to_string()))?;

    debug!(platform = PLATFORM, reply = %id, "Fetched quoted message");
    Ok(Some(Reply {
        id,
        msg: Some(b.generate_message(&response.message)),
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OneBotMessage, Sender};
    use uniseg_core::testing::RecordingBot;
    use uniseg_core::{MediaSource, SegmentType};

    fn group_event(message: OneBotMessage) -> MessageEvent {
        MessageEvent {
            self_id: 10000,
            message_type: "group".into(),
            message_id: 43,
            user_id: 20000,
            group_id: Some(30000),
            message,
            sender: Sender::default(),
        }
    }

    #[test]
    fn test_mismatched_payload_passes_through() {
        let seg: Segment =
            serde_json::from_value(json!({"type": "face", "data": {"name": "smile"}})).unwrap();
        let msg = builder().generate(std::slice::from_ref(&seg));
        assert_eq!(msg.len(), 1);
        assert!(matches!(msg[0].kind(), SegmentKind::Custom(c) if c.tag == "face"));
        assert_eq!(msg[0].origin_as::<Segment>(), Some(&seg));
    }

    #[test]
    fn test_parse_file_sources() {
        assert_eq!(
            parse_file("base64://aGk=").unwrap().source,
            Some(MediaSource::Raw {
                data: b"hi".to_vec(),
                mimetype: None
            })
        );
        assert_eq!(
            parse_file("file:///tmp/a.png").unwrap(),
            Media::path("/tmp/a.png")
        );
        assert_eq!(parse_file("https://x/y").unwrap(), Media::url("https://x/y"));
        assert_eq!(parse_file("abc.image").unwrap(), Media::id("abc.image"));
        assert!(parse_file("base64://!!!").is_err());
    }

    #[test]
    fn test_generate_maps_segments() {
        let msg = OneBotMessage::new()
            .text("hi ")
            .with(Segment::at("123"))
            .with(Segment::at_all())
            .with(Segment::face("178"))
            .with(Segment::record("https://x/a.amr"));

        let uni = builder().generate_message(&msg);
        let types: Vec<_> = uni.iter().map(UniSegment::segment_type).collect();
        assert_eq!(
            types,
            [
                SegmentType::Text,
                SegmentType::At,
                SegmentType::AtAll,
                SegmentType::Emoji,
                SegmentType::Voice
            ]
        );
        assert_eq!(uni.to_string(), "hi @123@all[emoji:178][voice]");
    }

    #[test]
    fn test_unknown_segment_passes_through() {
        let msg: OneBotMessage =
            serde_json::from_value(json!([{"type": "dice", "data": {"result": "3"}}])).unwrap();
        let uni = builder().generate_message(&msg);
        assert!(uni[0].is_custom());
        assert_eq!(uni[0].origin_as::<Segment>(), Some(&msg[0]));
    }

    #[tokio::test]
    async fn test_reply_fetched_via_get_msg() {
        let bot = RecordingBot::new(PLATFORM).respond(
            "get_msg",
            json!({
                "message_id": 42,
                "message": [{"type": "text", "data": {"text": "original"}}]
            }),
        );
        let event = group_event(OneBotMessage::new().with(Segment::reply("42")).text("answer"));

        let uni = builder().build(&event, &bot).await.unwrap();
        assert_eq!(uni.len(), 2);
        let reply = uni[0].as_reply().unwrap();
        assert_eq!(reply.id, "42");
        assert_eq!(
            reply.msg.as_ref().map(|m| m.extract_plain_text()),
            Some("original".to_string())
        );
        assert_eq!(bot.calls(), vec![("get_msg".to_string(), json!({"message_id": 42}))]);
    }

    #[tokio::test]
    async fn test_reply_kept_unresolved_when_fetch_fails() {
        let bot = RecordingBot::disconnected(PLATFORM);
        let event = group_event(OneBotMessage::new().with(Segment::reply("42")).text("answer"));

        let uni = builder().build(&event, &bot).await.unwrap();
        assert_eq!(uni.len(), 2);
        assert!(uni[0].as_reply().is_some_and(|r| r.msg.is_none()));
    }
}

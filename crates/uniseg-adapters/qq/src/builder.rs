//! QQ → uniseg conversion.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;

use uniseg_core::{
    AtFlag, Bot, BuildError, BuildResult, Built, Event, Media, MessageBuilder,
    Reply, Segment as UniSegment, downcast_event,
};

use crate::PLATFORM;
use crate::model::{MessageEvent, Segment};

type QQBuilder = MessageBuilder<Segment>;

/// Creates the QQ builder.
pub fn builder() -> QQBuilder {
    MessageBuilder::new(PLATFORM)
        .rule(&["text"], text)
        .rule(
            &["mention_user", "mention_channel", "mention_everyone"],
            mention,
        )
        .rule(&["emoji"], emoji)
        .rule(&["image", "file_image"], image)
        .rule(&["reference"], reference)
        .message_from(|event| downcast_event::<MessageEvent>(event).map(|e| e.message.to_vec()))
        .reply_from(quoted)
}

fn text(_: &QQBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Text { text } => Ok(UniSegment::text(text).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn mention(_: &QQBuilder, seg: &Segment) -> BuildResult<Built> {
    let built = match seg {
        Segment::MentionUser { user_id } => UniSegment::at(AtFlag::User, user_id),
        Segment::MentionChannel { channel_id } => UniSegment::at(AtFlag::Channel, channel_id),
        Segment::MentionEveryone {} => UniSegment::at_all(false),
        // `mention_everyone` without `data` lands in `Other`.
        Segment::Other { kind, .. } if kind == "mention_everyone" => UniSegment::at_all(false),
        _ => return Ok(Built::passthrough(seg)),
    };
    Ok(built.into())
}

fn emoji(_: &QQBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Emoji { id } => Ok(UniSegment::emoji(id).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn image(_: &QQBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Image { url } => Ok(UniSegment::image(Media::url(url)).into()),
        Segment::FileImage { content } => {
            let data = STANDARD
                .decode(content)
                .map_err(|e| BuildError::invalid("file_image", e.to_string()))?;
            Ok(UniSegment::image(Media::raw(data, None)).into())
        }
        _ => Ok(Built::passthrough(seg)),
    }
}

fn reference(_: &QQBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Reference { message_id, .. } => Ok(UniSegment::reply(message_id).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

/// The quote arrives on the event itself; its content is not fetched.
fn quoted<'a>(
    _: &'a QQBuilder,
    event: &'a dyn Event,
    _: &'a dyn Bot,
) -> BoxFuture<'a, BuildResult<Option<Reply>>> {
    let reply = downcast_event::<MessageEvent>(event)
        .and_then(|e| e.message_reference.as_ref())
        .map(|r| Reply {
            id: r.message_id.clone(),
            msg: None,
        });
    Box::pin(futures::future::ready(Ok::<_, BuildError>(reply)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, MessageReference, QQMessage};
    use uniseg_core::testing::RecordingBot;
    use serde_json::json;
    use uniseg_core::{MediaSource, NativeSegment, SegmentKind, SegmentType};

    fn event(segments: Vec<Segment>, quote: Option<&str>) -> MessageEvent {
        MessageEvent {
            id: "m1".into(),
            channel_id: Some("c1".into()),
            group_openid: None,
            author: Author::default(),
            message: QQMessage::from(segments),
            message_reference: quote.map(|id| MessageReference {
                message_id: id.into(),
            }),
        }
    }

    #[test]
    fn test_mentions() {
        let msg = builder().generate(&[
            Segment::mention_user("u1"),
            Segment::mention_channel("c1"),
            Segment::mention_everyone(),
        ]);
        assert_eq!(msg[0], UniSegment::at(AtFlag::User, "u1"));
        assert_eq!(msg[1], UniSegment::at(AtFlag::Channel, "c1"));
        assert!(msg[2].is_at_all());
    }

    #[test]
    fn test_mention_everyone_without_data() {
        let seg: Segment = serde_json::from_value(json!({"type": "mention_everyone"})).unwrap();
        let msg = builder().generate(&[seg]);
        assert_eq!(msg.len(), 1);
        assert!(msg[0].is_at_all());
    }

    #[test]
    fn test_mismatched_payload_passes_through() {
        let seg: Segment =
            serde_json::from_value(json!({"type": "emoji", "data": {"code": 5}})).unwrap();
        let msg = builder().generate(std::slice::from_ref(&seg));
        assert_eq!(msg.len(), 1);
        assert!(matches!(msg[0].kind(), SegmentKind::Custom(c) if c.tag == "emoji"));
        assert_eq!(msg[0].origin_as::<Segment>(), Some(&seg));
    }

    #[test]
    fn test_file_image_decodes() {
        let msg = builder().generate(&[Segment::FileImage {
            content: "aGk=".into(),
        }]);
        let media = msg[0].as_media().unwrap();
        assert!(matches!(&media.source, Some(MediaSource::Raw { data, .. }) if data == b"hi"));
    }

    #[tokio::test]
    async fn test_reply_from_message_reference() {
        let bot = RecordingBot::new(PLATFORM);
        let msg = builder()
            .build(&event(vec![Segment::text("yes")], Some("m0")), &bot)
            .await
            .unwrap();
        assert_eq!(msg.count(SegmentType::Reply), 1);
        assert_eq!(msg[0].as_reply().map(|r| r.id.as_str()), Some("m0"));
        assert!(bot.calls().is_empty());

        let msg = builder()
            .build(&event(vec![Segment::text("yes")], None), &bot)
            .await
            .unwrap();
        assert!(!msg.has(SegmentType::Reply));
    }
}

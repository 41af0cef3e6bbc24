//! Feishu → uniseg conversion.

use futures::future::BoxFuture;

use uniseg_core::{
    At, AtFlag, Bot, BuildError, BuildResult, Built, Event, Media, MessageBuilder,
    Reply, Segment as UniSegment, SegmentKind, Style, downcast_event,
};

use crate::PLATFORM;
use crate::model::{MessageEvent, Segment};

type FeishuBuilder = MessageBuilder<Segment>;

/// Creates the Feishu builder.
pub fn builder() -> FeishuBuilder {
    MessageBuilder::new(PLATFORM)
        .rule(&["text"], text)
        .rule(&["at"], at)
        .rule(&["image", "img"], image)
        .rule(&["media"], video)
        .rule(&["audio"], audio)
        .rule(&["file", "folder"], file)
        .rule(&["a"], link)
        .rule(&["emotion"], emotion)
        .rule(&["post"], post)
        .message_from(|event| downcast_event::<MessageEvent>(event).map(|e| e.message.to_vec()))
        .reply_from(quoted)
}

fn text(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Text { text } => Ok(UniSegment::text(text).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn at(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    let Segment::At { user_id, user_name } = seg else {
        return Ok(Built::passthrough(seg));
    };
    let built = match user_id.as_str() {
        "all" => UniSegment::at_all(false),
        "here" => UniSegment::at_all(true),
        _ => UniSegment::new(SegmentKind::At(At {
            flag: AtFlag::User,
            target: user_id.clone(),
            display: user_name.clone(),
        })),
    };
    Ok(built.into())
}

fn image(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Image { image_key } | Segment::Img { image_key } => {
            Ok(UniSegment::image(Media::id(image_key)).into())
        }
        _ => Ok(Built::passthrough(seg)),
    }
}

fn video(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Media { file_key, file_name } => {
            let name = file_name.as_deref().unwrap_or("video.mp4");
            Ok(UniSegment::video(Media::id(file_key).with_name(name)).into())
        }
        _ => Ok(Built::passthrough(seg)),
    }
}

fn audio(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Audio { file_key } => Ok(UniSegment::audio(Media::id(file_key)).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn file(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::File {
            file_key,
            file_name,
        }
        | Segment::Folder {
            file_key,
            file_name,
        } => {
            let name = file_name.as_deref().unwrap_or(file_key);
            Ok(UniSegment::file(Media::id(file_key).with_name(name)).into())
        }
        _ => Ok(Built::passthrough(seg)),
    }
}

fn link(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::A { text, .. } if !text.is_empty() => Ok(UniSegment::text(text).link().into()),
        Segment::A { href, .. } => Ok(UniSegment::text(href).link().into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

fn emotion(_: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    match seg {
        Segment::Emotion { emoji_type } => Ok(UniSegment::emoji(emoji_type).into()),
        _ => Ok(Built::passthrough(seg)),
    }
}

/// Expands a post into its nodes, line by line. A non-empty title comes
/// first as bold text.
fn post(b: &FeishuBuilder, seg: &Segment) -> BuildResult<Built> {
    let Segment::Post { title, content } = seg else {
        return Ok(Built::passthrough(seg));
    };
    let mut out = Vec::new();
    if !title.is_empty() {
        out.push(UniSegment::text(title).bold());
        out.push(UniSegment::text("\n").styled(Style::Br));
    }
    for (i, line) in content.iter().enumerate() {
        if i > 0 {
            out.push(UniSegment::text("\n").styled(Style::Br));
        }
        out.extend(line.iter().flat_map(|node| b.convert(node)));
    }
    Ok(out.into())
}

/// The host embeds the quoted message in the event; nothing is fetched.
fn quoted<'a>(
    b: &'a FeishuBuilder,
    event: &'a dyn Event,
    _: &'a dyn Bot,
) -> BoxFuture<'a, BuildResult<Option<Reply>>> {
    let reply = downcast_event::<MessageEvent>(event).and_then(|e| {
        match (&e.reply, &e.parent_id) {
            (Some(quoted), _) => Some(Reply {
                id: quoted.message_id.clone(),
                msg: Some(b.generate_message(&quoted.content)),
            }),
            (None, Some(parent)) => Some(Reply {
                id: parent.clone(),
                msg: None,
            }),
            (None, None) => None,
        }
    });
    Box::pin(futures::future::ready(Ok::<_, BuildError>(reply)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeishuMessage, QuotedMessage};
    use uniseg_core::testing::RecordingBot;
    use uniseg_core::{MediaSource, NativeSegment, SegmentType};

    fn event(segments: Vec<Segment>, reply: Option<QuotedMessage>) -> MessageEvent {
        MessageEvent {
            message_id: "om_2".into(),
            chat_id: "oc_1".into(),
            chat_type: "group".into(),
            sender_id: "ou_1".into(),
            parent_id: reply.as_ref().map(|r| r.message_id.clone()),
            message: FeishuMessage::from(segments),
            reply,
        }
    }

    #[test]
    fn test_post_expands_lines() {
        let msg = builder().generate(&[Segment::Post {
            title: String::new(),
            content: vec![
                vec![Segment::text("hello "), Segment::at("ou_2")],
                vec![
                    Segment::A {
                        href: "https://example.com".into(),
                        text: "site".into(),
                    },
                    Segment::Img {
                        image_key: "img_1".into(),
                    },
                ],
            ],
        }]);
        let types: Vec<_> = msg.iter().map(UniSegment::segment_type).collect();
        assert_eq!(
            types,
            vec![
                SegmentType::Text,
                SegmentType::At,
                SegmentType::Text,
                SegmentType::Text,
                SegmentType::Image,
            ]
        );
        assert!(matches!(
            msg[3].kind(),
            SegmentKind::Text(t) if t.style == Some(Style::Link) && t.text == "site"
        ));

        let msg = builder().generate(&[Segment::A {
            href: "https://example.com".into(),
            text: String::new(),
        }]);
        assert_eq!(msg.extract_plain_text(), "https://example.com");
    }

    #[test]
    fn test_media_defaults() {
        let msg = builder().generate(&[
            Segment::Media {
                file_key: "file_v".into(),
                file_name: None,
            },
            Segment::Folder {
                file_key: "file_d".into(),
                file_name: None,
            },
            Segment::at("all"),
        ]);
        assert_eq!(msg[0].as_media().and_then(|m| m.name.as_deref()), Some("video.mp4"));
        assert_eq!(msg[1].as_media().and_then(|m| m.name.as_deref()), Some("file_d"));
        assert!(matches!(
            &msg[1].as_media().unwrap().source,
            Some(MediaSource::Id(id)) if id == "file_d"
        ));
        assert!(msg[2].is_at_all());
    }

    #[tokio::test]
    async fn test_reply_from_embedded_message() {
        let quoted = QuotedMessage {
            message_id: "om_1".into(),
            sender_id: None,
            content: FeishuMessage::from(vec![Segment::text("original")]),
        };
        let bot = RecordingBot::new(PLATFORM);
        let msg = builder()
            .build(&event(vec![Segment::text("+1")], Some(quoted)), &bot)
            .await
            .unwrap();
        let reply = msg[0].as_reply().unwrap();
        assert_eq!(reply.id, "om_1");
        assert_eq!(
            reply.msg.as_ref().map(|m| m.extract_plain_text()),
            Some("original".to_string())
        );
        assert!(bot.calls().is_empty());
    }
}

//! uniseg → OneBot v11 conversion.
//!
//! OneBot has no text styling; styled text is exported as plain text. Audio
//! and voice both become `record`. Media sources map onto the `file` field:
//! resource ids and URLs verbatim, paths as `file://` and raw data as
//! `base64://`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use uniseg_core::{
    AtFlag, MediaSource, MessageExporter, Segment as UniSegment, SegmentGroup, SegmentKind,
    SegmentType, SerializeFailed, SerializeResult,
};

use crate::PLATFORM;
use crate::model::{MediaData, NodeData, OneBotMessage, Segment};

type OneBotExporter = MessageExporter<Segment>;

/// Creates the OneBot v11 exporter.
pub fn exporter() -> OneBotExporter {
    MessageExporter::new(PLATFORM)
        .rule(SegmentType::Text, text)
        .rule(SegmentType::Emoji, emoji)
        .rule(SegmentType::Reply, reply)
        .rule(SegmentType::Reference, reference)
        .group(SegmentGroup::Mention, mention)
        .group(SegmentGroup::Media, media)
}

fn unexpected(seg: &UniSegment) -> SerializeFailed {
    SerializeFailed::new(seg.segment_type(), "unexpected segment kind")
}

fn text(_: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    seg.as_text().map(Segment::text).ok_or_else(|| unexpected(seg))
}

fn emoji(_: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::Emoji(e) => Ok(Segment::face(&e.id)),
        _ => Err(unexpected(seg)),
    }
}

fn mention(_: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::At(at) if at.flag == AtFlag::User => Ok(Segment::at(&at.target)),
        SegmentKind::At(at) => Err(SerializeFailed::new(
            SegmentType::At,
            format!("cannot mention a {:?} on OneBot", at.flag),
        )),
        SegmentKind::AtAll(_) => Ok(Segment::at_all()),
        _ => Err(unexpected(seg)),
    }
}

/// Encodes a media source as a OneBot `file` value.
pub fn file_value(source: &MediaSource) -> String {
    match source {
        MediaSource::Id(id) => id.clone(),
        MediaSource::Url(url) => url.clone(),
        MediaSource::Path(path) => format!("file://{}", path.display()),
        MediaSource::Raw { data, .. } => format!("base64://{}", STANDARD.encode(data)),
    }
}

fn media(ex: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    let ty = seg.segment_type();
    let media = seg.as_media().ok_or_else(|| unexpected(seg))?;
    let data = MediaData {
        file: file_value(ex.pick(ty, media)?),
        url: None,
        name: media.name.clone(),
    };
    match ty {
        SegmentType::Image => Ok(Segment::Image(data)),
        SegmentType::Voice | SegmentType::Audio => Ok(Segment::Record(data)),
        SegmentType::Video => Ok(Segment::Video(data)),
        SegmentType::File => Ok(Segment::File(data)),
        _ => Err(unexpected(seg)),
    }
}

fn reply(_: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    seg.as_reply()
        .map(|r| Segment::reply(&r.id))
        .ok_or_else(|| unexpected(seg))
}

/// Exports a forward reference or a single forward node.
///
/// Node content is converted with the same rules; a node cannot nest
/// another reference.
fn reference(ex: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    let SegmentKind::Reference(reference) = seg.kind() else {
        return Err(unexpected(seg));
    };
    match (reference.id.as_ref(), reference.nodes.as_slice()) {
        (Some(id), []) => Ok(Segment::Forward(crate::model::ForwardData { id: id.clone() })),
        (_, [node]) => {
            let content = node
                .content
                .iter()
                .map(|child| convert(ex, child))
                .collect::<SerializeResult<OneBotMessage>>()?;
            Ok(Segment::Node(NodeData {
                id: node.id.clone(),
                user_id: node.uid.clone(),
                nickname: node.name.clone(),
                content: (!content.is_empty()).then_some(content),
            }))
        }
        _ => Err(SerializeFailed::new(
            SegmentType::Reference,
            "a OneBot node carries exactly one forwarded message",
        )),
    }
}

fn convert(ex: &OneBotExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    if let Some(native) = seg.origin_as::<Segment>() {
        return Ok(native.clone());
    }
    match seg.segment_type() {
        SegmentType::Text => text(ex, seg),
        SegmentType::Emoji => emoji(ex, seg),
        SegmentType::At | SegmentType::AtAll => mention(ex, seg),
        ty if ty.is_media() => media(ex, seg),
        ty => Err(SerializeFailed::new(ty, "not supported inside a forward node")),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::builder;
    use serde_json::json;
    use uniseg_core::testing::RecordingBot;
    use uniseg_core::{
        ExportError, FallbackPolicy, Media, NativeMessage, Reference, ReferenceNode, UniMessage,
    };

    async fn export(msg: &UniMessage, policy: FallbackPolicy) -> Result<OneBotMessage, ExportError> {
        exporter().export(msg, &RecordingBot::new(PLATFORM), policy).await
    }

    #[tokio::test]
    async fn test_export_basic_segments() {
        let msg = UniMessage::new()
            .with(UniSegment::reply("1"))
            .text("hi ")
            .with(UniSegment::at_user("123"))
            .with(UniSegment::at_all(false))
            .with(UniSegment::emoji("178"))
            .with(UniSegment::voice(Media::raw(b"hi".to_vec(), None)))
            .with(UniSegment::audio(Media::path("/tmp/a.mp3")));

        let native = export(&msg, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(
            serde_json::to_value(&native).unwrap(),
            json!([
                {"type": "reply", "data": {"id": "1"}},
                {"type": "text", "data": {"text": "hi "}},
                {"type": "at", "data": {"qq": "123"}},
                {"type": "at", "data": {"qq": "all"}},
                {"type": "face", "data": {"id": "178"}},
                {"type": "record", "data": {"file": "base64://aGk="}},
                {"type": "record", "data": {"file": "file:///tmp/a.mp3"}},
            ])
        );
    }

    #[tokio::test]
    async fn test_role_mention_falls_back() {
        let msg = UniMessage::from(UniSegment::at(AtFlag::Role, "admins")).text("!");
        let native = export(&msg, FallbackPolicy::Text).await.unwrap();
        assert_eq!(native.to_string(), "@role:admins!");

        let err = export(&msg, FallbackPolicy::Rollback).await.unwrap_err();
        assert!(matches!(err, ExportError::Rollback { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_unresolved_media_is_dropped() {
        let msg = UniMessage::from("a").with(UniSegment::image(Media::unresolved()));
        let native = export(&msg, FallbackPolicy::Ignore).await.unwrap();
        assert_eq!(native.len(), 1);
    }

    #[tokio::test]
    async fn test_forward_node_exports_content() {
        let msg = UniMessage::from(UniSegment::reference(Reference {
            id: None,
            nodes: vec![ReferenceNode {
                id: None,
                uid: Some("10001".into()),
                name: Some("Alice".into()),
                content: UniMessage::from("hello"),
            }],
        }));
        let native = export(&msg, FallbackPolicy::Rollback).await.unwrap();
        let Segment::Node(node) = &native[0] else {
            panic!("expected a node, got {:?}", native[0]);
        };
        assert_eq!(node.nickname.as_deref(), Some("Alice"));
        assert_eq!(node.content, Some(OneBotMessage::from_text("hello")));
    }

    #[tokio::test]
    async fn test_same_platform_round_trip_is_lossless() {
        let original: OneBotMessage = serde_json::from_value(json!([
            {"type": "text", "data": {"text": "roll "}},
            {"type": "dice", "data": {"result": "3"}},
            {"type": "image", "data": {"file": "abc.image", "url": "https://x/abc"}},
        ]))
        .unwrap();

        let uni = builder().generate_message(&original);
        let native = export(&uni, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(native.segments(), original.segments());
    }
}

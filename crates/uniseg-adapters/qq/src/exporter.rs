//! uniseg → QQ conversion.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use tracing::debug;

use uniseg_core::{
    AtFlag, Bot, MediaSource, MessageExporter, Segment as UniSegment, SegmentKind, SegmentType,
    SerializeFailed, SerializeResult, SourceKind,
};

use crate::PLATFORM;
use crate::model::Segment;

type QQExporter = MessageExporter<Segment>;

/// QQ cannot resolve foreign resource ids, so ids are never picked.
const IMAGE_SOURCES: &[SourceKind] = &[SourceKind::Url, SourceKind::Raw, SourceKind::Path];

/// Creates the QQ exporter.
pub fn exporter() -> QQExporter {
    MessageExporter::new(PLATFORM)
        .rule(SegmentType::Text, text)
        .rule(SegmentType::At, at)
        .rule(SegmentType::AtAll, |_, _| Ok(Segment::mention_everyone()))
        .rule(SegmentType::Emoji, emoji)
        .rule_async(SegmentType::Image, image)
        .rule(SegmentType::Reply, reply)
        .source_priority(IMAGE_SOURCES)
}

fn unexpected(seg: &UniSegment) -> SerializeFailed {
    SerializeFailed::new(seg.segment_type(), "unexpected segment kind")
}

fn text(_: &QQExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    seg.as_text()
        .map(|text| Segment::Text { text: text.into() })
        .ok_or_else(|| unexpected(seg))
}

fn at(_: &QQExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::At(at) => match at.flag {
            AtFlag::User => Ok(Segment::mention_user(&at.target)),
            AtFlag::Channel => Ok(Segment::mention_channel(&at.target)),
            AtFlag::Role => Err(SerializeFailed::new(
                SegmentType::At,
                "QQ cannot mention a role",
            )),
        },
        _ => Err(unexpected(seg)),
    }
}

fn emoji(_: &QQExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::Emoji(e) => Ok(Segment::emoji(&e.id)),
        _ => Err(unexpected(seg)),
    }
}

fn image<'a>(
    ex: &'a QQExporter,
    seg: &'a UniSegment,
    _: &'a dyn Bot,
) -> BoxFuture<'a, SerializeResult<Segment>> {
    Box::pin(export_image(ex, seg))
}

/// URLs are sent as-is; raw data and local files are uploaded with the
/// message as `file_image`.
async fn export_image(ex: &QQExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    let media = seg.as_media().ok_or_else(|| unexpected(seg))?;
    match ex.pick(SegmentType::Image, media)? {
        MediaSource::Url(url) => Ok(Segment::image(url)),
        MediaSource::Raw { data, .. } => Ok(Segment::FileImage {
            content: STANDARD.encode(data),
        }),
        MediaSource::Path(path) => {
            let data = tokio::fs::read(path).await.map_err(|e| {
                SerializeFailed::new(
                    SegmentType::Image,
                    format!("cannot read {}: {e}", path.display()),
                )
            })?;
            debug!(platform = PLATFORM, path = %path.display(), bytes = data.len(), "Read local image");
            Ok(Segment::FileImage {
                content: STANDARD.encode(data),
            })
        }
        MediaSource::Id(_) => Err(SerializeFailed::new(
            SegmentType::Image,
            "QQ cannot send images by id",
        )),
    }
}

fn reply(_: &QQExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    seg.as_reply()
        .map(|r| Segment::reference(&r.id))
        .ok_or_else(|| unexpected(seg))
}

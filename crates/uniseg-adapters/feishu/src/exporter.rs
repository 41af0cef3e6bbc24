//! uniseg → Feishu conversion.
//!
//! Feishu references media by keys issued on upload. Images with an id are
//! sent as-is; raw data and local files are uploaded through the bot first.
//! Files can only be sent by key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tracing::debug;

use uniseg_core::{
    AtFlag, Bot, MediaSource, MessageExporter, Segment as UniSegment, SegmentKind, SegmentType,
    SerializeFailed, SerializeResult, SourceKind, Style,
};

use crate::PLATFORM;
use crate::model::Segment;

type FeishuExporter = MessageExporter<Segment>;

/// API action used to upload message images.
pub const UPLOAD_IMAGE: &str = "im/v1/images";

const SOURCES: &[SourceKind] = &[SourceKind::Id, SourceKind::Raw, SourceKind::Path];

/// Creates the Feishu exporter.
pub fn exporter() -> FeishuExporter {
    MessageExporter::new(PLATFORM)
        .rule(SegmentType::Text, text)
        .rule(SegmentType::At, at)
        .rule(SegmentType::AtAll, |_, _| Ok(Segment::at("all")))
        .rule(SegmentType::Emoji, emoji)
        .rule_async(SegmentType::Image, image)
        .rule(SegmentType::File, file)
        .source_priority(SOURCES)
}

fn unexpected(seg: &UniSegment) -> SerializeFailed {
    SerializeFailed::new(seg.segment_type(), "unexpected segment kind")
}

fn text(_: &FeishuExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::Text(t) if t.style == Some(Style::Link) => Ok(Segment::A {
            href: t.text.clone(),
            text: t.text.clone(),
        }),
        SegmentKind::Text(t) => Ok(Segment::Text {
            text: t.text.clone(),
        }),
        _ => Err(unexpected(seg)),
    }
}

fn at(_: &FeishuExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::At(at) if at.flag == AtFlag::User => Ok(Segment::At {
            user_id: at.target.clone(),
            user_name: at.display.clone(),
        }),
        SegmentKind::At(at) => Err(SerializeFailed::new(
            SegmentType::At,
            format!("cannot mention a {:?} on Feishu", at.flag),
        )),
        _ => Err(unexpected(seg)),
    }
}

fn emoji(_: &FeishuExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    match seg.kind() {
        SegmentKind::Emoji(e) => Ok(Segment::emotion(&e.id)),
        _ => Err(unexpected(seg)),
    }
}

fn file(ex: &FeishuExporter, seg: &UniSegment) -> SerializeResult<Segment> {
    let media = seg.as_media().ok_or_else(|| unexpected(seg))?;
    match ex.pick(SegmentType::File, media)? {
        MediaSource::Id(key) => Ok(Segment::File {
            file_key: key.clone(),
            file_name: media.name.clone(),
        }),
        _ => Err(SerializeFailed::new(
            SegmentType::File,
            "files must be uploaded before sending",
        )),
    }
}

fn image<'a>(
    ex: &'a FeishuExporter,
    seg: &'a UniSegment,
    bot: &'a dyn Bot,
) -> BoxFuture<'a, SerializeResult<Segment>> {
    Box::pin(export_image(ex, seg, bot))
}

async fn export_image(
    ex: &FeishuExporter,
    seg: &UniSegment,
    bot: &dyn Bot,
) -> SerializeResult<Segment> {
    let media = seg.as_media().ok_or_else(|| unexpected(seg))?;
    let data = match ex.pick(SegmentType::Image, media)? {
        MediaSource::Id(key) => return Ok(Segment::image(key)),
        MediaSource::Raw { data, .. } => data.clone(),
        MediaSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
            SerializeFailed::new(
                SegmentType::Image,
                format!("cannot read {}: {e}", path.display()),
            )
        })?,
        MediaSource::Url(_) => {
            return Err(SerializeFailed::new(
                SegmentType::Image,
                "Feishu cannot send images by URL",
            ));
        }
    };
    upload_image(bot, &data).await.map(Segment::image)
}

/// Uploads an image and returns its `image_key`.
pub async fn upload_image(bot: &dyn Bot, data: &[u8]) -> SerializeResult<String> {
    let params = json!({"image_type": "message", "image": STANDARD.encode(data)});
    let response = bot
        .call_api(UPLOAD_IMAGE, params)
        .await
        .map_err(|e| SerializeFailed::new(SegmentType::Image, format!("upload failed: {e}")))?;
    let key = response
        .get("image_key")
        .or_else(|| response.pointer("/data/image_key"))
        .and_then(Value::as_str)
        .ok_or_else(|| SerializeFailed::new(SegmentType::Image, "upload returned no image_key"))?;
    debug!(platform = PLATFORM, image_key = key, bytes = data.len(), "Uploaded image");
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniseg_core::testing::RecordingBot;
    use uniseg_core::{ExportError, FallbackPolicy, Media, NativeMessage, UniMessage};

    async fn export(
        msg: &UniMessage,
        bot: &RecordingBot,
        policy: FallbackPolicy,
    ) -> Result<Vec<Segment>, ExportError> {
        exporter()
            .export(msg, bot, policy)
            .await
            .map(|native| native.segments().to_vec())
    }

    #[tokio::test]
    async fn test_export_text_and_mentions() {
        let bot = RecordingBot::new(PLATFORM);
        let msg = UniMessage::from("hi ")
            .with(UniSegment::at_user("ou_1"))
            .with(UniSegment::at_all(false))
            .with(UniSegment::emoji("SMILE"));
        let out = export(&msg, &bot, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(
            out,
            vec![
                Segment::Text { text: "hi ".into() },
                Segment::at("ou_1"),
                Segment::at("all"),
                Segment::emotion("SMILE"),
            ]
        );
    }

    #[tokio::test]
    async fn test_raw_image_is_uploaded() {
        let bot = RecordingBot::new(PLATFORM)
            .respond(UPLOAD_IMAGE, json!({"data": {"image_key": "img_up"}}));
        let msg = UniMessage::from(UniSegment::image(Media::raw(b"hi".to_vec(), None)))
            .with(UniSegment::image(Media::id("img_0")));
        let out = export(&msg, &bot, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(out, vec![Segment::image("img_up"), Segment::image("img_0")]);

        let calls = bot.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, UPLOAD_IMAGE);
        assert_eq!(calls[0].1["image"], "aGk=");
    }

    #[tokio::test]
    async fn test_failed_upload_follows_policy() {
        let bot = RecordingBot::disconnected(PLATFORM);
        let msg = UniMessage::from(UniSegment::image(Media::raw(b"hi".to_vec(), None)));

        let out = export(&msg, &bot, FallbackPolicy::Text).await.unwrap();
        assert_eq!(out, vec![Segment::Text { text: "[image]".into() }]);

        let err = export(&msg, &bot, FallbackPolicy::Rollback).await.unwrap_err();
        assert!(matches!(err, ExportError::Rollback { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_file_requires_key() {
        let bot = RecordingBot::new(PLATFORM);
        let msg = UniMessage::from(UniSegment::file(Media::id("file_1").with_name("a.pdf")))
            .with(UniSegment::file(Media::url("https://x/b.pdf")));
        let out = export(&msg, &bot, FallbackPolicy::Ignore).await.unwrap();
        assert_eq!(
            out,
            vec![Segment::File {
                file_key: "file_1".into(),
                file_name: Some("a.pdf".into()),
            }]
        );
    }
}

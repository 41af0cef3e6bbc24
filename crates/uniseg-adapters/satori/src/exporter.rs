//! uniseg → Satori conversion.
//!
//! Styled text becomes the matching style element. Media sources map onto
//! `src`: ids and URLs verbatim, paths as `file://` URLs and raw data as
//! base64 `data:` URLs, which need a known mimetype.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use uniseg_core::{
    AtFlag, MediaSource, MessageExporter, Segment as UniSegment, SegmentGroup, SegmentKind,
    SegmentType, SerializeFailed, SerializeResult, SourceKind, Style,
};

use crate::PLATFORM;
use crate::element::Element;

type SatoriExporter = MessageExporter<Element>;

const MEDIA_SOURCES: &[SourceKind] = &[
    SourceKind::Url,
    SourceKind::Id,
    SourceKind::Path,
    SourceKind::Raw,
];

/// Creates the Satori exporter.
pub fn exporter() -> SatoriExporter {
    MessageExporter::new(PLATFORM)
        .rule(SegmentType::Text, text)
        .rule(SegmentType::Reply, reply)
        .group(SegmentGroup::Mention, mention)
        .group(SegmentGroup::Media, media)
        .source_priority(MEDIA_SOURCES)
}

fn unexpected(seg: &UniSegment) -> SerializeFailed {
    SerializeFailed::new(seg.segment_type(), "unexpected segment kind")
}

/// Returns the element name for a text style.
pub fn style_tag(style: Style) -> &'static str {
    match style {
        Style::Bold => "b",
        Style::Italic => "i",
        Style::Underline => "u",
        Style::Strikethrough => "s",
        Style::Spoiler => "spoiler",
        Style::Code => "code",
        Style::CodeBlock => "pre",
        Style::Link => "a",
        Style::Superscript => "sup",
        Style::Subscript => "sub",
        Style::Br => "br",
    }
}

fn text(_: &SatoriExporter, seg: &UniSegment) -> SerializeResult<Element> {
    let SegmentKind::Text(t) = seg.kind() else {
        return Err(unexpected(seg));
    };
    let el = match t.style {
        None => Element::text(&t.text),
        Some(Style::Br) => Element::new("br"),
        Some(Style::Link) => Element::new("a").attr("href", t.text.as_str()),
        Some(style) => Element::new(style_tag(style)).child(Element::text(&t.text)),
    };
    Ok(el)
}

fn mention(_: &SatoriExporter, seg: &UniSegment) -> SerializeResult<Element> {
    match seg.kind() {
        SegmentKind::At(at) => {
            let el = match at.flag {
                AtFlag::User => Element::new("at").attr("id", at.target.as_str()),
                AtFlag::Role => Element::new("at").attr("role", at.target.as_str()),
                AtFlag::Channel => Element::new("sharp").attr("id", at.target.as_str()),
            };
            Ok(el.attr_opt("name", at.display.as_deref()))
        }
        SegmentKind::AtAll(all) => {
            Ok(Element::new("at").attr("type", if all.here { "here" } else { "all" }))
        }
        _ => Err(unexpected(seg)),
    }
}

/// Encodes a media source as a Satori `src` value.
pub fn src_value(ty: SegmentType, source: &MediaSource) -> SerializeResult<String> {
    match source {
        MediaSource::Id(id) => Ok(id.clone()),
        MediaSource::Url(url) => Ok(url.clone()),
        MediaSource::Path(path) => Ok(format!("file://{}", path.display())),
        MediaSource::Raw {
            data,
            mimetype: Some(mimetype),
        } => Ok(format!("data:{mimetype};base64,{}", STANDARD.encode(data))),
        MediaSource::Raw { mimetype: None, .. } => Err(SerializeFailed::new(
            ty,
            "raw data needs a mimetype to build a data URL",
        )),
    }
}

fn media(ex: &SatoriExporter, seg: &UniSegment) -> SerializeResult<Element> {
    let ty = seg.segment_type();
    let media = seg.as_media().ok_or_else(|| unexpected(seg))?;
    let tag = match ty {
        SegmentType::Image => "img",
        SegmentType::Voice | SegmentType::Audio => "audio",
        SegmentType::Video => "video",
        SegmentType::File => "file",
        _ => return Err(unexpected(seg)),
    };
    let src = src_value(ty, ex.pick(ty, media)?)?;
    Ok(Element::new(tag)
        .attr("src", src)
        .attr_opt("title", media.name.as_deref()))
}

/// Quoted content is exported with the same rules; segments it cannot
/// carry are left out.
fn reply(ex: &SatoriExporter, seg: &UniSegment) -> SerializeResult<Element> {
    let r = seg.as_reply().ok_or_else(|| unexpected(seg))?;
    let mut quote = Element::new("quote").attr("id", r.id.as_str());
    if let Some(msg) = &r.msg {
        quote.children = msg.iter().filter_map(|child| convert(ex, child).ok()).collect();
    }
    Ok(quote)
}

fn convert(ex: &SatoriExporter, seg: &UniSegment) -> SerializeResult<Element> {
    if let Some(native) = seg.origin_as::<Element>() {
        return Ok(native.clone());
    }
    match seg.segment_type() {
        SegmentType::Text => text(ex, seg),
        SegmentType::At | SegmentType::AtAll => mention(ex, seg),
        ty if ty.is_media() => media(ex, seg),
        ty => Err(SerializeFailed::new(ty, "not supported inside a quote")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::builder;
    use crate::element::SatoriMessage;
    use uniseg_core::testing::RecordingBot;
    use uniseg_core::{ExportError, FallbackPolicy, Media, Reply, UniMessage};

    async fn export(msg: &UniMessage, policy: FallbackPolicy) -> Result<SatoriMessage, ExportError> {
        exporter().export(msg, &RecordingBot::new(PLATFORM), policy).await
    }

    #[tokio::test]
    async fn test_export_styles_and_mentions() {
        let msg = UniMessage::new()
            .with(UniSegment::text("hi").bold())
            .with(UniSegment::text("https://example.com").link())
            .with(UniSegment::text("\n").styled(Style::Br))
            .with(UniSegment::at(AtFlag::Channel, "general"))
            .with(UniSegment::at(AtFlag::Role, "admin"))
            .with(UniSegment::at_all(true));
        let native = export(&msg, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(
            native.to_content(),
            r#"<b>hi</b><a href="https://example.com"/><br/><sharp id="general"/><at role="admin"/><at type="here"/>"#
        );
    }

    #[tokio::test]
    async fn test_media_src() {
        let msg = UniMessage::new()
            .with(UniSegment::image(Media::raw(b"hi".to_vec(), Some("image/png".into()))))
            .with(UniSegment::voice(Media::path("/tmp/a.ogg")))
            .with(UniSegment::file(Media::url("https://x/f.zip").with_name("f.zip")));
        let native = export(&msg, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(native[0].get_str("src"), Some("data:image/png;base64,aGk="));
        assert_eq!(native[1].kind, "audio");
        assert_eq!(native[1].get_str("src"), Some("file:///tmp/a.ogg"));
        assert_eq!(native[2].get_str("title"), Some("f.zip"));
    }

    #[tokio::test]
    async fn test_raw_without_mimetype_fails() {
        let msg = UniMessage::from(UniSegment::image(Media::raw(b"hi".to_vec(), None)));
        let err = export(&msg, FallbackPolicy::Rollback).await.unwrap_err();
        assert!(matches!(
            err,
            ExportError::Rollback { index: 0, source } if source.segment == SegmentType::Image
        ));
    }

    #[tokio::test]
    async fn test_reply_carries_quoted_content() {
        let reply = UniSegment::new(SegmentKind::Reply(Reply {
            id: "m1".into(),
            msg: Some(UniMessage::from("earlier").with(UniSegment::emoji("1"))),
        }));
        let native = export(&UniMessage::from(reply).text("ok"), FallbackPolicy::Rollback)
            .await
            .unwrap();
        assert_eq!(native.to_content(), r#"<quote id="m1">earlier</quote>ok"#);
    }

    #[tokio::test]
    async fn test_round_trip_keeps_unknown_elements() {
        let original = SatoriMessage::from(vec![
            Element::text("see "),
            Element::new("i").child(Element::text("this")),
            Element::new("button").attr("id", "b1"),
        ]);
        let uni = builder().generate_message(&original);
        assert!(uni[2].is_custom());
        let native = export(&uni, FallbackPolicy::Rollback).await.unwrap();
        assert_eq!(native.to_content(), original.to_content());
    }
}

//! Satori → uniseg conversion.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;

use uniseg_core::{
    AtFlag, Bot, BuildError, BuildResult, Built, Event, Media, MessageBuilder, Reply,
    Segment as UniSegment, SegmentKind, Style, downcast_event,
};

use crate::PLATFORM;
use crate::element::Element;
use crate::event::MessageEvent;

type SatoriBuilder = MessageBuilder<Element>;

const STYLE_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "ins", "s", "del", "spoiler", "code", "pre", "sup", "sub",
];

/// Creates the Satori builder.
pub fn builder() -> SatoriBuilder {
    MessageBuilder::new(PLATFORM)
        .rule(&["text"], text)
        .rule(STYLE_TAGS, styled)
        .rule(&["a"], link)
        .rule(&["br"], |_, _| Ok(UniSegment::text("\n").styled(Style::Br).into()))
        .rule(&["p"], paragraph)
        .rule(&["at"], at)
        .rule(&["sharp"], sharp)
        .rule(&["img", "image", "audio", "video", "file"], media)
        .rule(&["quote"], quote)
        .message_from(|event| {
            downcast_event::<MessageEvent>(event).map(|e| e.message.content.to_vec())
        })
        .reply_from(quoted)
}

/// Maps a Satori style element to a text style.
pub fn style_of(tag: &str) -> Option<Style> {
    let style = match tag {
        "b" | "strong" => Style::Bold,
        "i" | "em" => Style::Italic,
        "u" | "ins" => Style::Underline,
        "s" | "del" => Style::Strikethrough,
        "spoiler" => Style::Spoiler,
        "code" => Style::Code,
        "pre" => Style::CodeBlock,
        "sup" => Style::Superscript,
        "sub" => Style::Subscript,
        _ => return None,
    };
    Some(style)
}

fn text(_: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let content = el
        .get_str("content")
        .ok_or_else(|| BuildError::missing("text", "content"))?;
    Ok(UniSegment::text(content).into())
}

/// Styles the text children; nested non-text children are kept unstyled.
fn styled(b: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let style = style_of(&el.kind).ok_or_else(|| BuildError::invalid(&el.kind, "not a style"))?;
    let children = b.generate(&el.children);
    Ok(children
        .into_iter()
        .map(|seg| seg.styled(style))
        .collect::<Vec<_>>()
        .into())
}

fn link(_: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let href = match el.get_str("href") {
        Some(href) => href.to_string(),
        None => el.inner_text(),
    };
    if href.is_empty() {
        return Err(BuildError::missing("a", "href"));
    }
    Ok(UniSegment::text(href).link().into())
}

fn paragraph(b: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let mut segments = b.generate(&el.children).into_segments();
    segments.push(UniSegment::text("\n").styled(Style::Br));
    Ok(segments.into())
}

fn at(_: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let name = el.get_str("name");
    let (flag, target) = match (el.get_str("type"), el.get_str("id"), el.get_str("role")) {
        (Some("all"), ..) => return Ok(UniSegment::at_all(false).into()),
        (Some("here"), ..) => return Ok(UniSegment::at_all(true).into()),
        (_, Some(id), _) => (AtFlag::User, id),
        (_, None, Some(role)) => (AtFlag::Role, role),
        _ => return Err(BuildError::missing("at", "id")),
    };
    Ok(with_display(UniSegment::at(flag, target), name).into())
}

fn sharp(_: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let id = el.get_str("id").ok_or_else(|| BuildError::missing("sharp", "id"))?;
    Ok(with_display(UniSegment::at(AtFlag::Channel, id), el.get_str("name")).into())
}

fn with_display(seg: UniSegment, name: Option<&str>) -> UniSegment {
    match (seg.into_kind(), name) {
        (SegmentKind::At(mut at), Some(name)) => {
            at.display = Some(name.to_string());
            UniSegment::new(SegmentKind::At(at))
        }
        (kind, _) => UniSegment::new(kind),
    }
}

/// Parses a Satori `src` attribute.
///
/// `data:` URLs become raw data, `file://` URLs become local paths and
/// anything else is kept as a URL.
pub fn parse_src(src: &str) -> BuildResult<Media> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| BuildError::invalid("src", "malformed data URL"))?;
        let mimetype = header.strip_suffix(";base64").ok_or_else(|| {
            BuildError::invalid("src", "only base64 data URLs are supported")
        })?;
        let data = STANDARD
            .decode(payload)
            .map_err(|e| BuildError::invalid("src", e.to_string()))?;
        let mimetype = (!mimetype.is_empty()).then(|| mimetype.to_string());
        return Ok(Media::raw(data, mimetype));
    }
    if let Some(path) = src.strip_prefix("file://") {
        return Ok(Media::path(path));
    }
    Ok(Media::url(src))
}

fn media(_: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let src = el
        .get_str("src")
        .ok_or_else(|| BuildError::missing(&el.kind, "src"))?;
    let mut media = parse_src(src)?;
    if let Some(title) = el.get_str("title") {
        media = media.with_name(title);
    }
    let seg = match el.kind.as_str() {
        "img" | "image" => UniSegment::image(media),
        "audio" => UniSegment::audio(media),
        "video" => UniSegment::video(media),
        _ => UniSegment::file(media),
    };
    Ok(seg.into())
}

fn quote(b: &SatoriBuilder, el: &Element) -> BuildResult<Built> {
    let id = el.get_str("id").ok_or_else(|| BuildError::missing("quote", "id"))?;
    let content = b.generate(&el.children);
    Ok(UniSegment::new(SegmentKind::Reply(Reply {
        id: id.to_string(),
        msg: (!content.is_empty()).then_some(content),
    }))
    .into())
}

/// Satori servers resolve the quote along with the message.
fn quoted<'a>(
    b: &'a SatoriBuilder,
    event: &'a dyn Event,
    _: &'a dyn Bot,
) -> BoxFuture<'a, BuildResult<Option<Reply>>> {
    let reply = downcast_event::<MessageEvent>(event)
        .and_then(|e| e.message.quote.as_deref())
        .map(|quote| {
            let content = b.generate(&quote.content);
            Reply {
                id: quote.id.clone(),
                msg: (!content.is_empty()).then_some(content),
            }
        });
    Box::pin(futures::future::ready(Ok::<_, BuildError>(reply)))
}

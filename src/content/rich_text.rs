//! Rich-text nodes and their HTML serialization
//!
//! Nodes follow the content API's structured-text representation: a flat
//! list of blocks (paragraphs, headings, list items, images, embeds), each
//! text block carrying inline spans addressed by UTF-16 offsets.

use serde::Deserialize;
use serde_json::Value;

use crate::helpers::html::html_escape;

/// Kind of a text-bearing block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    Preformatted,
    ListItem,
    OListItem,
}

/// One structured-text block
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextNode {
    Text {
        kind: BlockKind,
        text: String,
        spans: Vec<Span>,
        label: Option<String>,
    },
    Image(ImageNode),
    Embed(EmbedNode),
    /// A block type this serializer does not know; renders as nothing
    Unknown(String),
}

/// Inline markup over a range of a text block
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// Start offset in UTF-16 code units
    pub start: usize,
    /// End offset (exclusive) in UTF-16 code units
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String, target: Option<String> },
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ImageNode {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(rename = "linkTo", default)]
    pub link_to: Option<LinkTo>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LinkTo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EmbedNode {
    #[serde(default)]
    pub embed_url: String,
    #[serde(rename = "type", default)]
    pub embed_type: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Deserialize)]
struct RawTextNode {
    #[serde(default)]
    text: String,
    #[serde(default)]
    spans: Vec<Value>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Parse a JSON rich-text value into nodes
///
/// Anything that is not an array yields no nodes; array elements that do
/// not look like a known block become [`RichTextNode::Unknown`].
pub fn parse_nodes(value: &Value) -> Vec<RichTextNode> {
    value
        .as_array()
        .map(|items| items.iter().map(parse_node).collect())
        .unwrap_or_default()
}

fn parse_node(value: &Value) -> RichTextNode {
    let node_type = value.get("type").and_then(Value::as_str).unwrap_or("");

    let kind = match node_type {
        "paragraph" => BlockKind::Paragraph,
        "preformatted" => BlockKind::Preformatted,
        "list-item" => BlockKind::ListItem,
        "o-list-item" => BlockKind::OListItem,
        "image" => {
            return match ImageNode::deserialize(value) {
                Ok(image) => RichTextNode::Image(image),
                Err(e) => unknown(node_type, e),
            }
        }
        "embed" => {
            return match value.get("oembed").map(EmbedNode::deserialize) {
                Some(Ok(embed)) => RichTextNode::Embed(embed),
                Some(Err(e)) => unknown(node_type, e),
                None => RichTextNode::Unknown(node_type.to_string()),
            }
        }
        other => match other
            .strip_prefix("heading")
            .and_then(|n| n.parse::<u8>().ok())
        {
            Some(level @ 1..=6) => BlockKind::Heading(level),
            _ => return RichTextNode::Unknown(other.to_string()),
        },
    };

    match RawTextNode::deserialize(value) {
        Ok(raw) => RichTextNode::Text {
            kind,
            text: raw.text,
            spans: raw.spans.iter().filter_map(parse_span).collect(),
            label: raw.label,
        },
        Err(e) => unknown(node_type, e),
    }
}

fn unknown(node_type: &str, e: serde_json::Error) -> RichTextNode {
    tracing::debug!("Skipping malformed {:?} node: {}", node_type, e);
    RichTextNode::Unknown(node_type.to_string())
}

fn parse_span(value: &Value) -> Option<Span> {
    let raw = RawSpan::deserialize(value).ok()?;
    let str_field = |name: &str| raw.data.get(name).and_then(Value::as_str).map(str::to_string);

    let kind = match raw.kind.as_str() {
        "strong" => SpanKind::Strong,
        "em" => SpanKind::Em,
        "hyperlink" => SpanKind::Hyperlink {
            url: str_field("url")?,
            target: str_field("target"),
        },
        "label" => SpanKind::Label(str_field("label")?),
        _ => return None,
    };

    Some(Span {
        start: raw.start,
        end: raw.end,
        kind,
    })
}

/// Serialize nodes to HTML
///
/// Consecutive list items are grouped into a single `<ul>` or `<ol>`.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut out = String::new();
    let mut open_list: Option<BlockKind> = None;

    for node in nodes {
        let list_kind = match node {
            RichTextNode::Text { kind, .. }
                if matches!(kind, BlockKind::ListItem | BlockKind::OListItem) =>
            {
                Some(*kind)
            }
            _ => None,
        };

        if open_list != list_kind {
            if let Some(kind) = open_list {
                out.push_str(list_tag(kind, true));
            }
            if let Some(kind) = list_kind {
                out.push_str(list_tag(kind, false));
            }
            open_list = list_kind;
        }

        serialize_node(node, &mut out);
    }

    if let Some(kind) = open_list {
        out.push_str(list_tag(kind, true));
    }

    out
}

/// Plain text of all text blocks, joined with a single space
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .filter_map(|node| match node {
            RichTextNode::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn list_tag(kind: BlockKind, close: bool) -> &'static str {
    match (kind, close) {
        (BlockKind::OListItem, false) => "<ol>",
        (BlockKind::OListItem, true) => "</ol>",
        (_, false) => "<ul>",
        (_, true) => "</ul>",
    }
}

fn serialize_node(node: &RichTextNode, out: &mut String) {
    match node {
        RichTextNode::Text {
            kind,
            text,
            spans,
            label,
        } => {
            let tag = match kind {
                BlockKind::Paragraph => "p".to_string(),
                BlockKind::Heading(level) => format!("h{}", level),
                BlockKind::Preformatted => "pre".to_string(),
                BlockKind::ListItem | BlockKind::OListItem => "li".to_string(),
            };
            let class = label
                .as_ref()
                .map(|l| format!(r#" class="{}""#, html_escape(l)))
                .unwrap_or_default();
            out.push_str(&format!("<{}{}>", tag, class));
            out.push_str(&serialize_spans(text, spans));
            out.push_str(&format!("</{}>", tag));
        }
        RichTextNode::Image(image) => {
            let img = format!(
                r#"<img src="{}" alt="{}" copyright="{}" />"#,
                html_escape(&image.url),
                html_escape(image.alt.as_deref().unwrap_or("")),
                html_escape(image.copyright.as_deref().unwrap_or(""))
            );
            let inner = match image.link_to.as_ref().and_then(|l| l.url.as_deref()) {
                Some(url) => format!(r#"<a href="{}">{}</a>"#, html_escape(url), img),
                None => img,
            };
            out.push_str(&format!(r#"<p class="block-img">{}</p>"#, inner));
        }
        RichTextNode::Embed(embed) => {
            out.push_str(&format!(
                r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                html_escape(&embed.embed_url),
                html_escape(embed.embed_type.as_deref().unwrap_or("")),
                html_escape(embed.provider_name.as_deref().unwrap_or("")),
                embed.html.as_deref().unwrap_or("")
            ));
        }
        RichTextNode::Unknown(_) => {}
    }
}

fn open_tag(span: &Span) -> String {
    match &span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        // Target slot stays even when empty: `<a  href="..">`
        SpanKind::Hyperlink { url, target } => {
            let target = target
                .as_deref()
                .map(|t| format!(r#"target="{}" rel="noopener""#, html_escape(t)))
                .unwrap_or_default();
            format!(r#"<a {} href="{}">"#, target, html_escape(url))
        }
        SpanKind::Label(label) => format!(r#"<span class="{}">"#, html_escape(label)),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink { .. } => "</a>",
        SpanKind::Label(_) => "</span>",
    }
}

/// Apply spans to a text, escaping it and keeping the markup well-nested
fn serialize_spans(text: &str, spans: &[Span]) -> String {
    let len: usize = text.encode_utf16().count();
    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    // Outer spans first when two start together
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut pos = 0;
    let mut chars = text.chars();

    loop {
        close_ended(pos, &mut open, &mut out);

        while next < spans.len() && spans[next].start <= pos {
            out.push_str(&open_tag(spans[next]));
            open.push(spans[next]);
            next += 1;
        }

        let Some(c) = chars.next() else { break };
        match c {
            '\n' => out.push_str("<br />"),
            c => out.push_str(&html_escape(c.encode_utf8(&mut [0; 4]))),
        }
        pos += c.len_utf16();
    }

    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
    }

    out
}

/// Close every open span ending at `pos`, reopening spans that continue
fn close_ended<'a>(pos: usize, open: &mut Vec<&'a Span>, out: &mut String) {
    if !open.iter().any(|s| s.end <= pos) {
        return;
    }

    let mut reopen = Vec::new();
    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
        if span.end > pos {
            reopen.push(span);
        }
        if !open.iter().any(|s| s.end <= pos) {
            break;
        }
    }

    for span in reopen.into_iter().rev() {
        out.push_str(&open_tag(span));
        open.push(span);
    }
}

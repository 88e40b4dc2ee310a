//! Raw documents as returned by the content API

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::rich_text::{self, RichTextNode};

/// An untyped content record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,

    #[serde(default, deserialize_with = "deserialize_date")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    #[serde(default, deserialize_with = "deserialize_date")]
    pub last_publication_date: Option<DateTime<FixedOffset>>,

    /// Domain fields, keyed by the content-type schema
    #[serde(default)]
    pub data: Value,
}

/// One `{heading, body}` element of a post's `content` group
#[derive(Debug, Clone, Default)]
pub struct RawContentBlock {
    pub heading: Option<String>,
    pub body: Vec<RichTextNode>,
}

impl RawDocument {
    /// Read a text field from `data`
    ///
    /// Plain strings are returned as-is; a rich-text array yields its text.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.data.get(field)? {
            Value::String(s) => Some(s.clone()),
            value @ Value::Array(_) => {
                let nodes = rich_text::parse_nodes(value);
                if nodes.is_empty() {
                    None
                } else {
                    Some(rich_text::as_text(&nodes))
                }
            }
            _ => None,
        }
    }

    /// `data.banner.url`
    pub fn banner_url(&self) -> Option<String> {
        self.data
            .pointer("/banner/url")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Parse `data.content` in source order
    ///
    /// Malformed blocks never fail: a missing heading is `None` and a
    /// missing or malformed body is empty.
    pub fn content_blocks(&self) -> Vec<RawContentBlock> {
        let Some(blocks) = self.data.get("content").and_then(Value::as_array) else {
            return Vec::new();
        };

        blocks
            .iter()
            .map(|block| RawContentBlock {
                heading: block
                    .get("heading")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                body: block
                    .get("body")
                    .map(rich_text::parse_nodes)
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Parse a publication timestamp
///
/// The content API emits offsets as `+0000`, which RFC 3339 rejects.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = parse_date(&s);
        if parsed.is_none() {
            tracing::warn!("Ignoring unparseable publication date {:?}", s);
        }
        parsed
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RawDocument {
        serde_json::from_value(json!({
            "id": "YF1",
            "uid": "como-utilizar-hooks",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-25T19:25:28+00:00",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                "author": "Joseph Oliveira",
                "banner": { "url": "https://images.prismic.io/banner.png" },
                "content": [
                    { "heading": "Proin et varius", "body": [
                        { "type": "paragraph", "text": "Lorem ipsum", "spans": [] }
                    ]},
                    { "heading": "Cras laoreet" },
                    { "body": "not a list" }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_prismic_dates() {
        let doc = sample();
        let first = doc.first_publication_date.unwrap();
        assert_eq!(first.format("%Y-%m-%d %H:%M").to_string(), "2021-03-15 19:25");
        assert!(doc.last_publication_date.is_some());
    }

    #[test]
    fn test_unparseable_date_is_absent() {
        let doc: RawDocument = serde_json::from_value(json!({
            "uid": "x",
            "first_publication_date": "yesterday",
            "data": {}
        }))
        .unwrap();
        assert!(doc.first_publication_date.is_none());
    }

    #[test]
    fn test_null_and_missing_fields() {
        let doc: RawDocument = serde_json::from_value(json!({
            "first_publication_date": null
        }))
        .unwrap();
        assert!(doc.uid.is_none());
        assert!(doc.first_publication_date.is_none());
        assert!(doc.text("title").is_none());
        assert!(doc.banner_url().is_none());
        assert!(doc.content_blocks().is_empty());
    }

    #[test]
    fn test_text_fields() {
        let doc = sample();
        assert_eq!(doc.text("title").as_deref(), Some("Como utilizar Hooks"));
        assert_eq!(doc.text("author").as_deref(), Some("Joseph Oliveira"));
        assert_eq!(
            doc.banner_url().as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
    }

    #[test]
    fn test_rich_text_title() {
        let doc: RawDocument = serde_json::from_value(json!({
            "data": { "title": [{ "type": "heading1", "text": "Hello", "spans": [] }] }
        }))
        .unwrap();
        assert_eq!(doc.text("title").as_deref(), Some("Hello"));
    }

    #[test]
    fn test_content_blocks_are_lenient() {
        let blocks = sample().content_blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].heading.as_deref(), Some("Proin et varius"));
        assert_eq!(blocks[0].body.len(), 1);
        assert_eq!(blocks[1].heading.as_deref(), Some("Cras laoreet"));
        assert!(blocks[1].body.is_empty());
        assert!(blocks[2].heading.is_none());
        assert!(blocks[2].body.is_empty());
    }
}

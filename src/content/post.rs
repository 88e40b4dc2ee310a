//! Post view models and the transformers that build them

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::document::RawDocument;
use super::reading_time::{estimate_reading_time, ReadingTimeMode};
use super::rich_text;
use crate::error::ContentError;

/// A post as shown on the listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub uid: Option<String>,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
}

/// One page of summaries plus the cursor to the next one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

/// A full post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: Option<String>,
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    pub last_publication_date: Option<DateTime<FixedOffset>>,
    pub title: Option<String>,
    pub banner_url: Option<String>,
    pub author: Option<String>,
    pub content: Vec<ContentSection>,
    pub reading_time_minutes: usize,
}

/// A heading and its rendered body, keyed by position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSection {
    pub index: usize,
    pub heading: Option<String>,
    pub body_html: String,
}

/// Project raw documents onto listing summaries, preserving order
pub fn transform_listing(documents: &[RawDocument]) -> Vec<PostSummary> {
    documents
        .iter()
        .map(|doc| PostSummary {
            uid: doc.uid.clone(),
            first_publication_date: doc.first_publication_date,
            title: doc.text("title"),
            subtitle: doc.text("subtitle"),
            author: doc.text("author"),
        })
        .collect()
}

/// Build a post page view model and its reading time
pub fn transform_detail(document: &RawDocument, mode: ReadingTimeMode) -> PostDetail {
    let blocks = document.content_blocks();

    let content = blocks
        .iter()
        .enumerate()
        .map(|(index, block)| ContentSection {
            index,
            heading: block.heading.clone(),
            body_html: rich_text::as_html(&block.body),
        })
        .collect();

    let reading_time_minutes =
        estimate_reading_time(blocks.iter().map(|b| b.body.as_slice()), mode);

    PostDetail {
        uid: document.uid.clone(),
        first_publication_date: document.first_publication_date,
        last_publication_date: document.last_publication_date,
        title: document.text("title"),
        banner_url: document.banner_url(),
        author: document.text("author"),
        content,
        reading_time_minutes,
    }
}

fn require<T>(value: &Option<T>, uid: &Option<String>, field: &'static str) -> Result<(), ContentError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ContentError::MalformedDocument {
            uid: uid.clone().unwrap_or_default(),
            field,
        }),
    }
}

impl PostSummary {
    /// Fail on the first absent field
    pub fn validate(&self) -> Result<(), ContentError> {
        require(&self.uid, &self.uid, "uid")?;
        require(&self.first_publication_date, &self.uid, "first_publication_date")?;
        require(&self.title, &self.uid, "data.title")?;
        require(&self.subtitle, &self.uid, "data.subtitle")?;
        require(&self.author, &self.uid, "data.author")
    }
}

impl PostDetail {
    /// Fail on the first absent field
    pub fn validate(&self) -> Result<(), ContentError> {
        require(&self.first_publication_date, &self.uid, "first_publication_date")?;
        require(&self.title, &self.uid, "data.title")?;
        require(&self.banner_url, &self.uid, "data.banner.url")?;
        require(&self.author, &self.uid, "data.author")?;
        for section in &self.content {
            require(&section.heading, &self.uid, "data.content.heading")?;
        }
        Ok(())
    }

    /// Use the requested slug as the identifier
    pub fn with_uid(mut self, slug: &str) -> Self {
        self.uid = Some(slug.to_string());
        self
    }
}

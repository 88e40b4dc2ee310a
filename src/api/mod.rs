//! Content API client
//!
//! The blog only talks to the content repository through the
//! [`ContentClient`] trait: a query by predicates returning a page of raw
//! documents, and a fetch by unique identifier. [`HttpContentClient`] speaks
//! the Prismic REST v2 protocol; tests use the generated `MockContentClient`.

mod http;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

#[cfg(test)]
use mockall::automock;

use crate::content::RawDocument;
use crate::error::ContentError;

pub use http::HttpContentClient;

/// A query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `path` equals `value`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// `document.type` equals `doc_type`
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                write!(f, "[at({}, \"{}\")]", path, value.replace('"', "\\\""))
            }
        }
    }
}

/// Render predicates as the `q` query parameter
pub fn query_string(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(Predicate::to_string).collect();
    format!("[{}]", inner)
}

/// Projection and paging for a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fields to return, as `"<type>.<field>"`; empty means all
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

impl QueryOptions {
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueryResponse {
    pub page: u32,
    pub results_per_page: u32,
    pub results_size: u32,
    pub total_results_size: u32,
    pub total_pages: u32,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    pub results: Vec<RawDocument>,
}

/// Read access to the content repository
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a predicate query and return the requested page
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, ContentError>;

    /// Fetch one document of `doc_type` by its unique identifier
    ///
    /// No match is [`ContentError::MissingDocument`].
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<RawDocument, ContentError>;
}

/// Predicate selecting a document by its unique identifier
pub fn uid_predicate(doc_type: &str, uid: &str) -> Predicate {
    Predicate::at(format!("my.{}.uid", doc_type), uid)
}

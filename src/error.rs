//! Content error types

use thiserror::Error;

/// Errors raised while fetching or shaping content from the content API
#[derive(Error, Debug)]
pub enum ContentError {
    /// The identifier-based fetch found no matching document
    #[error("No `{doc_type}` document with uid `{uid}`")]
    MissingDocument {
        /// Document type that was queried
        doc_type: String,
        /// Requested unique identifier
        uid: String,
    },

    /// A required field is absent from a raw document (strict validation only)
    #[error("Document `{uid}` is missing field `{field}`")]
    MalformedDocument {
        /// Identifier of the offending document (empty if unknown)
        uid: String,
        /// Dotted path of the absent field
        field: &'static str,
    },

    /// Network or API failure while talking to the content API
    #[error("Content API request failed: {0}")]
    Transient(String),

    /// The API root listed no master ref to query against
    #[error("Content API returned no master ref")]
    NoMasterRef,

    /// The configured endpoint is not a valid URL
    #[error("Invalid content API endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ContentError {
    /// Whether this error should surface as a not-found response
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::MissingDocument { .. })
    }
}

impl From<reqwest::Error> for ContentError {
    fn from(e: reqwest::Error) -> Self {
        ContentError::Transient(e.to_string())
    }
}

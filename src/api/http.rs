//! Prismic REST v2 client

use async_trait::async_trait;
use serde::Deserialize;

use super::{query_string, uid_predicate, ContentClient, Predicate, QueryOptions, QueryResponse};
use crate::config::ApiConfig;
use crate::content::RawDocument;
use crate::error::ContentError;

/// API root document, listing the repository refs
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Content client over HTTP
#[derive(Clone)]
pub struct HttpContentClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpContentClient {
    /// Create a client for an API endpoint such as `https://<repo>.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self, ContentError> {
        reqwest::Url::parse(endpoint)
            .map_err(|e| ContentError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Create a client from the `api` section of the site config
    pub fn from_config(config: &ApiConfig) -> Result<Self, ContentError> {
        Self::new(&config.endpoint, config.access_token.clone())
    }

    /// Resolve the ref of the currently published content
    async fn master_ref(&self) -> Result<String, ContentError> {
        let mut request = self.http.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }

        let root: ApiRoot = request.send().await?.error_for_status()?.json().await?;

        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(ContentError::NoMasterRef)
    }
}

#[async_trait]
impl ContentClient for HttpContentClient {
    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, ContentError> {
        let master_ref = self.master_ref().await?;
        let q = query_string(predicates);
        tracing::debug!(q = %q, page_size = ?options.page_size, "Querying content API");

        let mut params: Vec<(&str, String)> = vec![("ref", master_ref), ("q", q)];
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }
        if let Some(size) = options.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(page) = options.page {
            params.push(("page", page.to_string()));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        let response: QueryResponse = self
            .http
            .get(format!("{}/documents/search", self.endpoint))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(
            "Content API returned {} of {} documents",
            response.results.len(),
            response.total_results_size
        );

        Ok(response)
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<RawDocument, ContentError> {
        let response = self
            .query(&[uid_predicate(doc_type, uid)], &QueryOptions::default())
            .await?;

        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::MissingDocument {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}

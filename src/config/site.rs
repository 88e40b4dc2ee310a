//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api.endpoint`
pub const ENV_API_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `api.access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,

    // Content API
    #[serde(default)]
    pub api: ApiConfig,
    pub listing_document_type: String,
    pub post_document_type: String,
    pub listing_page_size: u32,
    pub paths_page_size: u32,

    // Rendering
    pub listing_date_format: String,
    pub post_date_format: String,
    pub reading_time_mode: ReadingTimeSetting,
    pub validation: ValidationMode,

    // Revalidation
    pub revalidate_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt_BR".to_string(),
            timezone: "UTC".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            api: ApiConfig::default(),
            listing_document_type: "posts".to_string(),
            post_document_type: "posts".to_string(),
            listing_page_size: 5,
            paths_page_size: 10,

            listing_date_format: "DD MMM YYYY".to_string(),
            post_date_format: "DD MMM YYYY".to_string(),
            reading_time_mode: ReadingTimeSetting::Markup,
            validation: ValidationMode::Permissive,

            revalidate_secs: 60 * 30,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_ENDPOINT).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, access_token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            tracing::debug!("Using content API endpoint from {}", ENV_API_ENDPOINT);
            self.api.endpoint = endpoint;
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            self.api.access_token = Some(token);
        }
    }
}

/// Content API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
        }
    }
}

/// How words are counted for the reading-time estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingTimeSetting {
    /// Split the rendered HTML on spaces (legacy-compatible)
    Markup,
    /// Count whitespace-separated words of the tag-stripped text
    Text,
}

/// Whether absent document fields are tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Permissive,
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.listing_page_size, 5);
        assert_eq!(config.paths_page_size, 10);
        assert_eq!(config.revalidate_secs, 1800);
        assert_eq!(config.reading_time_mode, ReadingTimeSetting::Markup);
        assert_eq!(config.validation, ValidationMode::Permissive);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
listing_document_type: post
reading_time_mode: text
validation: strict
api:
  endpoint: https://example.cdn.prismic.io/api/v2
  access_token: secret
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.listing_document_type, "post");
        assert_eq!(config.post_document_type, "posts");
        assert_eq!(config.reading_time_mode, ReadingTimeSetting::Text);
        assert_eq!(config.validation, ValidationMode::Strict);
        assert_eq!(config.api.endpoint, "https://example.cdn.prismic.io/api/v2");
        assert_eq!(config.api.access_token.as_deref(), Some("secret"));
        assert_eq!(config.listing_page_size, 5);
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = SiteConfig::default();
        config.apply_overrides(Some(String::new()), Some("token".to_string()));
        assert_eq!(config.api.endpoint, ApiConfig::default().endpoint);
        assert_eq!(config.api.access_token.as_deref(), Some("token"));

        config.apply_overrides(Some("http://127.0.0.1:9000/api/v2".to_string()), None);
        assert_eq!(config.api.endpoint, "http://127.0.0.1:9000/api/v2");
    }
}

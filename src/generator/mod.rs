//! Generator module - fetches content and renders pages with the built-in templates

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tera::Context;
use walkdir::WalkDir;

use crate::api::{ContentClient, Predicate, QueryOptions};
use crate::config::ValidationMode;
use crate::content::{
    transform_detail, transform_listing, Listing, PostDetail, PostSummary, ReadingTimeMode,
};
use crate::error::ContentError;
use crate::helpers::{
    date_xml, format_publication_date, full_url_for, html_escape, post_path, url_for, DateStyle,
};
use crate::templates::{ConfigData, PostPageData, SectionData, SummaryData, TemplateRenderer};
use crate::Blog;

/// Route of the listing page
pub const LISTING_ROUTE: &str = "/";

/// A rendered page and the route it answers
#[derive(Debug, Clone)]
pub struct GeneratedPage {
    pub route: String,
    pub html: String,
}

/// Page generator backed by a content client
pub struct Generator {
    blog: Blog,
    client: Arc<dyn ContentClient>,
    renderer: TemplateRenderer,
    date_style: DateStyle,
    reading_time_mode: ReadingTimeMode,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, client: Arc<dyn ContentClient>) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let date_style = DateStyle::new(&blog.config.language, &blog.config.timezone);

        Ok(Self {
            blog: blog.clone(),
            client,
            renderer,
            date_style,
            reading_time_mode: blog.config.reading_time_mode.into(),
        })
    }

    /// Generate the listing page and every enumerated post page
    pub async fn generate(&self) -> Result<Vec<GeneratedPage>> {
        fs::create_dir_all(&self.blog.public_dir)?;
        self.copy_static_assets()?;

        let mut pages = Vec::new();

        let listing = self.build_listing_page().await?;
        self.write_page(&listing)?;
        pages.push(listing);

        let slugs = self.enumerate_paths().await?;
        tracing::info!("Pre-generating {} post pages", slugs.len());

        for slug in slugs {
            if !is_safe_slug(&slug) {
                tracing::warn!("Skipping post with unsafe uid {:?}", slug);
                continue;
            }
            let page = self.build_post_page(&slug).await?;
            self.write_page(&page)?;
            pages.push(page);
        }

        Ok(pages)
    }

    /// Fetch the first listing page
    pub async fn fetch_listing(&self) -> Result<Listing, ContentError> {
        let config = &self.blog.config;
        let doc_type = &config.listing_document_type;

        let options = QueryOptions::default()
            .fetch([
                format!("{}.title", doc_type),
                format!("{}.subtitle", doc_type),
                format!("{}.author", doc_type),
            ])
            .page_size(config.listing_page_size);

        let response = self
            .client
            .query(&[Predicate::document_type(doc_type)], &options)
            .await?;

        let results = transform_listing(&response.results);
        if config.validation == ValidationMode::Strict {
            results.iter().try_for_each(PostSummary::validate)?;
        }

        Ok(Listing {
            next_page: response.next_page,
            results,
        })
    }

    /// Identifiers of the posts to pre-generate (first page only)
    pub async fn enumerate_paths(&self) -> Result<Vec<String>, ContentError> {
        let config = &self.blog.config;
        let options = QueryOptions::default().page_size(config.paths_page_size);

        let response = self
            .client
            .query(
                &[Predicate::document_type(&config.post_document_type)],
                &options,
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(|doc| {
                if doc.uid.is_none() {
                    tracing::warn!("Skipping document {:?} without uid", doc.id);
                }
                doc.uid
            })
            .collect())
    }

    /// Fetch and transform one post
    pub async fn fetch_post(&self, slug: &str) -> Result<PostDetail, ContentError> {
        let config = &self.blog.config;
        let document = self
            .client
            .get_by_uid(&config.post_document_type, slug)
            .await?;

        let detail = transform_detail(&document, self.reading_time_mode).with_uid(slug);
        if config.validation == ValidationMode::Strict {
            detail.validate()?;
        }

        Ok(detail)
    }

    /// Fetch and render the listing page
    pub async fn build_listing_page(&self) -> Result<GeneratedPage> {
        let listing = self.fetch_listing().await?;
        tracing::debug!("Listing has {} posts", listing.results.len());

        Ok(GeneratedPage {
            route: LISTING_ROUTE.to_string(),
            html: self.render_listing(&listing)?,
        })
    }

    /// Fetch and render one post page
    pub async fn build_post_page(&self, slug: &str) -> Result<GeneratedPage> {
        let detail = self.fetch_post(slug).await?;
        tracing::debug!(
            "Rendering post {} ({} min read)",
            slug,
            detail.reading_time_minutes
        );

        Ok(GeneratedPage {
            route: post_path(slug),
            html: self.render_post(&detail)?,
        })
    }

    /// Render the listing page
    pub fn render_listing(&self, listing: &Listing) -> Result<String> {
        let posts: Vec<SummaryData> = listing
            .results
            .iter()
            .map(|p| self.summary_data(p))
            .collect();

        let mut context = self.create_base_context();
        context.insert("posts", &posts);
        context.insert(
            "next_page",
            &listing.next_page.as_deref().map(html_escape),
        );

        self.renderer.render("home.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let config = &self.blog.config;
        let uid = post.uid.clone().unwrap_or_default();

        let data = PostPageData {
            permalink: full_url_for(config, &post_path(&uid)),
            uid,
            title: escaped(&post.title),
            banner_url: escaped(&post.banner_url),
            author: escaped(&post.author),
            date: format_publication_date(
                post.first_publication_date.as_ref(),
                &config.post_date_format,
                &self.date_style,
            ),
            datetime: post
                .first_publication_date
                .as_ref()
                .map(date_xml)
                .unwrap_or_default(),
            reading_time: post.reading_time_minutes,
            sections: post
                .content
                .iter()
                .map(|s| SectionData {
                    index: s.index,
                    heading: escaped(&s.heading),
                    body_html: s.body_html.clone(),
                })
                .collect(),
        };

        let mut context = self.create_base_context();
        context.insert("post", &data);

        self.renderer.render("post.html", &context)
    }

    /// Render the not-found page for a slug
    pub fn render_not_found(&self, slug: &str) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("slug", &html_escape(slug));
        self.renderer.render("not_found.html", &context)
    }

    /// Render the generic error page
    pub fn render_error(&self) -> Result<String> {
        self.renderer.render("error.html", &self.create_base_context())
    }

    /// Write a page to its file under the public directory
    pub fn write_page(&self, page: &GeneratedPage) -> Result<PathBuf> {
        let output_path = self.output_path(&page.route);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, &page.html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }

    /// File a route is written to
    pub fn output_path(&self, route: &str) -> PathBuf {
        let relative = route.trim_matches('/');
        let dir = if relative.is_empty() {
            self.blog.public_dir.clone()
        } else {
            let decoded = percent_encoding::percent_decode_str(relative).decode_utf8_lossy();
            self.blog.public_dir.join(decoded.as_ref())
        };
        dir.join("index.html")
    }

    fn create_base_context(&self) -> Context {
        let config = &self.blog.config;
        let config_data = ConfigData {
            title: html_escape(&config.title),
            root: url_for(config, ""),
            lang: config.language.replace('_', "-"),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let mut context = Context::new();
        context.insert("config", &config_data);
        context
    }

    fn summary_data(&self, post: &PostSummary) -> SummaryData {
        let config = &self.blog.config;
        let uid = post.uid.clone().unwrap_or_default();

        SummaryData {
            path: url_for(config, &post_path(&uid)),
            uid,
            title: escaped(&post.title),
            subtitle: escaped(&post.subtitle),
            author: escaped(&post.author),
            date: format_publication_date(
                post.first_publication_date.as_ref(),
                &config.listing_date_format,
                &self.date_style,
            ),
            datetime: post
                .first_publication_date
                .as_ref()
                .map(date_xml)
                .unwrap_or_default(),
        }
    }

    /// Copy static assets into the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                let relative = path.strip_prefix(static_dir)?;
                let dest = self.blog.public_dir.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::copy(path, &dest)?;
            }
        }

        Ok(())
    }
}

/// Escape an optional text value; absent renders as empty
fn escaped(value: &Option<String>) -> String {
    value.as_deref().map(html_escape).unwrap_or_default()
}

/// Whether a slug can be used as a single output path segment
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\'])
        && !slug.chars().any(char::is_control)
}

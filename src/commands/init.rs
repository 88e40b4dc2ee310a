//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
language: pt_BR
timezone: UTC

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public
static_dir: static

# Content API
## PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these values
api:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  access_token:
listing_document_type: posts
post_document_type: posts
listing_page_size: 5
paths_page_size: 10

# Rendering
listing_date_format: DD MMM YYYY
post_date_format: DD MMM YYYY
## markup: count words in the rendered HTML, text: count plain-text words
reading_time_mode: markup
## permissive: render absent fields as empty, strict: fail on absent fields
validation: permissive

# Seconds before a generated post page is regenerated
revalidate_secs: 1800
"#;

const DEFAULT_STYLE: &str = r#"body { margin: 0; background: #1a1d23; color: #d7d7d7; font-family: Inter, sans-serif; }
.container { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
.header { max-width: 720px; margin: 2rem auto; padding: 0 1rem; }
.logo { margin: 5rem 0 3rem; }
.post-link { display: block; margin-bottom: 3rem; color: inherit; text-decoration: none; }
.post-link strong { font-size: 1.75rem; color: #fff; }
.info { display: flex; gap: 1.5rem; font-size: 0.875rem; color: #bbb; }
.banner { width: 100%; max-height: 400px; object-fit: cover; }
.post h1 { font-size: 3rem; color: #fff; }
.post-content h2 { margin-top: 4rem; color: #fff; }
.load-more { background: none; border: 0; color: #ff57b2; font-size: 1.125rem; cursor: pointer; }
"#;

const DEFAULT_LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26"><text x="0" y="20" fill="#fff" font-family="sans-serif" font-size="22">spacetraveling<tspan fill="#ff57b2">.</tspan></text></svg>
"##;

/// Initialize a blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/css"))?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::write(target_dir.join("static/css/style.css"), DEFAULT_STYLE)?;
    fs::write(target_dir.join("static/logo.svg"), DEFAULT_LOGO)?;
    tracing::debug!("Wrote {:?}", config_path);

    Ok(())
}

//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off: every text
//! value is escaped while building the page data, and section bodies are
//! already HTML.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("home.html", include_str!("spacetraveling/home.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let text = crate::helpers::strip_html(&s);
    Ok(tera::Value::String(
        text.split_whitespace().collect::<Vec<_>>().join(" "),
    ))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub root: String,
    pub lang: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    pub permalink: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub reading_time: usize,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub index: usize,
    pub heading: String,
    pub body_html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfigData {
        ConfigData {
            title: "spacetraveling".to_string(),
            root: "/".to_string(),
            lang: "pt-BR".to_string(),
            version: "0.1.0".to_string(),
        }
    }

    #[test]
    fn test_render_home() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config());
        context.insert(
            "posts",
            &vec![SummaryData {
                uid: "hooks".to_string(),
                path: "/post/hooks".to_string(),
                title: "Como utilizar Hooks".to_string(),
                subtitle: "Pensando em sincronização".to_string(),
                author: "Joseph Oliveira".to_string(),
                date: "15 mar 2021".to_string(),
                datetime: String::new(),
            }],
        );
        context.insert("next_page", &Option::<String>::None);

        let html = renderer.render("home.html", &context).unwrap();
        assert!(html.contains("<title>Home | spacetraveling</title>"));
        assert!(html.contains(r#"href="/post/hooks""#));
        assert!(html.contains("<strong>Como utilizar Hooks</strong>"));
        assert!(html.contains("<time>15 mar 2021</time>"));
        assert!(!html.contains("load-more"));
    }

    #[test]
    fn test_render_post_keeps_body_html() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config());
        context.insert(
            "post",
            &PostPageData {
                uid: "hooks".to_string(),
                permalink: "http://localhost:3000/post/hooks".to_string(),
                title: "Hooks".to_string(),
                banner_url: String::new(),
                author: "Joseph".to_string(),
                date: String::new(),
                datetime: String::new(),
                reading_time: 4,
                sections: vec![SectionData {
                    index: 0,
                    heading: "Intro".to_string(),
                    body_html: "<p>Lorem <strong>ipsum</strong></p>".to_string(),
                }],
            },
        );

        let html = renderer.render("post.html", &context).unwrap();
        assert!(html.contains("<p>Lorem <strong>ipsum</strong></p>"));
        assert!(html.contains(r#"id="section-0""#));
        assert!(html.contains("4 min"));
        assert!(html.contains(r#"<meta name="description" content="Lorem ipsum">"#));
        assert!(!html.contains("class=\"banner\""));
    }

    #[test]
    fn test_truncate_chars_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let out = truncate_chars_filter(&tera::Value::from("Hello World"), &args).unwrap();
        assert_eq!(out, tera::Value::from("Hello..."));
    }
}

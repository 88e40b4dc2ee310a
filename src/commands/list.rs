//! List posts from the content API

use anyhow::Result;

use crate::generator::Generator;
use crate::helpers::{format_publication_date, DateStyle};
use crate::Blog;

/// Print the first listing page
pub async fn run(blog: &Blog) -> Result<()> {
    let generator = Generator::new(blog, blog.content_client()?)?;
    let listing = generator.fetch_listing().await?;
    let style = DateStyle::new(&blog.config.language, &blog.config.timezone);

    println!("Posts ({}):", listing.results.len());
    for post in &listing.results {
        let date = format_publication_date(
            post.first_publication_date.as_ref(),
            "YYYY-MM-DD",
            &style,
        );
        println!(
            "  {:<10} - {} [{}]",
            date,
            post.title.as_deref().unwrap_or("(untitled)"),
            post.uid.as_deref().unwrap_or("-")
        );
    }

    if let Some(next_page) = &listing.next_page {
        println!("More posts: {}", next_page);
    }

    Ok(())
}

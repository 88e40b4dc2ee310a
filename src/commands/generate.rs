//! Generate static pages

use anyhow::Result;

use crate::generator::Generator;
use crate::Blog;

/// Generate the listing page and every enumerated post page
pub async fn run(blog: &Blog) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, blog.content_client()?)?;
    let pages = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} pages into {:?} in {:.2}s",
        pages.len(),
        blog.public_dir,
        duration.as_secs_f64()
    );

    Ok(())
}

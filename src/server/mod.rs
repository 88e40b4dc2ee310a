//! Page server with on-demand generation and periodic revalidation

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::ContentClient;
use crate::cache::{Lookup, PageCache};
use crate::error::ContentError;
use crate::generator::{is_safe_slug, GeneratedPage, Generator, LISTING_ROUTE};
use crate::helpers::post_path;
use crate::Blog;

type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// A page the server knows how to generate
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Listing,
    Post(String),
}

impl Target {
    fn route(&self) -> String {
        match self {
            Target::Listing => LISTING_ROUTE.to_string(),
            Target::Post(slug) => post_path(slug),
        }
    }
}

/// Server state
pub struct ServerState {
    generator: Generator,
    cache: RwLock<PageCache>,
    generating: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    revalidate: Duration,
    public_dir: PathBuf,
    clock: Clock,
}

impl ServerState {
    /// Create state for a blog, using the system clock
    pub fn new(blog: &Blog, generator: Generator) -> Self {
        Self::with_clock(blog, generator, Arc::new(Instant::now))
    }

    fn with_clock(blog: &Blog, generator: Generator, clock: Clock) -> Self {
        Self {
            generator,
            cache: RwLock::new(PageCache::new()),
            generating: Mutex::new(HashMap::new()),
            revalidate: Duration::from_secs(blog.config.revalidate_secs),
            public_dir: blog.public_dir.clone(),
            clock,
        }
    }

    /// Register pages generated ahead of time
    pub async fn seed(&self, pages: Vec<GeneratedPage>) {
        let now = (self.clock)();
        let mut cache = self.cache.write().await;
        for page in pages {
            let window = self.window_for(&page.route);
            cache.insert(page.route, page.html, now, window);
        }
    }

    fn window_for(&self, route: &str) -> Option<Duration> {
        if route == LISTING_ROUTE {
            None
        } else {
            Some(self.revalidate)
        }
    }

    /// Generate a page, persist it and cache it
    async fn regenerate(&self, target: &Target) -> Result<String> {
        let page = match target {
            Target::Listing => self.generator.build_listing_page().await?,
            Target::Post(slug) => self.generator.build_post_page(slug).await?,
        };

        if let Err(e) = self.generator.write_page(&page) {
            tracing::warn!("Failed to write {}: {}", page.route, e);
        }

        let now = (self.clock)();
        let window = self.window_for(&page.route);
        self.cache
            .write()
            .await
            .insert(page.route, page.html.clone(), now, window);

        Ok(page.html)
    }

    /// Serve a target from cache, generating it when missing
    ///
    /// A stale page is served as-is while a background task regenerates it.
    async fn serve(self: &Arc<Self>, target: Target) -> Response {
        let route = target.route();
        let lookup = self.cache.read().await.lookup(&route, (self.clock)());

        match lookup {
            Lookup::Fresh(html) => Html(html).into_response(),
            Lookup::Stale(stale) => {
                self.spawn_refresh(target, route).await;
                Html(stale).into_response()
            }
            Lookup::Missing => self.generate_missing(target, route).await,
        }
    }

    /// Regenerate a stale page in the background, once per route
    async fn spawn_refresh(self: &Arc<Self>, target: Target, route: String) {
        if !self.cache.write().await.begin_refresh(&route) {
            tracing::debug!("Revalidation of {} already running", route);
            return;
        }

        tracing::info!("Revalidating {}", route);
        let state = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = state.regenerate(&target).await {
                tracing::warn!("Revalidation of {} failed, keeping stale page: {}", route, e);
                state.cache.write().await.abandon_refresh(&route);
            }
        });
    }

    /// Generate a page that was never cached, blocking the request
    async fn generate_missing(&self, target: Target, route: String) -> Response {
        let route_lock = self
            .generating
            .lock()
            .await
            .entry(route.clone())
            .or_default()
            .clone();

        let response = {
            let _guard = route_lock.lock().await;

            // Another request may have generated it while we waited
            let lookup = self.cache.read().await.lookup(&route, (self.clock)());
            match lookup {
                Lookup::Fresh(html) | Lookup::Stale(html) => Html(html).into_response(),
                Lookup::Missing => {
                    tracing::info!("Generating {} on demand", route);
                    match self.regenerate(&target).await {
                        Ok(html) => Html(html).into_response(),
                        Err(e) => self.error_response(&target, &e),
                    }
                }
            }
        };

        let mut generating = self.generating.lock().await;
        if Arc::strong_count(&route_lock) <= 2 {
            generating.remove(&route);
        }

        response
    }

    fn error_response(&self, target: &Target, err: &anyhow::Error) -> Response {
        let not_found = err
            .downcast_ref::<ContentError>()
            .map(ContentError::is_not_found)
            .unwrap_or(false);

        match target {
            Target::Post(slug) if not_found => self.not_found(slug),
            _ => {
                tracing::error!("Failed to generate {}: {:#}", target.route(), err);
                match self.generator.render_error() {
                    Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
                    Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
                }
            }
        }
    }

    fn not_found(&self, slug: &str) -> Response {
        match self.generator.render_not_found(slug) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.public_dir.clone();

    Router::new()
        .route("/", get(listing_handler))
        .route("/post/:slug", get(post_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(
    blog: &Blog,
    client: Arc<dyn ContentClient>,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let generator = Generator::new(blog, client)?;

    tracing::info!("Generating static pages...");
    let pages = generator.generate().await?;
    tracing::info!("Generated {} pages", pages.len());

    let state = Arc::new(ServerState::new(blog, generator));
    state.seed(pages).await;

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn listing_handler(State(state): State<Arc<ServerState>>) -> Response {
    state.serve(Target::Listing).await
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    if !is_safe_slug(&slug) {
        return state.not_found(&slug);
    }
    state.serve(Target::Post(slug)).await
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockContentClient, QueryResponse};
    use crate::config::SiteConfig;
    use crate::content::RawDocument;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const WINDOW: Duration = Duration::from_secs(1800);

    fn post_doc(uid: &str, title: &str) -> RawDocument {
        serde_json::from_value(json!({
            "uid": uid,
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": title,
                "author": "Joseph Oliveira",
                "content": [{ "heading": "Intro", "body": [
                    { "type": "paragraph", "text": "Lorem ipsum", "spans": [] }
                ]}]
            }
        }))
        .unwrap()
    }

    struct Harness {
        _dir: TempDir,
        state: Arc<ServerState>,
        now: Arc<Mutex<Instant>>,
    }

    impl Harness {
        fn new(client: MockContentClient) -> Self {
            let dir = TempDir::new().unwrap();
            let blog = Blog::with_config(dir.path(), SiteConfig::default());
            let generator = Generator::new(&blog, Arc::new(client)).unwrap();

            let now = Arc::new(Mutex::new(Instant::now()));
            let clock_now = now.clone();
            let clock: Clock = Arc::new(move || *clock_now.lock().unwrap());

            let state = Arc::new(ServerState::with_clock(&blog, generator, clock));
            Self {
                _dir: dir,
                state,
                now,
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }

        /// Let background revalidation of a route run to completion
        async fn settle(&self, route: &str) {
            for _ in 0..100 {
                if !self.state.cache.read().await.is_refreshing(route) {
                    return;
                }
                tokio::task::yield_now().await;
            }
            panic!("revalidation of {} did not finish", route);
        }

        async fn get(&self, uri: &str) -> (StatusCode, String) {
            let response = router(self.state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8(body.to_vec()).unwrap())
        }
    }

    #[tokio::test]
    async fn test_seeded_page_is_served_without_fetching() {
        let harness = Harness::new(MockContentClient::new());
        harness
            .state
            .seed(vec![GeneratedPage {
                route: "/post/hooks".to_string(),
                html: "<p>pre-generated</p>".to_string(),
            }])
            .await;

        let (status, body) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<p>pre-generated</p>");
    }

    #[tokio::test]
    async fn test_missing_page_is_generated_once() {
        let mut client = MockContentClient::new();
        client
            .expect_get_by_uid()
            .times(1)
            .returning(|_, uid| Ok(post_doc(uid, "Generated on demand")));
        let harness = Harness::new(client);

        let (status, body) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Generated on demand"));

        let (status, again) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, again);

        let written = harness.state.generator.output_path("/post/hooks");
        assert!(written.exists());
    }

    #[tokio::test]
    async fn test_stale_page_is_served_while_regenerating() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut client = MockContentClient::new();
        client.expect_get_by_uid().returning(move |_, uid| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(post_doc(uid, &format!("Version {}", n + 1)))
        });
        let harness = Harness::new(client);

        let (_, first) = harness.get("/post/hooks").await;
        assert!(first.contains("Version 1"));

        harness.advance(WINDOW - Duration::from_secs(1));
        let (_, cached) = harness.get("/post/hooks").await;
        assert!(cached.contains("Version 1"));

        harness.advance(Duration::from_secs(1));
        let (status, expired) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert!(expired.contains("Version 1"));

        harness.settle("/post/hooks").await;
        let (_, refreshed) = harness.get("/post/hooks").await;
        assert!(refreshed.contains("Version 2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_stale_hits_regenerate_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut client = MockContentClient::new();
        client.expect_get_by_uid().returning(move |_, uid| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(post_doc(uid, &format!("Version {}", n + 1)))
        });
        let harness = Harness::new(client);

        harness.get("/post/hooks").await;
        harness.advance(WINDOW);

        let ((_, a), (_, b)) =
            tokio::join!(harness.get("/post/hooks"), harness.get("/post/hooks"));
        assert!(a.contains("Version 1"));
        assert!(b.contains("Version 1"));

        harness.settle("/post/hooks").await;
        let (_, refreshed) = harness.get("/post/hooks").await;
        assert!(refreshed.contains("Version 2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let mut client = MockContentClient::new();
        client
            .expect_get_by_uid()
            .times(1)
            .returning(|_, uid| Ok(post_doc(uid, "Generated on demand")));
        let harness = Harness::new(client);

        let ((sa, a), (sb, b)) =
            tokio::join!(harness.get("/post/hooks"), harness.get("/post/hooks"));
        assert_eq!(sa, StatusCode::OK);
        assert_eq!(sb, StatusCode::OK);
        assert_eq!(a, b);
        assert!(harness.state.generating.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_revalidation_serves_stale_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut client = MockContentClient::new();
        client.expect_get_by_uid().returning(move |_, uid| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(post_doc(uid, "Original"))
            } else {
                Err(ContentError::Transient("connection reset".to_string()))
            }
        });
        let harness = Harness::new(client);

        harness.get("/post/hooks").await;
        harness.advance(WINDOW);
        let (status, body) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Original"));

        harness.settle("/post/hooks").await;
        let (status, body) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Original"));

        // The failed attempt releases the route, so the next hit retries
        harness.settle("/post/hooks").await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_document_is_404() {
        let mut client = MockContentClient::new();
        client.expect_get_by_uid().returning(|doc_type, uid| {
            Err(ContentError::MissingDocument {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
        });
        let harness = Harness::new(client);

        let (status, body) = harness.get("/post/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post não encontrado"));
    }

    #[tokio::test]
    async fn test_transient_failure_is_500() {
        let mut client = MockContentClient::new();
        client
            .expect_get_by_uid()
            .returning(|_, _| Err(ContentError::Transient("timeout".to_string())));
        let harness = Harness::new(client);

        let (status, _) = harness.get("/post/hooks").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unsafe_slug_is_404_without_fetching() {
        let harness = Harness::new(MockContentClient::new());
        let (status, _) = harness.get("/post/a%2Fb").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_listing_never_expires() {
        let mut client = MockContentClient::new();
        client.expect_query().times(1).returning(|_, _| {
            Ok(QueryResponse {
                results: vec![post_doc("hooks", "Como utilizar Hooks")],
                ..Default::default()
            })
        });
        let harness = Harness::new(client);

        let (status, body) = harness.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Como utilizar Hooks"));

        harness.advance(WINDOW * 10);
        let (_, again) = harness.get("/").await;
        assert_eq!(body, again);
    }
}

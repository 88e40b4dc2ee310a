//! Page cache with periodic revalidation
//!
//! Generated pages are kept in memory keyed by route. A page generated with
//! a revalidation window is served as-is until the window elapses; after
//! that, the next request regenerates it. Pages without a window never
//! expire.
//!
//! A route being regenerated in the background is marked as refreshing so
//! that only one regeneration runs per route at a time.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A cached page
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Rendered HTML
    pub html: String,
    /// When the page was generated
    pub generated_at: Instant,
    /// How long the page stays fresh (`None` = forever)
    pub revalidate: Option<Duration>,
}

impl CacheEntry {
    /// Whether the page must be regenerated at `now`
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.revalidate {
            Some(window) => now.saturating_duration_since(self.generated_at) >= window,
            None => false,
        }
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Page is within its window
    Fresh(String),
    /// Page exists but its window has elapsed
    Stale(String),
    /// Page has never been generated
    Missing,
}

/// In-memory cache of generated pages
#[derive(Debug, Default)]
pub struct PageCache {
    entries: HashMap<String, CacheEntry>,
    refreshing: HashSet<String>,
}

impl PageCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a route at `now`
    pub fn lookup(&self, route: &str, now: Instant) -> Lookup {
        match self.entries.get(route) {
            Some(entry) if entry.is_stale(now) => Lookup::Stale(entry.html.clone()),
            Some(entry) => Lookup::Fresh(entry.html.clone()),
            None => Lookup::Missing,
        }
    }

    /// Store a freshly generated page
    pub fn insert(
        &mut self,
        route: impl Into<String>,
        html: String,
        generated_at: Instant,
        revalidate: Option<Duration>,
    ) {
        let route = route.into();
        tracing::debug!("Caching {} (revalidate: {:?})", route, revalidate);
        self.refreshing.remove(&route);
        self.entries.insert(
            route,
            CacheEntry {
                html,
                generated_at,
                revalidate,
            },
        );
    }

    /// Mark a route as refreshing; false if a refresh is already running
    pub fn begin_refresh(&mut self, route: &str) -> bool {
        self.refreshing.insert(route.to_string())
    }

    /// Clear the refreshing mark without storing a new page
    pub fn abandon_refresh(&mut self, route: &str) {
        self.refreshing.remove(route);
    }

    pub fn is_refreshing(&self, route: &str) -> bool {
        self.refreshing.contains(route)
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

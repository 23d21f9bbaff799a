// 🗃️ View Cache - rendered pages keyed by request path + query
//
// Shared by all handlers; writes invalidate by path so the next read re-renders.
// Every invalidation bumps a generation counter. A page rendered before an
// invalidation is not stored afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Entries kept before the cache starts over
pub const MAX_ENTRIES: usize = 256;

#[derive(Clone, Default)]
pub struct ViewCache {
    pages: Arc<RwLock<HashMap<String, String>>>,
    generation: Arc<AtomicU64>,
}

/// `key` is `path` itself, or `path` followed by a query string
fn is_page(key: &str, path: &str) -> bool {
    key.strip_prefix(path)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with('?'))
}

/// `key` is `path`, a query on it, or anything nested below it
fn is_under(key: &str, path: &str) -> bool {
    is_page(key, path)
        || key
            .strip_prefix(path)
            .map_or(false, |rest| rest.starts_with('/'))
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let pages = self.pages.read().ok()?;
        pages.get(key).cloned()
    }

    /// Current generation; read it before rendering and hand it to `insert`
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store a page rendered at generation `seen`. Returns false (and stores
    /// nothing) when an invalidation happened since.
    pub fn insert(&self, key: impl Into<String>, html: impl Into<String>, seen: u64) -> bool {
        let Ok(mut pages) = self.pages.write() else {
            return false;
        };
        if self.generation() != seen {
            return false;
        }
        if pages.len() >= MAX_ENTRIES {
            pages.clear();
        }
        pages.insert(key.into(), html.into());
        true
    }

    /// Invalidations run under the write lock, so `insert` never sees a
    /// half-applied one.
    fn invalidate(&self, retain: impl FnMut(&String, &mut String) -> bool) {
        if let Ok(mut pages) = self.pages.write() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            pages.retain(retain);
        }
    }

    /// Drop one page and all its query variants (`/dashboard`, `/dashboard?x=1`)
    pub fn invalidate_page(&self, path: &str) {
        self.invalidate(|key, _| !is_page(key, path));
    }

    /// Drop a page and everything nested below it
    pub fn invalidate_prefix(&self, path: &str) {
        self.invalidate(|key, _| !is_under(key, path));
    }

    pub fn clear(&self) {
        self.invalidate(|_, _| false);
    }

    pub fn len(&self) -> usize {
        self.pages.read().map(|pages| pages.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_insert() {
        let cache = ViewCache::new();
        assert!(cache.get("/dashboard").is_none());

        assert!(cache.insert("/dashboard", "<p>hi</p>", cache.generation()));
        assert_eq!(cache.get("/dashboard").as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn test_invalidate_prefix_respects_boundaries() {
        let cache = ViewCache::new();
        cache.insert("/dashboard/crests", "a", cache.generation());
        cache.insert("/dashboard/crests?page=2", "b", cache.generation());
        cache.insert("/dashboard/crests/abc/edit", "c", cache.generation());
        cache.insert("/dashboard/crests-archive", "d", cache.generation());
        cache.insert("/dashboard/tools", "e", cache.generation());

        cache.invalidate_prefix("/dashboard/crests");

        assert!(cache.get("/dashboard/crests").is_none());
        assert!(cache.get("/dashboard/crests?page=2").is_none());
        assert!(cache.get("/dashboard/crests/abc/edit").is_none());
        assert!(cache.get("/dashboard/crests-archive").is_some());
        assert!(cache.get("/dashboard/tools").is_some());
    }

    #[test]
    fn test_invalidate_page_keeps_children() {
        let cache = ViewCache::new();
        cache.insert("/dashboard", "overview", cache.generation());
        cache.insert("/dashboard?x=1", "overview", cache.generation());
        cache.insert("/dashboard/tools", "tools", cache.generation());

        cache.invalidate_page("/dashboard");

        assert_eq!(cache.len(), 1);
        assert!(cache.get("/dashboard/tools").is_some());
    }

    #[test]
    fn test_bounded() {
        let cache = ViewCache::new();
        for i in 0..MAX_ENTRIES {
            cache.insert(format!("/p/{}", i), "x", cache.generation());
        }
        assert_eq!(cache.len(), MAX_ENTRIES);

        cache.insert("/one-more", "x", cache.generation());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_render_overtaken_by_invalidation_is_dropped() {
        let cache = ViewCache::new();
        let seen = cache.generation();

        // A write lands while the page is being rendered
        cache.invalidate_prefix("/dashboard/crests");

        assert!(!cache.insert("/dashboard/crests", "stale", seen));
        assert!(cache.get("/dashboard/crests").is_none());

        assert!(cache.insert("/dashboard/crests", "fresh", cache.generation()));
        assert_eq!(cache.get("/dashboard/crests").as_deref(), Some("fresh"));
    }
}

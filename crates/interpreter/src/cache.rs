//! Page-level cache of parsed trees.

use crate::control::ControlTree;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use xpages_traits::{CacheInfo, PageUri};

/// A parsed page and the loader token it was parsed from.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub root: Arc<ControlTree>,
    pub cache_info: CacheInfo,
}

/// Stores at most one parsed tree per URI.
///
/// Staleness is never judged here; the interpreter asks the loader.
pub trait PageCache: Send + Sync + Debug {
    fn get_page(&self, uri: &PageUri) -> Option<CachedPage>;

    /// Stores `page`, replacing any earlier entry for `uri`.
    fn put_page(&self, uri: &PageUri, page: CachedPage);
}

#[derive(Debug, Default)]
pub struct InMemoryPageCache {
    pages: RwLock<HashMap<PageUri, CachedPage>>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, uri: &PageUri) -> Option<CachedPage> {
        self.pages.write().ok()?.remove(uri)
    }

    pub fn clear(&self) {
        if let Ok(mut pages) = self.pages.write() {
            pages.clear();
        }
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.pages.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageCache for InMemoryPageCache {
    fn get_page(&self, uri: &PageUri) -> Option<CachedPage> {
        self.pages.read().ok()?.get(uri).cloned()
    }

    fn put_page(&self, uri: &PageUri, page: CachedPage) {
        match self.pages.write() {
            Ok(mut pages) => {
                pages.insert(uri.clone(), page);
            }
            Err(_) => log::warn!("Page cache lock poisoned; '{}' not stored", uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::XPagesObject;
    use crate::setter::SetterCache;
    use xpages_traits::{Definition, PropertyBag};

    fn page(token: &str) -> CachedPage {
        let def = Definition::builder("urn:test", "view", || Box::new(PropertyBag::new("View"))).build();
        CachedPage {
            root: Arc::new(ControlTree::new(XPagesObject::new(def, Arc::new(SetterCache::new())))),
            cache_info: CacheInfo::from(token),
        }
    }

    #[test]
    fn test_put_get_replace() {
        let cache = InMemoryPageCache::new();
        let uri = PageUri::from("/a.xsp");
        assert!(cache.get_page(&uri).is_none());

        let first = page("v1");
        cache.put_page(&uri, first.clone());
        let hit = cache.get_page(&uri).unwrap();
        assert!(Arc::ptr_eq(&hit.root, &first.root));

        cache.put_page(&uri, page("v2"));
        assert_eq!(cache.get_page(&uri).unwrap().cache_info, CacheInfo::from("v2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = InMemoryPageCache::new();
        cache.put_page(&PageUri::from("/a.xsp"), page("v1"));
        cache.put_page(&PageUri::from("/b.xsp"), page("v1"));
        assert!(cache.remove(&PageUri::from("/a.xsp")).is_some());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}

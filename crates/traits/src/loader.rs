//! PageLoader trait for abstracting page fetching.
//!
//! A loader returns raw markup together with an opaque staleness token, and
//! later judges whether a token it produced is still current.

use crate::ids::{CacheInfo, PageUri};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Error type for page loading operations.
#[derive(Error, Debug, Clone)]
pub enum LoaderError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Failed to load page '{uri}': {message}")]
    LoadFailed { uri: String, message: String },

    #[error("Failed to read page '{uri}': {source}")]
    Read {
        uri: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(Arc::new(err))
    }
}

/// Raw page content plus the token used to judge staleness later.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    pub content: String,
    pub cache_info: CacheInfo,
}

/// A trait for fetching page markup.
///
/// # Implementations
///
/// - `FilesystemPageLoader`: Loads from a directory, modification time as the token (xpages-resource)
/// - `InMemoryPageLoader`: Loads from pre-populated memory, a version counter as the token
pub trait PageLoader: Send + Sync + Debug {
    /// Load a page by its URI.
    fn load(&self, uri: &PageUri) -> Result<LoadedPage, LoaderError>;

    /// Whether `cache_info`, previously returned by `load` for `uri`, is out of date.
    fn is_cache_expired(&self, uri: &PageUri, cache_info: &CacheInfo) -> bool;

    /// Returns a human-readable name for this loader (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory page loader.
///
/// Every `add` bumps the page's version; the version is the cache token, so a
/// replaced page reads as expired.
#[derive(Debug, Default)]
pub struct InMemoryPageLoader {
    pages: RwLock<HashMap<PageUri, (String, u64)>>,
}

impl InMemoryPageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a page.
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::LoadFailed` if the internal lock is poisoned.
    pub fn add(&self, uri: impl Into<PageUri>, content: impl Into<String>) -> Result<(), LoaderError> {
        let uri = uri.into();
        let mut pages = self.pages.write().map_err(|_| LoaderError::LoadFailed {
            uri: uri.to_string(),
            message: "page store lock poisoned".to_string(),
        })?;
        let version = pages.get(&uri).map(|(_, v)| v + 1).unwrap_or(1);
        pages.insert(uri, (content.into(), version));
        Ok(())
    }

    /// Remove a page from the store.
    ///
    /// Returns `None` if the lock is poisoned or the page doesn't exist.
    pub fn remove(&self, uri: &PageUri) -> Option<String> {
        self.pages.write().ok()?.remove(uri).map(|(content, _)| content)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.pages.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.pages.read().map(|p| p.is_empty()).unwrap_or(true)
    }
}

impl PageLoader for InMemoryPageLoader {
    fn load(&self, uri: &PageUri) -> Result<LoadedPage, LoaderError> {
        let pages = self.pages.read().map_err(|_| LoaderError::LoadFailed {
            uri: uri.to_string(),
            message: "page store lock poisoned".to_string(),
        })?;
        pages
            .get(uri)
            .map(|(content, version)| LoadedPage {
                content: content.clone(),
                cache_info: CacheInfo::from(format!("v{}", version)),
            })
            .ok_or_else(|| LoaderError::NotFound(uri.to_string()))
    }

    fn is_cache_expired(&self, uri: &PageUri, cache_info: &CacheInfo) -> bool {
        match self.pages.read() {
            Ok(pages) => match pages.get(uri) {
                Some((_, version)) => cache_info.as_str() != format!("v{}", version),
                None => true,
            },
            Err(_) => true,
        }
    }

    fn name(&self) -> &'static str {
        "InMemoryPageLoader"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_loader_add_and_load() {
        let loader = InMemoryPageLoader::new();
        loader.add("/home.xsp", "<xp:view/>").unwrap();

        let page = loader.load(&PageUri::from("/home.xsp")).unwrap();
        assert_eq!(page.content, "<xp:view/>");
        assert_eq!(page.cache_info, CacheInfo::from("v1"));
    }

    #[test]
    fn test_in_memory_loader_not_found() {
        let loader = InMemoryPageLoader::new();
        let result = loader.load(&PageUri::from("/missing.xsp"));
        assert!(matches!(result, Err(LoaderError::NotFound(_))));
    }

    #[test]
    fn test_replacing_a_page_expires_its_token() {
        let loader = InMemoryPageLoader::new();
        let uri = PageUri::from("/home.xsp");
        loader.add(uri.clone(), "one").unwrap();
        let first = loader.load(&uri).unwrap();
        assert!(!loader.is_cache_expired(&uri, &first.cache_info));

        loader.add(uri.clone(), "two").unwrap();
        assert!(loader.is_cache_expired(&uri, &first.cache_info));
        let second = loader.load(&uri).unwrap();
        assert_eq!(second.content, "two");
        assert!(!loader.is_cache_expired(&uri, &second.cache_info));
        assert_eq!(loader.len(), 1);
    }

    #[test]
    fn test_removed_page_is_expired() {
        let loader = InMemoryPageLoader::new();
        let uri = PageUri::from("/gone.xsp");
        loader.add(uri.clone(), "x").unwrap();
        let page = loader.load(&uri).unwrap();
        assert_eq!(loader.remove(&uri), Some("x".to_string()));
        assert!(loader.is_cache_expired(&uri, &page.cache_info));
        assert!(loader.is_empty());
    }

    #[test]
    fn test_loader_error_display() {
        let err = LoaderError::LoadFailed {
            uri: "/a.xsp".to_string(),
            message: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/a.xsp"));
        assert!(err.to_string().contains("permission denied"));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: LoaderError = io_err.into();
        assert!(matches!(err, LoaderError::Io(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk gone");
    }

    #[test]
    fn test_loader_name() {
        assert_eq!(InMemoryPageLoader::new().name(), "InMemoryPageLoader");
    }
}

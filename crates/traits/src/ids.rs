//! Newtype wrappers for page URIs and cache tokens
//!
//! These keep page addresses and the loader's opaque staleness tokens from
//! being mixed up with ordinary strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The address of a page, as understood by a `PageLoader` (e.g. `/home.xsp`).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PageUri(Arc<str>);

impl PageUri {
    /// Creates a new PageUri from a string
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    /// Returns the string representation of this page URI
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PageUri {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for PageUri {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for PageUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque staleness token produced by a loader alongside page content.
///
/// Only the loader that produced it knows how to compare it; the interpreter
/// stores it next to the cached tree and hands it back unchanged.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CacheInfo(Arc<str>);

impl CacheInfo {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheInfo {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for CacheInfo {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

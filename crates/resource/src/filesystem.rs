//! Filesystem-based page loader for native platforms.
//!
//! Page URIs are resolved against a base directory; a leading `/` means the
//! base itself, so `/home.xsp` reads `<base>/home.xsp`.
//!
//! # Security
//!
//! The loader validates that all resolved paths remain within the base path
//! to prevent directory traversal attacks (e.g., `/../../etc/passwd`).

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use xpages_traits::{CacheInfo, LoadedPage, LoaderError, PageLoader, PageUri};

/// A page loader that reads markup from the local filesystem.
///
/// The cache token is the file's modification time and length, so any rewrite
/// of the file marks previously parsed trees as stale.
#[derive(Debug)]
pub struct FilesystemPageLoader {
    base_path: PathBuf,
    /// Canonicalized base path for security checks
    canonical_base: Option<PathBuf>,
}

impl FilesystemPageLoader {
    /// Creates a loader rooted at `base_path`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        // May fail if the directory doesn't exist yet
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a page URI below the base directory.
    ///
    /// Returns `None` if the path would escape it.
    fn resolve_path_safe(&self, uri: &str) -> Option<PathBuf> {
        let relative = uri.trim_start_matches('/');
        if relative.is_empty() || Path::new(relative).is_absolute() {
            return None;
        }

        let full_path = self.base_path.join(relative);

        if let Ok(canonical) = full_path.canonicalize()
            && let Some(ref base) = self.canonical_base
        {
            return canonical.starts_with(base).then_some(canonical);
        }

        // File doesn't exist (yet): reject any `..` outright
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        Some(full_path)
    }

    fn token_for(path: &Path) -> std::io::Result<CacheInfo> {
        let metadata = std::fs::metadata(path)?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Ok(CacheInfo::from(format!(
            "{}.{:09}:{}",
            modified.as_secs(),
            modified.subsec_nanos(),
            metadata.len()
        )))
    }
}

impl PageLoader for FilesystemPageLoader {
    fn load(&self, uri: &PageUri) -> Result<LoadedPage, LoaderError> {
        let path = self.resolve_path_safe(uri.as_str()).ok_or_else(|| {
            LoaderError::NotFound(format!("{} (path traversal blocked)", uri))
        })?;

        let map_err = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoaderError::NotFound(uri.to_string())
            } else {
                LoaderError::Read {
                    uri: uri.to_string(),
                    source: Arc::new(e),
                }
            }
        };

        // Token first: a write racing the read leaves an older token, which later reads as stale.
        let cache_info = Self::token_for(&path).map_err(map_err)?;
        let content = std::fs::read_to_string(&path).map_err(map_err)?;
        log::trace!("Read {} bytes for '{}' from {}", content.len(), uri, path.display());
        Ok(LoadedPage {
            content,
            cache_info,
        })
    }

    fn is_cache_expired(&self, uri: &PageUri, cache_info: &CacheInfo) -> bool {
        match self
            .resolve_path_safe(uri.as_str())
            .map(|p| Self::token_for(&p))
        {
            Some(Ok(current)) => &current != cache_info,
            _ => true,
        }
    }

    fn name(&self) -> &'static str {
        "FilesystemPageLoader"
    }
}

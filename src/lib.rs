//! # xpages
//!
//! A markup-to-object interpreter for XPages-style pages.
//!
//! This crate ties the workspace together:
//! - **traits**: host-side contracts (components, bindings, registries, loaders)
//! - **engine**: setter compilation, the security gate, materialization and page caching
//! - **markup**: the XML front end
//! - **resource**: filesystem and in-memory page loaders
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use xpages::{InMemoryRegistry, PageUri, ScopeEvaluator};
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! let interpreter = Arc::new(xpages::from_directory(registry, "pages").build());
//! let tree = interpreter.parse_uri(&PageUri::from("/home.xsp")).unwrap();
//! let ctx = interpreter.context(Arc::new(ScopeEvaluator));
//! let page = tree.root().materialize(&ctx).unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

// Re-export workspace crates
pub use xpages_interpreter as engine;
pub use xpages_markup as markup;
pub use xpages_resource as resource;
pub use xpages_traits as traits;

pub use xpages_interpreter::{
    CachedPage, CheckTarget, Context, Control, ControlFactory, ControlSnapshot, ControlTree,
    DefaultControlFactory, ErrorKind, ExpressionKind, InMemoryPageCache, InterpreterBuilder,
    InterpreterConfig, InterpreterError, MarkupParser, NodeId, PageCache,
    PermissiveSecurityManager, PolicySecurityManager, PropertySetter, RawValue, SecurityCheck,
    SecurityManager, SecurityViolation, XPagesInterpreter, XPagesObject,
};
pub use xpages_markup::{MarkupError, XmlMarkupParser};
pub use xpages_resource::FilesystemPageLoader;
pub use xpages_traits::{
    CacheInfo, Component, ComponentError, ComponentNode, Definition, ExpressionEvaluator,
    InMemoryPageLoader, InMemoryRegistry, PageLoader, PageUri, Property, PropertyBag, Registry,
    Scope, ScopeEvaluator, Value, ValueType,
};

/// An interpreter builder using the XML front end.
///
/// No loader or cache is configured; add them with the builder's `with_*` methods.
pub fn interpreter(registry: Arc<dyn Registry>) -> InterpreterBuilder {
    XPagesInterpreter::builder(registry, Arc::new(XmlMarkupParser::new()))
}

/// An interpreter builder that loads pages from `dir` and caches parsed trees in memory.
pub fn from_directory<P: AsRef<Path>>(registry: Arc<dyn Registry>, dir: P) -> InterpreterBuilder {
    log::debug!("Serving pages from {}", dir.as_ref().display());
    interpreter(registry)
        .with_loader(Arc::new(FilesystemPageLoader::new(dir)))
        .with_cache(Arc::new(InMemoryPageCache::new()))
}

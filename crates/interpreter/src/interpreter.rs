//! Page loading, parsing and caching.

use crate::cache::{CachedPage, PageCache};
use crate::config::InterpreterConfig;
use crate::context::Context;
use crate::control::ControlTree;
use crate::error::InterpreterError;
use crate::factory::{ControlFactory, DefaultControlFactory, MarkupParser};
use crate::security::{PermissiveSecurityManager, SecurityManager};
use std::sync::Arc;
use xpages_traits::{
    ComponentError, ComponentNode, ExpressionEvaluator, PageDriver, PageLoader, PageUri, Registry,
    Scope,
};

/// Orchestrates cache lookup, staleness checks, loading and parsing.
#[derive(Debug)]
pub struct XPagesInterpreter {
    parser: Arc<dyn MarkupParser>,
    control_factory: Arc<dyn ControlFactory>,
    security: Arc<dyn SecurityManager>,
    loader: Option<Arc<dyn PageLoader>>,
    cache: Option<Arc<dyn PageCache>>,
    config: InterpreterConfig,
}

impl XPagesInterpreter {
    pub fn builder(registry: Arc<dyn Registry>, parser: Arc<dyn MarkupParser>) -> InterpreterBuilder {
        InterpreterBuilder::new(registry, parser)
    }

    /// Returns the tree for `uri`, reusing the cached one while the loader says it is current.
    ///
    /// With a cache but no loader, a cached tree is returned as is.
    pub fn parse_uri(&self, uri: &PageUri) -> Result<Arc<ControlTree>, InterpreterError> {
        if let Some(cache) = &self.cache
            && let Some(page) = cache.get_page(uri)
        {
            match &self.loader {
                Some(loader) if loader.is_cache_expired(uri, &page.cache_info) => {
                    log::debug!("Cached page '{}' is stale ({})", uri, page.cache_info);
                }
                _ => {
                    log::debug!("Page cache hit for '{}'", uri);
                    return Ok(page.root);
                }
            }
        } else if self.cache.is_some() {
            log::debug!("Page cache miss for '{}'", uri);
        }

        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| InterpreterError::ResourceUnreachable {
                uri: uri.to_string(),
                reason: None,
            })?;
        let page = loader
            .load(uri)
            .map_err(|e| InterpreterError::ResourceUnreachable {
                uri: uri.to_string(),
                reason: Some(e),
            })?;
        log::debug!("Loaded '{}' via {} ({})", uri, loader.name(), page.cache_info);

        let root = Arc::new(
            self.parser
                .parse(&page.content, Some(uri), self.control_factory.as_ref())?,
        );
        if let Some(cache) = &self.cache {
            cache.put_page(
                uri,
                CachedPage {
                    root: Arc::clone(&root),
                    cache_info: page.cache_info,
                },
            );
        }
        Ok(root)
    }

    /// Parses `content` directly, without touching the cache.
    ///
    /// Content that does not open the configured root element is wrapped in one first.
    pub fn parse_content(&self, content: &str) -> Result<ControlTree, InterpreterError> {
        if self.config.contains_root(content) {
            self.parser.parse(content, None, self.control_factory.as_ref())
        } else {
            log::trace!("Wrapping fragment in <{}>", self.config.root_tag);
            let wrapped = self.config.wrap(content);
            self.parser.parse(&wrapped, None, self.control_factory.as_ref())
        }
    }

    /// A materialization context carrying this interpreter's security manager and a
    /// page driver that resolves includes through [`parse_uri`](Self::parse_uri).
    pub fn context(self: &Arc<Self>, evaluator: Arc<dyn ExpressionEvaluator>) -> Context {
        self.context_with_scope(evaluator, Scope::new())
    }

    pub fn context_with_scope(
        self: &Arc<Self>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        scope: Scope,
    ) -> Context {
        let driver = InterpreterPageDriver {
            interpreter: Arc::clone(self),
            evaluator: Arc::clone(&evaluator),
            scope: scope.clone(),
        };
        Context::new(evaluator)
            .with_scope(scope)
            .with_security_manager(Arc::clone(&self.security))
            .with_page_driver(Arc::new(driver))
    }

    pub fn security_manager(&self) -> &Arc<dyn SecurityManager> {
        &self.security
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }
}

/// Builder for [`XPagesInterpreter`].
///
/// Without a control factory, a [`DefaultControlFactory`] over the registry is
/// used, sharing the builder's security manager.
#[derive(Debug)]
pub struct InterpreterBuilder {
    registry: Arc<dyn Registry>,
    parser: Arc<dyn MarkupParser>,
    control_factory: Option<Arc<dyn ControlFactory>>,
    security: Arc<dyn SecurityManager>,
    loader: Option<Arc<dyn PageLoader>>,
    cache: Option<Arc<dyn PageCache>>,
    config: InterpreterConfig,
}

impl InterpreterBuilder {
    pub fn new(registry: Arc<dyn Registry>, parser: Arc<dyn MarkupParser>) -> Self {
        Self {
            registry,
            parser,
            control_factory: None,
            security: Arc::new(PermissiveSecurityManager),
            loader: None,
            cache: None,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn PageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn PageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_security_manager(mut self, security: Arc<dyn SecurityManager>) -> Self {
        self.security = security;
        self
    }

    pub fn with_control_factory(mut self, factory: Arc<dyn ControlFactory>) -> Self {
        self.control_factory = Some(factory);
        self
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> XPagesInterpreter {
        let control_factory = self.control_factory.unwrap_or_else(|| {
            Arc::new(
                DefaultControlFactory::new(self.registry)
                    .with_security_manager(Arc::clone(&self.security)),
            )
        });
        XPagesInterpreter {
            parser: self.parser,
            control_factory,
            security: self.security,
            loader: self.loader,
            cache: self.cache,
            config: self.config,
        }
    }
}

/// Lets include components build the pages they name.
#[derive(Debug)]
pub struct InterpreterPageDriver {
    interpreter: Arc<XPagesInterpreter>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    scope: Scope,
}

impl PageDriver for InterpreterPageDriver {
    fn load_page(&self, page_name: &str) -> Result<Option<ComponentNode>, ComponentError> {
        let uri = PageUri::from(page_name);
        let ctx = self
            .interpreter
            .context_with_scope(Arc::clone(&self.evaluator), self.scope.clone());
        self.interpreter
            .parse_uri(&uri)
            .and_then(|tree| tree.root().materialize(&ctx))
            .map_err(|e| ComponentError::Failed(format!("including '{}': {}", page_name, e)))
    }
}

//! The explicit evaluation context threaded through materialization.

use crate::security::{PermissiveSecurityManager, SecurityManager};
use std::sync::Arc;
use xpages_traits::{ExpressionEvaluator, PageDriver, Scope};

/// Everything a materialization needs besides the template itself.
///
/// Cloning is cheap apart from the scope's variables.
#[derive(Debug, Clone)]
pub struct Context {
    scope: Scope,
    evaluator: Arc<dyn ExpressionEvaluator>,
    security: Arc<dyn SecurityManager>,
    page_driver: Option<Arc<dyn PageDriver>>,
}

impl Context {
    /// A context with an empty scope and the permissive security manager.
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self {
            scope: Scope::new(),
            evaluator,
            security: Arc::new(PermissiveSecurityManager),
            page_driver: None,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_security_manager(mut self, security: Arc<dyn SecurityManager>) -> Self {
        self.security = security;
        self
    }

    pub fn with_page_driver(mut self, driver: Arc<dyn PageDriver>) -> Self {
        self.page_driver = Some(driver);
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn evaluator(&self) -> &dyn ExpressionEvaluator {
        self.evaluator.as_ref()
    }

    pub fn security(&self) -> &dyn SecurityManager {
        self.security.as_ref()
    }

    pub fn page_driver(&self) -> Option<&Arc<dyn PageDriver>> {
        self.page_driver.as_ref()
    }
}

//! The seams a markup parser plugs into.

use crate::control::ControlTree;
use crate::error::InterpreterError;
use crate::object::XPagesObject;
use crate::security::{PermissiveSecurityManager, SecurityManager};
use crate::setter::SetterCache;
use std::fmt::Debug;
use std::sync::Arc;
use xpages_traits::{PageUri, Registry};

/// Creates the template for each element a parser encounters.
pub trait ControlFactory: Send + Sync + Debug {
    /// Returns an empty template for `tag` in `namespace_uri`.
    ///
    /// `uri` is the page being parsed, or `None` for ad-hoc content.
    fn create_object(
        &self,
        uri: Option<&PageUri>,
        namespace_uri: &str,
        tag: &str,
    ) -> Result<XPagesObject, InterpreterError>;
}

/// Turns raw markup into a [`ControlTree`], calling back into `factory` for
/// every element and compiling every attribute through the template it gets back.
pub trait MarkupParser: Send + Sync + Debug {
    fn parse(
        &self,
        content: &str,
        uri: Option<&PageUri>,
        factory: &dyn ControlFactory,
    ) -> Result<ControlTree, InterpreterError>;
}

/// Looks tags up in a [`Registry`] after asking the security manager.
#[derive(Debug, Clone)]
pub struct DefaultControlFactory {
    registry: Arc<dyn Registry>,
    setters: Arc<SetterCache>,
    security: Arc<dyn SecurityManager>,
}

impl DefaultControlFactory {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            setters: Arc::new(SetterCache::new()),
            security: Arc::new(PermissiveSecurityManager),
        }
    }

    pub fn with_security_manager(mut self, security: Arc<dyn SecurityManager>) -> Self {
        self.security = security;
        self
    }

    /// Shares an existing factory memo instead of starting a fresh one.
    pub fn with_setter_cache(mut self, setters: Arc<SetterCache>) -> Self {
        self.setters = setters;
        self
    }

    pub fn setter_cache(&self) -> &Arc<SetterCache> {
        &self.setters
    }
}

impl ControlFactory for DefaultControlFactory {
    fn create_object(
        &self,
        uri: Option<&PageUri>,
        namespace_uri: &str,
        tag: &str,
    ) -> Result<XPagesObject, InterpreterError> {
        let definition = self
            .registry
            .find_definition(namespace_uri, tag)
            .ok_or_else(|| InterpreterError::UnknownTag {
                namespace: namespace_uri.to_string(),
                tag: tag.to_string(),
            })?;
        self.security
            .check_create_control(uri, namespace_uri, tag)?;
        Ok(XPagesObject::new(definition, Arc::clone(&self.setters)))
    }
}

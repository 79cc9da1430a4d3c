//! The live objects produced by materialization.
//!
//! A `Component` is whatever the host framework renders. The interpreter never
//! inspects one beyond this trait: every mutation goes through a named setter,
//! so an implementation decides for itself which properties it understands.

use crate::binding::{MethodBinding, ValueBinding};
use crate::value::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Error raised by a component when a write cannot be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("{operation} is not supported for '{property}'")]
    Unsupported { operation: String, property: String },

    #[error("Invalid value for '{property}': {message}")]
    InvalidValue { property: String, message: String },

    #[error("{0}")]
    Failed(String),
}

impl ComponentError {
    pub fn unsupported(operation: &str, property: &str) -> Self {
        ComponentError::Unsupported {
            operation: operation.to_string(),
            property: property.to_string(),
        }
    }
}

/// A live object built from a definition.
///
/// Only `set_property` is mandatory; the fast paths delegate to it and the
/// binding and collection operations refuse by default.
pub trait Component: Send + Sync + Debug + 'static {
    /// Name of the concrete type, used in diagnostics.
    fn type_name(&self) -> &str;

    /// Writes a concrete value.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), ComponentError>;

    fn set_id(&mut self, id: &str) -> Result<(), ComponentError> {
        self.set_property("id", Value::String(id.to_string()))
    }

    fn set_rendered(&mut self, rendered: bool) -> Result<(), ComponentError> {
        self.set_property("rendered", Value::Bool(rendered))
    }

    /// Invokes the collection's "add one element" operation.
    fn add_item(&mut self, method: &str, item: Value) -> Result<(), ComponentError> {
        let _ = item;
        Err(ComponentError::unsupported("add", method))
    }

    /// Installs a live binding that the host re-evaluates on its own schedule.
    fn set_value_binding(
        &mut self,
        name: &str,
        binding: Arc<dyn ValueBinding>,
    ) -> Result<(), ComponentError> {
        let _ = binding;
        Err(ComponentError::unsupported("value binding", name))
    }

    /// Installs a callable.
    fn set_method_binding(
        &mut self,
        name: &str,
        binding: Arc<dyn MethodBinding>,
    ) -> Result<(), ComponentError> {
        let _ = binding;
        Err(ComponentError::unsupported("method binding", name))
    }

    /// For nested values that stand for a callable (e.g. an action group),
    /// returns the callable they yield.
    fn method_binding(&self) -> Option<Arc<dyn MethodBinding>> {
        None
    }

    /// Components that pull in another page expose themselves here.
    fn as_include(&mut self) -> Option<&mut dyn IncludeComponent> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Capability of components that include another page.
pub trait IncludeComponent {
    fn set_page_name(&mut self, page_name: &str);
    fn set_page_driver(&mut self, driver: Arc<dyn PageDriver>);
}

/// Host-side hook handed to include components so they can build the page they include.
pub trait PageDriver: Send + Sync + Debug {
    /// Builds the live component graph of `page_name`.
    ///
    /// Returns `Ok(None)` when the page's root is not loaded.
    fn load_page(&self, page_name: &str) -> Result<Option<ComponentNode>, ComponentError>;
}

/// A materialized component together with its materialized children and facets.
#[derive(Debug)]
pub struct ComponentNode {
    pub component: Box<dyn Component>,
    pub children: Vec<ComponentNode>,
    pub facets: BTreeMap<String, ComponentNode>,
}

impl ComponentNode {
    pub fn new(component: Box<dyn Component>) -> Self {
        Self {
            component,
            children: Vec::new(),
            facets: BTreeMap::new(),
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.component.as_any().downcast_ref::<T>()
    }

    /// Total number of components in this subtree, facets included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ComponentNode::count).sum::<usize>()
            + self.facets.values().map(ComponentNode::count).sum::<usize>()
    }
}

/// A general-purpose component that records everything written to it.
///
/// Hosts without a dedicated type for a tag can register this, and it is the
/// component used throughout the tests.
#[derive(Debug, Default)]
pub struct PropertyBag {
    type_name: String,
    id: Option<String>,
    properties: BTreeMap<String, Value>,
    items: Vec<(String, Value)>,
    value_bindings: BTreeMap<String, Arc<dyn ValueBinding>>,
    method_bindings: BTreeMap<String, Arc<dyn MethodBinding>>,
    include: Option<IncludeState>,
}

#[derive(Debug, Default)]
struct IncludeState {
    page_name: Option<String>,
    driver: Option<Arc<dyn PageDriver>>,
}

impl PropertyBag {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// A bag that also accepts include wiring.
    pub fn include(type_name: impl Into<String>) -> Self {
        Self {
            include: Some(IncludeState::default()),
            ..Self::new(type_name)
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Items added through collection setters, with the add operation used.
    pub fn items(&self) -> &[(String, Value)] {
        &self.items
    }

    pub fn value_binding(&self, name: &str) -> Option<&Arc<dyn ValueBinding>> {
        self.value_bindings.get(name)
    }

    pub fn method_binding_for(&self, name: &str) -> Option<&Arc<dyn MethodBinding>> {
        self.method_bindings.get(name)
    }

    pub fn page_name(&self) -> Option<&str> {
        self.include.as_ref().and_then(|i| i.page_name.as_deref())
    }

    pub fn page_driver(&self) -> Option<&Arc<dyn PageDriver>> {
        self.include.as_ref().and_then(|i| i.driver.as_ref())
    }
}

impl Component for PropertyBag {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), ComponentError> {
        self.properties.insert(name.to_string(), value);
        Ok(())
    }

    fn set_id(&mut self, id: &str) -> Result<(), ComponentError> {
        self.id = Some(id.to_string());
        Ok(())
    }

    fn add_item(&mut self, method: &str, item: Value) -> Result<(), ComponentError> {
        self.items.push((method.to_string(), item));
        Ok(())
    }

    fn set_value_binding(
        &mut self,
        name: &str,
        binding: Arc<dyn ValueBinding>,
    ) -> Result<(), ComponentError> {
        self.value_bindings.insert(name.to_string(), binding);
        Ok(())
    }

    fn set_method_binding(
        &mut self,
        name: &str,
        binding: Arc<dyn MethodBinding>,
    ) -> Result<(), ComponentError> {
        self.method_bindings.insert(name.to_string(), binding);
        Ok(())
    }

    fn as_include(&mut self) -> Option<&mut dyn IncludeComponent> {
        if self.include.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl IncludeComponent for PropertyBag {
    fn set_page_name(&mut self, page_name: &str) {
        if let Some(include) = self.include.as_mut() {
            include.page_name = Some(page_name.to_string());
        }
    }

    fn set_page_driver(&mut self, driver: Arc<dyn PageDriver>) {
        if let Some(include) = self.include.as_mut() {
            include.driver = Some(driver);
        }
    }
}

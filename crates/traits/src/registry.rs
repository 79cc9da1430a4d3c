//! Tag and property metadata.
//!
//! A [`Definition`] describes one tag: which component type it builds and which
//! properties it declares. The interpreter only reads definitions; hosts populate
//! a [`Registry`] before any markup is compiled.

use crate::component::Component;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// How a property is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// A scalar written with a single setter call.
    Simple,
    /// A nested object built from its own definition.
    Complex,
    /// Repeated calls to an "add one element" operation.
    Collection {
        add_method: String,
        item_type: String,
    },
    /// A callable.
    MethodBinding,
}

/// Metadata for one declared property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
    /// Declared type name, e.g. `int` or `java.lang.String`.
    pub java_type: String,
    /// Whether a `#{...}` value binding may be installed.
    pub allow_run_time_binding: bool,
}

impl Property {
    pub fn simple(name: impl Into<String>, java_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Simple,
            java_type: java_type.into(),
            allow_run_time_binding: true,
        }
    }

    pub fn complex(name: impl Into<String>, java_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Complex,
            java_type: java_type.into(),
            allow_run_time_binding: true,
        }
    }

    pub fn collection(
        name: impl Into<String>,
        add_method: impl Into<String>,
        item_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Collection {
                add_method: add_method.into(),
                item_type: item_type.into(),
            },
            java_type: "java.util.List".to_string(),
            allow_run_time_binding: false,
        }
    }

    pub fn method_binding(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::MethodBinding,
            java_type: "javax.faces.el.MethodBinding".to_string(),
            allow_run_time_binding: false,
        }
    }

    /// Marks the property as literal-only.
    pub fn literal_only(mut self) -> Self {
        self.allow_run_time_binding = false;
        self
    }
}

type Constructor = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Metadata for one tag.
pub struct Definition {
    namespace_uri: String,
    tag_name: String,
    component_type: String,
    properties: HashMap<String, Property>,
    include_page: Option<String>,
    constructor: Constructor,
}

impl Definition {
    pub fn builder(
        namespace_uri: impl Into<String>,
        tag_name: impl Into<String>,
        constructor: impl Fn() -> Box<dyn Component> + Send + Sync + 'static,
    ) -> DefinitionBuilder {
        let tag_name = tag_name.into();
        DefinitionBuilder {
            definition: Definition {
                namespace_uri: namespace_uri.into(),
                component_type: tag_name.clone(),
                tag_name,
                properties: HashMap::new(),
                include_page: None,
                constructor: Arc::new(constructor),
            },
        }
    }

    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    /// Looks up a declared property.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// The page a custom control includes, if any.
    pub fn include_page(&self) -> Option<&str> {
        self.include_page.as_deref()
    }

    /// Instantiates the underlying component type.
    pub fn new_instance(&self) -> Box<dyn Component> {
        (self.constructor)()
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("namespace_uri", &self.namespace_uri)
            .field("tag_name", &self.tag_name)
            .field("component_type", &self.component_type)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("include_page", &self.include_page)
            .finish()
    }
}

pub struct DefinitionBuilder {
    definition: Definition,
}

impl DefinitionBuilder {
    pub fn component_type(mut self, component_type: impl Into<String>) -> Self {
        self.definition.component_type = component_type.into();
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.definition
            .properties
            .insert(property.name.clone(), property);
        self
    }

    pub fn include_page(mut self, page: impl Into<String>) -> Self {
        self.definition.include_page = Some(page.into());
        self
    }

    pub fn build(self) -> Arc<Definition> {
        Arc::new(self.definition)
    }
}

/// Answers "which definition handles this tag?".
pub trait Registry: Send + Sync + fmt::Debug {
    fn find_definition(&self, namespace_uri: &str, tag_name: &str) -> Option<Arc<Definition>>;
}

/// A registry populated in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    definitions: RwLock<HashMap<(String, String), Arc<Definition>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition, replacing any earlier one for the same tag.
    ///
    /// Does nothing if the lock is poisoned.
    pub fn register(&self, definition: Arc<Definition>) {
        let key = (
            definition.namespace_uri().to_string(),
            definition.tag_name().to_string(),
        );
        match self.definitions.write() {
            Ok(mut definitions) => {
                definitions.insert(key, definition);
            }
            Err(_) => log::warn!("Definition registry lock poisoned; '{}' not registered", key.1),
        }
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.definitions.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Registry for InMemoryRegistry {
    fn find_definition(&self, namespace_uri: &str, tag_name: &str) -> Option<Arc<Definition>> {
        self.definitions
            .read()
            .ok()?
            .get(&(namespace_uri.to_string(), tag_name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::PropertyBag;

    const CORE: &str = "http://www.ibm.com/xsp/core";

    fn text_definition() -> Arc<Definition> {
        Definition::builder(CORE, "text", || Box::new(PropertyBag::new("Text")))
            .component_type("com.example.Text")
            .property(Property::simple("value", "java.lang.Object"))
            .property(Property::simple("escape", "boolean").literal_only())
            .build()
    }

    #[test]
    fn test_definition_lookup() {
        let def = text_definition();
        assert_eq!(def.tag_name(), "text");
        assert_eq!(def.component_type(), "com.example.Text");
        assert!(def.property("value").is_some());
        assert!(!def.property("escape").unwrap().allow_run_time_binding);
        assert!(def.property("missing").is_none());
        assert_eq!(def.new_instance().type_name(), "Text");
    }

    #[test]
    fn test_registry_register_and_find() {
        let registry = InMemoryRegistry::new();
        assert!(registry.is_empty());
        registry.register(text_definition());
        assert_eq!(registry.len(), 1);
        assert!(registry.find_definition(CORE, "text").is_some());
        assert!(registry.find_definition(CORE, "panel").is_none());
        assert!(registry.find_definition("urn:other", "text").is_none());
    }

    #[test]
    fn test_collection_property_metadata() {
        let p = Property::collection("converters", "addConverter", "java.lang.Object");
        match p.kind {
            PropertyKind::Collection { add_method, item_type } => {
                assert_eq!(add_method, "addConverter");
                assert_eq!(item_type, "java.lang.Object");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }
}

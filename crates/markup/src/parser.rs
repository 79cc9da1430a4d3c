use crate::error::MarkupError;
use roxmltree::{Document, Node};
use xpages_interpreter::{
    ControlFactory, ControlTree, InterpreterError, Location, MarkupParser, NodeId, RawValue,
    XP_NAMESPACE, XPagesObject,
};
use xpages_traits::PageUri;

const PROPERTY_PREFIX: &str = "this.";
const FACETS: &str = "facets";
const FACET_KEY: &str = "key";

/// A [`MarkupParser`] over `roxmltree`.
///
/// Elements become controls and unqualified attributes become properties, in
/// document order. Two element forms are treated specially:
///
/// - `<p:this.NAME>` sets property `NAME` on its parent, either from its text or
///   from the nested objects it contains.
/// - `<p:this.facets>` holds facets, each keyed by its `xp:key` attribute.
#[derive(Debug, Clone)]
pub struct XmlMarkupParser {
    facet_key_namespace: String,
}

impl Default for XmlMarkupParser {
    fn default() -> Self {
        Self {
            facet_key_namespace: XP_NAMESPACE.to_string(),
        }
    }
}

impl XmlMarkupParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads facet keys from `namespace` instead of the core namespace.
    pub fn with_facet_key_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.facet_key_namespace = namespace.into();
        self
    }
}

impl MarkupParser for XmlMarkupParser {
    fn parse(
        &self,
        content: &str,
        uri: Option<&PageUri>,
        factory: &dyn ControlFactory,
    ) -> Result<ControlTree, InterpreterError> {
        let doc = Document::parse(content).map_err(MarkupError::from)?;
        let builder = TreeBuilder {
            doc: &doc,
            uri,
            factory,
            facet_key_namespace: &self.facet_key_namespace,
        };
        let root = doc.root_element();
        let mut tree = ControlTree::new(builder.build_object(root)?);
        builder.attach_children(&mut tree, ControlTree::ROOT, root)?;
        log::debug!(
            "Parsed {} into {} controls",
            uri.map(|u| u.as_str()).unwrap_or("content"),
            tree.len()
        );
        Ok(tree)
    }
}

struct TreeBuilder<'a, 'input> {
    doc: &'a Document<'input>,
    uri: Option<&'a PageUri>,
    factory: &'a dyn ControlFactory,
    facet_key_namespace: &'a str,
}

impl<'a, 'input> TreeBuilder<'a, 'input> {
    fn location(&self, node: Node<'_, '_>) -> Location {
        let pos = self.doc.text_pos_at(node.range().start);
        Location::from((pos.row as usize, pos.col as usize))
    }

    /// Creates the template for `node` and compiles its attributes and property elements.
    fn build_object(&self, node: Node<'_, '_>) -> Result<XPagesObject, InterpreterError> {
        let name = node.tag_name();
        let mut object =
            self.factory
                .create_object(self.uri, name.namespace().unwrap_or(""), name.name())?;

        for attribute in node.attributes() {
            if attribute.namespace().is_some() {
                continue;
            }
            object
                .add_property_from_string(attribute.name(), attribute.value())
                .inspect_err(|_| {
                    log::debug!("Rejected '{}' at {}", attribute.name(), self.location(node))
                })?;
        }

        for child in node.children().filter(Node::is_element) {
            let Some(property) = property_name(child) else {
                continue;
            };
            if property == FACETS {
                continue;
            }
            let nested: Vec<Node<'_, '_>> = child.children().filter(Node::is_element).collect();
            if nested.is_empty() {
                let text: String = child
                    .descendants()
                    .filter(|n| n.is_text())
                    .filter_map(|n| n.text())
                    .collect();
                object.add_property_from_string(property, text.trim())?;
            } else {
                let objects = nested
                    .into_iter()
                    .map(|n| self.build_nested(n, child))
                    .collect::<Result<Vec<_>, _>>()?;
                object.add_property(property, RawValue::Objects(objects))?;
            }
        }
        Ok(object)
    }

    /// A value object inside a property element; it may not contain controls.
    fn build_nested(
        &self,
        node: Node<'_, '_>,
        property: Node<'_, '_>,
    ) -> Result<XPagesObject, InterpreterError> {
        if property_name(node).is_some() {
            return Err(self.unexpected(node, property).into());
        }
        if let Some(control) = node
            .children()
            .find(|c| c.is_element() && property_name(*c).is_none())
        {
            return Err(self.unexpected(control, node).into());
        }
        self.build_object(node)
    }

    /// Adds the controls and facets nested in `node` below `parent`.
    fn attach_children(
        &self,
        tree: &mut ControlTree,
        parent: NodeId,
        node: Node<'_, '_>,
    ) -> Result<(), InterpreterError> {
        for child in node.children() {
            if !child.is_element() {
                if let Some(text) = child.text().map(str::trim).filter(|t| !t.is_empty()) {
                    log::trace!("Ignoring text {:?} at {}", text, self.location(child));
                }
                continue;
            }
            match property_name(child) {
                Some(FACETS) => {
                    for facet in child.children().filter(Node::is_element) {
                        let key = facet
                            .attribute((self.facet_key_namespace, FACET_KEY))
                            .ok_or_else(|| MarkupError::MissingFacetKey {
                                tag: facet.tag_name().name().to_string(),
                                attribute: FACET_KEY.to_string(),
                                location: self.location(facet),
                            })?;
                        let object = self.build_object(facet)?;
                        let id = tree.add_facet(parent, key, object)?;
                        self.attach_children(tree, id, facet)?;
                    }
                }
                Some(_) => {}
                None => {
                    let object = self.build_object(child)?;
                    let id = tree.add_child(parent, object)?;
                    self.attach_children(tree, id, child)?;
                }
            }
        }
        Ok(())
    }

    fn unexpected(&self, node: Node<'_, '_>, parent: Node<'_, '_>) -> MarkupError {
        MarkupError::UnexpectedElement {
            tag: node.tag_name().name().to_string(),
            parent: parent.tag_name().name().to_string(),
            location: self.location(node),
        }
    }
}

/// `NAME` for a `<p:this.NAME>` element.
fn property_name<'n>(node: Node<'n, '_>) -> Option<&'n str> {
    node.tag_name().name().strip_prefix(PROPERTY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use xpages_interpreter::{DefaultControlFactory, ErrorKind, PropertySetter};
    use xpages_traits::{Component, Definition, InMemoryRegistry, Property, PropertyBag, Value};

    fn bag(name: &'static str) -> impl Fn() -> Box<dyn Component> + Send + Sync + 'static {
        move || Box::new(PropertyBag::new(name))
    }

    fn factory() -> DefaultControlFactory {
        let registry = InMemoryRegistry::new();
        registry.register(Definition::builder(XP_NAMESPACE, "view", bag("View")).build());
        registry.register(Definition::builder(XP_NAMESPACE, "panel", bag("Panel")).build());
        registry.register(
            Definition::builder(XP_NAMESPACE, "inputText", bag("Input"))
                .property(Property::simple("value", "java.lang.Object"))
                .property(Property::simple("size", "int"))
                .property(Property::complex("converter", "Converter"))
                .property(Property::collection("validators", "addValidator", "Validator"))
                .build(),
        );
        registry.register(
            Definition::builder(XP_NAMESPACE, "convertNumber", bag("NumberConverter"))
                .property(Property::simple("pattern", "java.lang.String"))
                .build(),
        );
        registry.register(
            Definition::builder(XP_NAMESPACE, "validateRequired", bag("Required"))
                .property(Property::simple("message", "java.lang.String"))
                .build(),
        );
        DefaultControlFactory::new(Arc::new(registry))
    }

    fn parse(content: &str) -> Result<ControlTree, InterpreterError> {
        XmlMarkupParser::new().parse(content, None, &factory())
    }

    #[test]
    fn test_elements_become_controls_in_order() {
        let tree = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core" id="page">
                 <xp:panel id="a"><xp:inputText id="in" size="5"/></xp:panel>
                 <xp:panel id="b"/>
               </xp:view>"#,
        )
        .unwrap();
        let root = tree.root();
        assert_eq!(root.id(), Some("page"));
        let ids: Vec<_> = root.children().map(|c| c.id()).collect();
        assert_eq!(ids, vec![Some("a"), Some("b")]);

        let input = root.children().next().unwrap().children().next().unwrap();
        assert_eq!(input.tag(), "inputText");
        let names: Vec<_> = input.object().setters().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["id", "size"]);
    }

    #[test]
    fn test_property_elements() {
        let tree = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core">
                 <xp:inputText>
                   <xp:this.value>  plain text  </xp:this.value>
                   <xp:this.converter><xp:convertNumber pattern="0.00"/></xp:this.converter>
                   <xp:this.validators>
                     <xp:validateRequired message="one"/>
                     <xp:validateRequired message="two"/>
                   </xp:this.validators>
                 </xp:inputText>
               </xp:view>"#,
        )
        .unwrap();
        let input = tree.root().children().next().unwrap();
        assert_eq!(input.children().count(), 0);

        let setters = input.object().setters();
        assert!(matches!(
            &setters[0],
            PropertySetter::Generic { value: Value::String(s), .. } if s == "plain text"
        ));
        assert!(matches!(&setters[1], PropertySetter::Complex { .. }));
        match &setters[2] {
            PropertySetter::Collection { items, add_method, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(add_method, "addValidator");
            }
            other => panic!("unexpected setter {:?}", other),
        }
    }

    #[test]
    fn test_property_element_text_spans_comments() {
        let tree = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core">
                 <xp:inputText><xp:this.value>Hello <!-- note --> World<?pi x?>!</xp:this.value></xp:inputText>
               </xp:view>"#,
        )
        .unwrap();
        let input = tree.root().children().next().unwrap();
        assert!(matches!(
            &input.object().setters()[0],
            PropertySetter::Generic { value: Value::String(s), .. } if s == "Hello  World!"
        ));
    }

    #[test]
    fn test_facets_are_keyed() {
        let tree = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core">
                 <xp:panel>
                   <xp:this.facets>
                     <xp:panel xp:key="header" id="h"><xp:inputText id="inner"/></xp:panel>
                     <xp:panel xp:key="footer"/>
                   </xp:this.facets>
                   <xp:inputText id="body"/>
                 </xp:panel>
               </xp:view>"#,
        )
        .unwrap();
        let panel = tree.root().children().next().unwrap();
        assert_eq!(panel.children().count(), 1);
        let header = panel.facet("header").unwrap();
        assert_eq!(header.id(), Some("h"));
        assert_eq!(header.children().next().unwrap().id(), Some("inner"));
        assert_eq!(header.parent().unwrap().node_id(), panel.node_id());
        let keys: Vec<_> = panel.facets().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["footer", "header"]);
    }

    #[test]
    fn test_duplicate_and_missing_facet_keys() {
        let err = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core"><xp:this.facets>
                 <xp:panel xp:key="a"/><xp:panel xp:key="a"/>
               </xp:this.facets></xp:view>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core"><xp:this.facets>
                 <xp:panel/>
               </xp:this.facets></xp:view>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, InterpreterError::Parse { location: Some(Location { line: 2, .. }), .. }));
    }

    #[test]
    fn test_controls_inside_value_objects_are_rejected() {
        let err = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core"><xp:inputText><xp:this.converter>
                 <xp:convertNumber><xp:panel/></xp:convertNumber>
               </xp:this.converter></xp:inputText></xp:view>"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("panel"));
    }

    #[test]
    fn test_malformed_xml_reports_location() {
        let err = parse("<xp:view xmlns:xp=\"http://www.ibm.com/xsp/core\">\n<xp:panel>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, InterpreterError::Parse { location: Some(_), .. }));
    }

    #[test]
    fn test_unknown_tag_and_property() {
        let err = parse(r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core"><xp:nope/></xp:view>"#)
            .unwrap_err();
        assert!(matches!(err, InterpreterError::UnknownTag { ref tag, .. } if tag == "nope"));

        let err = parse(
            r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core"><xp:panel colour="red"/></xp:view>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            InterpreterError::UnknownProperty { ref tag, ref property } if tag == "panel" && property == "colour"
        ));
    }

    #[test]
    fn test_uri_reaches_the_factory_security_check() {
        use xpages_interpreter::PolicySecurityManager;
        let factory = factory()
            .with_security_manager(Arc::new(PolicySecurityManager::new().deny_tag("panel")));
        let uri = PageUri::from("/locked.xsp");
        let err = XmlMarkupParser::new()
            .parse(
                r#"<xp:view xmlns:xp="http://www.ibm.com/xsp/core"><xp:panel/></xp:view>"#,
                Some(&uri),
                &factory,
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }
}

//! The template tree.
//!
//! Nodes live in an arena owned by [`ControlTree`]; [`NodeId`]s index into it.
//! Parent links are plain indices used for navigation only. A node is attached
//! exactly once, when it is created as a child or facet, so the tree cannot
//! become cyclic and no node can have two parents.

use crate::context::Context;
use crate::error::InterpreterError;
use crate::object::XPagesObject;
use crate::setter::{LoadedFlag, SetterSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xpages_traits::{Component, ComponentNode};

/// Index of a node inside its [`ControlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct ControlNode {
    object: XPagesObject,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    facets: BTreeMap<String, NodeId>,
}

impl ControlNode {
    fn new(object: XPagesObject, parent: Option<NodeId>) -> Self {
        Self {
            object,
            parent,
            children: Vec::new(),
            facets: BTreeMap::new(),
        }
    }
}

/// An immutable-after-parse tree of templates, rooted at [`ControlTree::ROOT`].
#[derive(Debug, Clone)]
pub struct ControlTree {
    nodes: Vec<ControlNode>,
}

impl ControlTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(root: XPagesObject) -> Self {
        Self {
            nodes: vec![ControlNode::new(root, None)],
        }
    }

    pub fn root(&self) -> Control<'_> {
        Control {
            tree: self,
            id: Self::ROOT,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<Control<'_>> {
        (id.0 < self.nodes.len()).then_some(Control { tree: self, id })
    }

    /// Number of nodes, facets included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends `object` as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        object: XPagesObject,
    ) -> Result<NodeId, InterpreterError> {
        self.node(parent)?;
        let id = self.push(parent, object);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Attaches `object` as the facet `name` of `parent`.
    pub fn add_facet(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        object: XPagesObject,
    ) -> Result<NodeId, InterpreterError> {
        let name = name.into();
        let node = self.node(parent)?;
        if node.facets.contains_key(&name) {
            return Err(InterpreterError::DuplicateFacet {
                tag: node.object.definition().tag_name().to_string(),
                name,
            });
        }
        let id = self.push(parent, object);
        self.nodes[parent.0].facets.insert(name, id);
        Ok(id)
    }

    /// Mutable access to a node's template, for attaching setters while parsing.
    pub fn object_mut(&mut self, id: NodeId) -> Option<&mut XPagesObject> {
        self.nodes.get_mut(id.0).map(|n| &mut n.object)
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        self.root().snapshot()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    fn node(&self, id: NodeId) -> Result<&ControlNode, InterpreterError> {
        self.nodes.get(id.0).ok_or(InterpreterError::ForeignNode(id))
    }

    /// `parent` must already be validated.
    fn push(&mut self, parent: NodeId, object: XPagesObject) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ControlNode::new(object, Some(parent)));
        id
    }
}

/// A borrowed view of one node.
#[derive(Debug, Clone, Copy)]
pub struct Control<'t> {
    tree: &'t ControlTree,
    id: NodeId,
}

impl<'t> Control<'t> {
    fn node(&self) -> &'t ControlNode {
        &self.tree.nodes[self.id.0]
    }

    fn at(&self, id: NodeId) -> Control<'t> {
        Control { tree: self.tree, id }
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// The literal `id` property, if one was set.
    pub fn id(&self) -> Option<&'t str> {
        self.node().object.id()
    }

    pub fn tag(&self) -> &'t str {
        self.node().object.definition().tag_name()
    }

    pub fn object(&self) -> &'t XPagesObject {
        &self.node().object
    }

    pub fn parent(&self) -> Option<Control<'t>> {
        self.node().parent.map(|id| self.at(id))
    }

    pub fn children(self) -> impl Iterator<Item = Control<'t>> {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| Control { tree, id })
    }

    pub fn facet(&self, name: &str) -> Option<Control<'t>> {
        self.node().facets.get(name).map(|&id| self.at(id))
    }

    /// Facets in name order.
    pub fn facets(self) -> impl Iterator<Item = (&'t str, Control<'t>)> {
        let tree = self.tree;
        self.node()
            .facets
            .iter()
            .map(move |(name, &id)| (name.as_str(), Control { tree, id }))
    }

    pub fn is_loaded(&self, ctx: &Context) -> Result<bool, InterpreterError> {
        self.node().object.is_loaded(ctx)
    }

    /// A brand-new component for this node alone, or `None` when not loaded.
    pub fn get_component(
        &self,
        ctx: &Context,
    ) -> Result<Option<Box<dyn Component>>, InterpreterError> {
        self.node().object.get_component(ctx)
    }

    /// Builds this node and its loaded descendants into a live graph.
    pub fn materialize(&self, ctx: &Context) -> Result<Option<ComponentNode>, InterpreterError> {
        let Some(component) = self.get_component(ctx)? else {
            return Ok(None);
        };
        let mut node = ComponentNode::new(component);
        for child in self.children() {
            if let Some(built) = child.materialize(ctx)? {
                node.children.push(built);
            }
        }
        for (name, facet) in self.facets() {
            if let Some(built) = facet.materialize(ctx)? {
                node.facets.insert(name.to_string(), built);
            }
        }
        log::trace!("Materialized '{}' ({} components)", self.tag(), node.count());
        Ok(Some(node))
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let object = self.object();
        ControlSnapshot {
            namespace_uri: object.definition().namespace_uri().to_string(),
            tag: self.tag().to_string(),
            setters: object.setters().iter().map(|s| s.snapshot()).collect(),
            loaded: object.loaded_flag().map(|flag| match flag {
                LoadedFlag::Literal(b) => b.to_string(),
                LoadedFlag::Expression(e) => e.clone(),
            }),
            children: self.children().map(|c| c.snapshot()).collect(),
            facets: self
                .facets()
                .map(|(name, f)| (name.to_string(), f.snapshot()))
                .collect(),
        }
    }
}

/// A serializable description of a tree's shape and compiled setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub namespace_uri: String,
    pub tag: String,
    pub setters: Vec<SetterSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub loaded: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<ControlSnapshot>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub facets: BTreeMap<String, ControlSnapshot>,
}

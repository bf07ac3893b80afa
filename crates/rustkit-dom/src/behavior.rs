//! Element behaviors: the per-element-type hooks the document calls while
//! it mutates the tree.
//!
//! A behavior is attached to an element node when the document creates it
//! through its [`ElementFactory`]. Elements without a registered behavior
//! are plain data nodes.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use html5ever::{LocalName, Namespace, QualName};

use crate::{Document, Node};

/// How a subtree was inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionType {
    /// The inserted subtree is now part of the document tree.
    pub connected_to_document: bool,
}

/// How a subtree was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalType {
    /// The removed subtree was part of the document tree before removal.
    pub disconnected_from_document: bool,
}

/// Result of [`ElementBehavior::inserted_into_ancestor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertedIntoAncestorResult {
    #[default]
    Done,
    /// Call [`ElementBehavior::did_finish_inserting_node`] once the whole
    /// subtree has been inserted.
    NeedsPostInsertionCallback,
}

/// Hooks for an element type. Every method has a no-op default.
///
/// Hooks run while the document is consistent: links, ids and connection
/// state are already updated when they are called, and the document holds
/// no internal borrows, so a hook may query or mutate the document.
pub trait ElementBehavior: Any + fmt::Debug {
    /// An attribute was set (`Some`) or removed (`None`).
    fn parse_attribute(&self, _element: &Rc<Node>, _name: &QualName, _value: Option<&str>) {}

    /// Runs after [`parse_attribute`](Self::parse_attribute) for the same change.
    fn attribute_changed(&self, _element: &Rc<Node>, _document: &Document, _name: &QualName) {}

    /// The element (or one of its ancestors) was inserted under a new parent.
    fn inserted_into_ancestor(
        &self,
        _element: &Rc<Node>,
        _document: &Document,
        _insertion: InsertionType,
    ) -> InsertedIntoAncestorResult {
        InsertedIntoAncestorResult::Done
    }

    /// Post-insertion callback requested by `inserted_into_ancestor`.
    fn did_finish_inserting_node(&self, _element: &Rc<Node>, _document: &Document) {}

    /// The element (or one of its ancestors) was removed from its parent.
    fn removed_from_ancestor(
        &self,
        _element: &Rc<Node>,
        _document: &Document,
        _removal: RemovalType,
    ) {
    }

    /// Resolve (or re-resolve) the element's href target.
    fn build_pending_resource(&self, _element: &Rc<Node>, _document: &Document) {}

    /// A target this element references changed one of its attributes.
    fn referenced_target_changed(
        &self,
        _element: &Rc<Node>,
        _document: &Document,
        _target: &Rc<Node>,
    ) {
    }

    /// Whether the element gets a renderer at all.
    fn renderer_is_needed(&self, _element: &Node) -> bool {
        true
    }

    /// Whether `child` may create a renderer under this element.
    fn child_should_create_renderer(&self, _element: &Node, _child: &Node) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
}

/// Constructor for an element behavior.
pub type ElementConstructor = fn(&QualName) -> Rc<dyn ElementBehavior>;

/// Maps element names to behavior constructors.
#[derive(Debug, Clone, Default)]
pub struct ElementFactory {
    constructors: HashMap<(Namespace, LocalName), ElementConstructor>,
}

impl ElementFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `namespace` + `local` name.
    pub fn register(&mut self, namespace: &str, local: &str, constructor: ElementConstructor) {
        self.constructors.insert(
            (Namespace::from(namespace), LocalName::from(local)),
            constructor,
        );
    }

    /// Whether a constructor is registered for the name.
    pub fn is_registered(&self, name: &QualName) -> bool {
        self.constructors
            .contains_key(&(name.ns.clone(), name.local.clone()))
    }

    /// Create the behavior for an element name, if one is registered.
    pub fn create(&self, name: &QualName) -> Option<Rc<dyn ElementBehavior>> {
        self.constructors
            .get(&(name.ns.clone(), name.local.clone()))
            .map(|constructor| constructor(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{qual_name, SVG_NAMESPACE};

    #[derive(Debug)]
    struct Marker;

    impl ElementBehavior for Marker {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn make_marker(_name: &QualName) -> Rc<dyn ElementBehavior> {
        Rc::new(Marker)
    }

    #[test]
    fn test_factory_lookup_is_namespace_aware() {
        let mut factory = ElementFactory::new();
        factory.register(SVG_NAMESPACE, "textPath", make_marker);

        assert!(factory.is_registered(&qual_name(SVG_NAMESPACE, "textPath")));
        assert!(factory.create(&qual_name(SVG_NAMESPACE, "textPath")).is_some());
        assert!(factory.create(&qual_name("", "textPath")).is_none());
        assert!(factory.create(&qual_name(SVG_NAMESPACE, "textpath")).is_none());
    }

    #[test]
    fn test_default_hooks() {
        let marker = Marker;
        let node = Node::new(crate::NodeId::new(1), crate::NodeType::Text("x".into()));
        assert!(marker.renderer_is_needed(&node));
        assert!(marker.child_should_create_renderer(&node, &node));
    }
}

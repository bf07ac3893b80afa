//! # RustKit DOM
//!
//! DOM implementation for the RustKit browser engine.
//! Uses html5ever for HTML parsing and constructs a traversable DOM tree.
//!
//! ## Design Goals
//!
//! 1. **Standards-compliant parsing**: html5ever implements the HTML5 parsing algorithm,
//!    including foreign (SVG) content with case-adjusted names
//! 2. **Element behaviors**: per-element-type hooks for attribute parsing,
//!    insertion, removal, and resource resolution ([`ElementBehavior`])
//! 3. **Query support**: Element lookup by ID, class, tag name
//! 4. **Mutation support**: Node insertion, removal, attribute modification
//! 5. **Resource tracking**: href targets and pending references ([`ResourceRegistry`])

pub mod behavior;
pub mod document;
pub mod resources;

pub use behavior::{
    ElementBehavior, ElementConstructor, ElementFactory, InsertedIntoAncestorResult,
    InsertionType, RemovalType,
};
pub use document::{Document, QuerySelector};
pub use html5ever::{LocalName, Namespace, Prefix, QualName};
pub use resources::ResourceRegistry;

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};
use thiserror::Error;

/// The HTML namespace.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
/// The SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Errors that can occur in DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Node not found")]
    NodeNotFound,

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<DomError> for rustkit_common::RustKitError {
    fn from(err: DomError) -> Self {
        rustkit_common::RustKitError::dom_with_source("DOM operation failed", err)
    }
}

/// Build a qualified name with no namespace (plain attributes).
pub fn local_attr(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

/// Build a qualified name in the given namespace.
pub fn qual_name(namespace: &str, local: &str) -> QualName {
    QualName::new(None, Namespace::from(namespace), LocalName::from(local))
}

/// Unique identifier for a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// Type of DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    DocumentType {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        name: QualName,
        attributes: RefCell<Vec<Attribute>>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// A DOM node.
#[derive(Debug)]
pub struct Node {
    /// Unique ID for this node.
    pub id: NodeId,
    /// Node type and associated data.
    pub node_type: NodeType,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
    /// Child nodes.
    children: RefCell<Vec<Rc<Node>>>,
    /// Previous sibling.
    prev_sibling: RefCell<Option<Weak<Node>>>,
    /// Next sibling.
    next_sibling: RefCell<Option<Weak<Node>>>,
    /// Whether the node is part of its document's tree.
    connected: Cell<bool>,
    /// Element-type specific behavior, set at creation.
    behavior: Option<Rc<dyn ElementBehavior>>,
}

impl Node {
    /// Create a new node.
    pub fn new(id: NodeId, node_type: NodeType) -> Rc<Self> {
        Self::with_behavior(id, node_type, None)
    }

    pub(crate) fn with_behavior(
        id: NodeId,
        node_type: NodeType,
        behavior: Option<Rc<dyn ElementBehavior>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            id,
            node_type,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            prev_sibling: RefCell::new(None),
            next_sibling: RefCell::new(None),
            connected: Cell::new(false),
            behavior,
        })
    }

    /// Get the qualified name for element nodes.
    pub fn qual_name(&self) -> Option<&QualName> {
        match &self.node_type {
            NodeType::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Get the tag name (local name) for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        self.qual_name().map(|name| &*name.local)
    }

    /// Get the namespace URI for element nodes.
    pub fn namespace(&self) -> Option<&str> {
        self.qual_name().map(|name| &*name.ns)
    }

    /// Check namespace and local name at once.
    pub fn has_tag_name(&self, namespace: &str, local: &str) -> bool {
        self.qual_name()
            .map(|name| &*name.ns == namespace && &*name.local == local)
            .unwrap_or(false)
    }

    /// Get a non-namespaced attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.get_attribute_ns("", name)
    }

    /// Get a namespaced attribute value.
    pub fn get_attribute_ns(&self, namespace: &str, local: &str) -> Option<String> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes
                .borrow()
                .iter()
                .find(|a| &*a.name.ns == namespace && &*a.name.local == local)
                .map(|a| a.value.clone()),
            _ => None,
        }
    }

    /// Borrow all attributes of an element (empty for other nodes).
    pub fn attributes(&self) -> Vec<Attribute> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes.borrow().clone(),
            _ => Vec::new(),
        }
    }

    /// Store an attribute value, returning the previous one.
    pub(crate) fn store_attribute(&self, name: &QualName, value: &str) -> Option<String> {
        let NodeType::Element { attributes, .. } = &self.node_type else {
            return None;
        };
        let mut attributes = attributes.borrow_mut();
        match attributes
            .iter_mut()
            .find(|a| a.name.ns == name.ns && a.name.local == name.local)
        {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value.to_string())),
            None => {
                attributes.push(Attribute {
                    name: name.clone(),
                    value: value.to_string(),
                });
                None
            }
        }
    }

    /// Drop an attribute, returning its value.
    pub(crate) fn take_attribute(&self, name: &QualName) -> Option<String> {
        let NodeType::Element { attributes, .. } = &self.node_type else {
            return None;
        };
        let mut attributes = attributes.borrow_mut();
        let index = attributes
            .iter()
            .position(|a| a.name.ns == name.ns && a.name.local == name.local)?;
        Some(attributes.remove(index).value)
    }

    /// Get the text content.
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        match &self.node_type {
            NodeType::Text(text) => result.push_str(text),
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(result);
                }
            }
        }
    }

    /// Whether this node is part of its document's tree.
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.set(connected);
    }

    /// Element behavior attached at creation, if any.
    pub fn behavior(&self) -> Option<&Rc<dyn ElementBehavior>> {
        self.behavior.as_ref()
    }

    /// Downcast the attached behavior to a concrete element type.
    pub fn behavior_as<T: ElementBehavior>(&self) -> Option<&T> {
        self.behavior
            .as_ref()
            .and_then(|b| b.as_any().downcast_ref::<T>())
    }

    /// Get parent node.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children.borrow().clone()
    }

    /// Borrow the child list without cloning.
    pub fn children_ref(&self) -> Ref<'_, Vec<Rc<Node>>> {
        self.children.borrow()
    }

    /// Get first child.
    pub fn first_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().first().cloned()
    }

    /// Get last child.
    pub fn last_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().last().cloned()
    }

    /// Get previous sibling.
    pub fn previous_sibling(&self) -> Option<Rc<Node>> {
        self.prev_sibling
            .borrow()
            .as_ref()
            .and_then(|w| w.upgrade())
    }

    /// Get next sibling.
    pub fn next_sibling(&self) -> Option<Rc<Node>> {
        self.next_sibling
            .borrow()
            .as_ref()
            .and_then(|w| w.upgrade())
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element { .. })
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.node_type, NodeType::Text(_))
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_inclusive_ancestor_of(&self, other: &Rc<Node>) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.id == self.id {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// This node and all its descendants in tree order.
    pub fn inclusive_descendants(self: &Rc<Self>) -> Vec<Rc<Node>> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            for child in node.children.borrow().iter().rev() {
                stack.push(child.clone());
            }
            out.push(node);
        }
        out
    }

    /// Insert a child before `reference` (or append), fixing sibling links.
    pub(crate) fn link_child(self: &Rc<Self>, child: Rc<Node>, reference: Option<&Rc<Node>>) {
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));

        {
            let mut children = self.children.borrow_mut();
            let index = reference
                .and_then(|r| children.iter().position(|c| c.id == r.id))
                .unwrap_or(children.len());
            children.insert(index, child);
        }

        self.relink_siblings();
    }

    /// Detach a child, fixing sibling links. Returns false if not a child.
    pub(crate) fn unlink_child(&self, child: &Rc<Node>) -> bool {
        let removed = {
            let mut children = self.children.borrow_mut();
            match children.iter().position(|c| c.id == child.id) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            *child.parent.borrow_mut() = None;
            *child.prev_sibling.borrow_mut() = None;
            *child.next_sibling.borrow_mut() = None;
            self.relink_siblings();
        }
        removed
    }

    fn relink_siblings(&self) {
        let children = self.children.borrow();
        for (i, child) in children.iter().enumerate() {
            *child.prev_sibling.borrow_mut() = i
                .checked_sub(1)
                .map(|p| Rc::downgrade(&children[p]));
            *child.next_sibling.borrow_mut() = children.get(i + 1).map(Rc::downgrade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: usize, local: &str) -> Rc<Node> {
        Node::new(
            NodeId::new(id),
            NodeType::Element {
                name: qual_name(SVG_NAMESPACE, local),
                attributes: RefCell::new(Vec::new()),
            },
        )
    }

    #[test]
    fn test_store_and_take_attribute() {
        let node = element(1, "path");
        assert_eq!(node.store_attribute(&local_attr("d"), "M 0 0"), None);
        assert_eq!(
            node.store_attribute(&local_attr("d"), "M 1 1"),
            Some("M 0 0".to_string())
        );
        assert_eq!(node.get_attribute("d"), Some("M 1 1".to_string()));
        assert_eq!(node.take_attribute(&local_attr("d")), Some("M 1 1".to_string()));
        assert_eq!(node.get_attribute("d"), None);
    }

    #[test]
    fn test_namespaced_attributes_are_distinct() {
        let node = element(1, "textPath");
        node.store_attribute(&local_attr("href"), "#a");
        node.store_attribute(&qual_name(XLINK_NAMESPACE, "href"), "#b");
        assert_eq!(node.get_attribute("href"), Some("#a".to_string()));
        assert_eq!(
            node.get_attribute_ns(XLINK_NAMESPACE, "href"),
            Some("#b".to_string())
        );
    }

    #[test]
    fn test_link_and_unlink_keep_siblings() {
        let parent = element(1, "text");
        let a = element(2, "tspan");
        let b = element(3, "tspan");
        let c = element(4, "tspan");

        parent.link_child(a.clone(), None);
        parent.link_child(c.clone(), None);
        parent.link_child(b.clone(), Some(&c));

        assert_eq!(a.next_sibling().map(|n| n.id), Some(b.id));
        assert_eq!(c.previous_sibling().map(|n| n.id), Some(b.id));

        assert!(parent.unlink_child(&b));
        assert_eq!(a.next_sibling().map(|n| n.id), Some(c.id));
        assert!(b.parent().is_none());
        assert!(!parent.unlink_child(&b));
    }

    #[test]
    fn test_inclusive_descendants_tree_order() {
        let root = element(1, "svg");
        let text = element(2, "text");
        let path = element(3, "path");
        let tp = element(4, "textPath");
        root.link_child(text.clone(), None);
        root.link_child(path.clone(), None);
        text.link_child(tp.clone(), None);

        let ids: Vec<usize> = root.inclusive_descendants().iter().map(|n| n.id.raw()).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
        assert!(root.is_inclusive_ancestor_of(&tp));
        assert!(!path.is_inclusive_ancestor_of(&tp));
    }

    #[test]
    fn test_has_tag_name_checks_namespace() {
        let node = element(1, "text");
        assert!(node.has_tag_name(SVG_NAMESPACE, "text"));
        assert!(!node.has_tag_name(HTML_NAMESPACE, "text"));
    }
}

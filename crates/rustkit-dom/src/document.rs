//! The document: node creation, tree mutation, id index, and queries.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::QualName;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::{debug, trace};
use url::Url;

use crate::behavior::{ElementFactory, InsertedIntoAncestorResult, InsertionType, RemovalType};
use crate::resources::ResourceRegistry;
use crate::{local_attr, DomError, Node, NodeId, NodeType, HTML_NAMESPACE};

/// A complete DOM document.
pub struct Document {
    /// Root node of the document.
    root: Rc<Node>,
    /// All live nodes indexed by ID.
    nodes: RefCell<HashMap<NodeId, Weak<Node>>>,
    /// Connected elements indexed by ID attribute.
    elements_by_id: RefCell<HashMap<String, Rc<Node>>>,
    /// Next node ID.
    next_id: Cell<usize>,
    /// Element behaviors by name.
    factory: ElementFactory,
    /// href bookkeeping.
    resources: RefCell<ResourceRegistry>,
    /// Document URL, used to resolve same-document IRIs.
    url: RefCell<Option<Url>>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::with_factory(ElementFactory::new())
    }

    /// Create an empty document whose elements get behaviors from `factory`.
    pub fn with_factory(factory: ElementFactory) -> Self {
        let root = Node::new(NodeId::new(0), NodeType::Document);
        root.set_connected(true);
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::new(0), Rc::downgrade(&root));

        Self {
            root,
            nodes: RefCell::new(nodes),
            elements_by_id: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            factory,
            resources: RefCell::new(ResourceRegistry::new()),
            url: RefCell::new(None),
        }
    }

    /// Parse HTML and create a document.
    pub fn parse_html(html: &str) -> Result<Self, DomError> {
        Self::parse_html_with_factory(html, ElementFactory::new())
    }

    /// Parse HTML, attaching behaviors from `factory` to the created elements.
    pub fn parse_html_with_factory(html: &str, factory: ElementFactory) -> Result<Self, DomError> {
        debug!(len = html.len(), "Parsing HTML");

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| DomError::ParseError(e.to_string()))?;

        let doc = Document::with_factory(factory);
        let root = doc.root.clone();
        doc.convert_rcdom(&dom.document, &root);

        // Connect the parsed tree, running insertion hooks.
        for child in root.children() {
            doc.subtree_did_insert(&child);
        }

        debug!(node_count = doc.nodes.borrow().len(), "HTML parsed");
        Ok(doc)
    }

    fn convert_rcdom(&self, handle: &Handle, parent: &Rc<Node>) {
        for child_handle in handle.children.borrow().iter() {
            let node = match &child_handle.data {
                NodeData::Document => continue, // Skip document node itself
                NodeData::Doctype {
                    name,
                    public_id,
                    system_id,
                } => self.create_node(NodeType::DocumentType {
                    name: name.to_string(),
                    public_id: public_id.to_string(),
                    system_id: system_id.to_string(),
                }),
                NodeData::Element { name, attrs, .. } => {
                    let attributes = attrs
                        .borrow()
                        .iter()
                        .map(|attr| (attr.name.clone(), attr.value.to_string()))
                        .collect();
                    self.create_element_with_attributes(name.clone(), attributes)
                }
                NodeData::Text { contents } => {
                    self.create_node(NodeType::Text(contents.borrow().to_string()))
                }
                NodeData::Comment { contents } => {
                    self.create_node(NodeType::Comment(contents.to_string()))
                }
                NodeData::ProcessingInstruction { target, contents } => {
                    self.create_node(NodeType::ProcessingInstruction {
                        target: target.to_string(),
                        data: contents.to_string(),
                    })
                }
            };

            parent.link_child(node.clone(), None);

            // Recurse for children
            self.convert_rcdom(child_handle, &node);
        }
    }

    fn allocate_id(&self) -> NodeId {
        let id = NodeId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        id
    }

    fn create_node(&self, node_type: NodeType) -> Rc<Node> {
        let node = Node::new(self.allocate_id(), node_type);
        self.nodes.borrow_mut().insert(node.id, Rc::downgrade(&node));
        node
    }

    /// Create a detached element. Its behavior comes from the factory.
    pub fn create_element(&self, name: QualName) -> Rc<Node> {
        self.create_element_with_attributes(name, Vec::new())
    }

    /// Create a detached element with initial attributes.
    ///
    /// Each attribute goes through the behavior's parse hook, exactly as
    /// if it had been set after creation.
    pub fn create_element_with_attributes(
        &self,
        name: QualName,
        attributes: Vec<(QualName, String)>,
    ) -> Rc<Node> {
        let behavior = self.factory.create(&name);
        trace!(element = %name.local, has_behavior = behavior.is_some(), "creating element");

        let node = Node::with_behavior(
            self.allocate_id(),
            NodeType::Element {
                name,
                attributes: RefCell::new(Vec::new()),
            },
            behavior,
        );
        self.nodes.borrow_mut().insert(node.id, Rc::downgrade(&node));

        for (attr_name, value) in attributes {
            node.store_attribute(&attr_name, &value);
            self.attribute_did_change(&node, &attr_name, None, Some(&value));
        }
        node
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, text: &str) -> Rc<Node> {
        self.create_node(NodeType::Text(text.to_string()))
    }

    /// Set the document URL.
    pub fn set_url(&self, url: Url) {
        *self.url.borrow_mut() = Some(url);
    }

    /// Get the document URL.
    pub fn url(&self) -> Option<Url> {
        self.url.borrow().clone()
    }

    /// The resource registry (read access).
    pub fn resources(&self) -> Ref<'_, ResourceRegistry> {
        self.resources.borrow()
    }

    /// The resource registry (write access). Do not hold across DOM calls.
    pub fn resources_mut(&self) -> RefMut<'_, ResourceRegistry> {
        self.resources.borrow_mut()
    }

    // ==================== Mutation ====================

    /// Append `child` to `parent`.
    pub fn append_child(&self, parent: &Rc<Node>, child: Rc<Node>) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or at the end).
    pub fn insert_before(
        &self,
        parent: &Rc<Node>,
        child: Rc<Node>,
        reference: Option<&Rc<Node>>,
    ) -> Result<(), DomError> {
        if child.is_inclusive_ancestor_of(parent) {
            return Err(DomError::HierarchyRequest(
                "cannot insert a node into its own subtree".into(),
            ));
        }
        if matches!(child.node_type, NodeType::Document) {
            return Err(DomError::HierarchyRequest(
                "cannot insert a document node".into(),
            ));
        }
        if let Some(reference) = reference {
            let is_child = reference
                .parent()
                .map(|p| p.id == parent.id)
                .unwrap_or(false);
            if !is_child {
                return Err(DomError::NodeNotFound);
            }
        }

        // Inserting a node before itself keeps it in place.
        let reference = match reference {
            Some(r) if r.id == child.id => child.next_sibling(),
            other => other.cloned(),
        };

        if let Some(old_parent) = child.parent() {
            self.remove_child(&old_parent, &child)?;
        }

        parent.link_child(child.clone(), reference.as_ref());

        if parent.is_connected() {
            self.subtree_did_insert(&child);
        } else {
            self.run_insertion_hooks(&child, false);
        }
        Ok(())
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&self, parent: &Rc<Node>, child: &Rc<Node>) -> Result<Rc<Node>, DomError> {
        if !parent.unlink_child(child) {
            return Err(DomError::NodeNotFound);
        }

        let was_connected = child.is_connected();
        let subtree = child.inclusive_descendants();
        let mut orphaned_referrers = Vec::new();

        if was_connected {
            for node in &subtree {
                node.set_connected(false);
                if let Some(id) = node.get_attribute("id") {
                    self.unregister_id(&id, node);
                }
                let mut resources = self.resources.borrow_mut();
                resources.remove_element_from_pending_resources(node);
                orphaned_referrers.extend(resources.take_referencing_elements(node));
            }
        }

        let removal = RemovalType {
            disconnected_from_document: was_connected,
        };
        for node in &subtree {
            if let Some(behavior) = node.behavior() {
                behavior.removed_from_ancestor(node, self, removal);
            }
        }

        // Referrers outside the removed subtree lost their target.
        for referrer in orphaned_referrers {
            if referrer.is_connected() {
                if let Some(behavior) = referrer.behavior() {
                    behavior.build_pending_resource(&referrer, self);
                }
            }
        }

        self.prune_dead_nodes();
        trace!(node = child.id.raw(), was_connected, "node removed");
        Ok(child.clone())
    }

    /// Set a non-namespaced attribute.
    pub fn set_attribute(&self, element: &Rc<Node>, name: &str, value: &str) -> Result<(), DomError> {
        self.set_attribute_ns(element, &local_attr(name), value)
    }

    /// Set an attribute by qualified name.
    pub fn set_attribute_ns(
        &self,
        element: &Rc<Node>,
        name: &QualName,
        value: &str,
    ) -> Result<(), DomError> {
        if !element.is_element() {
            return Err(DomError::InvalidOperation(
                "attributes can only be set on elements".into(),
            ));
        }
        let old = element.store_attribute(name, value);
        if old.as_deref() == Some(value) {
            return Ok(());
        }
        self.attribute_did_change(element, name, old.as_deref(), Some(value));
        Ok(())
    }

    /// Remove an attribute by qualified name. Removing a missing attribute is a no-op.
    pub fn remove_attribute(&self, element: &Rc<Node>, name: &QualName) -> Result<(), DomError> {
        if !element.is_element() {
            return Err(DomError::InvalidOperation(
                "attributes can only be removed from elements".into(),
            ));
        }
        if let Some(old) = element.take_attribute(name) {
            self.attribute_did_change(element, name, Some(&old), None);
        }
        Ok(())
    }

    fn attribute_did_change(
        &self,
        element: &Rc<Node>,
        name: &QualName,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        let is_id = name.ns.is_empty() && &*name.local == "id";
        if is_id && element.is_connected() {
            if let Some(old_id) = old {
                self.unregister_id(old_id, element);
                // Referrers resolved the old id; let them re-resolve.
                let referrers = self.resources.borrow_mut().take_referencing_elements(element);
                for referrer in referrers {
                    if let Some(behavior) = referrer.behavior() {
                        behavior.build_pending_resource(&referrer, self);
                    }
                }
            }
            if let Some(new_id) = new {
                self.register_id(new_id, element);
                self.resolve_pending_resources(new_id);
            }
        }

        if let Some(behavior) = element.behavior() {
            behavior.parse_attribute(element, name, new);
            behavior.attribute_changed(element, self, name);
        }

        if element.is_connected() {
            let referrers = self.resources.borrow().referencing_elements(element);
            for referrer in referrers {
                if let Some(behavior) = referrer.behavior() {
                    behavior.referenced_target_changed(&referrer, self, element);
                }
            }
        }
    }

    /// Connect a freshly linked subtree and run its insertion hooks.
    fn subtree_did_insert(&self, child: &Rc<Node>) {
        let subtree = child.inclusive_descendants();
        let mut new_ids = Vec::new();
        for node in &subtree {
            node.set_connected(true);
            if let Some(id) = node.get_attribute("id") {
                self.register_id(&id, node);
                new_ids.push(id);
            }
        }

        self.run_insertion_hooks(child, true);

        for id in new_ids {
            self.resolve_pending_resources(&id);
        }
    }

    fn run_insertion_hooks(&self, child: &Rc<Node>, connected: bool) {
        let insertion = InsertionType {
            connected_to_document: connected,
        };
        let mut post_insertion = Vec::new();
        for node in child.inclusive_descendants() {
            if let Some(behavior) = node.behavior() {
                if behavior.inserted_into_ancestor(&node, self, insertion)
                    == InsertedIntoAncestorResult::NeedsPostInsertionCallback
                {
                    post_insertion.push(node.clone());
                }
            }
        }
        for node in post_insertion {
            if let Some(behavior) = node.behavior() {
                behavior.did_finish_inserting_node(&node, self);
            }
        }
    }

    fn resolve_pending_resources(&self, id: &str) {
        let clients = self.resources.borrow_mut().take_pending_resources(id);
        for client in clients {
            trace!(id, element = client.id.raw(), "resolving pending resource");
            if let Some(behavior) = client.behavior() {
                behavior.build_pending_resource(&client, self);
            }
        }
    }

    fn register_id(&self, id: &str, element: &Rc<Node>) {
        if id.is_empty() {
            return;
        }
        // First element in tree order wins.
        let mut by_id = self.elements_by_id.borrow_mut();
        match by_id.get(id) {
            Some(existing) if existing.is_connected() && existing.id != element.id => {
                if self.precedes(element, existing) {
                    by_id.insert(id.to_string(), element.clone());
                }
            }
            _ => {
                by_id.insert(id.to_string(), element.clone());
            }
        }
    }

    fn unregister_id(&self, id: &str, element: &Rc<Node>) {
        let is_registered = self
            .elements_by_id
            .borrow()
            .get(id)
            .map(|n| n.id == element.id)
            .unwrap_or(false);
        if !is_registered {
            return;
        }
        self.elements_by_id.borrow_mut().remove(id);

        // Another connected element may carry the same id.
        let mut replacement = None;
        self.traverse(|node| {
            if replacement.is_none()
                && node.id != element.id
                && node.get_attribute("id").as_deref() == Some(id)
            {
                replacement = Some(node.clone());
            }
        });
        if let Some(node) = replacement {
            self.elements_by_id.borrow_mut().insert(id.to_string(), node);
        }
    }

    /// Whether `a` comes before `b` in tree order.
    fn precedes(&self, a: &Rc<Node>, b: &Rc<Node>) -> bool {
        let mut result = None;
        self.traverse(|node| {
            if result.is_none() {
                if node.id == a.id {
                    result = Some(true);
                } else if node.id == b.id {
                    result = Some(false);
                }
            }
        });
        result.unwrap_or(false)
    }

    // ==================== Queries ====================

    /// Get the document root.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// Get the document element (<html>).
    pub fn document_element(&self) -> Option<Rc<Node>> {
        self.root.children().into_iter().find(|n| n.is_element())
    }

    /// Get the <body> element.
    pub fn body(&self) -> Option<Rc<Node>> {
        self.document_element()?
            .children()
            .into_iter()
            .find(|n| n.has_tag_name(HTML_NAMESPACE, "body"))
    }

    /// Get a connected element by ID.
    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Node>> {
        self.elements_by_id.borrow().get(id).cloned()
    }

    /// Get connected elements by local tag name (case-insensitive).
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<Rc<Node>> {
        let tag_name_lower = tag_name.to_lowercase();
        let mut found = Vec::new();
        self.traverse(|n| {
            if n.tag_name()
                .map(|t| t.to_lowercase() == tag_name_lower)
                .unwrap_or(false)
            {
                found.push(n.clone());
            }
        });
        found
    }

    /// Get connected elements by class name.
    pub fn get_elements_by_class_name(&self, class_name: &str) -> Vec<Rc<Node>> {
        let mut found = Vec::new();
        self.traverse(|n| {
            if n.get_attribute("class")
                .map(|c| c.split_whitespace().any(|cls| cls == class_name))
                .unwrap_or(false)
            {
                found.push(n.clone());
            }
        });
        found
    }

    /// Get a live node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<Rc<Node>> {
        self.nodes.borrow().get(&id).and_then(Weak::upgrade)
    }

    /// Number of live nodes created by this document.
    pub fn live_node_count(&self) -> usize {
        self.prune_dead_nodes();
        self.nodes.borrow().len()
    }

    /// Drop index entries for nodes that no longer exist.
    fn prune_dead_nodes(&self) {
        self.nodes.borrow_mut().retain(|_, node| node.strong_count() > 0);
    }

    /// Traverse all connected nodes depth-first.
    pub fn traverse<F>(&self, mut callback: F)
    where
        F: FnMut(&Rc<Node>),
    {
        self.traverse_node(&self.root, &mut callback);
    }

    #[allow(clippy::only_used_in_recursion)]
    fn traverse_node<F>(&self, node: &Rc<Node>, callback: &mut F)
    where
        F: FnMut(&Rc<Node>),
    {
        callback(node);
        for child in node.children() {
            self.traverse_node(&child, callback);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.borrow().len())
            .field("ids", &self.elements_by_id.borrow().len())
            .field("url", &self.url.borrow())
            .finish()
    }
}

/// Query selector support (basic).
pub struct QuerySelector;

impl QuerySelector {
    /// Select elements matching a simple selector.
    /// Supports: tag, #id, .class
    pub fn select(doc: &Document, selector: &str) -> Vec<Rc<Node>> {
        let selector = selector.trim();

        if let Some(id) = selector.strip_prefix('#') {
            // ID selector
            doc.get_element_by_id(id).into_iter().collect()
        } else if let Some(class) = selector.strip_prefix('.') {
            // Class selector
            doc.get_elements_by_class_name(class)
        } else {
            // Tag selector
            doc.get_elements_by_tag_name(selector)
        }
    }
}

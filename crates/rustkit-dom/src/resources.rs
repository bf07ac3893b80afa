//! Resource reference bookkeeping.
//!
//! Elements that reference another element by IRI (`href="#id"`) register
//! here. A reference whose target id does not exist yet is *pending*; the
//! document resolves it as soon as an element with that id is connected.
//! Resolved references are tracked per target so the referrers can be
//! invalidated when the target changes or leaves the document.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::{Node, NodeId};

/// Pending and resolved href references for one document.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    /// Target id -> elements waiting for it.
    pending: HashMap<String, Vec<Weak<Node>>>,
    /// Target node -> elements referencing it.
    referrers: HashMap<NodeId, Vec<Weak<Node>>>,
    /// Referencing element -> targets it references.
    targets: HashMap<NodeId, Vec<NodeId>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` as waiting for an element with `id`.
    pub fn add_pending_resource(&mut self, id: &str, element: &Rc<Node>) {
        if self.is_pending_resource(element, id) {
            return;
        }
        trace!(id, element = element.id.raw(), "pending resource added");
        self.pending
            .entry(id.to_string())
            .or_default()
            .push(Rc::downgrade(element));
    }

    /// Whether `element` is waiting for `id`.
    pub fn is_pending_resource(&self, element: &Node, id: &str) -> bool {
        self.pending
            .get(id)
            .map(|clients| contains(clients, element.id))
            .unwrap_or(false)
    }

    /// Whether `element` is waiting for any id.
    pub fn has_pending_resources(&self, element: &Node) -> bool {
        self.pending
            .values()
            .any(|clients| contains(clients, element.id))
    }

    /// Whether anything waits for `id`.
    pub fn has_pending_resources_for_id(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Remove and return every live element waiting for `id`.
    pub fn take_pending_resources(&mut self, id: &str) -> Vec<Rc<Node>> {
        self.pending
            .remove(id)
            .unwrap_or_default()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Forget every pending registration of `element`.
    pub fn remove_element_from_pending_resources(&mut self, element: &Node) {
        for clients in self.pending.values_mut() {
            clients.retain(|w| w.upgrade().is_some_and(|n| n.id != element.id));
        }
        self.pending.retain(|_, clients| !clients.is_empty());
    }

    /// Record that `referrer` resolved its href to `target`.
    pub fn add_element_referencing_target(&mut self, referrer: &Rc<Node>, target: &Rc<Node>) {
        let clients = self.referrers.entry(target.id).or_default();
        if !contains(clients, referrer.id) {
            clients.push(Rc::downgrade(referrer));
        }
        let targets = self.targets.entry(referrer.id).or_default();
        if !targets.contains(&target.id) {
            targets.push(target.id);
        }
    }

    /// Drop every resolved reference held by `referrer`.
    pub fn remove_all_target_references_for_element(&mut self, referrer: &Node) {
        let Some(targets) = self.targets.remove(&referrer.id) else {
            return;
        };
        for target in targets {
            if let Some(clients) = self.referrers.get_mut(&target) {
                clients.retain(|w| w.upgrade().is_some_and(|n| n.id != referrer.id));
                if clients.is_empty() {
                    self.referrers.remove(&target);
                }
            }
        }
    }

    /// Live elements referencing `target`.
    pub fn referencing_elements(&self, target: &Node) -> Vec<Rc<Node>> {
        self.referrers
            .get(&target.id)
            .map(|clients| clients.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// Targets `referrer` currently references.
    pub fn referenced_targets(&self, referrer: &Node) -> Vec<NodeId> {
        self.targets.get(&referrer.id).cloned().unwrap_or_default()
    }

    /// Remove every reference to `target`, returning the live referrers.
    pub fn take_referencing_elements(&mut self, target: &Node) -> Vec<Rc<Node>> {
        let clients: Vec<Rc<Node>> = self
            .referrers
            .remove(&target.id)
            .unwrap_or_default()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for client in &clients {
            if let Some(targets) = self.targets.get_mut(&client.id) {
                targets.retain(|t| *t != target.id);
                if targets.is_empty() {
                    self.targets.remove(&client.id);
                }
            }
        }
        clients
    }
}

fn contains(clients: &[Weak<Node>], id: NodeId) -> bool {
    clients
        .iter()
        .any(|w| w.upgrade().is_some_and(|n| n.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;

    fn node(id: usize) -> Rc<Node> {
        Node::new(NodeId::new(id), NodeType::Comment(String::new()))
    }

    #[test]
    fn test_pending_registration_is_idempotent() {
        let mut registry = ResourceRegistry::new();
        let a = node(1);
        registry.add_pending_resource("p", &a);
        registry.add_pending_resource("p", &a);

        assert!(registry.is_pending_resource(&a, "p"));
        assert!(!registry.is_pending_resource(&a, "q"));
        assert_eq!(registry.take_pending_resources("p").len(), 1);
        assert!(!registry.has_pending_resources(&a));
    }

    #[test]
    fn test_dropped_elements_are_not_returned() {
        let mut registry = ResourceRegistry::new();
        let a = node(1);
        registry.add_pending_resource("p", &a);
        drop(a);
        assert!(registry.take_pending_resources("p").is_empty());
    }

    #[test]
    fn test_remove_from_pending() {
        let mut registry = ResourceRegistry::new();
        let a = node(1);
        let b = node(2);
        registry.add_pending_resource("p", &a);
        registry.add_pending_resource("p", &b);
        registry.remove_element_from_pending_resources(&a);

        assert!(!registry.has_pending_resources(&a));
        assert!(registry.has_pending_resources(&b));
        assert!(registry.has_pending_resources_for_id("p"));
    }

    #[test]
    fn test_target_references() {
        let mut registry = ResourceRegistry::new();
        let referrer = node(1);
        let target = node(2);

        registry.add_element_referencing_target(&referrer, &target);
        registry.add_element_referencing_target(&referrer, &target);
        assert_eq!(registry.referencing_elements(&target).len(), 1);
        assert_eq!(registry.referenced_targets(&referrer), vec![target.id]);

        registry.remove_all_target_references_for_element(&referrer);
        assert!(registry.referencing_elements(&target).is_empty());
        assert!(registry.referenced_targets(&referrer).is_empty());
    }

    #[test]
    fn test_take_referencing_elements_clears_both_sides() {
        let mut registry = ResourceRegistry::new();
        let referrer = node(1);
        let target = node(2);
        registry.add_element_referencing_target(&referrer, &target);

        let taken = registry.take_referencing_elements(&target);
        assert_eq!(taken.len(), 1);
        assert!(registry.referenced_targets(&referrer).is_empty());
    }
}

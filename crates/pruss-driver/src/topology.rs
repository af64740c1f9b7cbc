// SPDX-License-Identifier: AGPL-3.0-only

//! Hardware description seen by the arbiter
//!
//! The arbiter never walks a device tree itself. It asks a [`HwTopology`]
//! four questions: which node a client's dependency points to, whether that
//! node is enabled, which child of an instance carries a given label, and
//! which core object (if any) has been bound to a node.
//!
//! [`DeviceTree`] is an in-memory implementation used by tests, the CLI
//! simulator, and integrations that build their description at runtime.

use crate::cores::CoreHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity of a node in the hardware description.
///
/// For [`DeviceTree`] this is the node's index, so every node ever added
/// has a distinct id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Property naming the PRU-ICSS instance a client depends on.
pub const PRUSS_PROPERTY: &str = "pruss";

/// Questions the arbiter asks about the hardware description.
pub trait HwTopology: Send + Sync {
    /// Node referenced by `property` of `client`, if the link exists.
    fn dependency(&self, client: NodeId, property: &str) -> Option<NodeId>;

    /// Whether `node` is enabled.
    fn is_available(&self, node: NodeId) -> bool;

    /// Child of `parent` carrying `label`.
    fn child_by_label(&self, parent: NodeId, label: &str) -> Option<NodeId>;

    /// Core object bound to `node`, once that core has registered.
    fn bound_core(&self, node: NodeId) -> Option<CoreHandle>;
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    label: Option<String>,
    available: bool,
    links: HashMap<String, NodeId>,
    core: Option<CoreHandle>,
}

/// In-memory hardware description.
#[derive(Debug, Default)]
pub struct DeviceTree {
    nodes: Mutex<Vec<Node>>,
}

impl DeviceTree {
    /// Create an empty description
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add an enabled node
    pub fn add_node(&self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        let mut nodes = self.nodes.lock();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            name: name.into(),
            parent,
            label: None,
            available: true,
            links: HashMap::new(),
            core: None,
        });
        id
    }

    /// Add an enabled child node tagged with `label`
    pub fn add_labeled_child(
        &self,
        parent: NodeId,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> NodeId {
        let id = self.add_node(name, Some(parent));
        self.with_node(id, |node| node.label = Some(label.into()));
        id
    }

    /// Point `property` of `client` at `target`
    pub fn link(&self, client: NodeId, property: impl Into<String>, target: NodeId) {
        self.with_node(client, |node| {
            node.links.insert(property.into(), target);
        });
    }

    /// Enable or disable a node
    pub fn set_available(&self, node: NodeId, available: bool) {
        self.with_node(node, |n| n.available = available);
    }

    /// Bind a core object to a node, replacing any previous binding
    pub fn bind_core(&self, node: NodeId, core: CoreHandle) {
        self.with_node(node, |n| n.core = Some(core));
    }

    /// Remove the core object bound to a node
    pub fn unbind_core(&self, node: NodeId) -> Option<CoreHandle> {
        self.with_node(node, |n| n.core.take()).flatten()
    }

    /// Node name, if the node exists
    pub fn name(&self, node: NodeId) -> Option<String> {
        self.with_node(node, |n| n.name.clone())
    }

    /// Children of `parent` in insertion order
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.lock();
        (0..nodes.len())
            .filter(|&i| nodes[i].parent == Some(parent))
            .map(NodeId)
            .collect()
    }

    fn with_node<R>(&self, node: NodeId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        let mut nodes = self.nodes.lock();
        nodes.get_mut(node.0).map(f)
    }
}

impl HwTopology for DeviceTree {
    fn dependency(&self, client: NodeId, property: &str) -> Option<NodeId> {
        let nodes = self.nodes.lock();
        let target = *nodes.get(client.0)?.links.get(property)?;
        // a dangling link resolves to nothing
        nodes.get(target.0).map(|_| target)
    }

    fn is_available(&self, node: NodeId) -> bool {
        self.nodes
            .lock()
            .get(node.0)
            .is_some_and(|n| n.available)
    }

    fn child_by_label(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        let nodes = self.nodes.lock();
        nodes
            .iter()
            .position(|n| n.parent == Some(parent) && n.label.as_deref() == Some(label))
            .map(NodeId)
    }

    fn bound_core(&self, node: NodeId) -> Option<CoreHandle> {
        self.nodes.lock().get(node.0)?.core.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cores::PruCore;
    use pruss_chip::pru::PruId;

    #[test]
    fn labels_are_scoped_to_parent() {
        let dt = DeviceTree::new();
        let a = dt.add_node("pruss-a", None);
        let b = dt.add_node("pruss-b", None);
        let a0 = dt.add_labeled_child(a, "a.pru0", "pru0");
        let b0 = dt.add_labeled_child(b, "b.pru0", "pru0");

        assert_eq!(dt.child_by_label(a, "pru0"), Some(a0));
        assert_eq!(dt.child_by_label(b, "pru0"), Some(b0));
        assert_eq!(dt.child_by_label(a, "pru1"), None);
        assert_eq!(dt.children(a), vec![a0]);
    }

    #[test]
    fn dependency_follows_links_only() {
        let dt = DeviceTree::new();
        let pruss = dt.add_node("pruss", None);
        let client = dt.add_node("client", None);
        assert_eq!(dt.dependency(client, PRUSS_PROPERTY), None);

        dt.link(client, PRUSS_PROPERTY, pruss);
        assert_eq!(dt.dependency(client, PRUSS_PROPERTY), Some(pruss));
        assert_eq!(dt.dependency(client, "other"), None);
    }

    #[test]
    fn bound_core_is_shared_not_moved() {
        let dt = DeviceTree::new();
        let pruss = dt.add_node("pruss", None);
        let child = dt.add_labeled_child(pruss, "pru0", "pru0");
        let core = PruCore::new("pru0", PruId::Pru0);

        dt.bind_core(child, Arc::clone(&core));
        let found = dt.bound_core(child).unwrap();
        assert!(Arc::ptr_eq(&found, &core));

        assert!(dt.unbind_core(child).is_some());
        assert!(dt.bound_core(child).is_none());
    }

    #[test]
    fn every_added_node_gets_its_own_id() {
        let dt = DeviceTree::new();
        let root = dt.add_node("root", None);
        let ids: Vec<NodeId> = (0..1000)
            .map(|i| dt.add_node(format!("n{i}"), Some(root)))
            .collect();

        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
        assert!(!ids.contains(&root));
        assert_eq!(dt.children(root), ids);
        assert_eq!(dt.name(ids[999]).as_deref(), Some("n999"));
        assert_eq!(dt.name(NodeId(5000)), None);
    }

    #[test]
    fn disabled_nodes_are_unavailable() {
        let dt = DeviceTree::new();
        let node = dt.add_node("pruss", None);
        assert!(dt.is_available(node));
        dt.set_available(node, false);
        assert!(!dt.is_available(node));
        assert!(!dt.is_available(NodeId(99)));
    }
}

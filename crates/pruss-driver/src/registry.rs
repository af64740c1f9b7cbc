// SPDX-License-Identifier: AGPL-3.0-only

//! Process-wide registry of attached PRU-ICSS instances
//!
//! Created once when the subsystem starts and passed by reference to
//! everything that attaches instances or resolves them for clients.
//!
//! Clients resolve the instance named by their `pruss` dependency with
//! [`PrussRegistry::get`]. Each successful `get` hands out a counted
//! reference (an `Arc` clone) that keeps the instance's windows mapped;
//! [`PrussRegistry::put`] gives it back.

use crate::error::{PrussError, Result};
use crate::pruss::Pruss;
use crate::topology::{HwTopology, NodeId, PRUSS_PROPERTY};
use parking_lot::Mutex;
use std::sync::Arc;

/// Registry of attached instances
#[derive(Debug, Default)]
pub struct PrussRegistry {
    instances: Mutex<Vec<Arc<Pruss>>>,
}

impl PrussRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attached instance
    pub fn register(&self, pruss: Arc<Pruss>) {
        let (id, node) = (pruss.id(), pruss.node());
        let count = {
            let mut instances = self.instances.lock();
            instances.push(pruss);
            instances.len()
        };
        tracing::info!("Registered pruss{} ({}), {} instance(s)", id, node, count);
    }

    /// Remove an instance by identity.
    ///
    /// The instance must have no outstanding core or region reservations.
    /// Returns false if it was not registered.
    pub fn deregister(&self, pruss: &Arc<Pruss>) -> bool {
        if pruss.has_reservations() {
            tracing::warn!("pruss{} deregistered with reservations outstanding", pruss.id());
        }

        let removed = {
            let mut instances = self.instances.lock();
            let before = instances.len();
            instances.retain(|p| !Arc::ptr_eq(p, pruss));
            before != instances.len()
        };

        if removed {
            tracing::info!("Deregistered pruss{} ({})", pruss.id(), pruss.node());
        }
        removed
    }

    /// Resolve the instance a client depends on.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the client has no `pruss` link or the linked node is
    ///   disabled: the instance is never going to show up
    /// - `NotReady` if the node is valid but no instance has registered for
    ///   it yet
    pub fn get(&self, topology: &dyn HwTopology, client: NodeId) -> Result<Arc<Pruss>> {
        let node = topology
            .dependency(client, PRUSS_PROPERTY)
            .filter(|&node| topology.is_available(node))
            .ok_or_else(|| {
                PrussError::not_found(format!("{client} has no available {PRUSS_PROPERTY} link"))
            })?;

        let found = self
            .instances
            .lock()
            .iter()
            .find(|p| p.node() == node)
            .cloned();

        match found {
            Some(pruss) => {
                tracing::debug!("{client} -> pruss{}", pruss.id());
                Ok(pruss)
            }
            None => Err(PrussError::not_ready(format!("no instance registered for {node}"))),
        }
    }

    /// Give back a reference obtained from [`PrussRegistry::get`]
    pub fn put(&self, pruss: Arc<Pruss>) {
        tracing::debug!("put pruss{}", pruss.id());
        drop(pruss);
    }

    /// Number of outstanding references to an instance, the registry's
    /// own included
    #[must_use]
    pub fn ref_count(pruss: &Arc<Pruss>) -> usize {
        Arc::strong_count(pruss)
    }

    /// Whether `pruss` is registered
    #[must_use]
    pub fn contains(&self, pruss: &Arc<Pruss>) -> bool {
        self.instances.lock().iter().any(|p| Arc::ptr_eq(p, pruss))
    }

    /// Number of registered instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Whether no instance is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    /// Snapshot of the registered instances
    #[must_use]
    pub fn instances(&self) -> Vec<Arc<Pruss>> {
        self.instances.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmio::SoftwareMapper;
    use crate::pruss::InstanceConfig;
    use crate::topology::DeviceTree;
    use pruss_chip::mem::MemKind;

    fn pruss(dt: &Arc<DeviceTree>, node: NodeId, id: u32) -> Arc<Pruss> {
        let config = InstanceConfig::new(id, node).with_resource(MemKind::Cfg, 0x2_6000, 0x2000);
        Pruss::new(&config, Arc::clone(dt) as Arc<dyn HwTopology>, &SoftwareMapper).unwrap()
    }

    #[test]
    fn get_counts_references() {
        let dt = DeviceTree::new();
        let node = dt.add_node("pruss", None);
        let client = dt.add_node("client", None);
        dt.link(client, PRUSS_PROPERTY, node);

        let registry = PrussRegistry::new();
        let instance = pruss(&dt, node, 0);
        registry.register(Arc::clone(&instance));
        assert_eq!(PrussRegistry::ref_count(&instance), 2);

        let got = registry.get(dt.as_ref(), client).unwrap();
        assert!(Arc::ptr_eq(&got, &instance));
        assert_eq!(PrussRegistry::ref_count(&instance), 3);

        registry.put(got);
        assert_eq!(PrussRegistry::ref_count(&instance), 2);
    }

    #[test]
    fn disabled_or_missing_dependency_is_not_found() {
        let dt = DeviceTree::new();
        let node = dt.add_node("pruss", None);
        let linked = dt.add_node("client", None);
        let unlinked = dt.add_node("other", None);
        dt.link(linked, PRUSS_PROPERTY, node);

        let registry = PrussRegistry::new();
        registry.register(pruss(&dt, node, 0));

        let err = registry.get(dt.as_ref(), unlinked).unwrap_err();
        assert!(matches!(err, PrussError::NotFound { .. }));

        dt.set_available(node, false);
        let err = registry.get(dt.as_ref(), linked).unwrap_err();
        assert!(matches!(err, PrussError::NotFound { .. }));
    }

    #[test]
    fn lookup_picks_the_linked_instance() {
        let dt = DeviceTree::new();
        let a = dt.add_node("pruss1", None);
        let b = dt.add_node("pruss2", None);
        let client = dt.add_node("client", None);
        dt.link(client, PRUSS_PROPERTY, b);

        let registry = PrussRegistry::new();
        registry.register(pruss(&dt, a, 1));
        registry.register(pruss(&dt, b, 2));
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.get(dt.as_ref(), client).unwrap().id(), 2);
    }

    #[test]
    fn deregister_is_by_identity() {
        let dt = DeviceTree::new();
        let node = dt.add_node("pruss", None);
        let registry = PrussRegistry::new();
        let first = pruss(&dt, node, 0);
        let twin = pruss(&dt, node, 0);

        registry.register(Arc::clone(&first));
        assert!(!registry.deregister(&twin));
        assert!(registry.contains(&first));
        assert!(registry.deregister(&first));
        assert!(registry.is_empty());
    }
}

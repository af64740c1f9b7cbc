//! Shared fixtures for the integration tests

#![allow(dead_code)]

use pruss_driver::prelude::*;
use pruss_driver::{attach, InstanceConfig, PlatformDevice, PruCore, SoftwareMapper};
use pruss_driver::chip::mem::AM335X_LAYOUT;
use std::sync::Arc;

/// A hardware description with one AM335x PRU-ICSS, its two PRU children,
/// and one client node linked to it.
pub struct Am335x {
    pub tree: Arc<DeviceTree>,
    pub pruss_node: NodeId,
    pub pru_nodes: [NodeId; 2],
    pub client: NodeId,
}

impl Am335x {
    pub fn describe() -> Self {
        let tree = DeviceTree::new();
        let pruss_node = tree.add_node("4a300000.pruss", None);
        let pru0 = tree.add_labeled_child(pruss_node, "4a334000.pru0", "pru0");
        let pru1 = tree.add_labeled_child(pruss_node, "4a338000.pru1", "pru1");
        let client = tree.add_node("ethernet@0", None);
        tree.link(client, pruss_driver::PRUSS_PROPERTY, pruss_node);
        Self {
            tree,
            pruss_node,
            pru_nodes: [pru0, pru1],
            client,
        }
    }

    pub fn device(&self) -> PlatformDevice {
        let mut device = PlatformDevice::new(self.pruss_node, "ti,am3356-pruss", "4a300000.pruss");
        for w in AM335X_LAYOUT {
            device = device.with_resource(w.kind.resource_name(), 0x4a30_0000 + w.offset, w.size);
        }
        device
    }

    pub fn topology(&self) -> Arc<dyn HwTopology> {
        Arc::clone(&self.tree) as Arc<dyn HwTopology>
    }

    /// Attach through the SoC table, binding both cores.
    pub fn attach(&self, registry: &PrussRegistry) -> Arc<Pruss> {
        attach(
            registry,
            self.topology(),
            &SoftwareMapper,
            self.tree.as_ref(),
            &self.device(),
        )
        .expect("attach")
    }

    /// Bind fresh core objects to both PRU children without attaching.
    pub fn bind_cores(&self) {
        for pru in PruId::ALL {
            self.tree.bind_core(
                self.pru_nodes[pru.index()],
                PruCore::new(format!("core.{}", pru.label()), pru),
            );
        }
    }
}

/// Instance "P0": two core slots, DRAM0 at 0x1000 (8 KB), DRAM1, CFG.
pub fn p0(fixture: &Am335x) -> Arc<Pruss> {
    let config = InstanceConfig::new(0, fixture.pruss_node)
        .with_resource(MemKind::Dram0, 0x1000, 0x2000)
        .with_resource(MemKind::Dram1, 0x3000, 0x2000)
        .with_resource(MemKind::Cfg, 0x2_6000, 0x2000);
    Pruss::new(&config, fixture.topology(), &SoftwareMapper).expect("P0")
}

//! Two clients sharing one simulated PRU-ICSS
//!
//! Attaches an AM335x instance backed by software memory, then lets two
//! clients split its cores and data RAMs between them.

use pruss_driver::chip::mem::AM335X_LAYOUT;
use pruss_driver::prelude::*;
use pruss_driver::{attach, detach, PlatformDevice, SoftwareMapper, PRUSS_PROPERTY};
use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pruss_driver=debug")
        .init();

    let tree = DeviceTree::new();
    let node = tree.add_node("4a300000.pruss", None);
    tree.add_labeled_child(node, "4a334000.pru0", "pru0");
    tree.add_labeled_child(node, "4a338000.pru1", "pru1");
    let eth0 = tree.add_node("ethernet@0", None);
    let eth1 = tree.add_node("ethernet@1", None);
    tree.link(eth0, PRUSS_PROPERTY, node);
    tree.link(eth1, PRUSS_PROPERTY, node);

    let mut device = PlatformDevice::new(node, "ti,am3356-pruss", "4a300000.pruss");
    for w in AM335X_LAYOUT {
        device = device.with_resource(w.kind.resource_name(), 0x4a30_0000 + w.offset, w.size);
    }

    let registry = PrussRegistry::new();
    let pruss = attach(
        &registry,
        Arc::clone(&tree) as Arc<dyn HwTopology>,
        &SoftwareMapper,
        tree.as_ref(),
        &device,
    )?;

    let first = registry.get(tree.as_ref(), eth0)?;
    let second = registry.get(tree.as_ref(), eth1)?;

    let core0 = first.reserve_core(PruId::Pru0)?;
    let core1 = second.reserve_core(PruId::Pru1)?;
    let ram0 = first.reserve_region(MemKind::Dram0)?;
    let ram1 = second.reserve_region(MemKind::Dram1)?;
    println!("eth0: {} + dram0 @ {:#x}", core0.name(), ram0.region().physical_base);
    println!("eth1: {} + dram1 @ {:#x}", core1.name(), ram1.region().physical_base);

    if let Err(e) = second.reserve_core(PruId::Pru0) {
        println!("eth1 asking for pru0: {e} (transient: {})", e.is_transient());
    }

    first.set_gpi_mode(&core0, GpiMode::Mii)?;
    second.set_gpi_mode(&core1, GpiMode::Mii)?;
    first.miirt_enable(true);

    second.release_region(ram1.token())?;
    second.release_core(&core1);
    first.release_region(ram0.token())?;
    first.release_core(&core0);
    registry.put(first);
    registry.put(second);

    detach(&registry, tree.as_ref(), &pruss);
    Ok(())
}

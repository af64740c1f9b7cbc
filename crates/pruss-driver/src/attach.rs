// SPDX-License-Identifier: AGPL-3.0-only

//! Attach and detach of PRU-ICSS platform devices
//!
//! Glue between a discovered platform device and the registry: match the
//! device against the SoC table, map its memory resources by name, register
//! the instance, then bring up its PRU cores.
//!
//! Bringing up cores is delegated to a [`CorePopulator`]; [`DeviceTree`]
//! implements it by creating one [`PruCore`] per labelled child.

use crate::cores::PruCore;
use crate::error::{PrussError, Result};
use crate::mmio::RegionMapper;
use crate::pruss::{InstanceConfig, Pruss};
use crate::region::MemResource;
use crate::registry::PrussRegistry;
use crate::topology::{DeviceTree, HwTopology, NodeId};
use pruss_chip::mem::MemKind;
use pruss_chip::pru::PruId;
use pruss_chip::soc::{self, InstanceData};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A platform device offered for attach
#[derive(Debug, Clone)]
pub struct PlatformDevice {
    /// Node of the device in the hardware description
    pub node: NodeId,
    /// Compatible string
    pub compatible: String,
    /// Device name (`<base>.pruss`)
    pub name: String,
    /// Memory resources by resource name
    pub resources: HashMap<String, MemResource>,
}

impl PlatformDevice {
    /// Device with no resources yet
    pub fn new(node: NodeId, compatible: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node,
            compatible: compatible.into(),
            name: name.into(),
            resources: HashMap::new(),
        }
    }

    /// Add a named memory resource
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, physical_base: u64, size: usize) -> Self {
        self.resources
            .insert(name.into(), MemResource::new(physical_base, size));
        self
    }
}

/// Creates and removes the PRU core objects of an instance.
pub trait CorePopulator {
    /// Create the cores of a freshly registered instance.
    ///
    /// # Errors
    ///
    /// Returns an error if a core cannot be created; the instance is then
    /// deregistered again.
    fn populate(&self, pruss: &Arc<Pruss>, data: &InstanceData) -> Result<()>;

    /// Remove the cores of an instance about to be detached.
    fn depopulate(&self, pruss: &Arc<Pruss>);
}

impl InstanceConfig {
    /// Build the attach-time configuration of a matched device.
    ///
    /// Resources are matched to memory kinds by name. Names that are not a
    /// memory kind, and shared RAM on a variant without it, are ignored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if a resource required by the variant is missing.
    pub fn from_instance_data(device: &PlatformDevice, data: &InstanceData) -> Result<Self> {
        let mut config = Self::new(data.pruss_id, device.node);

        for (name, resource) in &device.resources {
            match MemKind::from_resource_name(name) {
                Some(MemKind::SharedRam2) if data.has_no_sharedram => {
                    debug!("{}: no shared RAM on this variant, ignoring {name}", device.name);
                }
                Some(kind) => {
                    config = config.with_resource(kind, resource.physical_base, resource.size);
                }
                None => debug!("{}: ignoring resource {name}", device.name),
            }
        }

        let missing = MemKind::ALL.into_iter().find(|&kind| {
            config.resources[kind.index()].is_none()
                && !(data.has_no_sharedram && kind == MemKind::SharedRam2)
        });
        if let Some(kind) = missing {
            return Err(PrussError::not_found(format!(
                "{}: memory resource {}",
                device.name,
                kind.resource_name()
            )));
        }

        Ok(config)
    }
}

/// Attach a platform device and register the resulting instance.
///
/// # Errors
///
/// - `NotFound` if the device is not in the SoC table or lacks a resource
/// - the mapper's error if a window cannot be mapped
/// - the populator's error if the cores cannot be created (cores created so
///   far are removed and the instance is deregistered before returning)
pub fn attach(
    registry: &PrussRegistry,
    topology: Arc<dyn HwTopology>,
    mapper: &dyn RegionMapper,
    populator: &dyn CorePopulator,
    device: &PlatformDevice,
) -> Result<Arc<Pruss>> {
    let data = soc::find(&device.compatible, &device.name).ok_or_else(|| {
        error!("{}: missing private data", device.name);
        PrussError::not_found(format!("{} ({}) not in SoC table", device.name, device.compatible))
    })?;

    let config = InstanceConfig::from_instance_data(device, data).inspect_err(|e| {
        error!("{}: {e}", device.name);
    })?;

    let pruss = Pruss::new(&config, topology, mapper).inspect_err(|e| {
        error!("{}: failed to map memory resources: {e}", device.name);
    })?;

    registry.register(Arc::clone(&pruss));

    info!("{}: creating PRU cores", device.name);
    if let Err(e) = populator.populate(&pruss, data) {
        error!("{}: creating PRU cores failed: {e}", device.name);
        populator.depopulate(&pruss);
        registry.deregister(&pruss);
        return Err(e);
    }

    Ok(pruss)
}

/// Remove the cores of an instance and deregister it.
///
/// Every core and memory window must have been released by its client.
pub fn detach(registry: &PrussRegistry, populator: &dyn CorePopulator, pruss: &Arc<Pruss>) {
    info!("pruss{}: removing PRU cores", pruss.id());
    populator.depopulate(pruss);
    registry.deregister(pruss);
}

impl CorePopulator for DeviceTree {
    fn populate(&self, pruss: &Arc<Pruss>, data: &InstanceData) -> Result<()> {
        for pru in PruId::ALL {
            let child = self
                .child_by_label(pruss.node(), pru.label())
                .ok_or_else(|| {
                    PrussError::not_found(format!("pruss{} has no {} child", pruss.id(), pru))
                })?;
            self.bind_core(child, PruCore::new(data.pru_device(pru), pru));
        }
        Ok(())
    }

    fn depopulate(&self, pruss: &Arc<Pruss>) {
        for pru in PruId::ALL {
            if let Some(child) = self.child_by_label(pruss.node(), pru.label()) {
                self.unbind_core(child);
            }
        }
    }
}

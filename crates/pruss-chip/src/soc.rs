// SPDX-License-Identifier: AGPL-3.0-only

//! SoC match table.
//!
//! Which PRU-ICSS instances exist on each supported SoC, keyed by
//! compatible string and device name. The device name is the instance base
//! address followed by `.pruss`; PRU child devices are named after their own
//! control block address.
//!
//! ```text
//! Compatible          Device            Id  Shared RAM  PRU children
//! ─────────────────── ───────────────── ─── ─────────── ─────────────────────────────
//! ti,am3356-pruss     4a300000.pruss    0   yes         4a334000.pru0 4a338000.pru1
//! ti,am4376-pruss     54400000.pruss    1   yes         54434000.pru0 54438000.pru1
//!                     54440000.pruss    0   no          54474000.pru0 54478000.pru1
//! ti,am5728-pruss     4b200000.pruss    1   yes         4b234000.pru0 4b238000.pru1
//!                     4b280000.pruss    2   yes         4b2b4000.pru0 4b2b8000.pru1
//! ti,k2g-pruss        20a80000.pruss    0   yes         20ab4000.pru0 20ab8000.pru1
//!                     20ac0000.pruss    1   yes         20af4000.pru0 20af8000.pru1
//! ```

use crate::pru::{PruId, NUM_PRUS};

/// Per-instance data for one PRU-ICSS occurrence on a SoC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceData {
    /// Device name the instance is matched by.
    pub device_name: &'static str,
    /// Instance id, unique per SoC.
    pub pruss_id: u32,
    /// The shared data RAM is not present on this instance.
    pub has_no_sharedram: bool,
    /// Device names of the PRU children, indexed by [`PruId`].
    pub pru_devices: [&'static str; NUM_PRUS],
}

impl InstanceData {
    /// Device name of a PRU child.
    #[must_use]
    pub const fn pru_device(&self, pru: PruId) -> &'static str {
        self.pru_devices[pru.index()]
    }

    /// Instance base address encoded in the device name.
    #[must_use]
    pub fn base_address(&self) -> Option<u64> {
        let (addr, _) = self.device_name.split_once('.')?;
        u64::from_str_radix(addr, 16).ok()
    }
}

/// Instances of one SoC family.
#[derive(Debug, Clone, Copy)]
pub struct SocMatch {
    /// Compatible string of the PRU-ICSS node.
    pub compatible: &'static str,
    /// Instances present on this SoC.
    pub instances: &'static [InstanceData],
}

/// AM335x (single instance).
pub const AM335X: SocMatch = SocMatch {
    compatible: "ti,am3356-pruss",
    instances: &[InstanceData {
        device_name: "4a300000.pruss",
        pruss_id: 0,
        has_no_sharedram: false,
        pru_devices: ["4a334000.pru0", "4a338000.pru1"],
    }],
};

/// AM437x. PRU-ICSS0 has no shared data RAM.
pub const AM437X: SocMatch = SocMatch {
    compatible: "ti,am4376-pruss",
    instances: &[
        InstanceData {
            device_name: "54400000.pruss",
            pruss_id: 1,
            has_no_sharedram: false,
            pru_devices: ["54434000.pru0", "54438000.pru1"],
        },
        InstanceData {
            device_name: "54440000.pruss",
            pruss_id: 0,
            has_no_sharedram: true,
            pru_devices: ["54474000.pru0", "54478000.pru1"],
        },
    ],
};

/// AM57xx.
pub const AM57XX: SocMatch = SocMatch {
    compatible: "ti,am5728-pruss",
    instances: &[
        InstanceData {
            device_name: "4b200000.pruss",
            pruss_id: 1,
            has_no_sharedram: false,
            pru_devices: ["4b234000.pru0", "4b238000.pru1"],
        },
        InstanceData {
            device_name: "4b280000.pruss",
            pruss_id: 2,
            has_no_sharedram: false,
            pru_devices: ["4b2b4000.pru0", "4b2b8000.pru1"],
        },
    ],
};

/// 66AK2G.
pub const K2G: SocMatch = SocMatch {
    compatible: "ti,k2g-pruss",
    instances: &[
        InstanceData {
            device_name: "20a80000.pruss",
            pruss_id: 0,
            has_no_sharedram: false,
            pru_devices: ["20ab4000.pru0", "20ab8000.pru1"],
        },
        InstanceData {
            device_name: "20ac0000.pruss",
            pruss_id: 1,
            has_no_sharedram: false,
            pru_devices: ["20af4000.pru0", "20af8000.pru1"],
        },
    ],
};

/// Every supported SoC.
pub const SOC_TABLE: &[SocMatch] = &[AM335X, AM437X, AM57XX, K2G];

/// Find the instance data for a compatible string and device name.
#[must_use]
pub fn find(compatible: &str, device_name: &str) -> Option<&'static InstanceData> {
    SOC_TABLE
        .iter()
        .find(|soc| soc.compatible == compatible)?
        .instances
        .iter()
        .find(|inst| inst.device_name == device_name)
}

/// Find instance data by device name alone.
#[must_use]
pub fn find_by_device(device_name: &str) -> Option<(&'static SocMatch, &'static InstanceData)> {
    SOC_TABLE.iter().find_map(|soc| {
        soc.instances
            .iter()
            .find(|inst| inst.device_name == device_name)
            .map(|inst| (soc, inst))
    })
}

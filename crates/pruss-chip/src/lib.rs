// SPDX-License-Identifier: AGPL-3.0-only

//! Silicon model for the TI PRU-ICSS (Programmable Real-time Unit and
//! Industrial Communication SubSystem).
//!
//! This crate has **no dependencies** and **no hardware access**: it is a
//! pure model of the silicon: memory kinds and their resource names, the
//! CFG register map, PRU core identifiers, and the per-SoC instance table.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`mem`] | Memory kinds (DRAM0/1, shared RAM, CFG, IEP, MII_RT) and AM335x layout |
//! | [`pru`] | PRU core identifiers and child node labels |
//! | [`cfg`] | CFG register offsets, GPCFG/MII_RT/SPP bit fields, GPI mode and GP mux enums |
//! | [`soc`] | SoC match table: compatibles, device names, instance ids, PRU child names |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cfg;
pub mod mem;
pub mod pru;
pub mod soc;

use std::fmt;

/// A raw numeric identifier did not name a defined slot, kind or mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    /// The rejected raw value.
    pub raw: u32,
    /// What the value was supposed to identify.
    pub what: &'static str,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} out of range", self.what, self.raw)
    }
}

impl std::error::Error for OutOfRange {}

// SPDX-License-Identifier: AGPL-3.0-only

//! `pruss`: command-line interface for the PRU-ICSS arbiter.
//!
//! ```text
//! USAGE:
//!   pruss socs                          List supported SoCs and their instances
//!   pruss layout <device>               Memory windows of one instance
//!   pruss simulate [device]             Two clients contending on a simulated instance
//!   pruss cfg <device> [--mem /dev/mem] Dump (and optionally program) CFG registers
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pruss_driver::chip::cfg;
use pruss_driver::chip::mem::AM335X_LAYOUT;
use pruss_driver::chip::soc::{self, InstanceData, SocMatch, SOC_TABLE};
use pruss_driver::prelude::*;
use pruss_driver::{attach, detach, DevMemMapper, PlatformDevice, RegionMapper, SoftwareMapper};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pruss", about = "PRU-ICSS resource arbiter CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List supported SoCs and their PRU-ICSS instances.
    Socs,
    /// Print the memory windows of one instance.
    Layout {
        /// Device name (e.g. 4a300000.pruss).
        device: String,
    },
    /// Attach a simulated instance and let two clients contend for it.
    Simulate {
        /// Device name (e.g. 4a300000.pruss).
        #[arg(default_value = "4a300000.pruss")]
        device: String,
    },
    /// Dump the CFG registers of an instance, optionally programming them first.
    Cfg {
        /// Device name (e.g. 4a300000.pruss).
        device: String,
        /// Physical memory device; omit to run against simulated memory.
        #[arg(long)]
        mem: Option<String>,
        /// GPI mode for PRU0.
        #[arg(long, value_enum)]
        gpi0: Option<GpiArg>,
        /// GPI mode for PRU1.
        #[arg(long, value_enum)]
        gpi1: Option<GpiArg>,
        /// Enable or disable MII_RT events.
        #[arg(long)]
        miirt: Option<bool>,
        /// Enable or disable XIN/XOUT transfer shift.
        #[arg(long)]
        xfr: Option<bool>,
        /// Raw register write, OFFSET=VALUE (hex with 0x prefix or decimal).
        #[arg(long, value_parser = parse_poke)]
        poke: Vec<(usize, u32)>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GpiArg {
    Direct,
    Parallel,
    Shift28,
    Mii,
}

impl From<GpiArg> for GpiMode {
    fn from(arg: GpiArg) -> Self {
        match arg {
            GpiArg::Direct => Self::Direct,
            GpiArg::Parallel => Self::Parallel,
            GpiArg::Shift28 => Self::Shift28Bit,
            GpiArg::Mii => Self::Mii,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Socs => cmd_socs(),
        Cmd::Layout { device } => cmd_layout(&device)?,
        Cmd::Simulate { device } => cmd_simulate(&device)?,
        Cmd::Cfg {
            device,
            mem,
            gpi0,
            gpi1,
            miirt,
            xfr,
            poke,
        } => cmd_cfg(&device, mem.as_deref(), [gpi0, gpi1], miirt, xfr, &poke)?,
    }

    Ok(())
}

fn parse_number(s: &str) -> Result<u64> {
    let n = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    n.with_context(|| format!("Invalid number: {s}"))
}

fn parse_poke(s: &str) -> Result<(usize, u32)> {
    let (reg, value) = s
        .split_once('=')
        .with_context(|| format!("Expected OFFSET=VALUE, got {s}"))?;
    Ok((
        usize::try_from(parse_number(reg)?)?,
        u32::try_from(parse_number(value)?)?,
    ))
}

fn lookup(device: &str) -> Result<(&'static SocMatch, &'static InstanceData)> {
    soc::find_by_device(device).ok_or_else(|| anyhow::anyhow!("Unknown PRU-ICSS device: {device}"))
}

/// Describe one instance in a fresh tree: the instance node, its two
/// labelled PRU children, and a client linked to it.
fn describe(
    tree: &DeviceTree,
    soc: &SocMatch,
    data: &InstanceData,
) -> Result<(PlatformDevice, NodeId)> {
    let base = data
        .base_address()
        .with_context(|| format!("No base address in {}", data.device_name))?;

    let node = tree.add_node(data.device_name, None);
    for pru in PruId::ALL {
        tree.add_labeled_child(node, data.pru_device(pru), pru.label());
    }
    let client = tree.add_node("client", None);
    tree.link(client, pruss_driver::PRUSS_PROPERTY, node);

    let mut device = PlatformDevice::new(node, soc.compatible, data.device_name);
    for w in AM335X_LAYOUT {
        if data.has_no_sharedram && w.kind == MemKind::SharedRam2 {
            continue;
        }
        device = device.with_resource(w.kind.resource_name(), base + w.offset, w.size);
    }
    Ok((device, client))
}

fn cmd_socs() {
    for soc in SOC_TABLE {
        println!("{}", soc.compatible);
        for inst in soc.instances {
            println!(
                "  pruss{}  {:<16} shared RAM {:<3}  {} {}",
                inst.pruss_id,
                inst.device_name,
                if inst.has_no_sharedram { "no" } else { "yes" },
                inst.pru_device(PruId::Pru0),
                inst.pru_device(PruId::Pru1),
            );
        }
    }
}

fn cmd_layout(device: &str) -> Result<()> {
    let (soc, data) = lookup(device)?;
    let base = data
        .base_address()
        .with_context(|| format!("No base address in {device}"))?;

    println!("{} ({}) pruss{}", data.device_name, soc.compatible, data.pruss_id);
    for w in AM335X_LAYOUT {
        if data.has_no_sharedram && w.kind == MemKind::SharedRam2 {
            println!("  {:<9} absent", w.kind.resource_name());
            continue;
        }
        println!(
            "  {:<9} {:#010x}  {:#7x} bytes",
            w.kind.resource_name(),
            base + w.offset,
            w.size
        );
    }
    Ok(())
}

fn cmd_simulate(device: &str) -> Result<()> {
    let (soc, data) = lookup(device)?;
    let tree = DeviceTree::new();
    let registry = PrussRegistry::new();
    let (platform, client) = describe(&tree, soc, data)?;

    let children: Vec<String> = tree
        .children(platform.node)
        .into_iter()
        .filter_map(|child| tree.name(child))
        .collect();
    println!("PRU children          : {}", children.join(", "));

    let before = registry.get(tree.as_ref(), client);
    println!("lookup before attach  : {}", outcome(&before));

    let pruss = attach(
        &registry,
        Arc::clone(&tree) as Arc<dyn HwTopology>,
        &SoftwareMapper,
        tree.as_ref(),
        &platform,
    )?;

    let a = registry.get(tree.as_ref(), client)?;
    let b = registry.get(tree.as_ref(), client)?;
    println!("lookup after attach   : pruss{}", a.id());

    let a_core = a.reserve_core(PruId::Pru0)?;
    println!("A reserves pru0       : {}", a_core.name());
    println!("B reserves pru0       : {}", outcome(&b.reserve_core(PruId::Pru0)));
    let b_core = b.reserve_core(PruId::Pru1)?;
    println!("B reserves pru1       : {}", b_core.name());

    let a_bank = a.reserve_region(MemKind::Dram0)?;
    println!(
        "A reserves dram0      : pa {:#010x} size {:#x}",
        a_bank.region().physical_base,
        a_bank.region().size
    );
    println!("B reserves dram0      : {}", outcome(&b.reserve_region(MemKind::Dram0)));

    a.set_gpi_mode(&a_core, GpiMode::Parallel)?;
    b.set_gpmux(PruId::Pru1, GpMuxSel::Mii2);
    a.miirt_enable(true);
    print_cfg(&pruss);

    a.release_core(&a_core);
    a.release_region(a_bank.token())?;
    println!("A releases dram0 again: {}", outcome(&a.release_region(a_bank.token())));

    let b_core0 = b.reserve_core(PruId::Pru0)?;
    println!("B reserves pru0       : {}", b_core0.name());
    b.release_core(&b_core0);
    b.release_core(&b_core);

    registry.put(a);
    registry.put(b);
    detach(&registry, tree.as_ref(), &pruss);
    println!("lookup after detach   : {}", outcome(&registry.get(tree.as_ref(), client)));
    Ok(())
}

fn cmd_cfg(
    device: &str,
    mem: Option<&str>,
    gpi: [Option<GpiArg>; 2],
    miirt: Option<bool>,
    xfr: Option<bool>,
    pokes: &[(usize, u32)],
) -> Result<()> {
    let (soc, data) = lookup(device)?;
    let tree = DeviceTree::new();
    let registry = PrussRegistry::new();
    let (platform, _client) = describe(&tree, soc, data)?;

    let mapper: Box<dyn RegionMapper> = match mem {
        Some(path) => {
            tracing::info!("{device}: mapping windows through {path}");
            Box::new(
                DevMemMapper::open(path).with_context(|| format!("Cannot open {path}"))?,
            )
        }
        None => {
            tracing::info!("{device}: no memory device given, using simulated memory");
            Box::new(SoftwareMapper)
        }
    };

    let pruss = attach(
        &registry,
        Arc::clone(&tree) as Arc<dyn HwTopology>,
        mapper.as_ref(),
        tree.as_ref(),
        &platform,
    )?;

    for (pru, mode) in PruId::ALL.into_iter().zip(gpi) {
        if let Some(mode) = mode {
            let core = pruss.reserve_core(pru)?;
            let result = pruss.set_gpi_mode(&core, mode.into());
            pruss.release_core(&core);
            result?;
        }
    }
    if let Some(enable) = miirt {
        pruss.miirt_enable(enable);
    }
    if let Some(enable) = xfr {
        pruss.xfr_enable(enable);
    }
    for &(reg, value) in pokes {
        anyhow::ensure!(
            reg % 4 == 0 && reg < cfg::CFG_SPAN,
            "CFG offset {reg:#x} is not a register"
        );
        pruss.cfg_update(reg, u32::MAX, value);
    }

    print_cfg(&pruss);
    detach(&registry, tree.as_ref(), &pruss);
    Ok(())
}

fn print_cfg(pruss: &Pruss) {
    const REGS: [(&str, usize); 8] = [
        ("REVID", cfg::REVID),
        ("SYSCFG", cfg::SYSCFG),
        ("GPCFG0", cfg::GPCFG0),
        ("GPCFG1", cfg::GPCFG1),
        ("CGR", cfg::CGR),
        ("MII_RT", cfg::MII_RT),
        ("SPP", cfg::SPP),
        ("PIN_MX", cfg::PIN_MX),
    ];

    println!("pruss{} CFG:", pruss.id());
    for (name, reg) in REGS {
        println!("  {name:<7} [{reg:#04x}] {:#010x}", pruss.cfg_read(reg));
    }
}

fn outcome<T>(result: &pruss_driver::Result<T>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}

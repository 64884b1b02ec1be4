//! Hardware query layer
//!
//! Rich, owned query results for every hardware category, plus the
//! [`HardwareProbe`] trait that produces them. [`SystemProbe`] reads the live
//! machine using sysinfo and Linux sysfs/procfs; [`StaticProbe`] replays a
//! captured [`HardwareSnapshot`].
//!
//! Numeric fields that a platform cannot report are `-1`, matching what the C
//! boundary hands to foreign callers.

pub mod battery;
pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod mainboard;
pub mod network;
pub mod os;
pub mod ram;
mod snapshot;
mod sysfs;
mod system;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProbeResult;

pub use battery::Battery;
pub use cpu::{Cpu, CpuSample};
pub use disk::Disk;
pub use gpu::{Gpu, GpuVendor};
pub use mainboard::MainBoard;
pub use network::Network;
pub use os::Os;
pub use ram::{Memory, RamModule};
pub use snapshot::{HardwareSnapshot, StaticProbe};
pub use system::SystemProbe;

/// One hardware domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cpu,
    Os,
    Gpu,
    Memory,
    MainBoard,
    Disk,
    Battery,
    Network,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Cpu => write!(f, "CPU"),
            Category::Os => write!(f, "OS"),
            Category::Gpu => write!(f, "GPU"),
            Category::Memory => write!(f, "memory"),
            Category::MainBoard => write!(f, "mainboard"),
            Category::Disk => write!(f, "disk"),
            Category::Battery => write!(f, "battery"),
            Category::Network => write!(f, "network"),
        }
    }
}

/// Source of hardware query results.
///
/// Implementations must be callable from any thread. List methods return an
/// empty `Vec` when the machine has no hardware of that category; an `Err`
/// means the probe itself failed.
pub trait HardwareProbe: Send + Sync {
    /// One entry per CPU socket, `id` equal to its position
    fn cpus(&self) -> ProbeResult<Vec<Cpu>>;

    /// Overall utilization of `cpu` as a fraction in `0.0..=1.0`
    fn cpu_utilization(&self, cpu: &Cpu) -> ProbeResult<f64>;

    /// Per logical processor utilization of `cpu`, as fractions
    fn thread_utilizations(&self, cpu: &Cpu) -> ProbeResult<Vec<f64>>;

    /// Current clock of each logical processor of `cpu` in MHz
    fn thread_speeds_mhz(&self, cpu: &Cpu) -> ProbeResult<Vec<i64>>;

    fn os(&self) -> ProbeResult<Os>;

    fn gpus(&self) -> ProbeResult<Vec<Gpu>>;

    fn memory(&self) -> ProbeResult<Memory>;

    fn mainboard(&self) -> ProbeResult<MainBoard>;

    fn disks(&self) -> ProbeResult<Vec<Disk>>;

    fn batteries(&self) -> ProbeResult<Vec<Battery>>;

    fn networks(&self) -> ProbeResult<Vec<Network>>;
}

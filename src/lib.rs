//! hwinfo-ffi - hardware information behind a C ABI
//!
//! This crate:
//! - Probes CPU, OS, GPU, memory, mainboard, disk, battery and network details
//! - Caches list categories per process, with explicit invalidation
//! - Hands results to C callers as flat `#[repr(C)]` records they own and free
//! - Never lets a panic or error cross the boundary (null / 0 / -1.0 instead)
//!
//! Rust callers should use [`HardwareContext`] directly; the [`ffi`] module
//! is the C surface declared in `include/hwinfo_ffi.h`.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod ffi;
pub mod hardware;
pub mod logging;
pub mod report;

pub use config::{Config, LoggingConfig, ProbeConfig};
pub use context::{HardwareContext, SingletonPolicy};
pub use error::{DecodeError, ProbeError, QueryError};
pub use hardware::{
    Battery, Category, Cpu, CpuSample, Disk, Gpu, HardwareProbe, HardwareSnapshot, MainBoard,
    Memory, Network, Os, RamModule, StaticProbe, SystemProbe,
};

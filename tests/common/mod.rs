//! Shared fixtures for the C boundary tests

#![allow(dead_code)]

use std::sync::Once;

use hwinfo_ffi::{ffi, HardwareContext, HardwareSnapshot, StaticProbe};

pub const WORKSTATION: &str = include_str!("../fixtures/workstation.json");

/// A desktop with one CPU socket, one GPU, two disks (the second without
/// mounted volumes), a battery and two network interfaces
pub fn workstation() -> HardwareSnapshot {
    HardwareSnapshot::from_json(WORKSTATION).expect("fixture parses")
}

/// The workstation with every list category emptied
pub fn bare_machine() -> HardwareSnapshot {
    let mut snapshot = workstation();
    snapshot.cpus.clear();
    snapshot.cpu_samples.clear();
    snapshot.gpus.clear();
    snapshot.memory.modules.clear();
    snapshot.disks.clear();
    snapshot.batteries.clear();
    snapshot.networks.clear();
    snapshot
}

/// Install `snapshot` as the process-wide context behind the C functions.
/// Only the first call in a test binary has any effect.
pub fn install(snapshot: fn() -> HardwareSnapshot) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let ctx = HardwareContext::new(StaticProbe::new(snapshot()));
        assert!(ffi::install(ctx).is_ok(), "context installed twice");
    });
}

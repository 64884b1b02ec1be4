//! C-callable surface
//!
//! Every `get_*` function hands the caller sole ownership of what it returns.
//! Pass it to the matching `free_*` function exactly once, with the count
//! reported by the paired `get_*_count` (list categories).
//!
//! Nothing here panics across the boundary or reports errors beyond
//! sentinels: a null pointer or a zero count means "none found or the probe
//! failed", and `-1.0` from [`get_cpu_utilization`] means "no such CPU".
//!
//! All calls share one process-wide [`HardwareContext`], built from
//! [`Config::load`] on first use unless [`install`] supplied one earlier.

pub mod alloc;
pub mod decode;
pub mod marshal;
pub mod types;

use std::ffi::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::OnceLock;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::context::HardwareContext;
use crate::error::{QueryError, Result};
use crate::logging;
use marshal::{marshal_all, marshal_doubles, marshal_int64s, marshal_one, release_all, release_one};
use types::{
    CBattery, CCpu, CDisk, CDoubleArray, CGpu, CInt64Array, CMainBoard, CMemoryInfo, CNetwork,
    COs,
};

static CONTEXT: OnceLock<HardwareContext> = OnceLock::new();

/// Use `ctx` for every C call in this process.
///
/// Must run before the first C call; afterwards the context is fixed and
/// `ctx` is handed back.
pub fn install(ctx: HardwareContext) -> std::result::Result<(), HardwareContext> {
    CONTEXT.set(ctx)
}

fn context() -> &'static HardwareContext {
    CONTEXT.get_or_init(|| {
        let loaded = Config::load();
        let config = loaded.as_ref().cloned().unwrap_or_default();

        if config.logging.enabled || logging::requested_by_env() {
            logging::init(&config.logging);
        }
        if let Err(e) = loaded {
            warn!("using default configuration: {e:#}");
        }

        HardwareContext::from_config(&config)
    })
}

/// Run `query` against the shared context, collapsing any failure to
/// `fallback`
fn guard<T>(
    entry: &'static str,
    fallback: T,
    query: impl FnOnce(&HardwareContext) -> Result<T>,
) -> T {
    match panic::catch_unwind(AssertUnwindSafe(|| query(context()))) {
        Ok(Ok(value)) => value,
        Ok(Err(QueryError::Probe(e))) => {
            warn!(entry, error = %e, "hardware probe failed");
            fallback
        }
        Ok(Err(e)) => {
            debug!(entry, error = %e, "query rejected");
            fallback
        }
        Err(_) => {
            error!(entry, "panic caught at the C boundary");
            fallback
        }
    }
}

fn clamp_count(count: usize) -> c_int {
    c_int::try_from(count).unwrap_or(c_int::MAX)
}

// CPU

#[no_mangle]
pub extern "C" fn get_cpu_count() -> c_int {
    guard("get_cpu_count", 0, |ctx| ctx.cpu_count().map(clamp_count))
}

#[no_mangle]
pub extern "C" fn get_all_cpus() -> *mut CCpu {
    guard("get_all_cpus", ptr::null_mut(), |ctx| {
        Ok(marshal_all(ctx.cpus()?.as_slice()))
    })
}

/// Overall utilization of one CPU socket in `0.0..=1.0`, or `-1.0`
#[no_mangle]
pub extern "C" fn get_cpu_utilization(cpu_id: c_int) -> f64 {
    guard("get_cpu_utilization", -1.0, |ctx| ctx.cpu_utilization(cpu_id))
}

#[no_mangle]
pub extern "C" fn get_cpu_thread_utilizations(cpu_id: c_int) -> *mut CDoubleArray {
    guard("get_cpu_thread_utilizations", ptr::null_mut(), |ctx| {
        Ok(marshal_doubles(ctx.cpu_thread_utilizations(cpu_id)?))
    })
}

#[no_mangle]
pub extern "C" fn get_cpu_thread_speeds_mhz(cpu_id: c_int) -> *mut CInt64Array {
    guard("get_cpu_thread_speeds_mhz", ptr::null_mut(), |ctx| {
        Ok(marshal_int64s(ctx.cpu_thread_speeds_mhz(cpu_id)?))
    })
}

/// # Safety
/// `cpus` must be null or the result of [`get_all_cpus`], with `count` from
/// [`get_cpu_count`]. It must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn free_cpu_info(cpus: *mut CCpu, count: c_int) {
    unsafe { release_all(cpus, count) }
}

/// # Safety
/// `array` must be null or the result of [`get_cpu_thread_utilizations`].
#[no_mangle]
pub unsafe extern "C" fn free_double_array(array: *mut CDoubleArray) {
    unsafe { release_one(array) }
}

/// # Safety
/// `array` must be null or the result of [`get_cpu_thread_speeds_mhz`].
#[no_mangle]
pub unsafe extern "C" fn free_int64_array(array: *mut CInt64Array) {
    unsafe { release_one(array) }
}

// OS

#[no_mangle]
pub extern "C" fn get_os_info() -> *mut COs {
    guard("get_os_info", ptr::null_mut(), |ctx| Ok(marshal_one(&*ctx.os()?)))
}

/// # Safety
/// `os` must be null or the result of [`get_os_info`].
#[no_mangle]
pub unsafe extern "C" fn free_os_info(os: *mut COs) {
    unsafe { release_one(os) }
}

// GPU

#[no_mangle]
pub extern "C" fn get_gpu_count() -> c_int {
    guard("get_gpu_count", 0, |ctx| ctx.gpu_count().map(clamp_count))
}

#[no_mangle]
pub extern "C" fn get_all_gpus() -> *mut CGpu {
    guard("get_all_gpus", ptr::null_mut(), |ctx| {
        Ok(marshal_all(ctx.gpus()?.as_slice()))
    })
}

/// # Safety
/// `gpus` must be null or the result of [`get_all_gpus`], with `count` from
/// [`get_gpu_count`].
#[no_mangle]
pub unsafe extern "C" fn free_gpu_info(gpus: *mut CGpu, count: c_int) {
    unsafe { release_all(gpus, count) }
}

// Memory

#[no_mangle]
pub extern "C" fn get_memory_info() -> *mut CMemoryInfo {
    guard("get_memory_info", ptr::null_mut(), |ctx| {
        Ok(marshal_one(&*ctx.memory()?))
    })
}

/// # Safety
/// `memory_info` must be null or the result of [`get_memory_info`].
#[no_mangle]
pub unsafe extern "C" fn free_memory_info(memory_info: *mut CMemoryInfo) {
    unsafe { release_one(memory_info) }
}

// Mainboard

#[no_mangle]
pub extern "C" fn get_mainboard_info() -> *mut CMainBoard {
    guard("get_mainboard_info", ptr::null_mut(), |ctx| {
        Ok(marshal_one(&*ctx.mainboard()?))
    })
}

/// # Safety
/// `mainboard` must be null or the result of [`get_mainboard_info`].
#[no_mangle]
pub unsafe extern "C" fn free_mainboard_info(mainboard: *mut CMainBoard) {
    unsafe { release_one(mainboard) }
}

// Disk

#[no_mangle]
pub extern "C" fn get_disk_count() -> c_int {
    guard("get_disk_count", 0, |ctx| ctx.disk_count().map(clamp_count))
}

#[no_mangle]
pub extern "C" fn get_all_disks() -> *mut CDisk {
    guard("get_all_disks", ptr::null_mut(), |ctx| {
        Ok(marshal_all(ctx.disks()?.as_slice()))
    })
}

/// # Safety
/// `disks` must be null or the result of [`get_all_disks`], with `count`
/// from [`get_disk_count`].
#[no_mangle]
pub unsafe extern "C" fn free_disk_info(disks: *mut CDisk, count: c_int) {
    unsafe { release_all(disks, count) }
}

// Battery

#[no_mangle]
pub extern "C" fn get_battery_count() -> c_int {
    guard("get_battery_count", 0, |ctx| ctx.battery_count().map(clamp_count))
}

#[no_mangle]
pub extern "C" fn get_all_batteries() -> *mut CBattery {
    guard("get_all_batteries", ptr::null_mut(), |ctx| {
        Ok(marshal_all(ctx.batteries()?.as_slice()))
    })
}

/// # Safety
/// `batteries` must be null or the result of [`get_all_batteries`], with
/// `count` from [`get_battery_count`].
#[no_mangle]
pub unsafe extern "C" fn free_battery_info(batteries: *mut CBattery, count: c_int) {
    unsafe { release_all(batteries, count) }
}

// Network

#[no_mangle]
pub extern "C" fn get_network_count() -> c_int {
    guard("get_network_count", 0, |ctx| ctx.network_count().map(clamp_count))
}

#[no_mangle]
pub extern "C" fn get_all_networks() -> *mut CNetwork {
    guard("get_all_networks", ptr::null_mut(), |ctx| {
        Ok(marshal_all(ctx.networks()?.as_slice()))
    })
}

/// # Safety
/// `networks` must be null or the result of [`get_all_networks`], with
/// `count` from [`get_network_count`].
#[no_mangle]
pub unsafe extern "C" fn free_network_info(networks: *mut CNetwork, count: c_int) {
    unsafe { release_all(networks, count) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_clamp_to_c_int() {
        assert_eq!(clamp_count(3), 3);
        assert_eq!(clamp_count(usize::MAX), c_int::MAX);
    }

    #[test]
    fn free_functions_accept_null() {
        unsafe {
            free_cpu_info(ptr::null_mut(), 0);
            free_double_array(ptr::null_mut());
            free_int64_array(ptr::null_mut());
            free_os_info(ptr::null_mut());
            free_gpu_info(ptr::null_mut(), 0);
            free_memory_info(ptr::null_mut());
            free_mainboard_info(ptr::null_mut());
            free_disk_info(ptr::null_mut(), 0);
            free_battery_info(ptr::null_mut(), 0);
            free_network_info(ptr::null_mut(), 0);
        }
    }
}

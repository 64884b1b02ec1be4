//! Conversion of query results into C records, and the mirror image that
//! frees them.
//!
//! Every `Marshal` impl has a `Release` impl that walks the same shape: each
//! string field was made by [`copy_string`] and goes back through
//! [`free_string`]; each nested array was made by [`leak_array`] and its
//! elements are released before the array itself.

use std::ffi::{c_char, c_int};
use std::ptr;

use super::alloc::{
    copy_string, free_string, leak_array, leak_boxed, reclaim_array, reclaim_boxed, MAX_LEN,
};
use super::types::{
    CBattery, CCpu, CDisk, CDoubleArray, CGpu, CInt64Array, CMainBoard, CMemoryInfo, CNetwork,
    COs, CRamModule, CStringArray,
};
use crate::hardware::{Battery, Cpu, Disk, Gpu, MainBoard, Memory, Network, Os, RamModule};

/// A query result with a C record counterpart
pub trait Marshal {
    type Raw: Release;

    fn marshal(&self) -> Self::Raw;
}

/// Frees everything a C record owns.
pub trait Release {
    /// # Safety
    /// `self` must have been produced by [`Marshal::marshal`] (or be a
    /// zero-initialized record) and not released before.
    unsafe fn release(self);
}

/// One leaked array of records, or null when `items` is empty
pub fn marshal_all<T: Marshal>(items: &[T]) -> *mut T::Raw {
    if items.is_empty() {
        return ptr::null_mut();
    }
    let raw: Vec<T::Raw> = items.iter().take(MAX_LEN).map(Marshal::marshal).collect();
    leak_array(raw).0
}

pub fn marshal_one<T: Marshal>(item: &T) -> *mut T::Raw {
    leak_boxed(item.marshal())
}

/// # Safety
/// `ptr` must be null or come from [`marshal_all`] for a slice of exactly
/// `count` items. It must not be used afterwards.
pub unsafe fn release_all<R: Release>(ptr: *mut R, count: c_int) {
    for record in unsafe { reclaim_array(ptr, count) } {
        unsafe { record.release() };
    }
}

/// # Safety
/// `ptr` must be null or come from [`marshal_one`] (or a numeric array
/// constructor here). It must not be used afterwards.
pub unsafe fn release_one<R: Release>(ptr: *mut R) {
    if let Some(record) = unsafe { reclaim_boxed(ptr) } {
        unsafe { record.release() };
    }
}

impl<R: Release> Release for Box<R> {
    unsafe fn release(self) {
        unsafe { (*self).release() }
    }
}

pub fn marshal_strings(items: &[String]) -> CStringArray {
    let strings: Vec<*mut c_char> = items
        .iter()
        .take(MAX_LEN)
        .map(|s| copy_string(s))
        .collect();
    let (strings, count) = leak_array(strings);
    CStringArray { count, strings }
}

impl Release for CStringArray {
    unsafe fn release(self) {
        for string in unsafe { reclaim_array(self.strings, self.count) } {
            unsafe { free_string(string) };
        }
    }
}

pub fn marshal_doubles(values: Vec<f64>) -> *mut CDoubleArray {
    let (values, count) = leak_array(values);
    leak_boxed(CDoubleArray { count, values })
}

impl Release for CDoubleArray {
    unsafe fn release(self) {
        drop(unsafe { reclaim_array(self.values, self.count) });
    }
}

pub fn marshal_int64s(values: Vec<i64>) -> *mut CInt64Array {
    let (values, count) = leak_array(values);
    leak_boxed(CInt64Array { count, values })
}

impl Release for CInt64Array {
    unsafe fn release(self) {
        drop(unsafe { reclaim_array(self.values, self.count) });
    }
}

impl Marshal for Cpu {
    type Raw = CCpu;

    fn marshal(&self) -> CCpu {
        CCpu {
            id: self.id,
            vendor: copy_string(&self.vendor),
            model_name: copy_string(&self.model_name),
            num_physical_cores: self.num_physical_cores,
            num_logical_cores: self.num_logical_cores,
            max_clock_speed_mhz: self.max_clock_speed_mhz,
            regular_clock_speed_mhz: self.regular_clock_speed_mhz,
            l1_cache_size_bytes: self.l1_cache_size_bytes,
            l2_cache_size_bytes: self.l2_cache_size_bytes,
            l3_cache_size_bytes: self.l3_cache_size_bytes,
            flags: marshal_strings(&self.flags),
        }
    }
}

impl Release for CCpu {
    unsafe fn release(self) {
        unsafe {
            free_string(self.vendor);
            free_string(self.model_name);
            self.flags.release();
        }
    }
}

impl Marshal for Os {
    type Raw = COs;

    fn marshal(&self) -> COs {
        COs {
            name: copy_string(&self.name),
            version: copy_string(&self.version),
            kernel: copy_string(&self.kernel),
            is_32_bit: self.is_32_bit,
            is_64_bit: self.is_64_bit,
            is_little_endian: self.is_little_endian,
        }
    }
}

impl Release for COs {
    unsafe fn release(self) {
        unsafe {
            free_string(self.name);
            free_string(self.version);
            free_string(self.kernel);
        }
    }
}

impl Marshal for Gpu {
    type Raw = CGpu;

    fn marshal(&self) -> CGpu {
        CGpu {
            id: self.id,
            vendor: copy_string(&self.vendor),
            name: copy_string(&self.name),
            driver_version: copy_string(&self.driver_version),
            memory_bytes: self.memory_bytes,
            frequency_mhz: self.frequency_mhz,
            num_cores: self.num_cores,
            vendor_id: copy_string(&self.vendor_id),
            device_id: copy_string(&self.device_id),
        }
    }
}

impl Release for CGpu {
    unsafe fn release(self) {
        unsafe {
            free_string(self.vendor);
            free_string(self.name);
            free_string(self.driver_version);
            free_string(self.vendor_id);
            free_string(self.device_id);
        }
    }
}

impl Marshal for RamModule {
    type Raw = CRamModule;

    fn marshal(&self) -> CRamModule {
        CRamModule {
            id: self.id,
            vendor: copy_string(&self.vendor),
            name: copy_string(&self.name),
            model: copy_string(&self.model),
            serial_number: copy_string(&self.serial_number),
            total_bytes: self.total_bytes,
            frequency_hz: self.frequency_hz,
        }
    }
}

impl Release for CRamModule {
    unsafe fn release(self) {
        unsafe {
            free_string(self.vendor);
            free_string(self.name);
            free_string(self.model);
            free_string(self.serial_number);
        }
    }
}

impl Marshal for Memory {
    type Raw = CMemoryInfo;

    fn marshal(&self) -> CMemoryInfo {
        let modules: Vec<CRamModule> = self
            .modules
            .iter()
            .take(MAX_LEN)
            .map(Marshal::marshal)
            .collect();
        let (modules, module_count) = leak_array(modules);

        CMemoryInfo {
            total_bytes: self.total_bytes,
            free_bytes: self.free_bytes,
            available_bytes: self.available_bytes,
            module_count,
            modules,
        }
    }
}

impl Release for CMemoryInfo {
    unsafe fn release(self) {
        unsafe { release_all(self.modules, self.module_count) };
    }
}

impl Marshal for MainBoard {
    type Raw = CMainBoard;

    fn marshal(&self) -> CMainBoard {
        CMainBoard {
            vendor: copy_string(&self.vendor),
            name: copy_string(&self.name),
            version: copy_string(&self.version),
            serial_number: copy_string(&self.serial_number),
        }
    }
}

impl Release for CMainBoard {
    unsafe fn release(self) {
        unsafe {
            free_string(self.vendor);
            free_string(self.name);
            free_string(self.version);
            free_string(self.serial_number);
        }
    }
}

impl Marshal for Disk {
    type Raw = CDisk;

    fn marshal(&self) -> CDisk {
        CDisk {
            id: self.id,
            vendor: copy_string(&self.vendor),
            model: copy_string(&self.model),
            serial_number: copy_string(&self.serial_number),
            size_bytes: self.size_bytes,
            free_size_bytes: self.free_size_bytes,
            volumes: marshal_strings(&self.volumes),
        }
    }
}

impl Release for CDisk {
    unsafe fn release(self) {
        unsafe {
            free_string(self.vendor);
            free_string(self.model);
            free_string(self.serial_number);
            self.volumes.release();
        }
    }
}

impl Marshal for Battery {
    type Raw = CBattery;

    fn marshal(&self) -> CBattery {
        CBattery {
            id: self.id,
            vendor: copy_string(&self.vendor),
            model: copy_string(&self.model),
            serial_number: copy_string(&self.serial_number),
            technology: copy_string(&self.technology),
            energy_full: self.energy_full_mwh,
            energy_now: self.energy_now_mwh,
            charging: self.charging,
        }
    }
}

impl Release for CBattery {
    unsafe fn release(self) {
        unsafe {
            free_string(self.vendor);
            free_string(self.model);
            free_string(self.serial_number);
            free_string(self.technology);
        }
    }
}

impl Marshal for Network {
    type Raw = CNetwork;

    fn marshal(&self) -> CNetwork {
        CNetwork {
            interface_index: copy_string(&self.interface_index),
            description: copy_string(&self.description),
            mac: copy_string(&self.mac_address),
            ip4: copy_string(&self.ipv4_address),
            ip6: copy_string(&self.ipv6_address),
        }
    }
}

impl Release for CNetwork {
    unsafe fn release(self) {
        unsafe {
            free_string(self.interface_index);
            free_string(self.description);
            free_string(self.mac);
            free_string(self.ip4);
            free_string(self.ip6);
        }
    }
}

//! Reading C records back into owned query results
//!
//! For Rust programs that load the library through its C surface, and for
//! checking that what crosses the boundary matches what the probe reported.

use std::ffi::{c_char, c_int, CStr};
use std::slice;

use super::types::{
    CBattery, CCpu, CDisk, CDoubleArray, CGpu, CInt64Array, CMainBoard, CMemoryInfo, CNetwork,
    COs, CRamModule, CStringArray,
};
use crate::error::DecodeError;
use crate::hardware::{
    Battery, Category, Cpu, CpuSample, Disk, Gpu, HardwareSnapshot, MainBoard, Memory, Network,
    Os, RamModule,
};

type Result<T> = std::result::Result<T, DecodeError>;

/// A query result that can be read from its C record
pub trait Decode: Sized {
    type Raw;

    /// # Safety
    /// Every pointer in `raw` must be null or valid for reads, with array
    /// counts matching their allocations.
    unsafe fn decode(raw: &Self::Raw) -> Result<Self>;
}

/// Null reads as an empty string
unsafe fn read_string(ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Ok(String::new());
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_str()?.to_owned())
}

unsafe fn read_slice<'a, T>(ptr: *const T, count: c_int) -> &'a [T] {
    match usize::try_from(count) {
        Ok(len) if len > 0 && !ptr.is_null() => unsafe { slice::from_raw_parts(ptr, len) },
        _ => &[],
    }
}

unsafe fn read_strings(array: &CStringArray) -> Result<Vec<String>> {
    unsafe { read_slice(array.strings, array.count) }
        .iter()
        .map(|&s| unsafe { read_string(s) })
        .collect()
}

/// # Safety
/// `ptr` must be null or point at `count` valid records.
pub unsafe fn decode_all<T: Decode>(ptr: *const T::Raw, count: c_int) -> Result<Vec<T>> {
    unsafe { read_slice(ptr, count) }
        .iter()
        .map(|raw| unsafe { T::decode(raw) })
        .collect()
}

/// # Safety
/// `array.values` must be null or valid for `array.count` reads.
pub unsafe fn decode_doubles(array: &CDoubleArray) -> Vec<f64> {
    unsafe { read_slice(array.values, array.count) }.to_vec()
}

/// # Safety
/// `array.values` must be null or valid for `array.count` reads.
pub unsafe fn decode_int64s(array: &CInt64Array) -> Vec<i64> {
    unsafe { read_slice(array.values, array.count) }.to_vec()
}

impl Decode for Cpu {
    type Raw = CCpu;

    unsafe fn decode(raw: &CCpu) -> Result<Self> {
        unsafe {
            Ok(Cpu {
                id: raw.id,
                vendor: read_string(raw.vendor)?,
                model_name: read_string(raw.model_name)?,
                num_physical_cores: raw.num_physical_cores,
                num_logical_cores: raw.num_logical_cores,
                max_clock_speed_mhz: raw.max_clock_speed_mhz,
                regular_clock_speed_mhz: raw.regular_clock_speed_mhz,
                l1_cache_size_bytes: raw.l1_cache_size_bytes,
                l2_cache_size_bytes: raw.l2_cache_size_bytes,
                l3_cache_size_bytes: raw.l3_cache_size_bytes,
                flags: read_strings(&raw.flags)?,
                logical_processors: Vec::new(),
            })
        }
    }
}

impl Decode for Os {
    type Raw = COs;

    unsafe fn decode(raw: &COs) -> Result<Self> {
        unsafe {
            Ok(Os {
                name: read_string(raw.name)?,
                version: read_string(raw.version)?,
                kernel: read_string(raw.kernel)?,
                is_32_bit: raw.is_32_bit,
                is_64_bit: raw.is_64_bit,
                is_little_endian: raw.is_little_endian,
            })
        }
    }
}

impl Decode for Gpu {
    type Raw = CGpu;

    unsafe fn decode(raw: &CGpu) -> Result<Self> {
        unsafe {
            Ok(Gpu {
                id: raw.id,
                vendor: read_string(raw.vendor)?,
                name: read_string(raw.name)?,
                driver_version: read_string(raw.driver_version)?,
                memory_bytes: raw.memory_bytes,
                frequency_mhz: raw.frequency_mhz,
                num_cores: raw.num_cores,
                vendor_id: read_string(raw.vendor_id)?,
                device_id: read_string(raw.device_id)?,
            })
        }
    }
}

impl Decode for RamModule {
    type Raw = CRamModule;

    unsafe fn decode(raw: &CRamModule) -> Result<Self> {
        unsafe {
            Ok(RamModule {
                id: raw.id,
                vendor: read_string(raw.vendor)?,
                name: read_string(raw.name)?,
                model: read_string(raw.model)?,
                serial_number: read_string(raw.serial_number)?,
                total_bytes: raw.total_bytes,
                frequency_hz: raw.frequency_hz,
            })
        }
    }
}

impl Decode for Memory {
    type Raw = CMemoryInfo;

    unsafe fn decode(raw: &CMemoryInfo) -> Result<Self> {
        Ok(Memory {
            total_bytes: raw.total_bytes,
            free_bytes: raw.free_bytes,
            available_bytes: raw.available_bytes,
            modules: unsafe { decode_all(raw.modules, raw.module_count)? },
        })
    }
}

impl Decode for MainBoard {
    type Raw = CMainBoard;

    unsafe fn decode(raw: &CMainBoard) -> Result<Self> {
        unsafe {
            Ok(MainBoard {
                vendor: read_string(raw.vendor)?,
                name: read_string(raw.name)?,
                version: read_string(raw.version)?,
                serial_number: read_string(raw.serial_number)?,
            })
        }
    }
}

impl Decode for Disk {
    type Raw = CDisk;

    unsafe fn decode(raw: &CDisk) -> Result<Self> {
        unsafe {
            Ok(Disk {
                id: raw.id,
                vendor: read_string(raw.vendor)?,
                model: read_string(raw.model)?,
                serial_number: read_string(raw.serial_number)?,
                size_bytes: raw.size_bytes,
                free_size_bytes: raw.free_size_bytes,
                volumes: read_strings(&raw.volumes)?,
            })
        }
    }
}

impl Decode for Battery {
    type Raw = CBattery;

    unsafe fn decode(raw: &CBattery) -> Result<Self> {
        unsafe {
            Ok(Battery {
                id: raw.id,
                vendor: read_string(raw.vendor)?,
                model: read_string(raw.model)?,
                serial_number: read_string(raw.serial_number)?,
                technology: read_string(raw.technology)?,
                energy_full_mwh: raw.energy_full,
                energy_now_mwh: raw.energy_now,
                charging: raw.charging,
            })
        }
    }
}

impl Decode for Network {
    type Raw = CNetwork;

    unsafe fn decode(raw: &CNetwork) -> Result<Self> {
        unsafe {
            Ok(Network {
                interface_index: read_string(raw.interface_index)?,
                description: read_string(raw.description)?,
                mac_address: read_string(raw.mac)?,
                ipv4_address: read_string(raw.ip4)?,
                ipv6_address: read_string(raw.ip6)?,
            })
        }
    }
}

/// Call a `get_all_*` / `get_*_count` pair, decode the result and free it
fn fetch_list<T: Decode>(
    count: extern "C" fn() -> c_int,
    get: extern "C" fn() -> *mut T::Raw,
    free: unsafe extern "C" fn(*mut T::Raw, c_int),
) -> Result<Vec<T>> {
    // a successful get fills the cache, so the count read after it matches
    let ptr = get();
    let count = count();
    let decoded = unsafe { decode_all(ptr, count) };
    unsafe { free(ptr, count) };
    decoded
}

fn fetch_one<T: Decode>(
    category: Category,
    get: extern "C" fn() -> *mut T::Raw,
    free: unsafe extern "C" fn(*mut T::Raw),
) -> Result<T> {
    let ptr = get();
    if ptr.is_null() {
        return Err(DecodeError::Unavailable(category));
    }
    let decoded = unsafe { T::decode(&*ptr) };
    unsafe { free(ptr) };
    decoded
}

fn fetch_sample(cpu_id: c_int) -> CpuSample {
    let utilization = super::get_cpu_utilization(cpu_id);

    let threads = super::get_cpu_thread_utilizations(cpu_id);
    let thread_utilizations = if threads.is_null() {
        Vec::new()
    } else {
        unsafe {
            let values = decode_doubles(&*threads);
            super::free_double_array(threads);
            values
        }
    };

    let speeds = super::get_cpu_thread_speeds_mhz(cpu_id);
    let thread_speeds_mhz = if speeds.is_null() {
        Vec::new()
    } else {
        unsafe {
            let values = decode_int64s(&*speeds);
            super::free_int64_array(speeds);
            values
        }
    };

    CpuSample {
        cpu_id,
        utilization,
        thread_utilizations,
        thread_speeds_mhz,
    }
}

/// Read every category through the exported C functions, freeing each
/// result once it is decoded
pub fn read_snapshot() -> Result<HardwareSnapshot> {
    let cpus: Vec<Cpu> =
        fetch_list(super::get_cpu_count, super::get_all_cpus, super::free_cpu_info)?;
    let cpu_samples = cpus.iter().map(|cpu| fetch_sample(cpu.id)).collect();

    Ok(HardwareSnapshot {
        cpus,
        cpu_samples,
        os: fetch_one(Category::Os, super::get_os_info, super::free_os_info)?,
        gpus: fetch_list(super::get_gpu_count, super::get_all_gpus, super::free_gpu_info)?,
        memory: fetch_one(
            Category::Memory,
            super::get_memory_info,
            super::free_memory_info,
        )?,
        mainboard: fetch_one(
            Category::MainBoard,
            super::get_mainboard_info,
            super::free_mainboard_info,
        )?,
        disks: fetch_list(super::get_disk_count, super::get_all_disks, super::free_disk_info)?,
        batteries: fetch_list(
            super::get_battery_count,
            super::get_all_batteries,
            super::free_battery_info,
        )?,
        networks: fetch_list(
            super::get_network_count,
            super::get_all_networks,
            super::free_network_info,
        )?,
    })
}

//! `#[repr(C)]` records, laid out exactly as in `include/hwinfo_ffi.h`

use std::ffi::{c_char, c_int};

/// `C_StringArray`. `strings` is never null for a marshaled record, even
/// when `count` is 0.
#[repr(C)]
#[derive(Debug)]
pub struct CStringArray {
    pub count: c_int,
    pub strings: *mut *mut c_char,
}

/// `C_DoubleArray`
#[repr(C)]
#[derive(Debug)]
pub struct CDoubleArray {
    pub count: c_int,
    pub values: *mut f64,
}

/// `C_Int64Array`
#[repr(C)]
#[derive(Debug)]
pub struct CInt64Array {
    pub count: c_int,
    pub values: *mut i64,
}

/// `C_CPU`
#[repr(C)]
#[derive(Debug)]
pub struct CCpu {
    pub id: c_int,
    pub vendor: *mut c_char,
    pub model_name: *mut c_char,
    pub num_physical_cores: c_int,
    pub num_logical_cores: c_int,
    pub max_clock_speed_mhz: i64,
    pub regular_clock_speed_mhz: i64,
    pub l1_cache_size_bytes: i64,
    pub l2_cache_size_bytes: i64,
    pub l3_cache_size_bytes: i64,
    pub flags: CStringArray,
}

/// `C_OS`
#[repr(C)]
#[derive(Debug)]
pub struct COs {
    pub name: *mut c_char,
    pub version: *mut c_char,
    pub kernel: *mut c_char,
    pub is_32_bit: bool,
    pub is_64_bit: bool,
    pub is_little_endian: bool,
}

/// `C_GPU`
#[repr(C)]
#[derive(Debug)]
pub struct CGpu {
    pub id: c_int,
    pub vendor: *mut c_char,
    pub name: *mut c_char,
    pub driver_version: *mut c_char,
    pub memory_bytes: i64,
    pub frequency_mhz: i64,
    pub num_cores: c_int,
    pub vendor_id: *mut c_char,
    pub device_id: *mut c_char,
}

/// `C_RAM_Module`
#[repr(C)]
#[derive(Debug)]
pub struct CRamModule {
    pub id: c_int,
    pub vendor: *mut c_char,
    pub name: *mut c_char,
    pub model: *mut c_char,
    pub serial_number: *mut c_char,
    pub total_bytes: i64,
    pub frequency_hz: i64,
}

/// `C_MemoryInfo`. `modules` follows the same non-null rule as
/// [`CStringArray::strings`].
#[repr(C)]
#[derive(Debug)]
pub struct CMemoryInfo {
    pub total_bytes: i64,
    pub free_bytes: i64,
    pub available_bytes: i64,
    pub module_count: c_int,
    pub modules: *mut CRamModule,
}

/// `C_MainBoard`
#[repr(C)]
#[derive(Debug)]
pub struct CMainBoard {
    pub vendor: *mut c_char,
    pub name: *mut c_char,
    pub version: *mut c_char,
    pub serial_number: *mut c_char,
}

/// `C_Disk`
#[repr(C)]
#[derive(Debug)]
pub struct CDisk {
    pub id: c_int,
    pub vendor: *mut c_char,
    pub model: *mut c_char,
    pub serial_number: *mut c_char,
    pub size_bytes: i64,
    pub free_size_bytes: i64,
    pub volumes: CStringArray,
}

/// `C_Battery`. Energies are in mWh.
#[repr(C)]
#[derive(Debug)]
pub struct CBattery {
    pub id: c_int,
    pub vendor: *mut c_char,
    pub model: *mut c_char,
    pub serial_number: *mut c_char,
    pub technology: *mut c_char,
    pub energy_full: u32,
    pub energy_now: u32,
    pub charging: bool,
}

/// `C_Network`
#[repr(C)]
#[derive(Debug)]
pub struct CNetwork {
    pub interface_index: *mut c_char,
    pub description: *mut c_char,
    pub mac: *mut c_char,
    pub ip4: *mut c_char,
    pub ip6: *mut c_char,
}

#[cfg(all(test, target_pointer_width = "64"))]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layouts_match_header() {
        assert_eq!(size_of::<CStringArray>(), 16);
        assert_eq!(offset_of!(CStringArray, strings), 8);
        assert_eq!(size_of::<CDoubleArray>(), 16);
        assert_eq!(size_of::<CInt64Array>(), 16);

        assert_eq!(offset_of!(CCpu, vendor), 8);
        assert_eq!(offset_of!(CCpu, num_physical_cores), 24);
        assert_eq!(offset_of!(CCpu, num_logical_cores), 28);
        assert_eq!(offset_of!(CCpu, max_clock_speed_mhz), 32);
        assert_eq!(offset_of!(CCpu, flags), 72);
        assert_eq!(size_of::<CCpu>(), 88);

        assert_eq!(offset_of!(COs, is_32_bit), 24);
        assert_eq!(size_of::<COs>(), 32);

        assert_eq!(offset_of!(CGpu, memory_bytes), 32);
        assert_eq!(offset_of!(CGpu, num_cores), 48);
        assert_eq!(offset_of!(CGpu, vendor_id), 56);
        assert_eq!(size_of::<CGpu>(), 72);

        assert_eq!(size_of::<CRamModule>(), 56);
        assert_eq!(offset_of!(CMemoryInfo, module_count), 24);
        assert_eq!(offset_of!(CMemoryInfo, modules), 32);
        assert_eq!(size_of::<CMemoryInfo>(), 40);

        assert_eq!(size_of::<CMainBoard>(), 32);

        assert_eq!(offset_of!(CDisk, size_bytes), 32);
        assert_eq!(offset_of!(CDisk, volumes), 48);
        assert_eq!(size_of::<CDisk>(), 64);

        assert_eq!(offset_of!(CBattery, energy_full), 40);
        assert_eq!(offset_of!(CBattery, charging), 48);
        assert_eq!(size_of::<CBattery>(), 56);

        assert_eq!(size_of::<CNetwork>(), 40);
    }
}

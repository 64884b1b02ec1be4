//! A machine with nothing in any list category

mod common;

use std::ptr;

use hwinfo_ffi::ffi::*;

fn setup() {
    common::install(common::bare_machine);
}

#[test]
fn empty_lists_are_null_with_zero_count() {
    setup();
    assert_eq!(get_gpu_count(), 0);
    let gpus = get_all_gpus();
    assert!(gpus.is_null());
    unsafe { free_gpu_info(gpus, 0) };

    assert_eq!(get_cpu_count(), 0);
    assert!(get_all_cpus().is_null());
    assert_eq!(get_disk_count(), 0);
    assert!(get_all_disks().is_null());
    assert_eq!(get_battery_count(), 0);
    assert!(get_all_batteries().is_null());
    assert_eq!(get_network_count(), 0);
    assert!(get_all_networks().is_null());
}

#[test]
fn cpu_queries_fail_closed_without_cpus() {
    setup();
    assert_eq!(get_cpu_utilization(0), -1.0);
    assert!(get_cpu_thread_utilizations(0).is_null());
    assert!(get_cpu_thread_speeds_mhz(0).is_null());
}

#[test]
fn memory_without_modules_keeps_a_freeable_array() {
    setup();
    let memory = get_memory_info();
    assert!(!memory.is_null());
    unsafe {
        assert_eq!((*memory).module_count, 0);
        assert_ne!((*memory).modules, ptr::null_mut());
        free_memory_info(memory);
    }
}

#[test]
fn singletons_are_still_reported() {
    setup();
    let os = get_os_info();
    let board = get_mainboard_info();
    assert!(!os.is_null());
    assert!(!board.is_null());
    unsafe {
        free_os_info(os);
        free_mainboard_info(board);
    }
}

//! Disk detection module
//!
//! Physical disks come from /sys/block on Linux, so a drive with nothing
//! mounted is still listed. sysinfo's mounted filesystems are attached to their
//! parent block device for the mount points and free space. Filesystems whose
//! device has no /sys/block entry (device mapper, other platforms) become disks
//! of their own.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sysinfo::Disks;

use super::sysfs::{child_dirs, read_attr, read_i64};
use crate::error::ProbeResult;

/// Size unit of /sys/block/<dev>/size, independent of the logical block size
const SECTOR_BYTES: i64 = 512;

/// Block devices that are never physical disks
const VIRTUAL_PREFIXES: [&str; 3] = ["loop", "ram", "zram"];

/// One physical disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub id: i32,
    pub vendor: String,
    pub model: String,
    pub serial_number: String,
    /// Capacity, or -1 when unknown
    pub size_bytes: i64,
    /// Available space on the mounted filesystems, or -1 with nothing mounted
    pub free_size_bytes: i64,
    /// Mount points of the disk's filesystems (e.g., "/", "/home")
    pub volumes: Vec<String>,
}

/// A mounted filesystem as sysinfo reports it
#[derive(Debug, Clone)]
pub(crate) struct Volume {
    pub device: String,
    pub mount_point: String,
    pub total_space: u64,
    pub available_space: u64,
}

impl Disk {
    /// Detect physical disks (platform-specific)
    pub(crate) fn detect(sys_root: &Path) -> ProbeResult<Vec<Disk>> {
        let disks = Disks::new_with_refreshed_list();

        let volumes = disks
            .list()
            .iter()
            .map(|disk| Volume {
                device: disk.name().to_string_lossy().to_string(),
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                total_space: disk.total_space(),
                available_space: disk.available_space(),
            })
            .collect::<Vec<_>>();

        Ok(group_volumes(&volumes, sys_root))
    }

    fn unmounted(id: usize, block: &Path) -> Disk {
        let device = block.join("device");
        Disk {
            id: id as i32,
            vendor: read_attr(device.join("vendor")),
            model: read_attr(device.join("model")),
            serial_number: read_attr(device.join("serial")),
            size_bytes: -1,
            free_size_bytes: -1,
            volumes: Vec::new(),
        }
    }

    fn attach(&mut self, volume: &Volume, count_size: bool) {
        if self.volumes.contains(&volume.mount_point) {
            return;
        }
        if count_size {
            self.size_bytes = add_known(self.size_bytes, volume.total_space);
        }
        self.free_size_bytes = add_known(self.free_size_bytes, volume.available_space);
        self.volumes.push(volume.mount_point.clone());
    }
}

/// Adds to a value that may still be the -1 "unknown" marker
fn add_known(current: i64, bytes: u64) -> i64 {
    let bytes = i64::try_from(bytes).unwrap_or(i64::MAX);
    current.max(0).saturating_add(bytes)
}

fn is_virtual(name: &str) -> bool {
    VIRTUAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Capacity from the sector count, -1 when missing or out of range
fn read_capacity(block: &Path) -> i64 {
    read_i64(block.join("size"))
        .ok()
        .filter(|sectors| *sectors >= 0)
        .and_then(|sectors| sectors.checked_mul(SECTOR_BYTES))
        .unwrap_or(-1)
}

/// List every physical block device, then attach each volume to its parent.
///
/// Block devices keep /sys/block order and come first; volumes without a block
/// device follow in first-seen order.
pub(crate) fn group_volumes(volumes: &[Volume], sys_root: &Path) -> Vec<Disk> {
    let mut devices: Vec<String> = Vec::new();
    let mut disks: Vec<Disk> = Vec::new();
    // Disks whose capacity is summed from their filesystems
    let mut sized_by_volumes: Vec<bool> = Vec::new();

    for block in child_dirs(sys_root.join("block")) {
        let Some(name) = block.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if is_virtual(&name) {
            continue;
        }

        let mut disk = Disk::unmounted(disks.len(), &block);
        disk.size_bytes = read_capacity(&block);
        sized_by_volumes.push(disk.size_bytes < 0);
        disks.push(disk);
        devices.push(name);
    }

    for volume in volumes {
        let device = parent_device(&volume.device);
        if is_virtual(&device) {
            continue;
        }

        let index = match devices.iter().position(|d| *d == device) {
            Some(index) => index,
            None => {
                let block = sys_root.join("block").join(&device);
                disks.push(Disk::unmounted(disks.len(), &block));
                sized_by_volumes.push(true);
                devices.push(device);
                disks.len() - 1
            }
        };

        disks[index].attach(volume, sized_by_volumes[index]);
    }

    disks
}

/// Block device that owns a partition
///
/// "/dev/nvme0n1p2" -> "nvme0n1", "/dev/sda1" -> "sda", "/dev/mmcblk0p1" -> "mmcblk0".
/// Anything else (device mapper, network filesystems) stands on its own.
pub(crate) fn parent_device(device: &str) -> String {
    let name = device.strip_prefix("/dev/").unwrap_or(device);

    if name.starts_with("nvme") || name.starts_with("mmcblk") || name.starts_with("loop") {
        if let Some(index) = name.rfind('p') {
            let suffix = &name[index + 1..];
            let stem = &name[..index];
            if !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit())
                && stem.ends_with(|c: char| c.is_ascii_digit())
            {
                return stem.to_string();
            }
        }
        return name.to_string();
    }

    let is_scsi_like = ["sd", "hd", "vd", "xvd"]
        .iter()
        .any(|prefix| name.starts_with(prefix));
    if is_scsi_like && !name.contains('/') {
        return name.trim_end_matches(|c: char| c.is_ascii_digit()).to_string();
    }

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn volume(device: &str, mount_point: &str, total: u64, free: u64) -> Volume {
        Volume {
            device: device.to_string(),
            mount_point: mount_point.to_string(),
            total_space: total,
            available_space: free,
        }
    }

    #[test]
    fn parent_device_strips_partitions() {
        assert_eq!(parent_device("/dev/nvme0n1p2"), "nvme0n1");
        assert_eq!(parent_device("/dev/nvme0n1"), "nvme0n1");
        assert_eq!(parent_device("/dev/sda1"), "sda");
        assert_eq!(parent_device("/dev/vdb"), "vdb");
        assert_eq!(parent_device("/dev/mmcblk0p1"), "mmcblk0");
        assert_eq!(parent_device("/dev/mapper/vg-root"), "mapper/vg-root");
        assert_eq!(parent_device("tmpfs"), "tmpfs");
    }

    #[test]
    fn group_volumes_merges_partitions() {
        let temp_dir = TempDir::new().unwrap();
        let block = temp_dir.path().join("block/nvme0n1/device");
        fs::create_dir_all(&block).unwrap();
        fs::write(block.join("model"), "Samsung SSD 980 PRO 1TB\n").unwrap();
        fs::write(block.join("serial"), "S5GXNX0T123456\n").unwrap();

        let volumes = vec![
            volume("/dev/nvme0n1p2", "/", 100, 40),
            volume("/dev/sdb1", "/mnt/data", 500, 250),
            volume("/dev/nvme0n1p3", "/home", 300, 100),
            volume("/dev/nvme0n1p3", "/home", 300, 100),
        ];
        let disks = group_volumes(&volumes, temp_dir.path());

        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].id, 0);
        assert_eq!(disks[0].model, "Samsung SSD 980 PRO 1TB");
        assert_eq!(disks[0].serial_number, "S5GXNX0T123456");
        assert_eq!(disks[0].vendor, "");
        assert_eq!(disks[0].volumes, vec!["/", "/home"]);
        assert_eq!(disks[0].size_bytes, 400);
        assert_eq!(disks[0].free_size_bytes, 140);

        assert_eq!(disks[1].id, 1);
        assert_eq!(disks[1].size_bytes, 500);
        assert_eq!(disks[1].free_size_bytes, 250);
        assert_eq!(disks[1].volumes, vec!["/mnt/data"]);
    }

    #[test]
    fn group_volumes_lists_unmounted_disks() {
        let temp_dir = TempDir::new().unwrap();
        let block = temp_dir.path().join("block");
        for (name, sectors) in [("nvme0n1", "1953525168"), ("sdb", "7814037168"), ("loop0", "8")] {
            fs::create_dir_all(block.join(name).join("device")).unwrap();
            fs::write(block.join(name).join("size"), format!("{sectors}\n")).unwrap();
        }
        fs::write(block.join("sdb/device/model"), "WDC WD40EFRX-68N\n").unwrap();

        let volumes = vec![
            volume("/dev/nvme0n1p2", "/", 900_000_000_000, 400_000_000_000),
            volume("/dev/nvme0n1p1", "/boot/efi", 500_000_000, 480_000_000),
            volume("/dev/loop0", "/snap/core/1", 4096, 0),
        ];
        let disks = group_volumes(&volumes, temp_dir.path());

        assert_eq!(disks.len(), 2);

        assert_eq!(disks[0].id, 0);
        assert_eq!(disks[0].size_bytes, 1953525168 * 512);
        assert_eq!(disks[0].free_size_bytes, 400_480_000_000);
        assert_eq!(disks[0].volumes, vec!["/", "/boot/efi"]);

        assert_eq!(disks[1].id, 1);
        assert_eq!(disks[1].model, "WDC WD40EFRX-68N");
        assert_eq!(disks[1].size_bytes, 7814037168 * 512);
        assert_eq!(disks[1].free_size_bytes, -1);
        assert!(disks[1].volumes.is_empty());
    }

    #[test]
    fn capacity_out_of_range_is_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let sda = temp_dir.path().join("block/sda");
        fs::create_dir_all(&sda).unwrap();
        fs::write(sda.join("size"), format!("{}\n", i64::MAX)).unwrap();

        let disks = group_volumes(&[], temp_dir.path());
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].size_bytes, -1);
        assert_eq!(disks[0].free_size_bytes, -1);
    }

    #[test]
    fn group_volumes_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(group_volumes(&[], temp_dir.path()).is_empty());
    }
}

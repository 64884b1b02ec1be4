//! GPU detection module
//!
//! Detects GPUs using:
//! - NVIDIA: nvidia-smi if available (cross-platform)
//! - Linux: /sys/class/drm card devices (AMD, Intel, anything else)

use std::fs;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::sysfs::{child_dirs, read_attr, read_i64};
use crate::error::{ProbeError, ProbeResult};

/// GPU vendor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Unknown,
}

impl GpuVendor {
    /// Classify a PCI vendor id such as "0x10de" or "10DE"
    pub fn from_pci_id(id: &str) -> Self {
        let id = id.trim().trim_start_matches("0x").trim_start_matches("0X");
        match id.to_ascii_lowercase().as_str() {
            "10de" => GpuVendor::Nvidia,
            "1002" | "1022" => GpuVendor::Amd,
            "8086" => GpuVendor::Intel,
            _ => GpuVendor::Unknown,
        }
    }
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "NVIDIA"),
            GpuVendor::Amd => write!(f, "AMD"),
            GpuVendor::Intel => write!(f, "Intel"),
            GpuVendor::Unknown => write!(f, "Unknown"),
        }
    }
}

/// GPU information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gpu {
    /// Position in the GPU list
    pub id: i32,
    pub vendor: String,
    /// GPU name (e.g., "NVIDIA GeForce RTX 4070 SUPER")
    pub name: String,
    pub driver_version: String,
    /// Dedicated memory in bytes
    pub memory_bytes: i64,
    /// Maximum core clock in MHz
    pub frequency_mhz: i64,
    pub num_cores: i32,
    /// PCI vendor id, lowercase hex without prefix (e.g., "10de")
    pub vendor_id: String,
    /// PCI device id, lowercase hex without prefix
    pub device_id: String,
}

impl Gpu {
    /// Detect all GPUs. NVIDIA cards reported by nvidia-smi take precedence over
    /// their drm entries.
    pub(crate) fn detect(sys_root: &Path, use_nvidia_smi: bool) -> ProbeResult<Vec<Gpu>> {
        let mut gpus = Vec::new();

        if use_nvidia_smi {
            match Self::detect_nvidia_smi() {
                Ok(nvidia) => gpus.extend(nvidia),
                Err(e) => tracing::trace!("nvidia-smi unavailable: {e}"),
            }
        }

        let have_nvidia = !gpus.is_empty();
        gpus.extend(
            detect_drm(&sys_root.join("class/drm"))
                .into_iter()
                .filter(|gpu| !(have_nvidia && gpu.vendor_id == "10de")),
        );

        for (index, gpu) in gpus.iter_mut().enumerate() {
            gpu.id = index as i32;
        }

        Ok(gpus)
    }

    /// Detect NVIDIA GPUs using nvidia-smi (cross-platform)
    fn detect_nvidia_smi() -> ProbeResult<Vec<Gpu>> {
        let output = Command::new("nvidia-smi")
            .args([
                "--query-gpu=name,memory.total,driver_version,clocks.max.gr,pci.device_id",
                "--format=csv,noheader,nounits",
            ])
            .output()
            .map_err(|source| ProbeError::Command {
                command: "nvidia-smi",
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command: "nvidia-smi",
                status: output.status,
            });
        }

        Ok(parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `nvidia-smi --query-gpu=name,memory.total,driver_version,clocks.max.gr,pci.device_id`
/// CSV output, one GPU per line.
pub(crate) fn parse_nvidia_smi(stdout: &str) -> Vec<Gpu> {
    stdout
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(", ").map(str::trim).collect();
            if parts.len() < 5 || parts[0].is_empty() {
                return None;
            }

            let raw_name = parts[0];
            let name = if raw_name.starts_with("NVIDIA") {
                raw_name.to_string()
            } else {
                format!("NVIDIA {}", raw_name)
            };
            // memory.total is MiB with nounits
            let memory_bytes = parts[1]
                .parse::<i64>()
                .ok()
                .and_then(|mib| mib.checked_mul(1024 * 1024))
                .filter(|bytes| *bytes >= 0)
                .unwrap_or(-1);
            let frequency_mhz = parts[3].parse::<i64>().unwrap_or(-1);

            // pci.device_id packs the device id above the vendor id, e.g. 0x268210DE
            let (vendor_id, device_id) =
                match u32::from_str_radix(parts[4].trim_start_matches("0x"), 16) {
                    Ok(packed) => (
                        format!("{:04x}", packed & 0xffff),
                        format!("{:04x}", packed >> 16),
                    ),
                    Err(_) => ("10de".to_string(), String::new()),
                };

            Some(Gpu {
                id: 0,
                vendor: GpuVendor::Nvidia.to_string(),
                name,
                driver_version: parts[2].to_string(),
                memory_bytes,
                frequency_mhz,
                num_cores: -1,
                vendor_id,
                device_id,
            })
        })
        .collect()
}

/// Detect GPUs from drm card devices
fn detect_drm(drm_root: &Path) -> Vec<Gpu> {
    let mut gpus = Vec::new();

    for card in child_dirs(drm_root) {
        let Some(name) = card.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // card0-DP-1 and friends are connectors, not devices
        if !name.starts_with("card") || name.contains('-') {
            continue;
        }

        let device_path = card.join("device");
        let vendor_id = normalize_pci_id(&read_attr(device_path.join("vendor")));
        if vendor_id.is_empty() {
            continue;
        }
        let device_id = normalize_pci_id(&read_attr(device_path.join("device")));
        let vendor = GpuVendor::from_pci_id(&vendor_id);

        let driver = fs::read_link(device_path.join("driver"))
            .ok()
            .and_then(|link| link.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_default();
        let driver_version = if driver.is_empty() {
            String::new()
        } else {
            read_attr(device_path.join("driver/module/version"))
        };

        let product = read_attr(device_path.join("product_name"));
        let gpu_name = if product.is_empty() {
            format!("{} GPU [{}:{}]", vendor, vendor_id, device_id)
        } else {
            product
        };

        let memory_bytes = read_i64(device_path.join("mem_info_vram_total")).unwrap_or(-1);
        let frequency_mhz = fs::read_to_string(device_path.join("pp_dpm_sclk"))
            .ok()
            .and_then(|table| parse_dpm_max_mhz(&table))
            .unwrap_or(-1);

        gpus.push(Gpu {
            id: 0,
            vendor: vendor.to_string(),
            name: gpu_name,
            driver_version,
            memory_bytes,
            frequency_mhz,
            num_cores: -1,
            vendor_id,
            device_id,
        });
    }

    gpus
}

/// "0x10DE\n" -> "10de"
fn normalize_pci_id(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .to_ascii_lowercase()
}

/// Highest clock level in an amdgpu `pp_dpm_sclk` table
pub(crate) fn parse_dpm_max_mhz(table: &str) -> Option<i64> {
    table
        .lines()
        .filter_map(|line| {
            // "2: 2500Mhz *"
            let (_, rest) = line.split_once(':')?;
            let value = rest.split_whitespace().next()?;
            let digits = value.trim_end_matches(|c: char| !c.is_ascii_digit());
            digits.parse::<i64>().ok()
        })
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_nvidia_smi_reads_every_gpu() {
        let stdout = "NVIDIA GeForce RTX 4070 SUPER, 12282, 551.23, 3105, 0x278310DE\n\
                      Tesla T4, 15360, 535.104.05, 1590, 0x1EB810DE\n";
        let gpus = parse_nvidia_smi(stdout);

        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].name, "NVIDIA GeForce RTX 4070 SUPER");
        assert_eq!(gpus[0].memory_bytes, 12282 * 1024 * 1024);
        assert_eq!(gpus[0].driver_version, "551.23");
        assert_eq!(gpus[0].frequency_mhz, 3105);
        assert_eq!(gpus[0].vendor_id, "10de");
        assert_eq!(gpus[0].device_id, "2783");
        assert_eq!(gpus[1].name, "NVIDIA Tesla T4");
        assert_eq!(gpus[1].device_id, "1eb8");
    }

    #[test]
    fn parse_nvidia_smi_skips_short_lines() {
        assert!(parse_nvidia_smi("No devices were found\n").is_empty());
        assert!(parse_nvidia_smi("").is_empty());
    }

    #[test]
    fn parse_nvidia_smi_oversized_memory_is_unknown() {
        let stdout = "Tesla T4, 9223372036854775807, 535.104.05, 1590, 0x1EB810DE\n";
        let gpus = parse_nvidia_smi(stdout);

        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].memory_bytes, -1);
        assert_eq!(gpus[0].frequency_mhz, 1590);
    }

    #[test]
    fn parse_dpm_max_mhz_picks_highest_level() {
        let table = "0: 500Mhz\n1: 1800Mhz\n2: 2500Mhz *\n";
        assert_eq!(parse_dpm_max_mhz(table), Some(2500));
        assert_eq!(parse_dpm_max_mhz(""), None);
    }

    #[test]
    fn vendor_from_pci_id() {
        assert_eq!(GpuVendor::from_pci_id("0x10de"), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_pci_id("1002"), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_pci_id("0x8086"), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_pci_id("0x1af4"), GpuVendor::Unknown);
    }

    #[test]
    fn detect_drm_reads_cards_and_skips_connectors() {
        let temp_dir = TempDir::new().unwrap();
        let drm = temp_dir.path().join("class/drm");

        let amd = drm.join("card0/device");
        fs::create_dir_all(&amd).unwrap();
        fs::write(amd.join("vendor"), "0x1002\n").unwrap();
        fs::write(amd.join("device"), "0x73BF\n").unwrap();
        fs::write(amd.join("mem_info_vram_total"), "17163091968\n").unwrap();
        fs::write(amd.join("pp_dpm_sclk"), "0: 500Mhz\n1: 2615Mhz *\n").unwrap();
        fs::create_dir_all(drm.join("card0-DP-1")).unwrap();

        let nvidia = drm.join("card1/device");
        fs::create_dir_all(&nvidia).unwrap();
        fs::write(nvidia.join("vendor"), "0x10de\n").unwrap();
        fs::write(nvidia.join("device"), "0x2783\n").unwrap();

        let gpus = Gpu::detect(temp_dir.path(), false).unwrap();
        assert_eq!(gpus.len(), 2);

        assert_eq!(gpus[0].id, 0);
        assert_eq!(gpus[0].vendor, "AMD");
        assert_eq!(gpus[0].vendor_id, "1002");
        assert_eq!(gpus[0].device_id, "73bf");
        assert_eq!(gpus[0].name, "AMD GPU [1002:73bf]");
        assert_eq!(gpus[0].memory_bytes, 17163091968);
        assert_eq!(gpus[0].frequency_mhz, 2615);

        assert_eq!(gpus[1].id, 1);
        assert_eq!(gpus[1].vendor, "NVIDIA");
        assert_eq!(gpus[1].memory_bytes, -1);
    }

    #[test]
    fn detect_without_drm_finds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Gpu::detect(temp_dir.path(), false).unwrap().is_empty());
    }
}

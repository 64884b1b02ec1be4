//! RAM detection module
//!
//! Detects memory using:
//! - Cross-platform: sysinfo for total/free/available bytes
//! - Linux: dmidecode for installed modules (requires root, but we try anyway)

use std::process::Command;

use serde::{Deserialize, Serialize};
use sysinfo::System;

use super::sysfs::is_placeholder;
use crate::error::{ProbeError, ProbeResult};

/// One installed memory module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamModule {
    pub id: i32,
    pub vendor: String,
    /// Slot name (e.g., "DIMM_A1")
    pub name: String,
    /// Part number
    pub model: String,
    pub serial_number: String,
    pub total_bytes: i64,
    pub frequency_hz: i64,
}

/// Memory totals and installed modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub total_bytes: i64,
    pub free_bytes: i64,
    pub available_bytes: i64,
    pub modules: Vec<RamModule>,
}

impl Memory {
    /// Detect memory information (platform-specific)
    pub(crate) fn detect(use_dmidecode: bool) -> ProbeResult<Self> {
        let mut sys = System::new();
        sys.refresh_memory();

        let modules = if use_dmidecode {
            Self::get_dmidecode_modules().unwrap_or_else(|e| {
                tracing::trace!("dmidecode unavailable: {e}");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        Ok(Memory {
            total_bytes: sys.total_memory() as i64,
            free_bytes: sys.free_memory() as i64,
            available_bytes: sys.available_memory() as i64,
            modules,
        })
    }

    /// Get installed modules from dmidecode (requires root)
    fn get_dmidecode_modules() -> ProbeResult<Vec<RamModule>> {
        let output = Command::new("dmidecode")
            .args(["-t", "17"])
            .output()
            .map_err(|source| ProbeError::Command {
                command: "dmidecode",
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command: "dmidecode",
                status: output.status,
            });
        }

        Ok(parse_dmidecode(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `dmidecode -t 17` output into populated memory modules
pub(crate) fn parse_dmidecode(stdout: &str) -> Vec<RamModule> {
    let mut modules = Vec::new();

    for block in stdout.split("\n\n") {
        if !block.contains("Memory Device") {
            continue;
        }

        let field = |key: &str| -> String {
            block
                .lines()
                .filter_map(|line| line.trim().split_once(':'))
                .find(|(k, _)| k.trim() == key)
                .map(|(_, v)| v.trim())
                .filter(|v| !is_placeholder(v))
                .unwrap_or_default()
                .to_string()
        };

        let Some(total_bytes) = parse_module_size(&field("Size")) else {
            // "No Module Installed"
            continue;
        };

        let frequency_hz = parse_module_speed(&field("Configured Memory Speed"))
            .or_else(|| parse_module_speed(&field("Speed")))
            .unwrap_or(-1);

        modules.push(RamModule {
            id: modules.len() as i32,
            vendor: field("Manufacturer"),
            name: field("Locator"),
            model: field("Part Number"),
            serial_number: field("Serial Number"),
            total_bytes,
            frequency_hz,
        });
    }

    modules
}

/// "16 GB" / "8192 MB" -> bytes, -1 when the size does not fit
fn parse_module_size(raw: &str) -> Option<i64> {
    let mut parts = raw.split_whitespace();
    let value: i64 = parts.next()?.parse().ok()?;
    let multiplier = match parts.next()?.to_ascii_uppercase().as_str() {
        "KB" | "KIB" => 1024,
        "MB" | "MIB" => 1024 * 1024,
        "GB" | "GIB" => 1024 * 1024 * 1024,
        "TB" | "TIB" => 1024_i64 * 1024 * 1024 * 1024,
        _ => return None,
    };
    let bytes = value.checked_mul(multiplier).filter(|bytes| *bytes >= 0);
    Some(bytes.unwrap_or(-1))
}

/// "3200 MT/s" / "2666 MHz" -> Hz
fn parse_module_speed(raw: &str) -> Option<i64> {
    let value: i64 = raw.split_whitespace().next()?.parse().ok()?;
    value.checked_mul(1_000_000).filter(|hz| *hz >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DMIDECODE: &str = "\
# dmidecode 3.5
Getting SMBIOS data from sysfs.
SMBIOS 3.3.0 present.

Handle 0x0040, DMI type 17, 92 bytes
Memory Device
\tTotal Width: 64 bits
\tSize: 16 GB
\tLocator: DIMM_A1
\tBank Locator: BANK 0
\tType: DDR4
\tSpeed: 3200 MT/s
\tManufacturer: G.Skill
\tSerial Number: 00000000
\tPart Number: F4-3200C16-16GVK
\tConfigured Memory Speed: 3000 MT/s

Handle 0x0041, DMI type 17, 92 bytes
Memory Device
\tSize: No Module Installed
\tLocator: DIMM_A2
\tManufacturer: Unknown

Handle 0x0042, DMI type 17, 92 bytes
Memory Device
\tSize: 8192 MB
\tLocator: DIMM_B1
\tSpeed: 2666 MT/s
\tManufacturer: Not Specified
\tSerial Number: 1A2B3C4D
\tPart Number: M378A1K43CB2-CTD
";

    #[test]
    fn parse_dmidecode_skips_empty_slots() {
        let modules = parse_dmidecode(DMIDECODE);
        assert_eq!(modules.len(), 2);

        assert_eq!(modules[0].id, 0);
        assert_eq!(modules[0].vendor, "G.Skill");
        assert_eq!(modules[0].name, "DIMM_A1");
        assert_eq!(modules[0].model, "F4-3200C16-16GVK");
        assert_eq!(modules[0].total_bytes, 16 * 1024 * 1024 * 1024);
        assert_eq!(modules[0].frequency_hz, 3_000_000_000);

        assert_eq!(modules[1].id, 1);
        assert_eq!(modules[1].vendor, "");
        assert_eq!(modules[1].serial_number, "1A2B3C4D");
        assert_eq!(modules[1].total_bytes, 8192 * 1024 * 1024);
        assert_eq!(modules[1].frequency_hz, 2_666_000_000);
    }

    #[test]
    fn parse_dmidecode_without_devices() {
        assert!(parse_dmidecode("# dmidecode 3.5\n/dev/mem: Permission denied\n").is_empty());
    }

    #[test]
    fn parse_module_size_units() {
        assert_eq!(parse_module_size("32 GB"), Some(32 * 1024 * 1024 * 1024));
        assert_eq!(parse_module_size("512 MB"), Some(512 * 1024 * 1024));
        assert_eq!(parse_module_size("No Module Installed"), None);
        assert_eq!(parse_module_size(""), None);
    }

    #[test]
    fn oversized_module_values_are_unknown() {
        assert_eq!(parse_module_size("9223372036854775807 TB"), Some(-1));
        assert_eq!(parse_module_speed("9223372036854775807 MT/s"), None);

        let stdout = "Memory Device\n\
                      \tSize: 99999999999999 GB\n\
                      \tLocator: DIMM_A1\n\
                      \tSpeed: 3200 MT/s\n";
        let modules = parse_dmidecode(stdout);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].total_bytes, -1);
        assert_eq!(modules[0].frequency_hz, 3_200_000_000);
    }
}

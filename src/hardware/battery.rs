//! Battery detection module
//!
//! Linux only: reads /sys/class/power_supply entries of type "Battery".

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::sysfs::{child_dirs, read_attr, read_i64};
use crate::error::ProbeResult;

/// Battery information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub id: i32,
    pub vendor: String,
    pub model: String,
    pub serial_number: String,
    /// Cell chemistry (e.g., "Li-ion")
    pub technology: String,
    /// Last full charge energy in mWh, 0 when unknown
    pub energy_full_mwh: u32,
    /// Current energy in mWh, 0 when unknown
    pub energy_now_mwh: u32,
    pub charging: bool,
}

impl Battery {
    /// Detect batteries from power_supply sysfs
    pub(crate) fn detect(sys_root: &Path) -> ProbeResult<Vec<Battery>> {
        let mut batteries = Vec::new();

        for supply in child_dirs(sys_root.join("class/power_supply")) {
            if read_attr(supply.join("type")) != "Battery" {
                continue;
            }

            batteries.push(Battery {
                id: batteries.len() as i32,
                vendor: read_attr(supply.join("manufacturer")),
                model: read_attr(supply.join("model_name")),
                serial_number: read_attr(supply.join("serial_number")),
                technology: read_attr(supply.join("technology")),
                energy_full_mwh: read_energy_mwh(&supply, "full"),
                energy_now_mwh: read_energy_mwh(&supply, "now"),
                charging: read_attr(supply.join("status")) == "Charging",
            });
        }

        Ok(batteries)
    }
}

/// Read `energy_<which>` (µWh), falling back to `charge_<which>` (µAh) times
/// the design voltage (µV) for batteries that only report charge.
fn read_energy_mwh(supply: &Path, which: &str) -> u32 {
    let micro_wh = read_i64(supply.join(format!("energy_{which}"))).ok().or_else(|| {
        let charge = read_i64(supply.join(format!("charge_{which}"))).ok()?;
        let voltage = read_i64(supply.join("voltage_min_design")).ok()?;
        Some(charge.saturating_mul(voltage) / 1_000_000)
    });

    micro_wh
        .map(|uwh| (uwh / 1000).clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_supply(root: &Path, name: &str, attrs: &[(&str, &str)]) {
        let dir = root.join("class/power_supply").join(name);
        fs::create_dir_all(&dir).unwrap();
        for (attr, value) in attrs {
            fs::write(dir.join(attr), format!("{value}\n")).unwrap();
        }
    }

    #[test]
    fn detect_reads_batteries_and_skips_adapters() {
        let temp_dir = TempDir::new().unwrap();
        write_supply(temp_dir.path(), "AC", &[("type", "Mains"), ("online", "1")]);
        write_supply(
            temp_dir.path(),
            "BAT0",
            &[
                ("type", "Battery"),
                ("manufacturer", "SMP"),
                ("model_name", "5B10W51867"),
                ("serial_number", "1234"),
                ("technology", "Li-poly"),
                ("energy_full", "57000000"),
                ("energy_now", "42750000"),
                ("status", "Charging"),
            ],
        );
        write_supply(
            temp_dir.path(),
            "BAT1",
            &[
                ("type", "Battery"),
                ("charge_full", "4000000"),
                ("charge_now", "2000000"),
                ("voltage_min_design", "11400000"),
                ("status", "Discharging"),
            ],
        );

        write_supply(temp_dir.path(), "BAT2", &[("type", "Battery"), ("status", "Unknown")]);

        let batteries = Battery::detect(temp_dir.path()).unwrap();
        assert_eq!(batteries.len(), 3);

        assert_eq!(batteries[0].id, 0);
        assert_eq!(batteries[0].vendor, "SMP");
        assert_eq!(batteries[0].technology, "Li-poly");
        assert_eq!(batteries[0].energy_full_mwh, 57000);
        assert_eq!(batteries[0].energy_now_mwh, 42750);
        assert!(batteries[0].charging);

        assert_eq!(batteries[1].id, 1);
        assert_eq!(batteries[1].model, "");
        assert_eq!(batteries[1].energy_full_mwh, 45600);
        assert_eq!(batteries[1].energy_now_mwh, 22800);
        assert!(!batteries[1].charging);

        assert_eq!(batteries[2].energy_full_mwh, 0);
        assert_eq!(batteries[2].energy_now_mwh, 0);
    }

    #[test]
    fn detect_without_power_supply_class() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Battery::detect(temp_dir.path()).unwrap().is_empty());
    }
}

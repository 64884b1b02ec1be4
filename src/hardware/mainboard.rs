//! Mainboard information from the DMI id tables (Linux)

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::sysfs::read_attr;
use crate::error::ProbeResult;

/// Mainboard information. Fields the firmware leaves blank, or that need root
/// (the serial on most distributions), are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainBoard {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub serial_number: String,
}

impl MainBoard {
    pub(crate) fn detect(sys_root: &Path) -> ProbeResult<Self> {
        let dmi = sys_root.join("class/dmi/id");

        Ok(MainBoard {
            vendor: read_attr(dmi.join("board_vendor")),
            name: read_attr(dmi.join("board_name")),
            version: read_attr(dmi.join("board_version")),
            serial_number: read_attr(dmi.join("board_serial")),
        })
    }
}

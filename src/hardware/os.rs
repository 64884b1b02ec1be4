//! Operating system information

use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::error::ProbeResult;

/// Operating system information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Os {
    /// Distribution or product name (e.g., "Ubuntu", "Windows")
    pub name: String,
    pub version: String,
    pub kernel: String,
    pub is_32_bit: bool,
    pub is_64_bit: bool,
    pub is_little_endian: bool,
}

impl Os {
    pub(crate) fn detect() -> ProbeResult<Self> {
        Ok(Os {
            name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            version: System::os_version().unwrap_or_default(),
            kernel: System::kernel_version().unwrap_or_default(),
            is_32_bit: cfg!(target_pointer_width = "32"),
            is_64_bit: cfg!(target_pointer_width = "64"),
            is_little_endian: cfg!(target_endian = "little"),
        })
    }
}

//! CPU detection module
//!
//! Detects CPU sockets using:
//! - Linux: /proc/cpuinfo, cpufreq and cache sysfs
//! - Cross-platform: sysinfo crate (single socket fallback)

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sysinfo::System;

use super::sysfs::{child_dirs, read_i64, read_string};
use crate::error::ProbeResult;

/// One physical CPU package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cpu {
    /// Position in the socket list
    pub id: i32,
    /// Vendor string (e.g., "AuthenticAMD")
    pub vendor: String,
    /// Model name (e.g., "AMD Ryzen 7 5800X 8-Core Processor")
    pub model_name: String,
    pub num_physical_cores: i32,
    pub num_logical_cores: i32,
    pub max_clock_speed_mhz: i64,
    pub regular_clock_speed_mhz: i64,
    pub l1_cache_size_bytes: i64,
    pub l2_cache_size_bytes: i64,
    pub l3_cache_size_bytes: i64,
    /// Instruction set extensions (e.g., "sse4_2", "avx2")
    pub flags: Vec<String>,
    /// Logical processor numbers belonging to this socket
    #[serde(default)]
    pub logical_processors: Vec<usize>,
}

/// Point-in-time load and clock readings for one socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    pub cpu_id: i32,
    pub utilization: f64,
    pub thread_utilizations: Vec<f64>,
    pub thread_speeds_mhz: Vec<i64>,
}

impl Cpu {
    fn unknown() -> Self {
        Cpu {
            id: 0,
            vendor: String::new(),
            model_name: String::new(),
            num_physical_cores: -1,
            num_logical_cores: -1,
            max_clock_speed_mhz: -1,
            regular_clock_speed_mhz: -1,
            l1_cache_size_bytes: -1,
            l2_cache_size_bytes: -1,
            l3_cache_size_bytes: -1,
            flags: Vec::new(),
            logical_processors: Vec::new(),
        }
    }

    /// Detect all CPU sockets (platform-specific)
    pub(crate) fn detect(sys_root: &Path, proc_root: &Path) -> ProbeResult<Vec<Cpu>> {
        match fs::read_to_string(proc_root.join("cpuinfo")) {
            Ok(content) => {
                let mut cpus = parse_cpuinfo(&content);
                if !cpus.is_empty() {
                    for cpu in &mut cpus {
                        cpu.read_sysfs(sys_root);
                    }
                    return Ok(cpus);
                }
            }
            Err(e) => tracing::trace!("cpuinfo unavailable: {e}"),
        }

        Ok(Self::detect_sysinfo().into_iter().collect())
    }

    /// Single socket view built from sysinfo
    fn detect_sysinfo() -> Option<Cpu> {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        let cpus = sys.cpus();
        let first_cpu = cpus.first()?;

        let threads = cpus.len();
        let cores = sys.physical_core_count().unwrap_or(threads);

        Some(Cpu {
            vendor: first_cpu.vendor_id().to_string(),
            model_name: first_cpu.brand().trim().to_string(),
            num_physical_cores: cores as i32,
            num_logical_cores: threads as i32,
            regular_clock_speed_mhz: first_cpu.frequency() as i64,
            logical_processors: (0..threads).collect(),
            ..Cpu::unknown()
        })
    }

    /// Fill clocks and cache sizes from the socket's first logical processor
    fn read_sysfs(&mut self, sys_root: &Path) {
        let Some(&first) = self.logical_processors.first() else {
            return;
        };
        let cpu_dir = sys_root.join(format!("devices/system/cpu/cpu{first}"));

        if let Ok(khz) = read_i64(cpu_dir.join("cpufreq/cpuinfo_max_freq")) {
            self.max_clock_speed_mhz = khz / 1000; // kHz to MHz
        }
        if let Ok(khz) = read_i64(cpu_dir.join("cpufreq/base_frequency")) {
            self.regular_clock_speed_mhz = khz / 1000;
        }

        for index in child_dirs(cpu_dir.join("cache")) {
            let is_index = index
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("index"));
            if !is_index {
                continue;
            }

            let (Ok(level), Ok(kind), Some(size)) = (
                read_i64(index.join("level")),
                read_string(index.join("type")),
                read_string(index.join("size"))
                    .ok()
                    .and_then(|s| parse_cache_size(&s)),
            ) else {
                continue;
            };

            match level {
                1 if !kind.eq_ignore_ascii_case("instruction") => self.l1_cache_size_bytes = size,
                2 => self.l2_cache_size_bytes = size,
                3 => self.l3_cache_size_bytes = size,
                _ => {}
            }
        }
    }
}

/// Group /proc/cpuinfo processor blocks into sockets by `physical id`
pub(crate) fn parse_cpuinfo(content: &str) -> Vec<Cpu> {
    let mut sockets: BTreeMap<i64, Cpu> = BTreeMap::new();

    for block in content.split("\n\n") {
        let fields: HashMap<&str, &str> = block
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim(), value.trim()))
            .collect();

        let Some(processor) = fields.get("processor").and_then(|v| v.parse::<usize>().ok())
        else {
            continue;
        };
        let physical_id = fields
            .get("physical id")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let socket = sockets.entry(physical_id).or_insert_with(Cpu::unknown);
        socket.logical_processors.push(processor);

        if socket.vendor.is_empty() {
            if let Some(vendor) = fields.get("vendor_id").or(fields.get("CPU implementer")) {
                socket.vendor = vendor.to_string();
            }
        }
        if socket.model_name.is_empty() {
            if let Some(model) = fields.get("model name") {
                socket.model_name = model.to_string();
            }
        }
        if socket.flags.is_empty() {
            // ARM kernels call them "Features"
            if let Some(flags) = fields.get("flags").or(fields.get("Features")) {
                socket.flags = flags.split_whitespace().map(str::to_string).collect();
            }
        }
        if socket.num_physical_cores < 0 {
            if let Some(cores) = fields.get("cpu cores").and_then(|v| v.parse().ok()) {
                socket.num_physical_cores = cores;
            }
        }
        if socket.num_logical_cores < 0 {
            if let Some(siblings) = fields.get("siblings").and_then(|v| v.parse().ok()) {
                socket.num_logical_cores = siblings;
            }
        }
        if socket.regular_clock_speed_mhz < 0 {
            if let Some(mhz) = fields.get("cpu MHz").and_then(|v| v.parse::<f64>().ok()) {
                socket.regular_clock_speed_mhz = mhz.round() as i64;
            }
        }
    }

    sockets
        .into_values()
        .enumerate()
        .map(|(index, mut cpu)| {
            cpu.id = index as i32;
            if cpu.num_logical_cores < 0 {
                cpu.num_logical_cores = cpu.logical_processors.len() as i32;
            }
            if cpu.num_physical_cores < 0 {
                cpu.num_physical_cores = cpu.num_logical_cores;
            }
            cpu
        })
        .collect()
}

/// Parse a sysfs cache size such as "32K" or "16M" into bytes
pub(crate) fn parse_cache_size(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last()? {
        'K' | 'k' => (&raw[..raw.len() - 1], 1024),
        'M' | 'm' => (&raw[..raw.len() - 1], 1024 * 1024),
        'G' | 'g' => (&raw[..raw.len() - 1], 1024 * 1024 * 1024),
        _ => (raw, 1),
    };
    digits
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .filter(|bytes| *bytes >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_SOCKETS: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) Gold 6230 CPU @ 2.10GHz
physical id\t: 0
siblings\t: 2
cpu cores\t: 1
cpu MHz\t\t: 2100.000
flags\t\t: fpu vme sse4_2 avx2

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) Gold 6230 CPU @ 2.10GHz
physical id\t: 1
siblings\t: 2
cpu cores\t: 1
cpu MHz\t\t: 2099.612
flags\t\t: fpu vme sse4_2 avx2

processor\t: 2
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) Gold 6230 CPU @ 2.10GHz
physical id\t: 0
siblings\t: 2
cpu cores\t: 1
cpu MHz\t\t: 2100.000
flags\t\t: fpu vme sse4_2 avx2
";

    #[test]
    fn parse_cpuinfo_groups_processors_by_socket() {
        let cpus = parse_cpuinfo(TWO_SOCKETS);
        assert_eq!(cpus.len(), 2);

        assert_eq!(cpus[0].id, 0);
        assert_eq!(cpus[0].logical_processors, vec![0, 2]);
        assert_eq!(cpus[1].id, 1);
        assert_eq!(cpus[1].logical_processors, vec![1]);

        assert_eq!(cpus[0].vendor, "GenuineIntel");
        assert_eq!(cpus[0].num_physical_cores, 1);
        assert_eq!(cpus[0].num_logical_cores, 2);
        assert_eq!(cpus[0].regular_clock_speed_mhz, 2100);
        assert_eq!(cpus[0].flags, vec!["fpu", "vme", "sse4_2", "avx2"]);
        assert_eq!(cpus[0].l3_cache_size_bytes, -1);
    }

    #[test]
    fn parse_cpuinfo_handles_arm_layout() {
        let content = "processor\t: 0\nBogoMIPS\t: 48.00\n\
                       Features\t: fp asimd evtstrm\nCPU implementer\t: 0x41\n\n\
                       processor\t: 1\nBogoMIPS\t: 48.00\n\
                       Features\t: fp asimd evtstrm\nCPU implementer\t: 0x41\n";
        let cpus = parse_cpuinfo(content);

        assert_eq!(cpus.len(), 1);
        assert_eq!(cpus[0].vendor, "0x41");
        assert_eq!(cpus[0].flags, vec!["fp", "asimd", "evtstrm"]);
        assert_eq!(cpus[0].num_logical_cores, 2);
        assert_eq!(cpus[0].num_physical_cores, 2);
    }

    #[test]
    fn parse_cpuinfo_ignores_garbage() {
        assert!(parse_cpuinfo("").is_empty());
        assert!(parse_cpuinfo("Hardware\t: BCM2835\n").is_empty());
    }

    #[test]
    fn parse_cache_size_understands_suffixes() {
        assert_eq!(parse_cache_size("32K"), Some(32 * 1024));
        assert_eq!(parse_cache_size("16M\n"), Some(16 * 1024 * 1024));
        assert_eq!(parse_cache_size("512"), Some(512));
        assert_eq!(parse_cache_size("big"), None);
        assert_eq!(parse_cache_size(""), None);
        assert_eq!(parse_cache_size("9223372036854775807G"), None);
    }

    #[test]
    fn detect_reads_clocks_and_caches_from_sysfs() {
        let temp_dir = TempDir::new().unwrap();
        let proc_root = temp_dir.path().join("proc");
        let sys_root = temp_dir.path().join("sys");
        fs::create_dir_all(&proc_root).unwrap();
        fs::write(proc_root.join("cpuinfo"), TWO_SOCKETS).unwrap();

        let cpu0 = sys_root.join("devices/system/cpu/cpu0");
        fs::create_dir_all(cpu0.join("cpufreq")).unwrap();
        fs::write(cpu0.join("cpufreq/cpuinfo_max_freq"), "3900000\n").unwrap();
        fs::write(cpu0.join("cpufreq/base_frequency"), "2100000\n").unwrap();
        for (index, level, kind, size) in [
            ("index0", "1", "Data", "32K"),
            ("index1", "1", "Instruction", "64K"),
            ("index2", "2", "Unified", "1024K"),
            ("index3", "3", "Unified", "22528K"),
        ] {
            let dir = cpu0.join("cache").join(index);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("level"), level).unwrap();
            fs::write(dir.join("type"), kind).unwrap();
            fs::write(dir.join("size"), size).unwrap();
        }

        let cpus = Cpu::detect(&sys_root, &proc_root).unwrap();
        assert_eq!(cpus.len(), 2);
        assert_eq!(cpus[0].max_clock_speed_mhz, 3900);
        assert_eq!(cpus[0].regular_clock_speed_mhz, 2100);
        assert_eq!(cpus[0].l1_cache_size_bytes, 32 * 1024);
        assert_eq!(cpus[0].l2_cache_size_bytes, 1024 * 1024);
        assert_eq!(cpus[0].l3_cache_size_bytes, 22528 * 1024);
        // socket 1 has no sysfs entries in this tree
        assert_eq!(cpus[1].max_clock_speed_mhz, -1);
    }
}

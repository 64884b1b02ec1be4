//! Live probe of the current machine

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sysinfo::System;

use super::{Battery, Cpu, Disk, Gpu, HardwareProbe, MainBoard, Memory, Network, Os};
use crate::config::ProbeConfig;
use crate::error::{ProbeError, ProbeResult};

/// Reads hardware through sysinfo and sysfs/procfs
pub struct SystemProbe {
    sys_root: PathBuf,
    proc_root: PathBuf,
    use_nvidia_smi: bool,
    use_dmidecode: bool,
    sample_interval: Duration,
    sampler: Mutex<CpuSampler>,
}

/// Keeps the previous CPU time reading so utilization is a delta between two
/// refreshes.
struct CpuSampler {
    system: System,
    last_refresh: Option<Instant>,
}

impl CpuSampler {
    fn refresh_usage(&mut self, interval: Duration) {
        match self.last_refresh {
            // a recent baseline exists, only wait out the rest of the interval
            Some(last) if last.elapsed() <= interval.saturating_mul(10) => {
                let elapsed = last.elapsed();
                if elapsed < interval {
                    thread::sleep(interval - elapsed);
                }
            }
            _ => {
                self.system.refresh_cpu_usage();
                thread::sleep(interval);
            }
        }

        self.system.refresh_cpu_usage();
        self.last_refresh = Some(Instant::now());
    }
}

impl SystemProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        let sample_interval = Duration::from_millis(config.sample_interval_ms)
            .max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        Self {
            sys_root: config.sys_root.clone(),
            proc_root: config.proc_root.clone(),
            use_nvidia_smi: config.use_nvidia_smi,
            use_dmidecode: config.use_dmidecode,
            sample_interval,
            sampler: Mutex::new(CpuSampler {
                system: System::new(),
                last_refresh: None,
            }),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

/// Indices into sysinfo's CPU list for the logical processors of `cpu`
fn thread_indices(cpu: &Cpu, available: usize) -> Vec<usize> {
    if cpu.logical_processors.is_empty() {
        return (0..available).collect();
    }
    cpu.logical_processors
        .iter()
        .copied()
        .filter(|&index| index < available)
        .collect()
}

impl HardwareProbe for SystemProbe {
    fn cpus(&self) -> ProbeResult<Vec<Cpu>> {
        Cpu::detect(&self.sys_root, &self.proc_root)
    }

    fn cpu_utilization(&self, cpu: &Cpu) -> ProbeResult<f64> {
        let threads = self.thread_utilizations(cpu)?;
        if threads.is_empty() {
            return Ok(0.0);
        }
        Ok(threads.iter().sum::<f64>() / threads.len() as f64)
    }

    fn thread_utilizations(&self, cpu: &Cpu) -> ProbeResult<Vec<f64>> {
        let mut sampler = self.sampler.lock();
        sampler.refresh_usage(self.sample_interval);

        let cpus = sampler.system.cpus();
        Ok(thread_indices(cpu, cpus.len())
            .into_iter()
            .map(|index| f64::from(cpus[index].cpu_usage()) / 100.0)
            .collect())
    }

    fn thread_speeds_mhz(&self, cpu: &Cpu) -> ProbeResult<Vec<i64>> {
        let mut sampler = self.sampler.lock();
        sampler.system.refresh_cpu_frequency();

        let cpus = sampler.system.cpus();
        Ok(thread_indices(cpu, cpus.len())
            .into_iter()
            .map(|index| cpus[index].frequency() as i64)
            .collect())
    }

    fn os(&self) -> ProbeResult<Os> {
        Os::detect()
    }

    fn gpus(&self) -> ProbeResult<Vec<Gpu>> {
        Gpu::detect(&self.sys_root, self.use_nvidia_smi)
    }

    fn memory(&self) -> ProbeResult<Memory> {
        Memory::detect(self.use_dmidecode)
    }

    fn mainboard(&self) -> ProbeResult<MainBoard> {
        MainBoard::detect(&self.sys_root)
    }

    fn disks(&self) -> ProbeResult<Vec<Disk>> {
        Disk::detect(&self.sys_root)
    }

    fn batteries(&self) -> ProbeResult<Vec<Battery>> {
        // power_supply class is Linux only
        if !cfg!(target_os = "linux") {
            return Err(ProbeError::Unsupported("battery"));
        }
        Battery::detect(&self.sys_root)
    }

    fn networks(&self) -> ProbeResult<Vec<Network>> {
        Network::detect(&self.sys_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with_threads(threads: Vec<usize>) -> Cpu {
        Cpu {
            id: 0,
            vendor: "AuthenticAMD".to_string(),
            model_name: "AMD Ryzen 7 7800X3D 8-Core Processor".to_string(),
            num_physical_cores: 8,
            num_logical_cores: 16,
            max_clock_speed_mhz: 5050,
            regular_clock_speed_mhz: 4200,
            l1_cache_size_bytes: 32768,
            l2_cache_size_bytes: 1048576,
            l3_cache_size_bytes: 100663296,
            flags: Vec::new(),
            logical_processors: threads,
        }
    }

    #[test]
    fn thread_indices_follow_socket_membership() {
        assert_eq!(thread_indices(&cpu_with_threads(vec![0, 2, 9]), 4), vec![0, 2]);
        assert_eq!(thread_indices(&cpu_with_threads(Vec::new()), 3), vec![0, 1, 2]);
    }

    #[test]
    fn live_sample_has_one_value_per_thread() {
        let probe = SystemProbe::default();
        let cpus = probe.cpus().unwrap();
        let Some(cpu) = cpus.first() else {
            return;
        };

        let utilizations = probe.thread_utilizations(cpu).unwrap();
        let speeds = probe.thread_speeds_mhz(cpu).unwrap();
        assert_eq!(utilizations.len(), speeds.len());
        assert!(utilizations.iter().all(|u| (0.0..=1.0).contains(u)));

        let overall = probe.cpu_utilization(cpu).unwrap();
        assert!((0.0..=1.0).contains(&overall));
    }
}

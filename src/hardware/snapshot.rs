//! Captured hardware state and a probe that replays it

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Battery, Cpu, CpuSample, Disk, Gpu, HardwareProbe, MainBoard, Memory, Network, Os};
use crate::error::{ProbeError, ProbeResult};

/// Everything a [`HardwareProbe`] can report, at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareSnapshot {
    pub cpus: Vec<Cpu>,
    #[serde(default)]
    pub cpu_samples: Vec<CpuSample>,
    pub os: Os,
    #[serde(default)]
    pub gpus: Vec<Gpu>,
    pub memory: Memory,
    pub mainboard: MainBoard,
    #[serde(default)]
    pub disks: Vec<Disk>,
    #[serde(default)]
    pub batteries: Vec<Battery>,
    #[serde(default)]
    pub networks: Vec<Network>,
}

impl HardwareSnapshot {
    pub fn from_json(json: &str) -> ProbeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn sample(&self, cpu: &Cpu) -> ProbeResult<&CpuSample> {
        self.cpu_samples
            .iter()
            .find(|sample| sample.cpu_id == cpu.id)
            .ok_or_else(|| ProbeError::parse("snapshot", format!("no sample for CPU {}", cpu.id)))
    }
}

/// Serves a fixed [`HardwareSnapshot`]
#[derive(Debug, Clone)]
pub struct StaticProbe {
    snapshot: HardwareSnapshot,
}

impl StaticProbe {
    pub fn new(snapshot: HardwareSnapshot) -> Self {
        Self { snapshot }
    }

    /// Replay a snapshot written by `hwinfo-report capture`
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        HardwareSnapshot::load(path).map(Self::new)
    }

    pub fn snapshot(&self) -> &HardwareSnapshot {
        &self.snapshot
    }
}

impl HardwareProbe for StaticProbe {
    fn cpus(&self) -> ProbeResult<Vec<Cpu>> {
        Ok(self.snapshot.cpus.clone())
    }

    fn cpu_utilization(&self, cpu: &Cpu) -> ProbeResult<f64> {
        self.snapshot.sample(cpu).map(|s| s.utilization)
    }

    fn thread_utilizations(&self, cpu: &Cpu) -> ProbeResult<Vec<f64>> {
        self.snapshot
            .sample(cpu)
            .map(|s| s.thread_utilizations.clone())
    }

    fn thread_speeds_mhz(&self, cpu: &Cpu) -> ProbeResult<Vec<i64>> {
        self.snapshot.sample(cpu).map(|s| s.thread_speeds_mhz.clone())
    }

    fn os(&self) -> ProbeResult<Os> {
        Ok(self.snapshot.os.clone())
    }

    fn gpus(&self) -> ProbeResult<Vec<Gpu>> {
        Ok(self.snapshot.gpus.clone())
    }

    fn memory(&self) -> ProbeResult<Memory> {
        Ok(self.snapshot.memory.clone())
    }

    fn mainboard(&self) -> ProbeResult<MainBoard> {
        Ok(self.snapshot.mainboard.clone())
    }

    fn disks(&self) -> ProbeResult<Vec<Disk>> {
        Ok(self.snapshot.disks.clone())
    }

    fn batteries(&self) -> ProbeResult<Vec<Battery>> {
        Ok(self.snapshot.batteries.clone())
    }

    fn networks(&self) -> ProbeResult<Vec<Network>> {
        Ok(self.snapshot.networks.clone())
    }
}

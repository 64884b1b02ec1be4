//! Injectable handle that owns a probe and its per-category caches

use std::sync::Arc;

use tracing::debug;

use crate::cache::SnapshotCell;
use crate::config::{Config, ProbeConfig};
use crate::error::{ProbeResult, QueryError, Result};
use crate::hardware::{
    Battery, Category, Cpu, CpuSample, Disk, Gpu, HardwareProbe, HardwareSnapshot, MainBoard,
    Memory, Network, Os, SystemProbe,
};

/// Whether OS, memory and mainboard are cached like the list categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SingletonPolicy {
    /// Probe again on every call
    #[default]
    Fresh,
    /// Probe once, then serve the cached value until invalidated
    Cached,
}

/// Query handle over a [`HardwareProbe`].
///
/// CPU, GPU, disk, battery and network lists are probed on first use and
/// kept until [`invalidate`](Self::invalidate) is called. Counts read the
/// same cache, so asking for a count populates it exactly like fetching the
/// list does.
pub struct HardwareContext {
    probe: Box<dyn HardwareProbe>,
    policy: SingletonPolicy,
    cpus: SnapshotCell<Vec<Cpu>>,
    gpus: SnapshotCell<Vec<Gpu>>,
    disks: SnapshotCell<Vec<Disk>>,
    batteries: SnapshotCell<Vec<Battery>>,
    networks: SnapshotCell<Vec<Network>>,
    os: SnapshotCell<Os>,
    memory: SnapshotCell<Memory>,
    mainboard: SnapshotCell<MainBoard>,
}

impl HardwareContext {
    pub fn new(probe: impl HardwareProbe + 'static) -> Self {
        Self::with_policy(probe, SingletonPolicy::default())
    }

    pub fn with_policy(probe: impl HardwareProbe + 'static, policy: SingletonPolicy) -> Self {
        Self {
            probe: Box::new(probe),
            policy,
            cpus: SnapshotCell::new(Category::Cpu),
            gpus: SnapshotCell::new(Category::Gpu),
            disks: SnapshotCell::new(Category::Disk),
            batteries: SnapshotCell::new(Category::Battery),
            networks: SnapshotCell::new(Category::Network),
            os: SnapshotCell::new(Category::Os),
            memory: SnapshotCell::new(Category::Memory),
            mainboard: SnapshotCell::new(Category::MainBoard),
        }
    }

    /// Context over the live machine
    pub fn system(config: &ProbeConfig) -> Self {
        let policy = if config.cache_singletons {
            SingletonPolicy::Cached
        } else {
            SingletonPolicy::Fresh
        };
        Self::with_policy(SystemProbe::new(config), policy)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::system(&config.probe)
    }

    pub fn policy(&self) -> SingletonPolicy {
        self.policy
    }

    pub fn probe(&self) -> &dyn HardwareProbe {
        self.probe.as_ref()
    }

    fn list<T>(
        &self,
        cell: &SnapshotCell<Vec<T>>,
        probe: impl FnOnce(&dyn HardwareProbe) -> ProbeResult<Vec<T>>,
    ) -> Result<Arc<Vec<T>>> {
        let items = cell.get_or_populate(|| {
            let items = probe(self.probe.as_ref())?;
            debug!(category = %cell.category(), count = items.len(), "probed hardware");
            Ok::<_, QueryError>(items)
        })?;
        Ok(items)
    }

    fn singleton<T>(
        &self,
        cell: &SnapshotCell<T>,
        probe: impl FnOnce(&dyn HardwareProbe) -> ProbeResult<T>,
    ) -> Result<Arc<T>> {
        match self.policy {
            SingletonPolicy::Fresh => Ok(Arc::new(probe(self.probe.as_ref())?)),
            SingletonPolicy::Cached => {
                let value = cell.get_or_populate(|| probe(self.probe.as_ref()))?;
                Ok(value)
            }
        }
    }

    pub fn cpus(&self) -> Result<Arc<Vec<Cpu>>> {
        self.list(&self.cpus, |probe| probe.cpus())
    }

    pub fn cpu_count(&self) -> Result<usize> {
        Ok(self.cpus()?.len())
    }

    /// The CPU socket at position `id`
    pub fn cpu(&self, id: i32) -> Result<Cpu> {
        let cpus = self.cpus()?;
        if cpus.is_empty() {
            return Err(QueryError::NotFound(Category::Cpu));
        }

        usize::try_from(id)
            .ok()
            .and_then(|index| cpus.get(index))
            .cloned()
            .ok_or(QueryError::InvalidIndex {
                category: Category::Cpu,
                index: id,
                count: cpus.len(),
            })
    }

    pub fn cpu_utilization(&self, id: i32) -> Result<f64> {
        let cpu = self.cpu(id)?;
        Ok(self.probe.cpu_utilization(&cpu)?)
    }

    pub fn cpu_thread_utilizations(&self, id: i32) -> Result<Vec<f64>> {
        let cpu = self.cpu(id)?;
        Ok(self.probe.thread_utilizations(&cpu)?)
    }

    pub fn cpu_thread_speeds_mhz(&self, id: i32) -> Result<Vec<i64>> {
        let cpu = self.cpu(id)?;
        Ok(self.probe.thread_speeds_mhz(&cpu)?)
    }

    pub fn gpus(&self) -> Result<Arc<Vec<Gpu>>> {
        self.list(&self.gpus, |probe| probe.gpus())
    }

    pub fn gpu_count(&self) -> Result<usize> {
        Ok(self.gpus()?.len())
    }

    pub fn disks(&self) -> Result<Arc<Vec<Disk>>> {
        self.list(&self.disks, |probe| probe.disks())
    }

    pub fn disk_count(&self) -> Result<usize> {
        Ok(self.disks()?.len())
    }

    pub fn batteries(&self) -> Result<Arc<Vec<Battery>>> {
        self.list(&self.batteries, |probe| probe.batteries())
    }

    pub fn battery_count(&self) -> Result<usize> {
        Ok(self.batteries()?.len())
    }

    pub fn networks(&self) -> Result<Arc<Vec<Network>>> {
        self.list(&self.networks, |probe| probe.networks())
    }

    pub fn network_count(&self) -> Result<usize> {
        Ok(self.networks()?.len())
    }

    pub fn os(&self) -> Result<Arc<Os>> {
        self.singleton(&self.os, |probe| probe.os())
    }

    pub fn memory(&self) -> Result<Arc<Memory>> {
        self.singleton(&self.memory, |probe| probe.memory())
    }

    pub fn mainboard(&self) -> Result<Arc<MainBoard>> {
        self.singleton(&self.mainboard, |probe| probe.mainboard())
    }

    /// Forget cached results for `category`
    pub fn invalidate(&self, category: Category) {
        match category {
            Category::Cpu => self.cpus.invalidate(),
            Category::Gpu => self.gpus.invalidate(),
            Category::Disk => self.disks.invalidate(),
            Category::Battery => self.batteries.invalidate(),
            Category::Network => self.networks.invalidate(),
            Category::Os => self.os.invalidate(),
            Category::Memory => self.memory.invalidate(),
            Category::MainBoard => self.mainboard.invalidate(),
        }
    }

    /// Everything this context can report, including one utilization sample
    /// per CPU socket
    pub fn snapshot(&self) -> Result<HardwareSnapshot> {
        let cpus = self.cpus()?;
        let cpu_samples = cpus
            .iter()
            .map(|cpu| -> Result<CpuSample> {
                Ok(CpuSample {
                    cpu_id: cpu.id,
                    utilization: self.probe.cpu_utilization(cpu)?,
                    thread_utilizations: self.probe.thread_utilizations(cpu)?,
                    thread_speeds_mhz: self.probe.thread_speeds_mhz(cpu)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(HardwareSnapshot {
            cpus: cpus.to_vec(),
            cpu_samples,
            os: self.os()?.as_ref().clone(),
            gpus: self.gpus()?.to_vec(),
            memory: self.memory()?.as_ref().clone(),
            mainboard: self.mainboard()?.as_ref().clone(),
            disks: self.disks()?.to_vec(),
            batteries: self.batteries()?.to_vec(),
            networks: self.networks()?.to_vec(),
        })
    }
}

use {
    anyhow::{Context, Result},
    indexmap::IndexMap,
    std::{
        path::{Path, PathBuf},
        sync::Arc,
    },
    tap::prelude::*,
    tracing::{debug, instrument},
};

pub mod address;
pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;
pub mod temperature;

pub use {
    address::InterfaceAddress,
    cpu::{CpuSampler, CpuTimes},
    disk::DiskUsage,
    memory::VirtualMemory,
    network::IoCounters,
};

/// Prefix under which `/proc` and `/sys` are looked up. `/` on a live system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostRoot(Arc<Path>);

impl Default for HostRoot {
    fn default() -> Self {
        Self::live()
    }
}

impl HostRoot {
    pub fn live() -> Self {
        Self::new("/")
    }
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(path.as_ref()))
    }
    pub fn path(&self) -> &Path {
        &self.0
    }
    pub fn join(&self, absolute: &str) -> PathBuf {
        self.0.join(absolute.trim_start_matches('/'))
    }
    pub(crate) fn read_to_string(&self, absolute: &str) -> Result<String> {
        self.join(absolute)
            .pipe(|path| std::fs::read_to_string(&path).with_context(|| format!("reading [{}]", path.display())))
    }
}

/// What to collect besides the always-present metrics.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub disk_path: PathBuf,
    pub interfaces: Vec<String>,
    pub skip_interfaces: Vec<String>,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self {
            disk_path: PathBuf::from("/"),
            interfaces: vec!["wlan0".into(), "eth0".into()],
            skip_interfaces: vec!["lo".into()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub taken_at: chrono::DateTime<chrono::Local>,
    pub address: Option<InterfaceAddress>,
    pub cpu_percent: f64,
    pub temperature: Option<f64>,
    pub memory: VirtualMemory,
    pub disk: DiskUsage,
    /// in the order they were requested, `None` for interfaces the host does not have
    pub interfaces: IndexMap<String, Option<IoCounters>>,
}

impl Snapshot {
    #[instrument(skip(sampler), level = "DEBUG")]
    pub fn collect(sampler: &mut CpuSampler, request: &SnapshotRequest) -> Result<Self> {
        let root = sampler.root().clone();
        let counters = network::net_io_counters(&root).context("reading network counters")?;
        Ok(Self {
            taken_at: chrono::Local::now(),
            address: address::first_ipv4(&request.skip_interfaces),
            cpu_percent: sampler.sample().context("sampling cpu")?,
            temperature: temperature::first_celsius(&root).context("listing temperature sensors")?,
            memory: VirtualMemory::read(&root).context("reading memory usage")?,
            disk: DiskUsage::of(&request.disk_path).context("reading disk usage")?,
            interfaces: request
                .interfaces
                .iter()
                .map(|name| (name.clone(), counters.get(name).copied()))
                .collect(),
        })
        .tap_ok(|snapshot| debug!(?snapshot, "collected"))
    }
}

pub(crate) fn list_dir(path: &Path) -> Result<Vec<String>> {
    match std::fs::read_dir(path) {
        Ok(entries) => entries
            .map(|entry| {
                entry
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .with_context(|| format!("listing [{}]", path.display()))
            })
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(e).with_context(|| format!("listing [{}]", path.display())),
    }
}

/// `hwmon10` sorts after `hwmon2`
pub(crate) fn natural_key(name: &str) -> (&str, u64, &str) {
    let start = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    let end = name[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|offset| start + offset)
        .unwrap_or(name.len());
    (&name[..start], name[start..end].parse().unwrap_or(0), &name[end..])
}

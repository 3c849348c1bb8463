use {
    crate::HostRoot,
    anyhow::{Context, Result},
    std::collections::HashMap,
    tap::prelude::*,
};

/// System memory in bytes, as `/proc/meminfo` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualMemory {
    pub total: u64,
    pub available: u64,
    pub free: u64,
    pub buffers: u64,
    /// page cache plus reclaimable slab
    pub cached: u64,
    pub used: u64,
}

fn parse_fields(meminfo: &str) -> Result<HashMap<&str, u64>> {
    meminfo
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_once(':')
                .with_context(|| format!("no ':' in [{line}]"))
                .and_then(|(key, value)| {
                    let mut parts = value.split_whitespace();
                    let amount = parts
                        .next()
                        .context("no value")
                        .and_then(|amount| amount.parse::<u64>().context("bad value"))
                        .with_context(|| format!("parsing [{line}]"))?;
                    match parts.next() {
                        Some("kB") => amount
                            .checked_mul(1024)
                            .with_context(|| format!("[{line}] does not fit into 64 bits of bytes"))
                            .map(|bytes| (key.trim(), bytes)),
                        Some(unit) => Err(anyhow::anyhow!("unknown unit '{unit}' in [{line}]")),
                        None => Ok((key.trim(), amount)),
                    }
                })
        })
        .collect()
}

impl VirtualMemory {
    pub fn parse(meminfo: &str) -> Result<Self> {
        let fields = parse_fields(meminfo)?;
        let field = |name: &str| {
            fields
                .get(name)
                .copied()
                .with_context(|| format!("meminfo has no [{name}]"))
        };
        let optional = |name: &str| fields.get(name).copied().unwrap_or(0);

        let total = field("MemTotal")?;
        let free = field("MemFree")?;
        let buffers = optional("Buffers");
        let cached = optional("Cached").saturating_add(optional("SReclaimable"));
        let reclaimable = free.saturating_add(buffers).saturating_add(cached);
        let available = field("MemAvailable").unwrap_or(reclaimable);
        let used = total
            .checked_sub(reclaimable)
            .unwrap_or_else(|| total.saturating_sub(free));
        Ok(Self {
            total,
            available,
            free,
            buffers,
            cached,
            used,
        })
    }

    pub fn read(root: &HostRoot) -> Result<Self> {
        root.read_to_string("/proc/meminfo")
            .and_then(|meminfo| Self::parse(&meminfo).context("parsing meminfo"))
    }

    /// Percent of memory that is not available to new allocations.
    pub fn percent(&self) -> f64 {
        match self.total {
            0 => 0.0,
            total => total
                .saturating_sub(self.available)
                .pipe(|unavailable| unavailable as f64 / total as f64 * 100.0),
        }
    }
}

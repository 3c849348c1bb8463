use {
    crate::HostRoot,
    anyhow::{Context, Result},
    tap::prelude::*,
    tracing::{instrument, trace},
};

/// Aggregate jiffies of the `cpu` line in `/proc/stat`. `idle` includes iowait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

impl CpuTimes {
    pub fn parse(stat: &str) -> Result<Self> {
        stat.lines()
            .find(|line| line.split_whitespace().next() == Some("cpu"))
            .context("no aggregate cpu line")
            .and_then(|line| {
                line.split_whitespace()
                    .skip(1)
                    // guest time is already part of user/nice
                    .take(8)
                    .map(|value| {
                        value
                            .parse::<u64>()
                            .with_context(|| format!("bad jiffies value: '{value}'"))
                    })
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("parsing [{line}]"))
            })
            .and_then(|values| match values.as_slice() {
                [_user, _nice, _system, idle, rest @ ..] => Ok(Self {
                    idle: idle + rest.first().copied().unwrap_or(0),
                    total: values.iter().sum(),
                }),
                other => Err(anyhow::anyhow!("expected at least 4 cpu columns, got {}", other.len())),
            })
    }

    pub fn read(root: &HostRoot) -> Result<Self> {
        root.read_to_string("/proc/stat")
            .and_then(|stat| Self::parse(&stat))
    }

    /// Percent of jiffies spent busy between `earlier` and `self`. Zero when no time has passed.
    pub fn busy_percent_since(&self, earlier: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(earlier.total);
        let idle = self.idle.saturating_sub(earlier.idle);
        match total {
            0 => 0.0,
            total => (total.saturating_sub(idle) as f64 / total as f64 * 100.0).clamp(0.0, 100.0),
        }
    }
}

/// Busy percent between consecutive calls, the first call measuring from construction.
#[derive(Debug)]
pub struct CpuSampler {
    root: HostRoot,
    last: CpuTimes,
}

impl CpuSampler {
    pub fn new(root: HostRoot) -> Result<Self> {
        CpuTimes::read(&root)
            .context("priming cpu sampler")
            .map(|last| Self { root, last })
    }

    pub fn root(&self) -> &HostRoot {
        &self.root
    }

    #[instrument(level = "TRACE")]
    pub fn sample(&mut self) -> Result<f64> {
        CpuTimes::read(&self.root).map(|now| {
            now.busy_percent_since(&self.last)
                .tap(|percent| trace!(?now, last=?self.last, %percent))
                .tap(|_| self.last = now)
        })
    }
}

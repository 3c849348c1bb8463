use {
    crate::HostRoot,
    anyhow::{Context, Result},
    indexmap::IndexMap,
    tracing::instrument,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCounters {
    pub bytes_recv: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub dropin: u64,
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub errout: u64,
    pub dropout: u64,
}

impl IoCounters {
    fn parse_columns(columns: &str) -> Result<Self> {
        let values = columns
            .split_whitespace()
            .map(|value| {
                value
                    .parse::<u64>()
                    .with_context(|| format!("bad counter: '{value}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        match values.as_slice() {
            [bytes_recv, packets_recv, errin, dropin, _fifo, _frame, _compressed, _multicast, bytes_sent, packets_sent, errout, dropout, ..] => Ok(Self {
                bytes_recv: *bytes_recv,
                packets_recv: *packets_recv,
                errin: *errin,
                dropin: *dropin,
                bytes_sent: *bytes_sent,
                packets_sent: *packets_sent,
                errout: *errout,
                dropout: *dropout,
            }),
            other => Err(anyhow::anyhow!("expected at least 12 counters, got {}", other.len())),
        }
    }
}

/// Parses `/proc/net/dev`, keeping the kernel's interface order.
pub fn parse_net_dev(net_dev: &str) -> Result<IndexMap<String, IoCounters>> {
    net_dev
        .lines()
        // the two header lines have no ':' but contain '|'
        .filter(|line| !line.contains('|') && !line.trim().is_empty())
        .map(|line| {
            line.split_once(':')
                .context("no interface name")
                .and_then(|(name, columns)| IoCounters::parse_columns(columns).map(|counters| (name.trim().to_owned(), counters)))
                .with_context(|| format!("parsing [{line}]"))
        })
        .collect()
}

#[instrument(level = "TRACE")]
pub fn net_io_counters(root: &HostRoot) -> Result<IndexMap<String, IoCounters>> {
    root.read_to_string("/proc/net/dev")
        .and_then(|net_dev| parse_net_dev(&net_dev))
}

/// `Ok(None)` when the host has no interface called `name`.
pub fn interface(root: &HostRoot, name: &str) -> Result<Option<IoCounters>> {
    net_io_counters(root).map(|mut counters| counters.swap_remove(name))
}

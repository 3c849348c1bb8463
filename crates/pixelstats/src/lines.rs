use {
    anyhow::{Context, Result},
    chrono::{
        format::{Item, StrftimeItems},
        DateTime, TimeZone,
    },
    host_metrics::{DiskUsage, InterfaceAddress, IoCounters, VirtualMemory},
    human_bytes::bytes2human,
    std::fmt::Write,
};

pub const DEFAULT_CLOCK_FORMAT: &str = "%b %d %H:%M:%S";

pub fn validate_clock_format(format: &str) -> Result<()> {
    match StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        true => Err(anyhow::anyhow!("invalid strftime format: '{format}'")),
        false => Ok(()),
    }
}

pub fn clock<Tz>(now: &DateTime<Tz>, format: &str) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut line = String::new();
    write!(line, "{}", now.format(format))
        .map_err(|_| anyhow::anyhow!("invalid strftime format"))
        .with_context(|| format!("formatting time with '{format}'"))
        .map(|_| line)
}

pub fn ip_address(address: Option<&InterfaceAddress>) -> String {
    match address {
        Some(InterfaceAddress { address, .. }) => format!("IP: {address}"),
        None => "IP: not found".to_owned(),
    }
}

pub fn cpu(percent: f64, temperature: Option<f64>) -> String {
    match temperature {
        Some(celsius) => format!("CPU: {percent:.0}%  {celsius:.0}°C"),
        None => format!("CPU: {percent:.0}%"),
    }
}

/// Used memory and the percentage that is still available.
pub fn memory(memory: &VirtualMemory) -> String {
    format!("RAM: {} {:.0}%", bytes2human(memory.used), 100.0 - memory.percent())
}

pub fn disk(disk: &DiskUsage) -> String {
    format!("SD: {} {:.0}%", bytes2human(disk.used), disk.percent_of_total())
}

pub fn network(interface: &str, counters: &IoCounters) -> String {
    format!(
        "{interface}: Tx {} Rx {}",
        bytes2human(counters.bytes_sent),
        bytes2human(counters.bytes_recv)
    )
}

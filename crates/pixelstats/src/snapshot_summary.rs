use {
    crate::lines,
    host_metrics::Snapshot,
    human_bytes::bytes2human,
    itertools::Itertools,
    tabled::{
        settings::{object::Columns, Color, Rotate, Style},
        Tabled,
    },
};

/// One poll, with both raw and human readable byte counts.
#[derive(Tabled)]
pub struct SnapshotSummary {
    pub taken_at: String,
    pub address: String,
    pub cpu_percent: String,
    pub temperature: String,
    pub memory_used: String,
    pub memory_total: String,
    pub memory_available: String,
    pub disk_used: String,
    pub disk_total: String,
    pub network: String,
}

fn with_raw(bytes: u64) -> String {
    format!("{} ({bytes} bytes)", bytes2human(bytes))
}

impl SnapshotSummary {
    pub fn print(&self) -> String {
        tabled::Table::new([self])
            .with(Style::modern())
            .with(Rotate::Left)
            .modify(Columns::single(0), Color::FG_GREEN)
            .to_string()
    }

    pub fn new(
        Snapshot {
            taken_at,
            address,
            cpu_percent,
            temperature,
            memory,
            disk,
            interfaces,
        }: &Snapshot,
    ) -> Self {
        Self {
            taken_at: taken_at.to_rfc3339(),
            address: address
                .as_ref()
                .map(|address| address.to_string())
                .unwrap_or_else(|| "not found".to_owned()),
            cpu_percent: format!("{cpu_percent:.1}%"),
            temperature: temperature
                .map(|celsius| format!("{celsius:.1}°C"))
                .unwrap_or_else(|| "no sensor".to_owned()),
            memory_used: with_raw(memory.used),
            memory_total: with_raw(memory.total),
            memory_available: format!("{} ({:.1}%)", with_raw(memory.available), 100.0 - memory.percent()),
            disk_used: format!("{} ({:.1}%)", with_raw(disk.used), disk.percent_of_total()),
            disk_total: with_raw(disk.total),
            network: interfaces
                .iter()
                .map(|(interface, counters)| match counters {
                    Some(counters) => lines::network(interface, counters),
                    None => format!("{interface}: not available"),
                })
                .join("\n"),
        }
    }
}

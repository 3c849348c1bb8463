use {
    crate::{
        config_file::PixelstatsConfig,
        display::Frame,
        lines,
    },
    anyhow::{Context, Result},
    host_metrics::Snapshot,
    tracing::debug,
};

/// Displays shorter than this only get the clock, address and cpu lines.
pub const MEMORY_MIN_HEIGHT: u32 = 32;
pub const DISK_AND_NETWORK_MIN_HEIGHT: u32 = 64;

pub fn compose(snapshot: &Snapshot, config: &PixelstatsConfig) -> Result<Frame> {
    let size = config.display.size();
    let mut layout = Frame::layout(size, config.display.line_height());
    layout
        .push(lines::clock(&snapshot.taken_at, &config.clock_format).context("drawing clock")?)
        .push(lines::ip_address(snapshot.address.as_ref()))
        .push(lines::cpu(snapshot.cpu_percent, snapshot.temperature));
    if size.height >= MEMORY_MIN_HEIGHT {
        layout.push(lines::memory(&snapshot.memory));
    }
    if size.height >= DISK_AND_NETWORK_MIN_HEIGHT {
        layout.push(lines::disk(&snapshot.disk));
        snapshot
            .interfaces
            .iter()
            .for_each(|(interface, counters)| match counters {
                Some(counters) => {
                    layout.push(lines::network(interface, counters));
                }
                None => debug!(%interface, "no such interface, skipping"),
            });
    }
    Ok(layout.finish())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::config_file::DisplayConfig,
        chrono::TimeZone,
        host_metrics::{DiskUsage, InterfaceAddress, IoCounters, VirtualMemory},
        indexmap::IndexMap,
        itertools::Itertools,
        pretty_assertions::assert_eq,
    };

    fn snapshot(interfaces: IndexMap<String, Option<IoCounters>>) -> Result<Snapshot> {
        Ok(Snapshot {
            taken_at: chrono::Local
                .with_ymd_and_hms(2024, 3, 7, 9, 5, 1)
                .earliest()
                .context("bad date")?,
            address: Some(InterfaceAddress {
                interface: "wlan0".into(),
                address: [192, 168, 1, 23].into(),
            }),
            cpu_percent: 12.3,
            temperature: Some(47.8),
            memory: VirtualMemory {
                total: 1000 * 1024 * 1024,
                available: 333 * 1024 * 1024,
                free: 100 * 1024 * 1024,
                buffers: 0,
                cached: 0,
                used: 100001221,
            },
            disk: DiskUsage::from_space(4 << 30, 3 << 30, 2 << 30),
            interfaces,
        })
    }

    fn config(height: u32) -> PixelstatsConfig {
        PixelstatsConfig {
            display: DisplayConfig { height, ..Default::default() },
            ..Default::default()
        }
    }

    fn both_interfaces() -> IndexMap<String, Option<IoCounters>> {
        [
            ("wlan0".to_owned(), None),
            (
                "eth0".to_owned(),
                Some(IoCounters {
                    bytes_recv: 100001221,
                    bytes_sent: 10000,
                    ..Default::default()
                }),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_tiny_display() -> Result<()> {
        let frame = compose(&snapshot(both_interfaces())?, &config(16))?;
        assert_eq!(frame.texts().collect_vec(), vec!["Mar 07 09:05:01", "IP: 192.168.1.23"]);
        Ok(())
    }

    #[test]
    fn test_32_pixels_adds_memory() -> Result<()> {
        let frame = compose(&snapshot(both_interfaces())?, &config(32))?;
        assert_eq!(
            frame.texts().collect_vec(),
            vec!["Mar 07 09:05:01", "IP: 192.168.1.23", "CPU: 12%  48°C", "RAM: 95M 33%"]
        );
        assert_eq!(frame.lines.iter().map(|line| line.y).collect_vec(), vec![0, 10, 20, 30]);
        Ok(())
    }

    #[test_log::test]
    fn test_64_pixels_adds_disk_and_present_interfaces() -> Result<()> {
        let frame = compose(&snapshot(both_interfaces())?, &config(64))?;
        assert_eq!(
            frame.texts().collect_vec(),
            vec![
                "Mar 07 09:05:01",
                "IP: 192.168.1.23",
                "CPU: 12%  48°C",
                "RAM: 95M 33%",
                "SD: 1G 25%",
                "eth0: Tx 9K Rx 95M",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_lines_past_the_bottom_are_dropped() -> Result<()> {
        let interfaces = ["wlan0", "eth0", "usb0"]
            .into_iter()
            .map(|name| (name.to_owned(), Some(IoCounters::default())))
            .collect();
        let frame = compose(&snapshot(interfaces)?, &config(64))?;
        assert_eq!(frame.lines.len(), 7);
        assert_eq!(frame.lines.last().map(|line| line.text.as_str()), Some("eth0: Tx 0B Rx 0B"));
        Ok(())
    }

    #[test]
    fn test_font_size_sets_line_height() -> Result<()> {
        let config = PixelstatsConfig {
            display: DisplayConfig {
                height: 64,
                font_size: 18,
                ..Default::default()
            },
            ..Default::default()
        };
        let frame = compose(&snapshot(both_interfaces())?, &config)?;
        assert_eq!(frame.lines.iter().map(|line| line.y).collect_vec(), vec![0, 16, 32, 48]);
        Ok(())
    }
}

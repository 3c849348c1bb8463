use {
    crate::{config_file::PixelstatsConfig, display::DisplaySink, screen},
    anyhow::{Context, Result},
    host_metrics::{CpuSampler, Snapshot},
    std::time::Duration,
    tokio::time::{Instant, MissedTickBehavior},
    tracing::{info, instrument, warn},
};

/// How long cpu times are left to accumulate before the first sample is taken.
pub const CPU_PRIMING: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub polls: u64,
    pub frames: u64,
}

/// Polls and redraws every `config.interval` until ctrl-c, or `iterations` polls if that is not zero.
///
/// A poll that cannot collect metrics is skipped with a warning. Failing to draw ends the loop.
#[instrument(skip_all, fields(interval = %config.interval, size = %sink.size()))]
pub async fn run(config: &PixelstatsConfig, sink: &mut dyn DisplaySink, iterations: u64) -> Result<RunSummary> {
    let mut sampler = CpuSampler::new(config.host_root()).context("starting cpu sampler")?;
    let request = config.snapshot_request();
    // the first tick would otherwise fire right after priming and measure nothing
    let first_poll = Instant::now() + CPU_PRIMING.min(config.interval.0);
    let mut ticker = tokio::time::interval_at(first_poll, config.interval.0);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut summary = RunSummary::default();
    while iterations == 0 || summary.polls < iterations {
        tokio::select! {
            interrupted = &mut ctrl_c => {
                interrupted.context("listening for ctrl-c")?;
                info!("interrupted, stopping");
                break;
            }
            _ = ticker.tick() => {}
        }
        summary.polls += 1;
        match Snapshot::collect(&mut sampler, &request) {
            Ok(snapshot) => {
                screen::compose(&snapshot, config)
                    .and_then(|frame| sink.present(&frame))
                    .context("presenting frame")?;
                summary.frames += 1;
            }
            Err(reason) => warn!("skipping poll #{}: {reason:?}", summary.polls),
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            config_file::{DisplayConfig, Interval},
            display::MemoryDisplay,
        },
        pretty_assertions::assert_eq,
    };

    const PROC_STAT: &str = "cpu  100 0 100 700 100 0 0 0 0 0\n";
    const MEMINFO: &str = "MemTotal: 1024000 kB\nMemFree: 102400 kB\nMemAvailable: 512000 kB\n";
    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
  eth0:    2048       2    0    0    0     0          0         0     1024       1    0    0    0     0       0          0
";

    fn fake_host(files: &[(&str, &str)]) -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        files.iter().try_for_each(|(path, contents)| {
            let path = dir.path().join(path);
            path.parent()
                .map(std::fs::create_dir_all)
                .transpose()
                .and_then(|_| std::fs::write(&path, contents))
                .with_context(|| format!("writing [{}]", path.display()))
        })?;
        Ok(dir)
    }

    fn config(host: &tempfile::TempDir) -> PixelstatsConfig {
        PixelstatsConfig {
            interval: Interval(Duration::from_millis(10)),
            display: DisplayConfig {
                height: 64,
                ..Default::default()
            },
            disk_path: host.path().to_owned(),
            host_root: host.path().to_owned(),
            ..Default::default()
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_bounded_run_draws_every_poll() -> Result<()> {
        let host = fake_host(&[("proc/stat", PROC_STAT), ("proc/meminfo", MEMINFO), ("proc/net/dev", NET_DEV)])?;
        let config = config(&host);
        let mut display = MemoryDisplay::new(config.display.size());
        let summary = run(&config, &mut display, 3).await?;

        assert_eq!(summary, RunSummary { polls: 3, frames: 3 });
        assert_eq!(display.frames.len(), 3);
        let last = display.last().context("no frame")?;
        assert!(last.texts().any(|text| text == "CPU: 0%"));
        assert!(last.texts().any(|text| text == "RAM: 900M 50%"));
        assert!(last.texts().any(|text| text == "eth0: Tx 1K Rx 2K"));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_polls_are_skipped() -> Result<()> {
        let host = fake_host(&[("proc/stat", PROC_STAT), ("proc/net/dev", NET_DEV)])?;
        let config = config(&host);
        let mut display = MemoryDisplay::new(config.display.size());
        let summary = run(&config, &mut display, 2).await?;

        assert_eq!(summary, RunSummary { polls: 2, frames: 0 });
        assert!(display.frames.is_empty());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_proc_stat_fails_to_start() -> Result<()> {
        let host = fake_host(&[])?;
        let config = config(&host);
        let mut display = MemoryDisplay::new(config.display.size());
        assert!(run(&config, &mut display, 1).await.is_err());
        Ok(())
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_first_poll_waits_for_cpu_priming() -> Result<()> {
        let host = fake_host(&[("proc/stat", PROC_STAT), ("proc/meminfo", MEMINFO), ("proc/net/dev", NET_DEV)])?;
        let config = PixelstatsConfig {
            interval: Interval(Duration::from_secs(5)),
            ..config(&host)
        };
        let mut display = MemoryDisplay::new(config.display.size());
        let started = Instant::now();
        let summary = run(&config, &mut display, 1).await?;

        assert_eq!(summary, RunSummary { polls: 1, frames: 1 });
        let waited = started.elapsed();
        assert!(waited >= CPU_PRIMING, "first poll after {waited:?}");
        assert!(waited < config.interval.0, "first poll after {waited:?}");
        Ok(())
    }
}

use {
    anyhow::{Context, Result},
    clap::{Parser, Subcommand, ValueEnum},
    config_file::PixelstatsConfig,
    display::Backend,
    std::{path::PathBuf, str::FromStr},
    tap::prelude::*,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// configuration of the display and of what gets polled, defaults are used when the file does not exist
    ///
    /// run `pixelstats print-default-config` for a starting point
    #[arg(long, short = 'c', default_value = config_file::CONFIG_FILE_NAME)]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
    #[arg(long, value_enum, default_value_t = Default::default())]
    logging_mode: LoggingMode,
}

#[derive(Subcommand)]
enum Commands {
    /// polls the host and redraws the display until interrupted
    Run {
        /// stop after this many polls, 0 means never
        #[arg(long, default_value_t = 0)]
        iterations: u64,
        #[arg(long, value_enum, default_value_t = Default::default())]
        backend: Backend,
    },
    /// polls the host once and prints everything that was collected
    Snapshot,
    /// prints byte counts the way the display shows them
    Format {
        #[arg(allow_negative_numbers = true, required = true)]
        bytes: Vec<i128>,
    },
    /// prints default config. save it and modify to your liking
    PrintDefaultConfig,
}

pub mod config_file;
pub mod display;
pub mod lines;
pub mod run;
pub mod screen;
pub mod snapshot_summary;

#[derive(Debug, ValueEnum, Clone, Copy, Default, serde::Serialize)]
pub enum LoggingMode {
    #[default]
    Cli,
    TracingConsole,
}

fn setup_logging(logging_mode: LoggingMode) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
    match logging_mode {
        LoggingMode::Cli => tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::from_str("info"))?)
            // stdout belongs to the terminal display
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Unable to set a global subscriber"),
        LoggingMode::TracingConsole => tracing_subscriber::registry()
            .with(console_subscriber::spawn())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Unable to set a global subscriber"),
    }
}

fn ensure_supported_platform() -> Result<()> {
    match cfg!(target_os = "linux") {
        true => Ok(()),
        false => Err(anyhow::anyhow!("{} platform not supported", std::env::consts::OS)),
    }
}

async fn async_main() -> Result<()> {
    let Cli {
        command,
        config,
        logging_mode,
    } = Cli::parse();
    setup_logging(logging_mode)?;

    match command {
        Commands::Run { iterations, backend } => {
            ensure_supported_platform()?;
            let config = PixelstatsConfig::find_or_default(&config).context("reading pixelstats config file")?;
            let mut display = backend.open(config.display.size(), config.display.columns());
            run::run(&config, display.as_mut(), iterations)
                .await
                .map(|summary| tracing::info!(polls = summary.polls, frames = summary.frames, "finished"))
        }
        Commands::Snapshot => {
            ensure_supported_platform()?;
            let config = PixelstatsConfig::find_or_default(&config).context("reading pixelstats config file")?;
            let mut sampler = host_metrics::CpuSampler::new(config.host_root()).context("starting cpu sampler")?;
            // a sample right after priming measures nothing
            tokio::time::sleep(run::CPU_PRIMING).await;
            host_metrics::Snapshot::collect(&mut sampler, &config.snapshot_request())
                .map(|snapshot| snapshot_summary::SnapshotSummary::new(&snapshot).print())
                .map(|summary| println!("\n{summary}"))
        }
        Commands::Format { bytes } => bytes
            .into_iter()
            .map(|bytes| human_bytes::try_bytes2human(bytes).with_context(|| format!("formatting [{bytes}]")))
            .collect::<Result<Vec<_>>>()
            .map(|formatted| formatted.into_iter().for_each(|formatted| println!("{formatted}"))),
        Commands::PrintDefaultConfig => PixelstatsConfig::default()
            .write()
            .map(|config| println!("{config}")),
    }
    .context("\n\nerror occurred, run with --help or check your configuration")
    .tap_err(|e| {
        tracing::error!("\n\n{e:?}");
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    async_main().await
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_accepts_negative_numbers() -> Result<()> {
        let cli = Cli::try_parse_from(["pixelstats", "format", "10000", "-1"])?;
        match cli.command {
            Commands::Format { bytes } => assert_eq!(bytes, vec![10000, -1]),
            _ => anyhow::bail!("expected the format command"),
        }
        Ok(())
    }

    #[test]
    fn test_run_defaults() -> Result<()> {
        let cli = Cli::try_parse_from(["pixelstats", "-c", "/etc/pixelstats.yaml", "run"])?;
        assert_eq!(cli.config, PathBuf::from("/etc/pixelstats.yaml"));
        match cli.command {
            Commands::Run { iterations, backend } => {
                assert_eq!(iterations, 0);
                assert_eq!(backend, Backend::Terminal);
            }
            _ => anyhow::bail!("expected the run command"),
        }
        Ok(())
    }
}

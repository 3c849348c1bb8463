use {
    crate::{display::DisplaySize, lines},
    anyhow::{Context, Result},
    host_metrics::{HostRoot, SnapshotRequest},
    serde::{Deserialize, Serialize},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
    tap::prelude::*,
    tracing::{debug, info},
};

/// Polling period, written as `5s` or `500ms` in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, derive_more::Into)]
pub struct Interval(pub Duration);

impl std::str::FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (amount, to_duration): (&str, fn(u64) -> Option<Duration>) = if let Some(amount) = s.strip_suffix("ms") {
            (amount, |millis| Some(Duration::from_millis(millis)))
        } else if let Some(amount) = s.strip_suffix('s') {
            (amount, |secs| Some(Duration::from_secs(secs)))
        } else if let Some(amount) = s.strip_suffix('m') {
            (amount, |minutes| minutes.checked_mul(60).map(Duration::from_secs))
        } else {
            anyhow::bail!("interval [{s}] needs a unit: ms, s or m")
        };
        amount
            .trim()
            .parse::<u64>()
            .with_context(|| format!("bad interval amount: '{amount}'"))
            .and_then(|amount| to_duration(amount).with_context(|| format!("interval [{s}] is too long")))
            .and_then(|duration| {
                (!duration.is_zero())
                    .then_some(Self(duration))
                    .context("interval must be longer than zero")
            })
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.subsec_millis() {
            0 => write!(f, "{}s", self.0.as_secs()),
            _ => write!(f, "{}ms", self.0.as_millis()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, derivative::Derivative, PartialEq, Eq)]
#[derivative(Default)]
#[serde(default)]
pub struct DisplayConfig {
    #[derivative(Default(value = "128"))]
    pub width: u32,
    #[derivative(Default(value = "64"))]
    pub height: u32,
    /// pixel height of the font, lines advance by two pixels less
    #[derivative(Default(value = "12"))]
    pub font_size: u32,
    /// pixel width of a glyph, used to fit text into the terminal rendition
    #[derivative(Default(value = "6"))]
    pub char_width: u32,
}

impl DisplayConfig {
    pub fn size(&self) -> DisplaySize {
        DisplaySize {
            width: self.width,
            height: self.height,
        }
    }
    pub fn line_height(&self) -> u32 {
        self.font_size.saturating_sub(2).max(1)
    }
    pub fn columns(&self) -> usize {
        (self.width / self.char_width.max(1)).max(1) as usize
    }
}

#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, derivative::Derivative, PartialEq)]
#[derivative(Default)]
#[serde(default)]
pub struct PixelstatsConfig {
    #[derivative(Default(value = "Interval(Duration::from_secs(5))"))]
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub interval: Interval,
    pub display: DisplayConfig,
    #[derivative(Default(value = "lines::DEFAULT_CLOCK_FORMAT.to_owned()"))]
    pub clock_format: String,
    #[derivative(Default(value = "PathBuf::from(\"/\")"))]
    pub disk_path: PathBuf,
    #[derivative(Default(value = "vec![\"wlan0\".into(), \"eth0\".into()]"))]
    pub interfaces: Vec<String>,
    #[derivative(Default(value = "vec![\"lo\".into()]"))]
    pub skip_interfaces: Vec<String>,
    #[derivative(Default(value = "PathBuf::from(\"/\")"))]
    pub host_root: PathBuf,
}

pub static CONFIG_FILE_NAME: &str = "pixelstats.yaml";

impl PixelstatsConfig {
    pub fn write(&self) -> Result<String> {
        self.pipe_ref(serde_yaml::to_string)
            .context("serialization failed")
            .map(|config| format!("\n# default {CONFIG_FILE_NAME} file\n# edit it according to your needs:\n{config}"))
    }

    pub fn parse(config: &str) -> Result<Self> {
        serde_yaml::from_str::<Self>(config)
            .context("parsing config file")
            .and_then(|config| config.validate().map(|_| config))
    }

    fn validate(&self) -> Result<()> {
        lines::validate_clock_format(&self.clock_format)
            .context("checking clock_format")
            .and_then(|_| {
                (self.display.width > 0 && self.display.height > 0)
                    .then_some(())
                    .with_context(|| format!("display size must not be empty, got [{}]", self.display.size()))
            })
    }

    pub fn find(path: &Path) -> Result<(PathBuf, Self)> {
        path.exists()
            .then(|| path.to_owned())
            .with_context(|| format!("config path [{}] does not exist", path.display()))
            .and_then(|config_path| {
                std::fs::read_to_string(&config_path)
                    .context("reading file")
                    .and_then(|config| Self::parse(&config))
                    .map(|config| (config_path, config))
            })
            .with_context(|| format!("getting [{CONFIG_FILE_NAME}]"))
            .tap_ok(|config| debug!("{config:?}"))
    }

    /// A missing file is not an error, the defaults describe a 128x64 display on a raspberry pi.
    pub fn find_or_default(path: &Path) -> Result<Self> {
        match path.exists() {
            true => Self::find(path)
                .tap_ok(|(path, _)| info!("found config at '{}'", path.display()))
                .map(|(_, config)| config),
            false => {
                info!("no config at '{}', using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn host_root(&self) -> HostRoot {
        HostRoot::new(&self.host_root)
    }

    pub fn snapshot_request(&self) -> SnapshotRequest {
        SnapshotRequest {
            disk_path: self.disk_path.clone(),
            interfaces: self.interfaces.clone(),
            skip_interfaces: self.skip_interfaces.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn test_interval_parsing() -> Result<()> {
        assert_eq!("5s".parse::<Interval>()?, Interval(Duration::from_secs(5)));
        assert_eq!(" 250ms ".parse::<Interval>()?, Interval(Duration::from_millis(250)));
        assert_eq!("2m".parse::<Interval>()?, Interval(Duration::from_secs(120)));
        assert!("5".parse::<Interval>().is_err());
        assert!("0s".parse::<Interval>().is_err());
        assert!("-1s".parse::<Interval>().is_err());
        assert!("fast".parse::<Interval>().is_err());
        assert!(format!("{}m", u64::MAX).parse::<Interval>().is_err());
        Ok(())
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(Interval(Duration::from_secs(5)).to_string(), "5s");
        assert_eq!(Interval(Duration::from_millis(1500)).to_string(), "1500ms");
    }

    #[test_log::test]
    fn test_default_round_trips() -> Result<()> {
        let written = PixelstatsConfig::default().write()?;
        assert!(written.contains("interval: 5s"));
        assert_eq!(PixelstatsConfig::parse(&written)?, PixelstatsConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let config = PixelstatsConfig::parse("interval: 1s\ndisplay:\n  height: 32\ninterfaces: [eth1]\n")?;
        assert_eq!(config.interval, Interval(Duration::from_secs(1)));
        assert_eq!(config.display.height, 32);
        assert_eq!(config.display.width, 128);
        assert_eq!(config.display.line_height(), 10);
        assert_eq!(config.interfaces, vec!["eth1".to_owned()]);
        assert_eq!(config.skip_interfaces, vec!["lo".to_owned()]);
        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        assert!(PixelstatsConfig::parse("interval: never\n").is_err());
        assert!(PixelstatsConfig::parse("clock_format: \"%Q\"\n").is_err());
        assert!(PixelstatsConfig::parse("display:\n  width: 0\n").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(
            PixelstatsConfig::find_or_default(&dir.path().join(CONFIG_FILE_NAME))?,
            PixelstatsConfig::default()
        );
        Ok(())
    }

    #[test]
    fn test_find_existing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "disk_path: /boot\n")?;
        let (found, config) = PixelstatsConfig::find(&path)?;
        assert_eq!(found, path);
        assert_eq!(config.disk_path, PathBuf::from("/boot"));
        assert_eq!(config.snapshot_request().disk_path, PathBuf::from("/boot"));
        Ok(())
    }

    #[test]
    fn test_columns() {
        assert_eq!(DisplayConfig::default().columns(), 21);
        assert_eq!(DisplayConfig { char_width: 0, ..Default::default() }.columns(), 128);
    }
}

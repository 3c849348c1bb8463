use {
    crate::{list_dir, natural_key, HostRoot},
    anyhow::{Context, Result},
    itertools::Itertools,
    std::path::{Path, PathBuf},
    tap::prelude::*,
    tracing::{debug, instrument},
};

const HWMON: &str = "/sys/class/hwmon";
const THERMAL: &str = "/sys/class/thermal";

fn sorted_matching(root: &HostRoot, dir: &str, matches: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    root.join(dir)
        .pipe_ref(|dir| list_dir(dir))
        .map(|names| {
            names
                .into_iter()
                .filter(|name| matches(name))
                .sorted_by(|a, b| natural_key(a).cmp(&natural_key(b)))
                .collect()
        })
}

fn hwmon_inputs(root: &HostRoot) -> Result<Vec<PathBuf>> {
    sorted_matching(root, HWMON, |name| name.starts_with("hwmon")).and_then(|devices| {
        devices
            .into_iter()
            .map(|device| format!("{HWMON}/{device}"))
            .map(|device| {
                sorted_matching(root, &device, |name| name.starts_with("temp") && name.ends_with("_input"))
                    .map(|inputs| inputs.into_iter().map(|input| root.join(&format!("{device}/{input}"))).collect_vec())
            })
            .flatten_ok()
            .collect()
    })
}

fn thermal_zones(root: &HostRoot) -> Result<Vec<PathBuf>> {
    sorted_matching(root, THERMAL, |name| name.starts_with("thermal_zone")).map(|zones| {
        zones
            .into_iter()
            .map(|zone| root.join(&format!("{THERMAL}/{zone}/temp")))
            .filter(|path| path.exists())
            .collect()
    })
}

pub fn parse_millidegrees(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("bad temperature reading: '{}'", raw.trim()))
        .map(|millidegrees| millidegrees as f64 / 1000.0)
}

/// Every sensor reading path in preference order: hwmon devices first, then thermal zones.
pub fn sensor_paths(root: &HostRoot) -> Result<Vec<PathBuf>> {
    hwmon_inputs(root).and_then(|hwmon| thermal_zones(root).map(|thermal| hwmon.into_iter().chain(thermal).collect()))
}

fn read_celsius(path: &Path) -> Result<f64> {
    std::fs::read_to_string(path)
        .with_context(|| format!("reading [{}]", path.display()))
        .and_then(|raw| parse_millidegrees(&raw))
}

/// Degrees Celsius of the first sensor that can be read, `None` if there is none.
///
/// Unreadable inputs are common (a wifi chip reports EIO while its interface is down), those are skipped.
#[instrument(level = "TRACE")]
pub fn first_celsius(root: &HostRoot) -> Result<Option<f64>> {
    sensor_paths(root).map(|paths| {
        paths.iter().find_map(|path| {
            read_celsius(path)
                .tap_ok(|celsius| debug!(path=%path.display(), %celsius))
                .tap_err(|reason| debug!(path=%path.display(), ?reason, "skipping sensor"))
                .ok()
        })
    })
}

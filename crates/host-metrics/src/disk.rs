use {
    anyhow::{Context, Result},
    std::path::Path,
    tracing::instrument,
};

/// Usage of the filesystem holding a path, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    /// available to unprivileged users, so `used + free` can be less than `total`
    pub free: u64,
}

impl DiskUsage {
    pub fn from_space(total: u64, free_space: u64, available_space: u64) -> Self {
        Self {
            total,
            used: total.saturating_sub(free_space),
            free: available_space,
        }
    }

    #[instrument(level = "TRACE")]
    pub fn of(path: &Path) -> Result<Self> {
        fs2::statvfs(path)
            .with_context(|| format!("statvfs of [{}]", path.display()))
            .map(|stats| Self::from_space(stats.total_space(), stats.free_space(), stats.available_space()))
    }

    pub fn percent_of_total(&self) -> f64 {
        match self.total {
            0 => 0.0,
            total => self.used as f64 / total as f64 * 100.0,
        }
    }
}

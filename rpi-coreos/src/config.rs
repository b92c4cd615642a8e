use crate::cache;
use crate::errors::ProvisionResult;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Deadlines for each kind of external call.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub download: Duration,
    pub write: Duration,
    pub package_install: Duration,
    pub copy: Duration,
    pub rsync: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            download: Duration::from_secs(6 * 60 * 60),
            write: Duration::from_secs(2 * 60 * 60),
            package_install: Duration::from_secs(2 * 60 * 60),
            copy: Duration::from_secs(5 * 60),
            rsync: Duration::from_secs(30 * 60),
        }
    }
}

/// Process-wide settings, resolved once at startup and passed to every step.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: PathBuf,
    /// Privileged commands are prefixed with `sudo`.
    pub elevate: bool,
    pub timeouts: Timeouts,
}

impl Config {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            elevate: true,
            timeouts: Timeouts::default(),
        }
    }

    pub fn resolve(cache_dir: Option<&Path>, elevate: bool) -> ProvisionResult<Self> {
        let cache_dir = cache::resolve_cache_dir(cache_dir)?;
        Ok(Self {
            elevate,
            ..Self::new(cache_dir)
        })
    }
}

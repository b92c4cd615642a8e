//! High-level file copy operations.

use crate::HalResult;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RsyncOptions {
    pub archive: bool,
    pub verbose: bool,
    pub human_readable: bool,
    /// Skip files that already exist on the receiving side.
    pub ignore_existing: bool,
}

impl RsyncOptions {
    /// `rsync -avh --ignore-existing`: fill in whatever the destination is missing.
    pub fn mirror_missing() -> Self {
        Self {
            archive: true,
            verbose: true,
            human_readable: true,
            ignore_existing: true,
        }
    }

    /// Render the option flags (without source and destination).
    pub fn to_args(&self) -> Vec<String> {
        let mut short = String::new();
        if self.archive {
            short.push('a');
        }
        if self.verbose {
            short.push('v');
        }
        if self.human_readable {
            short.push('h');
        }

        let mut args = Vec::new();
        if !short.is_empty() {
            args.push(format!("-{}", short));
        }
        if self.ignore_existing {
            args.push("--ignore-existing".to_string());
        }
        args
    }
}

pub trait RsyncOps {
    /// Copy the contents of `src` into `dst` (a trailing slash is added to `src`).
    ///
    /// Runs with elevated privileges when the backend elevates, since the destination is
    /// usually a freshly mounted root-owned filesystem.
    fn rsync(
        &self,
        src: &Path,
        dst: &Path,
        opts: &RsyncOptions,
        timeout: Duration,
    ) -> HalResult<()>;
}

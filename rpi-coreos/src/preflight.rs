//! Checks that the external tools a run depends on are installed.

use crate::errors::{ProvisionError, ProvisionResult};
use crate::{download::COREOS_INSTALLER, rootfs::CONTAINER_RUNTIME};
use log::info;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Which parts of the pipeline are about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Download,
    Write,
    BuildRoot,
    Install,
}

pub fn required_binaries(workflow: Workflow, elevate: bool) -> Vec<&'static str> {
    let mut bins = Vec::new();
    if matches!(workflow, Workflow::Download | Workflow::Write | Workflow::Install) {
        bins.push(COREOS_INSTALLER);
    }
    if matches!(workflow, Workflow::Write | Workflow::Install) {
        bins.extend(["mount", "umount"]);
    }
    if matches!(workflow, Workflow::BuildRoot | Workflow::Install) {
        bins.push(CONTAINER_RUNTIME);
    }
    if workflow == Workflow::Install {
        bins.extend(["lsblk", "cp", "rsync"]);
    }
    if elevate && matches!(workflow, Workflow::Write | Workflow::Install) {
        bins.push("sudo");
    }
    bins
}

pub fn run(workflow: Workflow, elevate: bool) -> ProvisionResult<()> {
    info!("🧪 Preflight checks");
    let path = std::env::var_os("PATH").unwrap_or_default();
    check_binaries(&required_binaries(workflow, elevate), &path)?;
    info!("✅ Preflight complete");
    Ok(())
}

/// Every binary in `bins` must be an executable regular file somewhere on `path_var`.
pub fn check_binaries(bins: &[&str], path_var: &OsStr) -> ProvisionResult<()> {
    let entries = std::env::split_paths(path_var).collect::<Vec<_>>();
    for bin in bins {
        let Some(found) = find_in_paths(bin, &entries) else {
            return Err(ProvisionError::MissingBinary(bin.to_string()));
        };
        if !is_executable(&found) {
            return Err(ProvisionError::NotExecutable {
                name: bin.to_string(),
                path: found,
            });
        }
        log::debug!("found {} at {}", bin, found.display());
    }
    Ok(())
}

fn find_in_paths(bin: &str, paths: &[PathBuf]) -> Option<PathBuf> {
    paths
        .iter()
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}

fn is_executable(path: &Path) -> bool {
    let Ok(md) = fs::metadata(path) else {
        return false;
    };
    if !md.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        md.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real hardware.

use super::{BlockOps, MountOps, ProcessOps, RsyncOps, RsyncOptions};
use crate::{HalError, HalResult};
use std::collections::{HashMap, HashSet};
#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
        elevated: bool,
        captured: bool,
    },
    Mount {
        device: PathBuf,
        target: PathBuf,
    },
    Unmount {
        target: PathBuf,
    },
    MountTable,
    Lsblk {
        disk: PathBuf,
    },
    Rsync {
        src: PathBuf,
        dst: PathBuf,
        args: Vec<String>,
    },
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Simulated mount table as (source, mount point), in mount order
    mounts: Vec<(String, PathBuf)>,
    /// Canned stdout per program
    stdout: HashMap<String, String>,
    /// Programs that report a non-zero exit
    failing: HashSet<String>,
}

/// Fake HAL implementation that records operations without executing them.
///
/// This is designed for testing and CI environments where real system
/// operations would fail or be dangerous. `mount`, `umount`, `lsblk` and `rsync`
/// honour [`FakeHal::fail_program`] under those program names.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the simulated mount table.
    pub fn with_mount(self, source: &str, target: impl Into<PathBuf>) -> Self {
        self.lock().mounts.push((source.to_string(), target.into()));
        self
    }

    /// Canned stdout returned by every captured run of `program` (and by `lsblk`).
    pub fn with_stdout(self, program: &str, stdout: &str) -> Self {
        self.lock()
            .stdout
            .insert(program.to_string(), stdout.to_string());
        self
    }

    /// Make every subsequent run of `program` fail.
    pub fn fail_program(&self, program: &str) {
        self.lock().failing.insert(program.to_string());
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Recorded external commands as `program arg...` strings.
    pub fn command_lines(&self) -> Vec<String> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Command { program, args, .. } => {
                    let mut line = program.clone();
                    for arg in args {
                        line.push(' ');
                        line.push_str(arg);
                    }
                    Some(line)
                }
                _ => None,
            })
            .collect()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.lock().operations.iter().any(check)
    }

    /// Whether `path` is a mount point or mounted source in the simulated table.
    pub fn is_mounted(&self, path: &Path) -> bool {
        self.lock()
            .mounts
            .iter()
            .any(|(source, target)| target == path || Path::new(source) == path)
    }

    /// Mount points currently in the simulated table.
    pub fn mounted_targets(&self) -> Vec<PathBuf> {
        self.lock()
            .mounts
            .iter()
            .map(|(_, target)| target.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record_operation(&self, op: Operation) {
        self.lock().operations.push(op);
    }

    fn check_failure(&self, program: &str) -> HalResult<()> {
        if self.lock().failing.contains(program) {
            return Err(HalError::CommandFailed {
                program: program.to_string(),
                code: Some(1),
                stderr: format!("{} failed (fake)", program),
            });
        }
        Ok(())
    }

    fn record_command(&self, program: &str, args: &[&str], elevated: bool, captured: bool) {
        self.record_operation(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            elevated,
            captured,
        });
    }
}

impl ProcessOps for FakeHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> HalResult<Output> {
        log::info!("FAKE HAL: {} {}", program, args.join(" "));
        self.record_command(program, args, false, true);
        self.check_failure(program)?;

        let stdout = self.lock().stdout.get(program).cloned().unwrap_or_default();
        #[cfg(unix)]
        let status = std::process::ExitStatus::from_raw(0);
        #[cfg(not(unix))]
        let status = std::process::Command::new("true").status()?;

        Ok(Output {
            status,
            stdout: stdout.into_bytes(),
            stderr: Vec::new(),
        })
    }

    fn command_status(&self, program: &str, args: &[&str], _timeout: Duration) -> HalResult<()> {
        log::info!("FAKE HAL: {} {}", program, args.join(" "));
        self.record_command(program, args, false, false);
        self.check_failure(program)
    }

    fn command_status_elevated(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> HalResult<()> {
        log::info!("FAKE HAL: sudo {} {}", program, args.join(" "));
        self.record_command(program, args, true, false);
        self.check_failure(program)
    }
}

impl MountOps for FakeHal {
    fn mount_device(&self, device: &Path, target: &Path) -> HalResult<()> {
        log::info!("FAKE HAL: mount {} -> {}", device.display(), target.display());

        self.record_operation(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
        });
        self.check_failure("mount")?;
        self.lock()
            .mounts
            .push((device.display().to_string(), target.to_path_buf()));

        Ok(())
    }

    fn unmount(&self, target: &Path) -> HalResult<()> {
        log::info!("FAKE HAL: unmount {}", target.display());

        self.record_operation(Operation::Unmount {
            target: target.to_path_buf(),
        });
        self.check_failure("umount")?;
        // Like umount(8): only the most recent mount matching the argument goes away.
        let mut state = self.lock();
        let latest = state.mounts.iter().rposition(|(source, mount_point)| {
            mount_point == target || Path::new(source) == target
        });
        if let Some(pos) = latest {
            state.mounts.remove(pos);
        }

        Ok(())
    }

    fn mount_sources(&self) -> HalResult<Vec<String>> {
        self.record_operation(Operation::MountTable);
        self.check_failure("mount")?;
        Ok(self
            .lock()
            .mounts
            .iter()
            .map(|(source, _)| source.clone())
            .collect())
    }
}

impl BlockOps for FakeHal {
    fn lsblk_json(&self, disk: &Path) -> HalResult<String> {
        self.record_operation(Operation::Lsblk {
            disk: disk.to_path_buf(),
        });
        self.check_failure("lsblk")?;
        Ok(self
            .lock()
            .stdout
            .get("lsblk")
            .cloned()
            .unwrap_or_else(|| r#"{"blockdevices": []}"#.to_string()))
    }
}

impl RsyncOps for FakeHal {
    fn rsync(
        &self,
        src: &Path,
        dst: &Path,
        opts: &RsyncOptions,
        _timeout: Duration,
    ) -> HalResult<()> {
        log::info!("FAKE HAL: rsync {} -> {}", src.display(), dst.display());
        self.record_operation(Operation::Rsync {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            args: opts.to_args(),
        });
        self.check_failure("rsync")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_mounts_are_reported_as_sources() {
        let hal = FakeHal::new()
            .with_mount("/dev/sda1", "/run/media/boot")
            .with_mount("/dev/sdb1", "/run/media/data");
        assert_eq!(hal.mount_sources().unwrap(), vec!["/dev/sda1", "/dev/sdb1"]);
    }

    #[test]
    fn unmount_by_source_removes_entry() {
        let hal = FakeHal::new().with_mount("/dev/sda1", "/run/media/boot");
        hal.unmount(Path::new("/dev/sda1")).unwrap();
        assert!(hal.mounted_targets().is_empty());
    }

    #[test]
    fn unmount_by_source_releases_only_the_latest_mount() {
        let hal = FakeHal::new()
            .with_mount("/dev/sda4", "/run/media/me/root")
            .with_mount("/dev/sda4", "/run/media/me/var");
        hal.unmount(Path::new("/dev/sda4")).unwrap();
        assert_eq!(
            hal.mounted_targets(),
            vec![PathBuf::from("/run/media/me/root")]
        );
    }

    #[test]
    fn captured_command_returns_canned_stdout() {
        let hal = FakeHal::new().with_stdout("coreos-installer", "/tmp/image.raw.xz\n");
        let out = hal
            .command_output("coreos-installer", &["download"], Duration::from_secs(1))
            .unwrap();
        assert_eq!(out.stdout, b"/tmp/image.raw.xz\n");
        assert_eq!(hal.command_lines(), vec!["coreos-installer download"]);
    }

    #[test]
    fn failing_program_still_records_the_attempt() {
        let hal = FakeHal::new();
        hal.fail_program("podman");
        let err = hal
            .command_status("podman", &["run"], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, HalError::CommandFailed { .. }));
        assert_eq!(hal.command_lines(), vec!["podman run"]);
    }

    #[test]
    fn failed_mount_leaves_table_untouched() {
        let hal = FakeHal::new();
        hal.fail_program("mount");
        assert!(hal
            .mount_device(Path::new("/dev/sda2"), Path::new("/mnt/efi"))
            .is_err());
        assert!(!hal.is_mounted(Path::new("/mnt/efi")));
    }
}

//! Linux HAL implementation backed by the usual command-line tools.

use super::{BlockOps, MountOps, ProcessOps, RsyncOps, RsyncOptions};
use crate::{mount_table, HalError, HalResult};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    elevate: bool,
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHal {
    /// Elevate with `sudo` unless we are already root.
    pub fn new() -> Self {
        Self::with_elevation(!crate::running_as_root())
    }

    pub fn with_elevation(elevate: bool) -> Self {
        Self { elevate }
    }

    fn command(&self, program: &str, args: &[&str], elevated: bool) -> (String, Command) {
        let argv = elevated_argv(program, args, elevated && self.elevate);
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        log::debug!("exec: {}", argv.join(" "));
        (argv[0].clone(), cmd)
    }
}

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const MOUNT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Full argv for `program args...`, prefixed with `sudo` when `elevate` is set.
pub fn elevated_argv(program: &str, args: &[&str], elevate: bool) -> Vec<String> {
    let mut argv = Vec::with_capacity(args.len() + 2);
    if elevate {
        argv.push("sudo".to_string());
    }
    argv.push(program.to_string());
    argv.extend(args.iter().map(|a| a.to_string()));
    argv
}

fn map_command_err(spawned: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(spawned.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(
    program: &str,
    spawned: &str,
    cmd: &mut Command,
    timeout: Duration,
) -> HalResult<Output> {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(spawned, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let output = Output {
        status,
        stdout: stdout_handle.join().unwrap_or_default(),
        stderr: stderr_handle.join().unwrap_or_default(),
    };
    if !output.status.success() {
        return Err(output_failed(program, &output));
    }
    Ok(output)
}

fn status_with_timeout(
    program: &str,
    spawned: &str,
    cmd: &mut Command,
    timeout: Duration,
) -> HalResult<()> {
    let mut child = cmd.spawn().map_err(|e| map_command_err(spawned, e))?;

    match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) if status.success() => Ok(()),
        Some(status) => Err(HalError::CommandFailed {
            program: program.to_string(),
            code: status.code(),
            // stderr went straight to the terminal.
            stderr: String::new(),
        }),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}

impl ProcessOps for LinuxHal {
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<Output> {
        let (spawned, mut cmd) = self.command(program, args, false);
        output_with_timeout(program, &spawned, &mut cmd, timeout)
    }

    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()> {
        let (spawned, mut cmd) = self.command(program, args, false);
        status_with_timeout(program, &spawned, &mut cmd, timeout)
    }

    fn command_status_elevated(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<()> {
        let (spawned, mut cmd) = self.command(program, args, true);
        status_with_timeout(program, &spawned, &mut cmd, timeout)
    }
}

impl MountOps for LinuxHal {
    fn mount_device(&self, device: &Path, target: &Path) -> HalResult<()> {
        let device = device.display().to_string();
        let target = target.display().to_string();
        let (spawned, mut cmd) = self.command("mount", &[device.as_str(), target.as_str()], true);
        output_with_timeout("mount", &spawned, &mut cmd, MOUNT_TIMEOUT)?;
        Ok(())
    }

    fn unmount(&self, target: &Path) -> HalResult<()> {
        let target = target.display().to_string();
        let (spawned, mut cmd) = self.command("umount", &[target.as_str()], true);
        output_with_timeout("umount", &spawned, &mut cmd, MOUNT_TIMEOUT)?;
        Ok(())
    }

    fn mount_sources(&self) -> HalResult<Vec<String>> {
        let (spawned, mut cmd) = self.command("mount", &[], false);
        let output = output_with_timeout("mount", &spawned, &mut cmd, QUERY_TIMEOUT)?;
        let stdout = String::from_utf8(output.stdout)?;
        Ok(mount_table::parse_sources(&stdout))
    }
}

impl BlockOps for LinuxHal {
    fn lsblk_json(&self, disk: &Path) -> HalResult<String> {
        let disk = disk.display().to_string();
        let args = [disk.as_str(), "-J", "-oLABEL,PATH"];
        let (spawned, mut cmd) = self.command("lsblk", &args, false);
        let output = output_with_timeout("lsblk", &spawned, &mut cmd, QUERY_TIMEOUT)?;
        Ok(String::from_utf8(output.stdout)?)
    }
}

impl RsyncOps for LinuxHal {
    fn rsync(
        &self,
        src: &Path,
        dst: &Path,
        opts: &RsyncOptions,
        timeout: Duration,
    ) -> HalResult<()> {
        let mut args = opts.to_args();
        // Ensure trailing slashes so the contents of src land directly in dst.
        args.push(format!("{}/", src.display()));
        args.push(format!("{}/", dst.display()));
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();

        let (spawned, mut cmd) = self.command("rsync", &argv, true);
        status_with_timeout("rsync", &spawned, &mut cmd, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn elevated_argv_prefixes_sudo() {
        assert_eq!(
            elevated_argv("umount", &["/mnt/efi"], true),
            vec!["sudo", "umount", "/mnt/efi"]
        );
        assert_eq!(
            elevated_argv("umount", &["/mnt/efi"], false),
            vec!["umount", "/mnt/efi"]
        );
    }

    #[test]
    fn command_output_captures_stdout() {
        let hal = LinuxHal::with_elevation(false);
        let output = hal
            .command_output("sh", &["-c", "echo hello"], Duration::from_secs(10))
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn command_output_reports_failure_with_stderr() {
        let hal = LinuxHal::with_elevation(false);
        let err = hal
            .command_output("sh", &["-c", "echo nope >&2; exit 3"], Duration::from_secs(10))
            .unwrap_err();
        match err {
            HalError::CommandFailed {
                program,
                code,
                stderr,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_command_not_found() {
        let hal = LinuxHal::with_elevation(false);
        let err = hal
            .command_status("definitely-not-a-real-tool-42", &[], Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(
            err,
            HalError::CommandNotFound(ref p) if p == "definitely-not-a-real-tool-42"
        ));
    }

    #[test]
    fn hung_command_times_out() {
        let hal = LinuxHal::with_elevation(false);
        let err = hal
            .command_status("sleep", &["5"], Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, HalError::CommandTimeout { ref program, .. } if program == "sleep"));
    }

    #[test]
    fn elevated_without_elevation_runs_directly() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("marker");
        let hal = LinuxHal::with_elevation(false);
        hal.command_status_elevated(
            "touch",
            &[marker.to_str().unwrap()],
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(marker.exists());
    }

    #[test]
    fn rsync_fills_in_missing_files_only() {
        if which_rsync().is_none() {
            return;
        }
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(src.join("EFI/BOOT")).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("EFI/BOOT/BOOTAA64.EFI"), b"new").unwrap();
        std::fs::write(src.join("start4.elf"), b"new").unwrap();
        std::fs::write(dst.join("start4.elf"), b"old").unwrap();

        let hal = LinuxHal::with_elevation(false);
        hal.rsync(
            &src,
            &dst,
            &RsyncOptions::mirror_missing(),
            Duration::from_secs(60),
        )
        .unwrap();

        assert_eq!(std::fs::read(dst.join("EFI/BOOT/BOOTAA64.EFI")).unwrap(), b"new");
        assert_eq!(std::fs::read(dst.join("start4.elf")).unwrap(), b"old");
    }

    fn which_rsync() -> Option<std::path::PathBuf> {
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join("rsync"))
            .find(|candidate| candidate.is_file())
    }
}

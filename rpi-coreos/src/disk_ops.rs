//! Preparing and writing the target block device.

use crate::config::Config;
use crate::download::COREOS_INSTALLER;
use crate::errors::{ProvisionError, ProvisionResult};
use rpi_hal::{mount_table, MountOps, ProcessOps};
use std::path::{Component, Path, PathBuf};

/// The device must be an absolute path under `/dev/` with no `..` components.
pub fn validate_device(device: &Path) -> ProvisionResult<()> {
    let escapes = device
        .components()
        .any(|component| component == Component::ParentDir);
    if device.is_absolute()
        && !escapes
        && device.starts_with("/dev")
        && device != Path::new("/dev")
    {
        return Ok(());
    }
    Err(ProvisionError::InvalidDevice(device.to_path_buf()))
}

/// Unmount every mounted source whose path starts with `device`.
///
/// Prefix matching is textual, so `/dev/sda` covers `/dev/sda1` and `/dev/sda2`.
/// Partitions are released highest-numbered first and before the bare disk.
/// Returns the sources that were unmounted.
pub fn unmount_all<H: MountOps + ?Sized>(hal: &H, device: &Path) -> ProvisionResult<Vec<String>> {
    let sources = hal.mount_sources()?;
    let prefix = device.to_string_lossy();
    let mounted = mount_table::sources_under_device(&sources, &prefix);

    if mounted.is_empty() {
        log::debug!("nothing mounted from {}", device.display());
    }
    for source in &mounted {
        log::info!("🔌 Unmounting {}", source);
        hal.unmount(&PathBuf::from(source))?;
    }
    Ok(mounted)
}

/// Write `image` onto `device` with `coreos-installer install`.
pub fn write_image<H: ProcessOps + ?Sized>(
    hal: &H,
    cfg: &Config,
    device: &Path,
    image: &Path,
) -> ProvisionResult<()> {
    log::info!("💾 Writing {} -> {}", image.display(), device.display());
    let image = image.display().to_string();
    let device = device.display().to_string();
    hal.command_status_elevated(
        COREOS_INSTALLER,
        &["install", "-f", image.as_str(), device.as_str()],
        cfg.timeouts.write,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpi_hal::{FakeHal, Operation};

    #[test]
    fn validate_device_accepts_dev_paths() {
        for dev in ["/dev/sda", "/dev/mmcblk0", "/dev/disk/by-id/usb-SanDisk"] {
            validate_device(Path::new(dev)).unwrap();
        }
    }

    #[test]
    fn validate_device_rejects_parent_dir_escapes() {
        for dev in ["/dev/../etc/passwd", "/dev/sda/../../etc", "/dev/.."] {
            assert!(
                matches!(
                    validate_device(Path::new(dev)),
                    Err(ProvisionError::InvalidDevice(_))
                ),
                "{dev} should be rejected"
            );
        }
    }

    #[test]
    fn validate_device_rejects_other_paths() {
        for dev in ["sda", "dev/sda", "/tmp/sda", "/dev", "/devices/sda"] {
            assert!(
                matches!(
                    validate_device(Path::new(dev)),
                    Err(ProvisionError::InvalidDevice(_))
                ),
                "{dev} should be rejected"
            );
        }
    }

    #[test]
    fn unmount_all_releases_only_matching_sources() {
        let hal = FakeHal::new()
            .with_mount("/dev/nvme0n1p3", "/")
            .with_mount("/dev/sda1", "/run/media/me/boot")
            .with_mount("/dev/sdb1", "/run/media/me/backup")
            .with_mount("/dev/sda2", "/run/media/me/EFI-SYSTEM");

        let released = unmount_all(&hal, Path::new("/dev/sda")).unwrap();
        assert_eq!(released, vec!["/dev/sda2", "/dev/sda1"]);

        let unmounted: Vec<PathBuf> = hal
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Unmount { target } => Some(target),
                _ => None,
            })
            .collect();
        assert_eq!(
            unmounted,
            vec![PathBuf::from("/dev/sda2"), PathBuf::from("/dev/sda1")]
        );
        assert!(hal.is_mounted(Path::new("/")));
        assert!(hal.is_mounted(Path::new("/run/media/me/backup")));
    }

    #[test]
    fn unmount_all_releases_every_mount_of_a_partition() {
        let hal = FakeHal::new()
            .with_mount("/dev/sda4", "/run/media/me/root")
            .with_mount("/dev/sda4", "/run/media/me/var");

        let released = unmount_all(&hal, Path::new("/dev/sda")).unwrap();
        assert_eq!(released, vec!["/dev/sda4", "/dev/sda4"]);

        let unmounts = hal
            .operations()
            .iter()
            .filter(|op| matches!(op, Operation::Unmount { .. }))
            .count();
        assert_eq!(unmounts, 2);
        assert!(hal.mounted_targets().is_empty());
    }

    #[test]
    fn unmount_all_with_nothing_mounted_is_a_no_op() {
        let hal = FakeHal::new().with_mount("/dev/sdb1", "/mnt");
        assert!(unmount_all(&hal, Path::new("/dev/sda")).unwrap().is_empty());
        assert!(!hal.has_operation(|op| matches!(op, Operation::Unmount { .. })));
    }

    #[test]
    fn unmount_failure_is_fatal() {
        let hal = FakeHal::new().with_mount("/dev/sda1", "/mnt/boot");
        hal.fail_program("umount");
        assert!(unmount_all(&hal, Path::new("/dev/sda")).is_err());
    }

    #[test]
    fn write_image_runs_elevated_install() {
        let hal = FakeHal::new();
        let cfg = Config::new(PathBuf::from("/cache"));
        write_image(
            &hal,
            &cfg,
            Path::new("/dev/sda"),
            Path::new("/cache/fedora-coreos-38.raw.xz"),
        )
        .unwrap();

        assert!(hal.has_operation(|op| matches!(
            op,
            Operation::Command { program, elevated: true, .. } if program == "coreos-installer"
        )));
        assert_eq!(
            hal.command_lines(),
            vec!["coreos-installer install -f /cache/fedora-coreos-38.raw.xz /dev/sda"]
        );
    }
}

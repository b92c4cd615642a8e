//! Copying Raspberry Pi boot firmware onto the EFI system partition.

use crate::config::Config;
use crate::errors::{ProvisionError, ProvisionResult};
use rpi_hal::{blockdev, BlockOps, MountGuard, MountOps, ProcessOps, RsyncOps, RsyncOptions};
use std::path::{Path, PathBuf};

pub const EFI_LABEL: &str = "EFI-SYSTEM";

/// First partition on `device` labeled `EFI-SYSTEM`.
pub fn find_efi_partition<H: BlockOps + ?Sized>(
    hal: &H,
    device: &Path,
) -> ProvisionResult<PathBuf> {
    let devices = hal.block_devices(device)?;
    blockdev::find_by_label(&devices, EFI_LABEL)
        .map(PathBuf::from)
        .ok_or_else(|| ProvisionError::NoEfiPartitionFound {
            device: device.to_path_buf(),
        })
}

/// U-Boot binary shipped by `uboot-images-armv8` for the given Pi revision.
pub fn uboot_source(root_dir: &Path, rpi_revision: &str) -> PathBuf {
    root_dir
        .join("usr/share/uboot")
        .join(format!("rpi_{}", rpi_revision))
        .join("u-boot.bin")
}

/// File name the Pi firmware expects on the EFI partition, e.g. `rpi4-u-boot.bin`.
pub fn uboot_dest_name(rpi_revision: &str) -> String {
    format!("rpi{}-u-boot.bin", rpi_revision)
}

/// Mount the EFI partition of `device` and add the U-Boot binary and firmware tree from
/// `root_dir`.
///
/// The partition is unmounted again on every path out of this function. Failures of the
/// final rsync are logged and ignored.
pub fn add_rpi_files<H>(
    hal: &H,
    cfg: &Config,
    device: &Path,
    root_dir: &Path,
    rpi_revision: &str,
) -> ProvisionResult<PathBuf>
where
    H: ProcessOps + MountOps + BlockOps + RsyncOps + ?Sized,
{
    let efi_part = find_efi_partition(hal, device)?;
    log::info!("🧩 EFI partition: {}", efi_part.display());

    let mount_dir = tempfile::Builder::new().prefix("rpi-coreos-efi-").tempdir()?;
    hal.mount_device(&efi_part, mount_dir.path())?;
    let guard = MountGuard::new(hal, mount_dir.path());

    let copied = copy_firmware(hal, cfg, root_dir, rpi_revision, guard.target());

    match guard.finish() {
        Ok(()) => {}
        Err(err) => {
            // Never let TempDir clean up a directory that may still be a mount point.
            let kept = mount_dir.keep();
            log::error!("failed to unmount {}: {}", kept.display(), err);
            copied?;
            return Err(err.into());
        }
    }
    copied?;

    log::info!("✅ Raspberry Pi firmware installed on {}", efi_part.display());
    Ok(efi_part)
}

fn copy_firmware<H>(
    hal: &H,
    cfg: &Config,
    root_dir: &Path,
    rpi_revision: &str,
    mount_point: &Path,
) -> ProvisionResult<()>
where
    H: ProcessOps + RsyncOps + ?Sized,
{
    let src = uboot_source(root_dir, rpi_revision).display().to_string();
    let dst = mount_point
        .join(uboot_dest_name(rpi_revision))
        .display()
        .to_string();
    log::info!("🥾 Copying U-Boot for Raspberry Pi {}", rpi_revision);
    hal.command_status_elevated("cp", &[src.as_str(), dst.as_str()], cfg.timeouts.copy)?;

    let efi_tree = root_dir.join("boot/efi");
    if let Err(err) = hal.rsync(
        &efi_tree,
        mount_point,
        &RsyncOptions::mirror_missing(),
        cfg.timeouts.rsync,
    ) {
        log::warn!(
            "copying {} onto the EFI partition did not complete, continuing: {}",
            efi_tree.display(),
            err
        );
    }
    Ok(())
}

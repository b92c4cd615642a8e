//! End-to-end provisioning: image onto the device, then Raspberry Pi firmware on top.

use crate::config::Config;
use crate::download::Stream;
use crate::errors::ProvisionResult;
use crate::{disk_ops, download, firmware, rootfs};
use rpi_hal::SystemHal;
use std::path::{Path, PathBuf};

/// What to write and where.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub arch: String,
    pub device: PathBuf,
    pub stream: Stream,
    /// Raspberry Pi hardware revision, e.g. `"4"`.
    pub rpi_revision: String,
}

/// What a completed install touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub unmounted: Vec<String>,
    pub image: PathBuf,
    pub fedora_version: String,
    pub root_dir: PathBuf,
    pub efi_partition: PathBuf,
}

/// Unmount the device, fetch the image and write it. Returns the unmounted sources and
/// the image path.
pub fn write<H: SystemHal + ?Sized>(
    hal: &H,
    cfg: &Config,
    device: &Path,
    arch: &str,
    stream: Stream,
) -> ProvisionResult<(Vec<String>, PathBuf)> {
    disk_ops::validate_device(device)?;
    let unmounted = disk_ops::unmount_all(hal, device)?;
    let image = download::download_image(hal, cfg, arch, stream)?;
    disk_ops::write_image(hal, cfg, device, &image)?;
    Ok((unmounted, image))
}

/// Full provisioning of a Raspberry Pi boot medium.
pub fn install<H: SystemHal + ?Sized>(
    hal: &H,
    cfg: &Config,
    req: &InstallRequest,
) -> ProvisionResult<InstallReport> {
    disk_ops::validate_device(&req.device)?;
    let unmounted = disk_ops::unmount_all(hal, &req.device)?;
    let image = download::download_image(hal, cfg, &req.arch, req.stream)?;
    // Checked before writing so an unexpected image name never costs the device contents.
    let fedora_version = download::fedora_version(&image)?;

    disk_ops::write_image(hal, cfg, &req.device, &image)?;

    let root_dir = rootfs::create_rpi_root(hal, cfg, &fedora_version, &req.arch)?;
    let efi_partition =
        firmware::add_rpi_files(hal, cfg, &req.device, &root_dir, &req.rpi_revision)?;

    log::info!(
        "🎉 {} is ready for a Raspberry Pi {}",
        req.device.display(),
        req.rpi_revision
    );
    Ok(InstallReport {
        unmounted,
        image,
        fedora_version,
        root_dir,
        efi_partition,
    })
}

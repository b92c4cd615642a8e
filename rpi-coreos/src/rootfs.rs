//! Building a local package root with the Raspberry Pi boot firmware.
//!
//! The packages are installed by dnf running inside a throwaway Fedora container, so the
//! host needs neither dnf nor a matching architecture.

use crate::cache;
use crate::config::Config;
use crate::errors::ProvisionResult;
use rpi_hal::ProcessOps;
use std::path::{Path, PathBuf};

pub const CONTAINER_RUNTIME: &str = "podman";
pub const FEDORA_IMAGE: &str = "registry.fedoraproject.org/fedora";

/// U-Boot builds plus the Broadcom firmware and overlays for Pi 3 and Pi 4.
pub const RPI_PACKAGES: &[&str] = &[
    "uboot-images-armv8",
    "bcm283x-firmware",
    "bcm283x-overlays",
    "bcm2835-firmware",
    "bcm2711-firmware",
];

const CONTAINER_ROOT: &str = "/target";

pub fn root_dir_for(cache_dir: &Path, fedora_version: &str, arch: &str) -> PathBuf {
    cache_dir.join(format!("fedora-{}-{}", fedora_version, arch))
}

/// `podman run ...` arguments that install `packages` into `dest`.
pub fn package_install_args(
    dest: &Path,
    fedora_version: &str,
    arch: &str,
    packages: &[&str],
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "run".into(),
        "-v".into(),
        format!("{}:{}", dest.display(), CONTAINER_ROOT),
        "--security-opt".into(),
        "label=disable".into(),
        "--pull".into(),
        "always".into(),
        "--rm".into(),
        format!("{}:{}", FEDORA_IMAGE, fedora_version),
        "dnf".into(),
        "install".into(),
        "-y".into(),
        format!("--forcearch={}", arch),
        "--installroot".into(),
        CONTAINER_ROOT.into(),
        "--release".into(),
        fedora_version.into(),
    ];
    args.extend(packages.iter().map(|p| p.to_string()));
    args
}

/// Ensure `<cache>/fedora-<version>-<arch>` holds the Raspberry Pi firmware packages.
///
/// The install runs even when the directory already exists; dnf leaves an up-to-date
/// installroot alone and refreshes a stale one.
pub fn create_rpi_root<H: ProcessOps + ?Sized>(
    hal: &H,
    cfg: &Config,
    fedora_version: &str,
    arch: &str,
) -> ProvisionResult<PathBuf> {
    let root_dir = cache::ensure_dir(&root_dir_for(&cfg.cache_dir, fedora_version, arch))?;
    log::info!(
        "📦 Installing Raspberry Pi firmware (Fedora {}, {}) into {}",
        fedora_version,
        arch,
        root_dir.display()
    );

    let args = package_install_args(&root_dir, fedora_version, arch, RPI_PACKAGES);
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
    hal.command_status(CONTAINER_RUNTIME, &argv, cfg.timeouts.package_install)?;

    Ok(root_dir)
}

//! Provision Fedora CoreOS onto Raspberry Pi boot media.
//!
//! The pipeline is: unmount the target, download the image with coreos-installer,
//! write it, install the Pi firmware packages into a cached root with podman, and copy
//! U-Boot plus the firmware tree onto the image's EFI partition.

pub mod cache;
pub mod cli;
pub mod config;
pub mod disk_ops;
pub mod download;
pub mod errors;
pub mod firmware;
pub mod logging;
pub mod preflight;
pub mod provision;
pub mod rootfs;

pub use config::Config;
pub use errors::{ProvisionError, ProvisionResult};
